use thiserror::Error;

/// Unique violation code PostgREST forwards from Postgres.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

impl DatabaseError {
    /// Classify a non-success PostgREST response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let code = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_string));

        if code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
            return DatabaseError::UniqueViolation(body.to_string());
        }

        match status {
            401 | 403 => DatabaseError::Auth(body.to_string()),
            404 => DatabaseError::NotFound(body.to_string()),
            409 => DatabaseError::UniqueViolation(body.to_string()),
            _ => DatabaseError::Api {
                status,
                message: body.to_string(),
            },
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::UniqueViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_unique_code_wins_over_status() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#;
        assert!(DatabaseError::from_response(400, body).is_unique_violation());
        assert!(DatabaseError::from_response(409, "conflict").is_unique_violation());
    }

    #[test]
    fn statuses_map_to_variants() {
        assert!(matches!(DatabaseError::from_response(401, "no"), DatabaseError::Auth(_)));
        assert!(matches!(DatabaseError::from_response(403, "no"), DatabaseError::Auth(_)));
        assert!(matches!(DatabaseError::from_response(404, "gone"), DatabaseError::NotFound(_)));
        assert!(matches!(
            DatabaseError::from_response(500, "boom"),
            DatabaseError::Api { status: 500, .. }
        ));
    }
}
