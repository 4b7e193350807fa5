use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DatabaseError;

/// Lookup tables offered as pick-lists when writing a prescription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Medicines,
    Diagnoses,
    Frequencies,
    Instructions,
    Days,
    Dosages,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 6] = [
        ReferenceKind::Medicines,
        ReferenceKind::Diagnoses,
        ReferenceKind::Frequencies,
        ReferenceKind::Instructions,
        ReferenceKind::Days,
        ReferenceKind::Dosages,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Medicines => "medicines",
            ReferenceKind::Diagnoses => "diagnoses",
            ReferenceKind::Frequencies => "frequencies",
            ReferenceKind::Instructions => "instructions",
            ReferenceKind::Days => "days",
            ReferenceKind::Dosages => "dosages",
        }
    }

    /// Singular label for messages.
    pub fn label(&self) -> &'static str {
        match self {
            ReferenceKind::Medicines => "medicine",
            ReferenceKind::Diagnoses => "diagnosis",
            ReferenceKind::Frequencies => "frequency",
            ReferenceKind::Instructions => "instruction",
            ReferenceKind::Days => "day",
            ReferenceKind::Dosages => "dosage",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEntryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("{} entry not found", .0.label())]
    NotFound(ReferenceKind),

    #[error("A {} named '{}' already exists", .kind.label(), .name)]
    Duplicate { kind: ReferenceKind, name: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for ReferenceDataError {
    fn from(err: DatabaseError) -> Self {
        ReferenceDataError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for ReferenceDataError {
    fn from(err: serde_json::Error) -> Self {
        ReferenceDataError::DatabaseError(format!("Malformed reference entry: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_path_segment() {
        for kind in ReferenceKind::ALL {
            let parsed: ReferenceKind = serde_json::from_value(serde_json::json!(kind.table())).unwrap();
            assert_eq!(parsed, kind);
        }
        assert!(serde_json::from_str::<ReferenceKind>("\"allergies\"").is_err());
    }

    #[test]
    fn duplicate_message_uses_singular() {
        let err = ReferenceDataError::Duplicate {
            kind: ReferenceKind::Diagnoses,
            name: "Migraine".to_string(),
        };
        assert_eq!(err.to_string(), "A diagnosis named 'Migraine' already exists");
    }
}
