use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{supabase::SupabaseClient, DatabaseError};

use crate::models::{
    CreateEntryRequest, ReferenceDataError, ReferenceEntry, ReferenceKind, UpdateEntryRequest,
};

/// CRUD over the prescription lookup tables. Every kind shares one row shape.
pub struct ReferenceDataService {
    supabase: SupabaseClient,
}

impl ReferenceDataService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_entries(
        &self,
        kind: ReferenceKind,
        auth_token: Option<&str>,
    ) -> Result<Vec<ReferenceEntry>, ReferenceDataError> {
        let path = format!("/rest/v1/{}?order=name.asc", kind.table());
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, auth_token, None).await?;

        let entries = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ReferenceEntry>, _>>()?;

        debug!("Loaded {} {} entries", entries.len(), kind.label());
        Ok(entries)
    }

    pub async fn create_entry(
        &self,
        kind: ReferenceKind,
        request: CreateEntryRequest,
        auth_token: Option<&str>,
    ) -> Result<ReferenceEntry, ReferenceDataError> {
        let name = required_name(&request.name, kind)?;

        let entry_data = json!({
            "name": name,
            "description": request.description,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/{}", kind.table());
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &path,
                auth_token,
                Some(entry_data),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| duplicate_or(e, kind, &name))?;

        let row = result.into_iter().next().ok_or_else(|| {
            ReferenceDataError::DatabaseError(format!("Failed to create {}", kind.label()))
        })?;
        let entry: ReferenceEntry = serde_json::from_value(row)?;

        info!("Created {} '{}' ({})", kind.label(), entry.name, entry.id);
        Ok(entry)
    }

    pub async fn update_entry(
        &self,
        kind: ReferenceKind,
        entry_id: &str,
        request: UpdateEntryRequest,
        auth_token: Option<&str>,
    ) -> Result<ReferenceEntry, ReferenceDataError> {
        let entry_id = parse_entry_id(entry_id)?;
        let mut update_data = serde_json::Map::new();

        let name = match request.name {
            Some(name) => {
                let name = required_name(&name, kind)?;
                update_data.insert("name".to_string(), json!(name));
                name
            }
            None => String::new(),
        };
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/{}?id=eq.{}", kind.table(), entry_id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(Value::Object(update_data)),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| duplicate_or(e, kind, &name))?;

        let row = result.into_iter().next().ok_or(ReferenceDataError::NotFound(kind))?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn delete_entry(
        &self,
        kind: ReferenceKind,
        entry_id: &str,
        auth_token: Option<&str>,
    ) -> Result<(), ReferenceDataError> {
        let entry_id = parse_entry_id(entry_id)?;

        let path = format!("/rest/v1/{}?id=eq.{}", kind.table(), entry_id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                auth_token,
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        if result.is_empty() {
            return Err(ReferenceDataError::NotFound(kind));
        }

        info!("Deleted {} {}", kind.label(), entry_id);
        Ok(())
    }
}

fn required_name(raw: &str, kind: ReferenceKind) -> Result<String, ReferenceDataError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ReferenceDataError::ValidationError(format!(
            "{} name is required",
            kind.label()
        )));
    }
    Ok(name.to_string())
}

fn parse_entry_id(raw: &str) -> Result<Uuid, ReferenceDataError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ReferenceDataError::ValidationError(format!("Invalid entry id: {}", raw)))
}

fn duplicate_or(err: DatabaseError, kind: ReferenceKind, name: &str) -> ReferenceDataError {
    if err.is_unique_violation() {
        warn!("Rejected duplicate {} '{}'", kind.label(), name);
        ReferenceDataError::Duplicate {
            kind,
            name: name.to_string(),
        }
    } else {
        err.into()
    }
}
