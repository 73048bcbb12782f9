use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

/// Error surfaced by the sync core. The `code` is a stable machine-readable
/// identifier; `context` carries structured detail for API consumers.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CoreError {
    pub code: String,
    pub message: String,
    pub context: Option<Value>,
}

impl CoreError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn parse_error(field: &str, record_id: &str, detail: &str) -> Self {
        Self::new(
            "parse_error",
            &format!("Cannot parse `{field}` for record `{record_id}`: {detail}"),
        )
        .with_context(json!({
            "field": field,
            "record_id": record_id,
        }))
    }

    pub fn validation_error(field: &str, record_id: &str, detail: &str) -> Self {
        Self::new(
            "validation_error",
            &format!("Invalid `{field}` for record `{record_id}`: {detail}"),
        )
        .with_context(json!({
            "field": field,
            "record_id": record_id,
        }))
    }

    pub fn provider_error(scope: &str, detail: &str) -> Self {
        Self::new(
            "provider_error",
            &format!("Provider request failed for {scope}: {detail}"),
        )
        .with_context(json!({
            "scope": scope,
        }))
    }

    pub fn storage_conflict(entity_kind: &str, key: &str, detail: &str) -> Self {
        Self::new(
            "storage_conflict",
            &format!("Upsert conflict for {entity_kind} `{key}`: {detail}"),
        )
        .with_context(json!({
            "entity_kind": entity_kind,
            "key": key,
        }))
    }

    pub fn unresolved_reference(entity_kind: &str, key: &str) -> Self {
        Self::new(
            "unresolved_reference",
            &format!("Reference to {entity_kind} `{key}` cannot be resolved."),
        )
        .with_context(json!({
            "entity_kind": entity_kind,
            "key": key,
        }))
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new("invalid_argument", message)
    }

    pub fn internal_serialization(detail: &str) -> Self {
        Self::new("internal_serialization_error", detail)
    }

    pub fn store_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_locked",
            &format!("Entity store database is locked at `{location}`."),
        )
    }

    pub fn store_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_corrupt",
            &format!("Entity store database appears corrupt at `{location}`."),
        )
    }

    pub fn store_init_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_init_permission_denied",
            &format!("Cannot initialize entity store at `{location}`: {detail}"),
        )
    }

    pub fn store_init_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_init_failed",
            &format!("Entity store initialization failed at `{location}`: {detail}"),
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Entity store migration failed at `{location}`: {detail}"),
        )
    }

    /// Record-level errors are folded into a sync report; everything else
    /// aborts the run.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self.code.as_str(),
            "parse_error"
                | "validation_error"
                | "provider_error"
                | "storage_conflict"
                | "unresolved_reference"
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
