//! Shared page payload read from disk.

use std::path::Path;

use serde_json::Value;

use common::errors::{AppError, AppResult};

/// Reads and parses the shared JSON payload.
///
/// Read on every request, so edits show up without a restart.
pub async fn load_common_data(path: &Path) -> AppResult<Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::StaticData(format!("{}: {}", path.display(), e)))?;

    serde_json::from_str(&text)
        .map_err(|e| AppError::StaticData(format!("{}: {}", path.display(), e)))
}
