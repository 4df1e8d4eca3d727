//! Import validation and export of collection files.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::{CatalogError, Result},
    models::GameRecord,
};

const NOT_AN_ARRAY: &str = "Data should be an array of games";
const EMPTY_COLLECTION: &str = "Collection is empty";
const INVALID_FORMAT: &str = "Invalid game data format. Each game needs an \"id\" and \"name\"";

/// Validate an uploaded or pasted collection file.
///
/// The payload is accepted or rejected as a whole; nothing is returned for a
/// partially valid array. An empty array is rejected.
pub fn validate_import(raw: &str) -> Result<Vec<GameRecord>> {
    let parsed: Value = serde_json::from_str(raw).map_err(|err| {
        CatalogError::Validation(format!("Import is not valid JSON: {err}"))
    })?;

    let Value::Array(entries) = parsed else {
        return Err(CatalogError::Validation(NOT_AN_ARRAY.to_string()));
    };
    if entries.is_empty() {
        return Err(CatalogError::Validation(EMPTY_COLLECTION.to_string()));
    }

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        if !has_required_fields(&entry) {
            warn!(index, "Rejecting import: entry lacks id or name");
            return Err(CatalogError::Validation(format!(
                "{INVALID_FORMAT} (entry {})",
                index + 1
            )));
        }
        let record: GameRecord = serde_json::from_value(entry).map_err(|err| {
            CatalogError::Validation(format!("{INVALID_FORMAT} (entry {}: {err})", index + 1))
        })?;
        if !seen.insert(record.id.clone()) {
            return Err(CatalogError::Validation(format!(
                "Duplicate game id {:?} in import",
                record.id
            )));
        }
        records.push(record);
    }

    info!(count = records.len(), "Import payload validated");
    Ok(records)
}

fn has_required_fields(entry: &Value) -> bool {
    let non_empty = |field: &str| {
        entry
            .get(field)
            .and_then(Value::as_str)
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    };
    non_empty("id") && non_empty("name")
}

/// Pretty-printed JSON for a collection export.
pub fn export_json(records: &[GameRecord]) -> Result<String> {
    serde_json::to_string_pretty(records)
        .map_err(|err| CatalogError::Storage(format!("failed to serialize export: {err}")))
}

/// Download name for an export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("board-game-collection-{}.json", date.format("%Y-%m-%d"))
}

/// Write an export file into `dir`, returning its path.
pub fn write_export(dir: &Path, records: &[GameRecord], date: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|err| {
        CatalogError::Storage(format!("failed to create {}: {err}", dir.display()))
    })?;
    let path = dir.join(export_file_name(date));
    fs::write(&path, export_json(records)?).map_err(|err| {
        CatalogError::Storage(format!("failed to write {}: {err}", path.display()))
    })?;
    info!(path = %path.display(), count = records.len(), "Collection exported");
    Ok(path)
}
