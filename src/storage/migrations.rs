use serde_json::Value;

use crate::storage::StorageError;

/// One schema upgrade step, rewriting the raw JSON of version `from` into
/// version `from + 1`.
struct Migration {
    from: u32,
    run: fn(Value) -> Result<Value, StorageError>,
}

const MIGRATIONS: &[Migration] = &[
    // Future schema upgrades register here, e.g.
    // Migration { from: 1, run: split_notes_out_of_title },
];

/// Reads the schema version out of an already-parsed store file. The first
/// schema carried no version field, so its absence means version 1.
pub fn detect_version(data: &Value) -> Result<u32, StorageError> {
    match data.get("version") {
        None => Ok(1),
        Some(field) => field
            .as_u64()
            .map(|n| n as u32)
            .ok_or_else(|| StorageError::InvalidVersionField(field.to_string())),
    }
}

/// Walks the store's JSON from `from_version` up to `to_version`, one
/// registered step at a time. A missing step means the file predates any
/// upgrade path this build knows about.
pub fn apply_migrations(
    mut data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<Value, StorageError> {
    for version in from_version..to_version {
        let step = MIGRATIONS
            .iter()
            .find(|migration| migration.from == version)
            .ok_or(StorageError::UnsupportedVersion(version))?;
        data = (step.run)(data)?;
    }

    Ok(data)
}
