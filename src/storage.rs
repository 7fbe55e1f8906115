use std::path::PathBuf;

use thiserror::Error;

use crate::models::store::Store;

pub mod json;
pub mod migrations;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("could not read store file '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file '{path}' is not valid JSON: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not write store file '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize store: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("could not back up store file to '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not prune old backups in '{dir}': {source}")]
    CleanupFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file has a malformed version field: {0}")]
    InvalidVersionField(String),

    #[error(
        "store file uses schema version {0}, which is newer than this build of wilt understands; upgrade wilt first"
    )]
    FutureVersion(u32),

    #[error("store file uses schema version {0} and no upgrade path exists for it")]
    UnsupportedVersion(u32),
}

pub trait Storage {
    fn load(&self) -> Result<Store, StorageError>;
    fn save(&self, store: &Store) -> Result<(), StorageError>;
}
