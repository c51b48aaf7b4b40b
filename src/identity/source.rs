// src/identity/source.rs - Where directory snapshots come from

use async_trait::async_trait;
use std::path::PathBuf;

use super::directory::DirectoryRecord;
use crate::infra::errors::{KarmaError, KarmaResult};

/// Produces the full list of accounts for one refresh.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_records(&self) -> KarmaResult<Vec<DirectoryRecord>>;
}

/// Reads a JSON array of `DirectoryRecord`s exported by the account system.
pub struct FileDirectorySource {
    path: PathBuf,
}

impl FileDirectorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DirectorySource for FileDirectorySource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_records(&self) -> KarmaResult<Vec<DirectoryRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            KarmaError::directory(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let records: Vec<DirectoryRecord> = serde_json::from_str(&content)?;
        Ok(records)
    }
}

/// Fixed record list; used when no directory file is configured.
#[derive(Default)]
pub struct StaticDirectorySource {
    records: Vec<DirectoryRecord>,
}

impl StaticDirectorySource {
    pub fn new(records: Vec<DirectoryRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl DirectorySource for StaticDirectorySource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_records(&self) -> KarmaResult<Vec<DirectoryRecord>> {
        Ok(self.records.clone())
    }
}
