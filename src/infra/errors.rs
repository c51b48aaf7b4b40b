// src/infra/errors.rs - Error types for karmabot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KarmaError {
    // Ledger
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Ledger value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid vote value {0} in ledger (expected 1 or -1)")]
    InvalidVote(i64),

    #[error("Migration {version} ({name}) failed: {message}")]
    Migration {
        version: u32,
        name: &'static str,
        message: String,
    },

    // Collaborators
    #[error("Release lookup failed: {message}")]
    Release { message: String },

    #[error("Directory sync failed: {message}")]
    Directory { message: String },

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KarmaError {
    pub fn release(message: impl Into<String>) -> Self {
        KarmaError::Release {
            message: message.into(),
        }
    }

    pub fn directory(message: impl Into<String>) -> Self {
        KarmaError::Directory {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            KarmaError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            KarmaError::Release { .. } | KarmaError::Directory { .. } => true,
            _ => false,
        }
    }
}

pub type KarmaResult<T> = Result<T, KarmaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_error_is_transient() {
        assert!(KarmaError::release("timeout").is_transient());
        assert!(!KarmaError::InvalidVote(3).is_transient());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            KarmaError::InvalidVote(2).to_string(),
            "Invalid vote value 2 in ledger (expected 1 or -1)"
        );
        assert_eq!(
            KarmaError::directory("bad json").to_string(),
            "Directory sync failed: bad json"
        );
    }

    #[test]
    fn test_busy_is_transient() {
        let err = KarmaError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(err.is_transient());
    }
}
