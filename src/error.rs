//! Errors that end a sync run.
//!
//! Only the failures listed here stop the process. Update-path failures on an
//! existing issue never reach this type; they are logged and dropped where
//! they happen.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Backlog file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Backlog file {} has no header row", .0.display())]
    EmptyBacklog(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create issue for {id}")]
    Create {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl SyncError {
    /// Process exit code: 2 when a row's creation failed, 1 for everything
    /// that stops the run before or outside row processing.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Create { .. } => 2,
            Self::MissingFile(_) | Self::EmptyBacklog(_) | Self::Config(_) | Self::Io { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_failure_exits_with_two() {
        let err = SyncError::Create {
            id: "BL-3".into(),
            source: anyhow::anyhow!("gh issue create failed"),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("BL-3"));
    }

    #[test]
    fn missing_file_exits_with_one() {
        let err = SyncError::MissingFile(PathBuf::from("BACKLOG.csv"));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("BACKLOG.csv"));
    }

    #[test]
    fn config_error_exits_with_one() {
        assert_eq!(SyncError::Config("bad".into()).exit_code(), 1);
    }
}
