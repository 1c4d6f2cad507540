use std::error::Error as _;
use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for log conversion.
///
/// Only `DirectoryNotFound` and `BadPattern` ever escape a batch call; the
/// per-file variants are captured by the converter and recorded as `Failed`
/// outcomes instead of propagating.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("input directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("invalid glob pattern {pattern:?}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("cannot read {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// One-line description including the underlying cause, for outcome records.
    pub fn describe(&self) -> String {
        match self.source() {
            Some(source) => format!("{self}: {source}"),
            None => self.to_string(),
        }
    }
}
