use std::path::PathBuf;

use crate::contract::StorageError;

/// Failure while turning the source/exclude globs into concrete paths.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to expand {pattern:?}: {source}")]
    Walk {
        pattern: String,
        #[source]
        source: walkdir::Error,
    },

    #[error("no files matched {pattern:?}")]
    NoMatches { pattern: String },
}

/// Errors that end an upload run (or, under `FailurePolicy::Continue`, a single file).
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("authentication failed: {0}")]
    Auth(#[source] StorageError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create object {target:?}: {source}")]
    Create {
        target: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write object {target:?}: {source}")]
    Write {
        target: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to finalize object {target:?}: {source}")]
    Close {
        target: String,
        #[source]
        source: StorageError,
    },
}
