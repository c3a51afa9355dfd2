//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while deciding or executing a placement.
///
/// Whatever the variant, the source file is still reachable at its
/// original path when one of these is returned, except for
/// [`PlacerError::CleanupFailed`] where it is reachable at both.
#[derive(Debug, Error)]
pub enum PlacerError {
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Only regular files are moved; a link would dangle once relocated.
    #[error("Refusing to move symbolic link {path}")]
    SymlinkSource { path: PathBuf },

    /// A decided target was taken before the move happened.
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compare {path}: {source}")]
    CompareFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cross-device copy did not match the source. The copy was removed.
    #[error("Copy of {from} at {to} does not match the source; copy discarded")]
    VerificationFailed { from: PathBuf, to: PathBuf },

    /// The verified copy is in place but the source could not be removed.
    #[error("Copied to {to} but failed to remove source {path}: {source}")]
    CleanupFailed {
        path: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid placer configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacerError {
    pub fn copy_failed(from: PathBuf, to: PathBuf, source: std::io::Error) -> Self {
        Self::CopyFailed { from, to, source }
    }

    pub fn move_failed(from: PathBuf, to: PathBuf, source: std::io::Error) -> Self {
        Self::MoveFailed { from, to, source }
    }

    pub fn compare_failed(path: PathBuf, source: std::io::Error) -> Self {
        Self::CompareFailed { path, source }
    }

    /// Whether this is a failed post-copy integrity check.
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::VerificationFailed { .. })
    }
}
