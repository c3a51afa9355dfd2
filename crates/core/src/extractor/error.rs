//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while sniffing a book's format or reading its contents.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// No handler exists for the detected content.
    #[error("Unsupported format {format}: {path}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// The file is larger than the configured extraction guard.
    #[error("File too large to extract ({size_bytes} bytes > {limit_bytes}): {path}")]
    TooLarge {
        path: PathBuf,
        size_bytes: u64,
        limit_bytes: u64,
    },

    /// The document structure could not be parsed.
    #[error("Malformed {format} document {path}: {reason}")]
    Malformed {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    /// I/O error.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, format: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            path: path.into(),
            format,
            reason: reason.to_string(),
        }
    }
}
