//! Trait definitions for the extractor module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ExtractorError;
use super::types::{DetectedFormat, FormatTag};

/// Identifies a file's format from its content.
#[async_trait]
pub trait FormatDetector: Send + Sync {
    async fn detect_format(&self, path: &Path) -> Result<DetectedFormat, ExtractorError>;
}

/// Locates the first ISBN-like string in a book of one format.
///
/// Implementations only read the file.
#[async_trait]
pub trait BookExtractor: Send + Sync {
    /// The format this extractor handles.
    fn format(&self) -> FormatTag;

    /// Returns the raw, unvalidated first ISBN-like token, if any.
    async fn extract_first_isbn(&self, path: &Path) -> Result<Option<String>, ExtractorError>;
}
