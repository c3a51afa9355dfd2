//! Format detection and ISBN extraction for book files.
//!
//! Formats are modelled as a capability pair: a [`FormatDetector`] that
//! sniffs content, and one [`BookExtractor`] per [`FormatTag`], looked up
//! in an [`ExtractorSet`] keyed by the detected tag.
//!
//! # Example
//!
//! ```ignore
//! use arkivist_core::extractor::{ExtractionConfig, ExtractorSet};
//!
//! let extractors = ExtractorSet::standard(ExtractionConfig::default());
//! let format = extractors.detect_format(path).await?;
//! ```

mod config;
mod epub;
mod error;
mod pdf;
mod sniff;
mod traits;
mod types;

pub use config::ExtractionConfig;
pub use epub::EpubExtractor;
pub use error::ExtractorError;
pub use pdf::PdfExtractor;
pub use sniff::MagicSniffer;
pub use traits::{BookExtractor, FormatDetector};
pub use types::{DetectedFormat, FormatTag};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// The detector plus the registered per-format extractors.
#[derive(Clone)]
pub struct ExtractorSet {
    detector: Arc<dyn FormatDetector>,
    extractors: HashMap<FormatTag, Arc<dyn BookExtractor>>,
}

impl ExtractorSet {
    /// Creates an empty set around a detector.
    pub fn new(detector: Arc<dyn FormatDetector>) -> Self {
        Self {
            detector,
            extractors: HashMap::new(),
        }
    }

    /// Magic-byte sniffing with the PDF and EPUB extractors.
    pub fn standard(config: ExtractionConfig) -> Self {
        Self::new(Arc::new(MagicSniffer::new()))
            .with_extractor(Arc::new(PdfExtractor::new(config.clone())))
            .with_extractor(Arc::new(EpubExtractor::new(config)))
    }

    /// Registers an extractor under its own format tag, replacing any previous one.
    pub fn with_extractor(mut self, extractor: Arc<dyn BookExtractor>) -> Self {
        self.extractors.insert(extractor.format(), extractor);
        self
    }

    pub async fn detect_format(&self, path: &Path) -> Result<DetectedFormat, ExtractorError> {
        self.detector.detect_format(path).await
    }

    /// Runs the extractor registered for `format`.
    pub async fn extract_first_isbn(
        &self,
        path: &Path,
        format: FormatTag,
    ) -> Result<Option<String>, ExtractorError> {
        match self.extractors.get(&format) {
            Some(extractor) => extractor.extract_first_isbn(path).await,
            None => Err(ExtractorError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: format.to_string(),
            }),
        }
    }

    pub fn supports(&self, format: FormatTag) -> bool {
        self.extractors.contains_key(&format)
    }
}

/// Reads a whole file, refusing anything above `limit` bytes.
pub(crate) async fn read_bounded(path: &Path, limit: u64) -> Result<Vec<u8>, ExtractorError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| ExtractorError::io(path, e))?;
    if meta.len() > limit {
        return Err(ExtractorError::TooLarge {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
            limit_bytes: limit,
        });
    }
    tokio::fs::read(path)
        .await
        .map_err(|e| ExtractorError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_extractor_is_unsupported() {
        let set = ExtractorSet::new(Arc::new(MagicSniffer::new()))
            .with_extractor(Arc::new(PdfExtractor::new(ExtractionConfig::default())));

        assert!(set.supports(FormatTag::Pdf));
        assert!(!set.supports(FormatTag::Epub));

        let result = set
            .extract_first_isbn(Path::new("/tmp/book.epub"), FormatTag::Epub)
            .await;
        assert!(matches!(result, Err(ExtractorError::UnsupportedFormat { .. })));
    }

    #[tokio::test]
    async fn test_read_bounded_rejects_large_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.pdf");
        tokio::fs::write(&path, vec![0u8; 2048]).await.unwrap();

        assert!(matches!(
            read_bounded(&path, 1024).await,
            Err(ExtractorError::TooLarge { size_bytes: 2048, .. })
        ));
        assert_eq!(read_bounded(&path, 4096).await.unwrap().len(), 2048);
    }
}
