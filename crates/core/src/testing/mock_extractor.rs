//! Mock format detector and ISBN extractor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::extractor::{
    BookExtractor, DetectedFormat, ExtractorError, ExtractorSet, FormatDetector, FormatTag,
};

#[derive(Debug, Clone)]
struct RegisteredBook {
    format: FormatTag,
    isbn: Option<String>,
}

/// Mock implementation of the extractor capabilities.
///
/// Books are registered by file CONTENT, so a file keeps its format and
/// ISBN after being moved or renamed. Unregistered content is reported as
/// an unsupported format.
///
/// # Example
///
/// ```rust,ignore
/// use arkivist_core::testing::MockExtractor;
///
/// let extractor = MockExtractor::new();
/// extractor.register(b"book bytes", FormatTag::Pdf, Some("9780596518189")).await;
///
/// let classifier = Classifier::new(extractor.extractor_set(), resolver);
/// ```
#[derive(Debug, Clone)]
pub struct MockExtractor {
    /// Registered books by content.
    books: Arc<RwLock<HashMap<Vec<u8>, RegisteredBook>>>,
    /// Paths passed to `extract_first_isbn`.
    extractions: Arc<RwLock<Vec<PathBuf>>>,
    /// If set, the next extraction will fail with this error.
    next_error: Arc<RwLock<Option<ExtractorError>>>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            books: Arc::new(RwLock::new(HashMap::new())),
            extractions: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Registers content with a format and an optional raw ISBN token.
    pub async fn register(&self, content: &[u8], format: FormatTag, isbn: Option<&str>) {
        self.books.write().await.insert(
            content.to_vec(),
            RegisteredBook {
                format,
                isbn: isbn.map(str::to_string),
            },
        );
    }

    /// Configure the next extraction to fail with the given error.
    pub async fn set_next_error(&self, error: ExtractorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Paths extracted so far.
    pub async fn recorded_extractions(&self) -> Vec<PathBuf> {
        self.extractions.read().await.clone()
    }

    pub async fn extraction_count(&self) -> usize {
        self.extractions.read().await.len()
    }

    /// An [`ExtractorSet`] backed by this mock for every format.
    pub fn extractor_set(&self) -> ExtractorSet {
        [FormatTag::Pdf, FormatTag::Epub].into_iter().fold(
            ExtractorSet::new(Arc::new(self.clone())),
            |set, format| {
                set.with_extractor(Arc::new(MockFormatExtractor {
                    format,
                    mock: self.clone(),
                }))
            },
        )
    }

    async fn lookup(&self, path: &Path) -> Result<Option<RegisteredBook>, ExtractorError> {
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| ExtractorError::io(path, e))?;
        Ok(self.books.read().await.get(&content).cloned())
    }
}

#[async_trait]
impl FormatDetector for MockExtractor {
    async fn detect_format(&self, path: &Path) -> Result<DetectedFormat, ExtractorError> {
        Ok(match self.lookup(path).await? {
            Some(book) => DetectedFormat::Known(book.format),
            None => DetectedFormat::Unsupported("unknown".to_string()),
        })
    }
}

/// Per-format view of a [`MockExtractor`].
struct MockFormatExtractor {
    format: FormatTag,
    mock: MockExtractor,
}

#[async_trait]
impl BookExtractor for MockFormatExtractor {
    fn format(&self) -> FormatTag {
        self.format
    }

    async fn extract_first_isbn(&self, path: &Path) -> Result<Option<String>, ExtractorError> {
        self.mock.extractions.write().await.push(path.to_path_buf());

        if let Some(err) = self.mock.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self.mock.lookup(path).await?.and_then(|book| book.isbn))
    }
}
