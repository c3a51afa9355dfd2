//! PDF ISBN extraction.

use async_trait::async_trait;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, warn};

use super::config::ExtractionConfig;
use super::error::ExtractorError;
use super::read_bounded;
use super::traits::BookExtractor;
use super::types::FormatTag;
use crate::isbn::find_isbn_like;

/// Scans the text of the first pages of a PDF.
pub struct PdfExtractor {
    config: ExtractionConfig,
}

impl PdfExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    fn scan(path: &Path, bytes: &[u8], pages: usize) -> Result<Option<String>, ExtractorError> {
        // pdf-extract panics on some malformed fonts and glyph tables
        let texts = match catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        })) {
            Ok(Ok(texts)) => texts,
            Ok(Err(e)) => return Err(ExtractorError::malformed(path, "pdf", e)),
            Err(_) => {
                warn!("PDF parser panicked on {}", path.display());
                return Err(ExtractorError::malformed(path, "pdf", "parser panicked"));
            }
        };

        debug!("Scanning {} of {} pages in {}", pages.min(texts.len()), texts.len(), path.display());

        let text = texts
            .iter()
            .take(pages)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(find_isbn_like(&text).map(str::to_string))
    }
}

#[async_trait]
impl BookExtractor for PdfExtractor {
    fn format(&self) -> FormatTag {
        FormatTag::Pdf
    }

    async fn extract_first_isbn(&self, path: &Path) -> Result<Option<String>, ExtractorError> {
        let bytes = read_bounded(path, self.config.max_file_size).await?;
        let pages = self.config.pages;
        let owned = path.to_path_buf();

        tokio::task::spawn_blocking(move || Self::scan(&owned, &bytes, pages))
            .await
            .map_err(|e| ExtractorError::io(path, std::io::Error::other(e)))?
    }
}
