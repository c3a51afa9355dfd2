//! Classification: format, first ISBN, and metadata combined into one outcome.

mod types;

pub use types::{Category, Classification, ClassificationOutcome};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::discovery::CandidateFile;
use crate::extractor::{DetectedFormat, ExtractorError, ExtractorSet};
use crate::isbn::Isbn;
use crate::metadata::{BibliographicRecord, LookupOutcome, MetadataResolver, ProviderFailure};
use crate::metrics;

/// Errors that stop a single file from being classified.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// No handler for the sniffed content.
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error(transparent)]
    Extraction(ExtractorError),
}

impl From<ExtractorError> for ClassifyError {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::UnsupportedFormat { path, format } => {
                Self::UnsupportedFormat { path, format }
            }
            other => Self::Extraction(other),
        }
    }
}

/// Combines the extractor set and the metadata resolver.
#[derive(Clone)]
pub struct Classifier {
    extractors: ExtractorSet,
    resolver: MetadataResolver,
}

impl Classifier {
    pub fn new(extractors: ExtractorSet, resolver: MetadataResolver) -> Self {
        Self {
            extractors,
            resolver,
        }
    }

    /// Classifies one candidate. Only reads the file.
    pub async fn classify(&self, file: &CandidateFile) -> Result<Classification, ClassifyError> {
        let path = file.path.as_path();

        let format = match self.extractors.detect_format(path).await? {
            DetectedFormat::Known(tag) => tag,
            DetectedFormat::Unsupported(description) => {
                return Err(ClassifyError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    format: description,
                })
            }
        };

        let raw_isbn = self.extractors.extract_first_isbn(path, format).await?;
        let outcome = match raw_isbn.as_deref() {
            None => {
                debug!("No ISBN-like token in {}", path.display());
                ClassificationOutcome::NoIsbn
            }
            Some(raw) => match Isbn::parse(raw) {
                Ok(isbn) => self.resolve(path, isbn, format.extension()).await,
                Err(e) => {
                    debug!("First ISBN-like token {:?} in {} is invalid: {}", raw, path.display(), e);
                    ClassificationOutcome::NoIsbn
                }
            },
        };

        metrics::CLASSIFICATIONS
            .with_label_values(&[outcome.label()])
            .inc();

        Ok(Classification {
            format,
            raw_isbn,
            outcome,
        })
    }

    async fn resolve(&self, path: &Path, isbn: Isbn, extension: &str) -> ClassificationOutcome {
        match self.resolver.lookup(&isbn).await {
            LookupOutcome::Found { metadata, provider } => {
                match BibliographicRecord::from_metadata(metadata, extension) {
                    Ok(record) => ClassificationOutcome::Classified(record),
                    Err(e) => {
                        warn!("Unusable metadata for {} ({}): {}", path.display(), isbn, e);
                        ClassificationOutcome::NoMetadata {
                            isbn,
                            provider_errors: vec![ProviderFailure {
                                provider,
                                message: e.to_string(),
                            }],
                        }
                    }
                }
            }
            LookupOutcome::NotFound { errors } => ClassificationOutcome::NoMetadata {
                isbn,
                provider_errors: errors,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::FormatTag;
    use crate::metadata::{BookMetadata, MetadataError};
    use crate::testing::{fixtures, MockExtractor, MockMetadataProvider};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Setup {
        temp: TempDir,
        extractor: Arc<MockExtractor>,
        provider: Arc<MockMetadataProvider>,
        classifier: Classifier,
    }

    fn setup() -> Setup {
        let extractor = Arc::new(MockExtractor::new());
        let provider = Arc::new(MockMetadataProvider::new("mock"));
        let classifier = Classifier::new(
            extractor.extractor_set(),
            MetadataResolver::new(vec![provider.clone()]),
        );
        Setup {
            temp: TempDir::new().unwrap(),
            extractor,
            provider,
            classifier,
        }
    }

    async fn candidate(setup: &Setup, name: &str, content: &[u8]) -> CandidateFile {
        let path = setup.temp.path().join(name);
        tokio::fs::write(&path, content).await.unwrap();
        CandidateFile::probe(path).unwrap()
    }

    #[tokio::test]
    async fn test_classified_uses_detected_extension() {
        let s = setup();
        s.extractor
            .register(b"erlang", FormatTag::Pdf, Some("978-0-596-51818-9"))
            .await;
        s.provider.add_book(fixtures::erlang_programming()).await;

        let file = candidate(&s, "misnamed.epub", b"erlang").await;
        let classification = s.classifier.classify(&file).await.unwrap();
        assert_eq!(s.extractor.recorded_extractions().await, vec![file.path.clone()]);
        assert_eq!(
            s.provider.recorded_lookups().await,
            vec![fixtures::isbn(fixtures::ERLANG_ISBN)]
        );

        assert_eq!(classification.format, FormatTag::Pdf);
        match classification.outcome {
            ClassificationOutcome::Classified(record) => {
                assert_eq!(record.isbn().as_str(), "9780596518189");
                assert_eq!(record.extension(), "pdf");
            }
            other => panic!("expected Classified, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_token_is_no_isbn() {
        let s = setup();
        s.extractor.register(b"plain", FormatTag::Pdf, None).await;

        let file = candidate(&s, "plain.pdf", b"plain").await;
        let classification = s.classifier.classify(&file).await.unwrap();
        assert_eq!(classification.outcome, ClassificationOutcome::NoIsbn);
        assert_eq!(s.provider.lookup_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_first_token_is_no_isbn() {
        let s = setup();
        s.extractor
            .register(b"bad", FormatTag::Epub, Some("9780596518188"))
            .await;

        let file = candidate(&s, "bad.epub", b"bad").await;
        let classification = s.classifier.classify(&file).await.unwrap();
        assert_eq!(classification.outcome, ClassificationOutcome::NoIsbn);
        assert_eq!(classification.raw_isbn.as_deref(), Some("9780596518188"));
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_no_metadata() {
        let s = setup();
        s.extractor
            .register(b"lost", FormatTag::Pdf, Some("9780596518189"))
            .await;
        s.provider
            .set_next_error(MetadataError::ApiError {
                status: 503,
                message: "unavailable".into(),
            })
            .await;

        let file = candidate(&s, "lost.pdf", b"lost").await;
        match s.classifier.classify(&file).await.unwrap().outcome {
            ClassificationOutcome::NoMetadata {
                isbn,
                provider_errors,
            } => {
                assert_eq!(isbn.as_str(), "9780596518189");
                assert_eq!(provider_errors.len(), 1);
                assert!(provider_errors[0].message.contains("503"));
            }
            other => panic!("expected NoMetadata, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_incomplete_metadata_is_no_metadata() {
        let s = setup();
        s.extractor
            .register(b"partial", FormatTag::Pdf, Some("9780596518189"))
            .await;
        s.provider
            .add_book(BookMetadata {
                year: None,
                ..fixtures::erlang_programming()
            })
            .await;

        let file = candidate(&s, "partial.pdf", b"partial").await;
        let outcome = s.classifier.classify(&file).await.unwrap().outcome;
        assert_eq!(outcome.category(), Category::NoMetadata);
    }

    #[tokio::test]
    async fn test_unsupported_format_is_an_error() {
        let s = setup();
        let file = candidate(&s, "notes.pdf", b"not a registered book").await;

        assert!(matches!(
            s.classifier.classify(&file).await,
            Err(ClassifyError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_extractor_error_propagates() {
        let s = setup();
        s.extractor.register(b"broken", FormatTag::Pdf, None).await;
        s.extractor
            .set_next_error(ExtractorError::malformed(Path::new("broken.pdf"), "pdf", "bad xref"))
            .await;

        let file = candidate(&s, "broken.pdf", b"broken").await;
        assert!(matches!(
            s.classifier.classify(&file).await,
            Err(ClassifyError::Extraction(ExtractorError::Malformed { .. }))
        ));
    }
}
