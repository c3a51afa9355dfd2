//! Bibliographic metadata lookup by ISBN.
//!
//! Providers are consulted in priority order by [`MetadataResolver`]. A
//! provider that errors is recorded and skipped; it never aborts the lookup.

mod google_books;
mod open_library;
mod types;

pub use google_books::{GoogleBooksConfig, GoogleBooksProvider};
pub use open_library::{OpenLibraryConfig, OpenLibraryProvider};
pub use types::*;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::isbn::Isbn;
use crate::metrics;

/// Errors that can occur when querying a metadata provider.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// HTTP request failed (connection, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Provider not usable as configured.
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// A source of bibliographic metadata.
///
/// `Ok(None)` means the provider answered but has no data for the ISBN.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short identifier used in logs, metrics, and reports.
    fn name(&self) -> &str;

    async fn lookup(&self, isbn: &Isbn) -> Result<Option<BookMetadata>, MetadataError>;
}

/// One entry of the ordered provider list in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    GoogleBooks(GoogleBooksConfig),
    OpenLibrary(OpenLibraryConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GoogleBooks(_) => "google_books",
            Self::OpenLibrary(_) => "open_library",
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        match self {
            Self::GoogleBooks(c) => c.timeout_secs,
            Self::OpenLibrary(c) => c.timeout_secs,
        }
    }
}

/// Default provider order: Google Books, then Open Library.
pub fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::GoogleBooks(GoogleBooksConfig::default()),
        ProviderConfig::OpenLibrary(OpenLibraryConfig::default()),
    ]
}

/// Builds providers from configuration, preserving order.
pub fn create_providers(
    configs: &[ProviderConfig],
) -> Result<Vec<Arc<dyn MetadataProvider>>, MetadataError> {
    configs
        .iter()
        .map(|config| -> Result<Arc<dyn MetadataProvider>, MetadataError> {
            Ok(match config {
                ProviderConfig::GoogleBooks(c) => Arc::new(GoogleBooksProvider::new(c.clone())?),
                ProviderConfig::OpenLibrary(c) => Arc::new(OpenLibraryProvider::new(c.clone())?),
            })
        })
        .collect()
}

/// Ordered provider list with first-complete-answer-wins semantics.
#[derive(Clone)]
pub struct MetadataResolver {
    providers: Vec<Arc<dyn MetadataProvider>>,
}

impl MetadataResolver {
    pub fn new(providers: Vec<Arc<dyn MetadataProvider>>) -> Self {
        Self { providers }
    }

    pub fn from_config(configs: &[ProviderConfig]) -> Result<Self, MetadataError> {
        Ok(Self::new(create_providers(configs)?))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Asks each provider in order until one returns complete metadata.
    ///
    /// Later providers are not queried once an answer is found.
    pub async fn lookup(&self, isbn: &Isbn) -> LookupOutcome {
        let mut errors = Vec::new();

        for provider in &self.providers {
            let name = provider.name();
            match provider.lookup(isbn).await {
                Ok(Some(metadata)) if metadata.is_complete() => {
                    metrics::PROVIDER_LOOKUPS
                        .with_label_values(&[name, "found"])
                        .inc();
                    info!("Metadata for {} from {}", isbn, name);
                    return LookupOutcome::Found {
                        metadata,
                        provider: name.to_string(),
                    };
                }
                Ok(Some(metadata)) => {
                    metrics::PROVIDER_LOOKUPS
                        .with_label_values(&[name, "incomplete"])
                        .inc();
                    debug!("Incomplete metadata for {} from {}: {:?}", isbn, name, metadata);
                }
                Ok(None) => {
                    metrics::PROVIDER_LOOKUPS
                        .with_label_values(&[name, "empty"])
                        .inc();
                    debug!("No metadata for {} from {}", isbn, name);
                }
                Err(e) => {
                    metrics::PROVIDER_LOOKUPS
                        .with_label_values(&[name, "error"])
                        .inc();
                    warn!("Provider {} failed for {}: {}", name, isbn, e);
                    errors.push(ProviderFailure {
                        provider: name.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        LookupOutcome::NotFound { errors }
    }
}
