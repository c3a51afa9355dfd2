//! Open Library books API provider.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{parse_year, BookMetadata};
use super::{MetadataError, MetadataProvider};
use crate::isbn::Isbn;

/// Open Library provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenLibraryConfig {
    /// Base URL (default: https://openlibrary.org).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    15
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Open Library `/api/books` lookup by ISBN.
pub struct OpenLibraryProvider {
    client: Client,
    base_url: String,
}

impl OpenLibraryProvider {
    pub fn new(config: OpenLibraryConfig) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .user_agent(format!("arkivist/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://openlibrary.org".to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MetadataProvider for OpenLibraryProvider {
    fn name(&self) -> &str {
        "open_library"
    }

    async fn lookup(&self, isbn: &Isbn) -> Result<Option<BookMetadata>, MetadataError> {
        let url = format!("{}/api/books", self.base_url);
        let bibkey = format!("ISBN:{}", isbn);
        debug!("Open Library lookup: {}", bibkey);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("bibkeys", bibkey.as_str()),
                ("jscmd", "data"),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == 429 {
            return Err(MetadataError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let mut books: HashMap<String, OlBook> = response.json().await.map_err(|e| {
            MetadataError::ParseError(format!("Failed to parse books response: {}", e))
        })?;

        Ok(books.remove(&bibkey).map(|book| book.into_metadata(isbn)))
    }
}

// ============================================================================
// Open Library API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct OlBook {
    title: Option<String>,
    #[serde(default)]
    publishers: Vec<OlNamed>,
    publish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OlNamed {
    name: String,
}

impl OlBook {
    fn into_metadata(self, isbn: &Isbn) -> BookMetadata {
        BookMetadata {
            isbn: isbn.clone(),
            title: self.title,
            year: self.publish_date.as_deref().and_then(parse_year),
            publisher: self.publishers.into_iter().next().map(|p| p.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_books_response_conversion() {
        let body = r#"{
            "ISBN:9780596518189": {
                "title": "Erlang Programming",
                "publishers": [{"name": "O'Reilly"}, {"name": "Other"}],
                "publish_date": "June 2009",
                "number_of_pages": 470
            }
        }"#;
        let isbn = Isbn::parse("9780596518189").unwrap();
        let mut books: HashMap<String, OlBook> = serde_json::from_str(body).unwrap();
        let metadata = books.remove("ISBN:9780596518189").unwrap().into_metadata(&isbn);

        assert_eq!(metadata.title.as_deref(), Some("Erlang Programming"));
        assert_eq!(metadata.publisher.as_deref(), Some("O'Reilly"));
        assert_eq!(metadata.year, Some(2009));
    }

    #[test]
    fn test_empty_books_response() {
        let books: HashMap<String, OlBook> = serde_json::from_str("{}").unwrap();
        assert!(books.is_empty());
    }
}
