//! Google Books API provider.
//!
//! Works without an API key at a low anonymous quota; a key raises it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{parse_year, BookMetadata};
use super::{MetadataError, MetadataProvider};
use crate::isbn::Isbn;

/// Google Books provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleBooksConfig {
    /// API key (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL (default: https://www.googleapis.com/books/v1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    15
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Google Books volumes search by ISBN.
pub struct GoogleBooksProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksProvider {
    pub fn new(config: GoogleBooksConfig) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://www.googleapis.com/books/v1".to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl MetadataProvider for GoogleBooksProvider {
    fn name(&self) -> &str {
        "google_books"
    }

    async fn lookup(&self, isbn: &Isbn) -> Result<Option<BookMetadata>, MetadataError> {
        let url = format!("{}/volumes", self.base_url);
        debug!("Google Books lookup: isbn={}", isbn);

        let mut request = self
            .client
            .get(&url)
            .query(&[("q", format!("isbn:{}", isbn))]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == 429 {
            return Err(MetadataError::RateLimitExceeded);
        }
        if status == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let volumes: GbVolumesResponse = response.json().await.map_err(|e| {
            MetadataError::ParseError(format!("Failed to parse volumes response: {}", e))
        })?;

        Ok(volumes.into_metadata(isbn))
    }
}

// ============================================================================
// Google Books API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct GbVolumesResponse {
    #[serde(rename = "totalItems", default)]
    total_items: u32,
    #[serde(default)]
    items: Vec<GbVolume>,
}

#[derive(Debug, Deserialize)]
struct GbVolume {
    #[serde(rename = "volumeInfo")]
    volume_info: GbVolumeInfo,
}

#[derive(Debug, Deserialize)]
struct GbVolumeInfo {
    title: Option<String>,
    publisher: Option<String>,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
}

impl GbVolumesResponse {
    fn into_metadata(self, isbn: &Isbn) -> Option<BookMetadata> {
        if self.total_items == 0 {
            return None;
        }
        let info = self.items.into_iter().next()?.volume_info;
        Some(BookMetadata {
            isbn: isbn.clone(),
            title: info.title,
            year: info.published_date.as_deref().and_then(parse_year),
            publisher: info.publisher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isbn() -> Isbn {
        Isbn::parse("9780596518189").unwrap()
    }

    #[test]
    fn test_volumes_response_conversion() {
        let body = r#"{
            "kind": "books#volumes",
            "totalItems": 1,
            "items": [{
                "volumeInfo": {
                    "title": "Erlang Programming",
                    "authors": ["Francesco Cesarini", "Simon Thompson"],
                    "publisher": "O'Reilly Media, Inc.",
                    "publishedDate": "2009-06-11"
                }
            }]
        }"#;
        let response: GbVolumesResponse = serde_json::from_str(body).unwrap();
        let metadata = response.into_metadata(&isbn()).unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Erlang Programming"));
        assert_eq!(metadata.publisher.as_deref(), Some("O'Reilly Media, Inc."));
        assert_eq!(metadata.year, Some(2009));
        assert!(metadata.is_complete());
    }

    #[test]
    fn test_empty_response() {
        let response: GbVolumesResponse =
            serde_json::from_str(r#"{"kind": "books#volumes", "totalItems": 0}"#).unwrap();
        assert!(response.into_metadata(&isbn()).is_none());
    }

    #[test]
    fn test_missing_publisher_is_incomplete() {
        let body = r#"{"totalItems": 1, "items": [{"volumeInfo": {"title": "T", "publishedDate": "2001"}}]}"#;
        let response: GbVolumesResponse = serde_json::from_str(body).unwrap();
        let metadata = response.into_metadata(&isbn()).unwrap();
        assert!(!metadata.is_complete());
    }

    #[test]
    fn test_blank_api_key_ignored() {
        let provider = GoogleBooksProvider::new(GoogleBooksConfig {
            api_key: Some(String::new()),
            ..Default::default()
        })
        .unwrap();
        assert!(provider.api_key.is_none());
        assert_eq!(provider.name(), "google_books");
    }
}
