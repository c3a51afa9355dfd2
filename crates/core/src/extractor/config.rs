//! Configuration for the extractor module.

use serde::{Deserialize, Serialize};

/// Limits applied while looking inside book files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Leading pages (PDF) or spine documents (EPUB) scanned for an ISBN.
    #[serde(default = "default_pages")]
    pub pages: usize,

    /// Files above this size are not loaded for extraction.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_pages() -> usize {
    5
}

fn default_max_file_size() -> u64 {
    512 * 1024 * 1024 // 512 MB
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pages: default_pages(),
            max_file_size: default_max_file_size(),
        }
    }
}

impl ExtractionConfig {
    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}
