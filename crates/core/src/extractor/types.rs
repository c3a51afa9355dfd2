//! Types for the extractor module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Book formats with a registered extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatTag {
    Pdf,
    Epub,
}

impl FormatTag {
    /// Canonical file extension, used when naming filed books.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Epub => "epub",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Result of content sniffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedFormat {
    Known(FormatTag),
    /// Content is not a book format we handle; carries a short description.
    Unsupported(String),
}
