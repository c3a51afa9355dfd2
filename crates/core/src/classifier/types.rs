//! Types for the classifier module.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extractor::FormatTag;
use crate::isbn::Isbn;
use crate::metadata::{BibliographicRecord, ProviderFailure};

/// Top-level archive folder a file is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ByIsbn,
    NoIsbn,
    NoMetadata,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::ByIsbn, Category::NoIsbn, Category::NoMetadata];

    /// Folder name on disk.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::ByIsbn => "By-ISBN",
            Self::NoIsbn => "No-ISBN",
            Self::NoMetadata => "No-Metadata",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.dir_name() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// What is known about a file's bibliographic identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome {
    Classified(BibliographicRecord),
    /// Format recognized, but no valid ISBN located.
    NoIsbn,
    /// ISBN located, no provider had complete data. Provider errors kept for diagnostics.
    NoMetadata {
        isbn: Isbn,
        provider_errors: Vec<ProviderFailure>,
    },
}

impl ClassificationOutcome {
    pub fn category(&self) -> Category {
        match self {
            Self::Classified(_) => Category::ByIsbn,
            Self::NoIsbn => Category::NoIsbn,
            Self::NoMetadata { .. } => Category::NoMetadata,
        }
    }

    /// Metric and report label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Classified(_) => "classified",
            Self::NoIsbn => "no_isbn",
            Self::NoMetadata { .. } => "no_metadata",
        }
    }

    pub fn isbn(&self) -> Option<&Isbn> {
        match self {
            Self::Classified(record) => Some(record.isbn()),
            Self::NoIsbn => None,
            Self::NoMetadata { isbn, .. } => Some(isbn),
        }
    }
}

/// A classified file: detected format plus outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub format: FormatTag,
    /// First ISBN-like token as found in the document, before validation.
    pub raw_isbn: Option<String>,
    pub outcome: ClassificationOutcome,
}

impl Classification {
    /// Extension the filed copy should carry, from the detected format.
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}
