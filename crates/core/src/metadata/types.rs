//! Types for the metadata module.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::isbn::Isbn;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

/// What a provider knows about a book, possibly incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub isbn: Isbn,
    pub title: Option<String>,
    pub year: Option<u16>,
    pub publisher: Option<String>,
}

impl BookMetadata {
    /// True when every field a [`BibliographicRecord`] needs is present and non-blank.
    pub fn is_complete(&self) -> bool {
        non_blank(&self.title) && non_blank(&self.publisher) && self.year.is_some()
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Extracts the first four-digit year from a free-form date ("2009-06-01", "June 2009").
pub fn parse_year(date: &str) -> Option<u16> {
    YEAR.captures(date)
        .and_then(|c| c[1].parse().ok())
        .filter(|year| *year > 0)
}

/// Why a [`BibliographicRecord`] could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Bibliographic field '{0}' is missing or blank")]
    MissingField(&'static str),
}

/// A complete bibliographic identity. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BibliographicRecord {
    isbn: Isbn,
    title: String,
    year: u16,
    publisher: String,
    extension: String,
}

impl BibliographicRecord {
    pub fn new(
        isbn: Isbn,
        title: impl Into<String>,
        year: u16,
        publisher: impl Into<String>,
        extension: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let title = title.into().trim().to_string();
        let publisher = publisher.into().trim().to_string();
        let extension = extension.into().trim().trim_start_matches('.').to_string();

        if title.is_empty() {
            return Err(RecordError::MissingField("title"));
        }
        if publisher.is_empty() {
            return Err(RecordError::MissingField("publisher"));
        }
        if extension.is_empty() {
            return Err(RecordError::MissingField("extension"));
        }
        if year == 0 {
            return Err(RecordError::MissingField("year"));
        }

        Ok(Self {
            isbn,
            title,
            year,
            publisher,
            extension,
        })
    }

    /// Completes provider metadata with the detected file extension.
    pub fn from_metadata(metadata: BookMetadata, extension: &str) -> Result<Self, RecordError> {
        let title = metadata.title.ok_or(RecordError::MissingField("title"))?;
        let publisher = metadata.publisher.ok_or(RecordError::MissingField("publisher"))?;
        let year = metadata.year.ok_or(RecordError::MissingField("year"))?;
        Self::new(metadata.isbn, title, year, publisher, extension)
    }

    pub fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// A provider that failed during a lookup. Kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub message: String,
}

/// Result of asking every provider in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// First complete answer, and which provider gave it.
    Found {
        metadata: BookMetadata,
        provider: String,
    },
    /// No provider had complete data. `errors` lists providers that failed outright.
    NotFound { errors: Vec<ProviderFailure> },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isbn() -> Isbn {
        Isbn::parse("9780596518189").unwrap()
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2009-06-01"), Some(2009));
        assert_eq!(parse_year("June 2009"), Some(2009));
        assert_eq!(parse_year("c. 1999?"), Some(1999));
        assert_eq!(parse_year("unknown"), None);
    }

    #[test]
    fn test_record_rejects_blank_fields() {
        assert_eq!(
            BibliographicRecord::new(isbn(), "  ", 2009, "O'Reilly", "pdf"),
            Err(RecordError::MissingField("title"))
        );
        assert_eq!(
            BibliographicRecord::new(isbn(), "Erlang Programming", 2009, "", "pdf"),
            Err(RecordError::MissingField("publisher"))
        );
        assert_eq!(
            BibliographicRecord::new(isbn(), "Erlang Programming", 0, "O'Reilly", "pdf"),
            Err(RecordError::MissingField("year"))
        );
    }

    #[test]
    fn test_record_from_metadata() {
        let metadata = BookMetadata {
            isbn: isbn(),
            title: Some("Erlang Programming".to_string()),
            year: Some(2009),
            publisher: Some("O'Reilly".to_string()),
        };
        assert!(metadata.is_complete());

        let record = BibliographicRecord::from_metadata(metadata, ".pdf").unwrap();
        assert_eq!(record.title(), "Erlang Programming");
        assert_eq!(record.extension(), "pdf");
    }

    #[test]
    fn test_incomplete_metadata() {
        let metadata = BookMetadata {
            isbn: isbn(),
            title: Some("Erlang Programming".to_string()),
            year: None,
            publisher: Some("O'Reilly".to_string()),
        };
        assert!(!metadata.is_complete());
        assert_eq!(
            BibliographicRecord::from_metadata(metadata, "pdf"),
            Err(RecordError::MissingField("year"))
        );
    }
}
