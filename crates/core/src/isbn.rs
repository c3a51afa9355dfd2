//! ISBN parsing, checksum validation, and discovery in free text.
//!
//! Every [`Isbn`] value is a checksum-valid EAN-13. ISBN-10 input is
//! converted to its `978` form, so two spellings of the same book compare
//! equal.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Leading labels tolerated in front of an ISBN (`ISBN`, `ISBN-13:`, `urn:isbn:`).
static PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:urn:)?(?:isbn(?:-?1[03])?\s*[:_]?)?\s*").unwrap());

/// ISBN-like tokens: 13 or 10 significant characters, optionally hyphenated.
static ISBN_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d[-‐]?){12}\d\b|\b(?:\d[-‐]?){9}[\dXx]\b").unwrap()
});

/// Errors produced when a string is not a well-formed ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsbnError {
    #[error("ISBN must have 10 or 13 significant characters, got {0}")]
    InvalidLength(usize),

    #[error("Invalid character in ISBN: {0:?}")]
    InvalidCharacter(char),

    #[error("ISBN-13 must start with 978 or 979: {0}")]
    InvalidPrefix(String),

    #[error("Checksum mismatch for ISBN {0}")]
    ChecksumMismatch(String),
}

/// A validated, normalized 13-digit ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    /// Parses an ISBN-10 or ISBN-13, with or without hyphens and labels.
    pub fn parse(raw: &str) -> Result<Self, IsbnError> {
        let body = PREFIX.replace(raw, "");

        let mut significant = Vec::with_capacity(13);
        for c in body.trim().chars() {
            match c {
                '0'..='9' => significant.push(c),
                'X' | 'x' => significant.push('X'),
                '-' | '‐' | ' ' => continue,
                other => return Err(IsbnError::InvalidCharacter(other)),
            }
        }

        match significant.len() {
            10 => Self::from_isbn10(&significant),
            13 => Self::from_isbn13(&significant),
            n => Err(IsbnError::InvalidLength(n)),
        }
    }

    /// The 13 digits, no separators.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_isbn10(chars: &[char]) -> Result<Self, IsbnError> {
        let raw: String = chars.iter().collect();
        if chars[..9].contains(&'X') {
            return Err(IsbnError::InvalidCharacter('X'));
        }

        let sum: u32 = chars
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let value = if *c == 'X' { 10 } else { digit(*c) };
                (10 - i as u32) * value
            })
            .sum();
        if sum % 11 != 0 {
            return Err(IsbnError::ChecksumMismatch(raw));
        }

        let mut digits: Vec<u32> = vec![9, 7, 8];
        digits.extend(chars[..9].iter().map(|c| digit(*c)));
        digits.push(ean13_check_digit(&digits));

        Ok(Self(digits.iter().map(|d| d.to_string()).collect()))
    }

    fn from_isbn13(chars: &[char]) -> Result<Self, IsbnError> {
        let raw: String = chars.iter().collect();
        if chars.contains(&'X') {
            return Err(IsbnError::InvalidCharacter('X'));
        }
        if !raw.starts_with("978") && !raw.starts_with("979") {
            return Err(IsbnError::InvalidPrefix(raw));
        }

        let digits: Vec<u32> = chars.iter().map(|c| digit(*c)).collect();
        if ean13_check_digit(&digits[..12]) != digits[12] {
            return Err(IsbnError::ChecksumMismatch(raw));
        }

        Ok(Self(raw))
    }
}

fn digit(c: char) -> u32 {
    c.to_digit(10).unwrap_or(0)
}

/// Check digit for the first 12 digits of an EAN-13.
fn ean13_check_digit(first_twelve: &[u32]) -> u32 {
    let sum: u32 = first_twelve
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    (10 - sum % 10) % 10
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Isbn {
    type Err = IsbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Isbn {
    type Error = IsbnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}

/// Returns the first ISBN-like token in `text`, in document order.
///
/// The token is not validated; callers decide what an invalid first token means.
pub fn find_isbn_like(text: &str) -> Option<&str> {
    ISBN_LIKE.find(text).map(|m| m.as_str())
}

/// Returns the ISBN-like token when `value` is nothing but a (labelled) ISBN.
///
/// Meant for metadata fields such as EPUB identifiers, where a partial
/// match inside a UUID must not count.
pub fn isbn_like_identifier(value: &str) -> Option<&str> {
    let body = value.trim();
    let label_len = PREFIX.find(body).map(|m| m.end()).unwrap_or(0);
    let body = body[label_len..].trim();
    find_isbn_like(body).filter(|token| *token == body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_isbn13() {
        let isbn = Isbn::parse("9780596518189").unwrap();
        assert_eq!(isbn.as_str(), "9780596518189");
    }

    #[test]
    fn test_parse_hyphenated_and_labelled() {
        assert_eq!(
            Isbn::parse("ISBN-13: 978-0-596-51818-9").unwrap().as_str(),
            "9780596518189"
        );
        assert_eq!(
            Isbn::parse("urn:isbn:9780596518189").unwrap().as_str(),
            "9780596518189"
        );
    }

    #[test]
    fn test_isbn10_converted_to_ean13() {
        let isbn = Isbn::parse("0-596-51818-8").unwrap();
        assert_eq!(isbn.as_str(), "9780596518189");
        assert_eq!(isbn, Isbn::parse("9780596518189").unwrap());
    }

    #[test]
    fn test_isbn10_with_x_check_digit() {
        let isbn = Isbn::parse("097522980X").unwrap();
        assert_eq!(isbn.as_str(), "9780975229804");
    }

    #[test]
    fn test_bad_checksum_rejected() {
        assert!(matches!(
            Isbn::parse("9780596518188"),
            Err(IsbnError::ChecksumMismatch(_))
        ));
        assert!(matches!(
            Isbn::parse("0596518187"),
            Err(IsbnError::ChecksumMismatch(_))
        ));
    }

    #[test]
    fn test_wrong_length_and_prefix() {
        assert_eq!(Isbn::parse("12345"), Err(IsbnError::InvalidLength(5)));
        assert!(matches!(
            Isbn::parse("1234567890128"),
            Err(IsbnError::InvalidPrefix(_))
        ));
        assert!(matches!(
            Isbn::parse("97805965a8189"),
            Err(IsbnError::InvalidCharacter('a'))
        ));
    }

    #[test]
    fn test_serde_validates() {
        let isbn: Isbn = serde_json::from_str("\"978-0-596-51818-9\"").unwrap();
        assert_eq!(serde_json::to_string(&isbn).unwrap(), "\"9780596518189\"");
        assert!(serde_json::from_str::<Isbn>("\"9780596518188\"").is_err());
    }

    #[test]
    fn test_find_first_isbn_like() {
        let text = "Copyright 2009. ISBN: 978-0-596-51818-9\nSecond: 0-596-51818-8";
        assert_eq!(find_isbn_like(text), Some("978-0-596-51818-9"));
    }

    #[test]
    fn test_find_ignores_longer_digit_runs() {
        assert_eq!(find_isbn_like("order 97805965181891234 shipped"), None);
        assert_eq!(find_isbn_like("no identifiers here"), None);
    }

    #[test]
    fn test_find_returns_invalid_first_token_unvalidated() {
        let text = "ref 1234567890 then 9780596518189";
        assert_eq!(find_isbn_like(text), Some("1234567890"));
    }

    #[test]
    fn test_identifier_must_be_whole_isbn() {
        assert_eq!(
            isbn_like_identifier("urn:isbn:978-0-596-51818-9"),
            Some("978-0-596-51818-9")
        );
        assert_eq!(isbn_like_identifier(" 9780596518189 "), Some("9780596518189"));
        assert_eq!(
            isbn_like_identifier("urn:uuid:12345678-1234-5678-1234-567812345678"),
            None
        );
    }
}
