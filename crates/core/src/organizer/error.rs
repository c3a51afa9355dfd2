//! Error taxonomy of an organize run.

use std::path::PathBuf;
use thiserror::Error;

use crate::classifier::ClassifyError;
use crate::discovery::DiscoveryError;
use crate::extractor::ExtractorError;
use crate::metadata::MetadataError;
use crate::placer::PlacerError;

/// Errors raised while organizing.
///
/// Only [`OrganizeError::InvalidRoot`], [`OrganizeError::Providers`] and
/// [`OrganizeError::Setup`] end a run; every other variant is recorded
/// against a single file and the run moves on.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Invalid root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Failed to build metadata providers: {0}")]
    Providers(#[from] MetadataError),

    #[error("Organizer setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error(transparent)]
    Extraction(ExtractorError),

    #[error("{path} is outside the library and archive roots")]
    OutsideRoot { path: PathBuf },

    #[error("Suffix space exhausted for {path} (tried _1 to _{max_suffix})")]
    SuffixSpaceExhausted { path: PathBuf, max_suffix: u32 },

    #[error("Copy of {from} at {to} failed verification; source kept")]
    PlacementVerificationFailed { from: PathBuf, to: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Placement(PlacerError),
}

impl OrganizeError {
    /// Short label used in reports and the failure metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRoot { .. } => "invalid_root",
            Self::Providers(_) => "providers",
            Self::Setup(_) => "setup",
            Self::Discovery(_) => "discovery",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Extraction(_) => "extraction",
            Self::OutsideRoot { .. } => "outside_root",
            Self::SuffixSpaceExhausted { .. } => "suffix_space_exhausted",
            Self::PlacementVerificationFailed { .. } => "verification_failed",
            Self::Io { .. } => "io",
            Self::Placement(_) => "placement",
        }
    }

    /// Whether the error ends the whole run rather than one file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidRoot { .. } | Self::Providers(_) | Self::Setup(_)
        )
    }
}

impl From<ClassifyError> for OrganizeError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::UnsupportedFormat { path, format } => {
                Self::UnsupportedFormat { path, format }
            }
            ClassifyError::Extraction(err) => match err {
                ExtractorError::Io { path, source } => Self::Io { path, source },
                ExtractorError::TooLarge { ref path, .. } => Self::Io {
                    path: path.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::FileTooLarge, err.to_string()),
                },
                other => Self::Extraction(other),
            },
        }
    }
}

impl From<PlacerError> for OrganizeError {
    fn from(err: PlacerError) -> Self {
        match err {
            PlacerError::VerificationFailed { from, to } => {
                Self::PlacementVerificationFailed { from, to }
            }
            other => Self::Placement(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_errors_map_to_taxonomy() {
        let unsupported: OrganizeError = ClassifyError::UnsupportedFormat {
            path: "/l/a.pdf".into(),
            format: "zip".into(),
        }
        .into();
        assert_eq!(unsupported.kind(), "unsupported_format");

        let too_large: OrganizeError = ClassifyError::Extraction(ExtractorError::TooLarge {
            path: "/l/huge.pdf".into(),
            size_bytes: 10,
            limit_bytes: 5,
        })
        .into();
        assert!(matches!(too_large, OrganizeError::Io { ref path, .. } if path.ends_with("huge.pdf")));

        let malformed: OrganizeError =
            ClassifyError::Extraction(ExtractorError::malformed("/l/b.epub", "epub", "bad zip")).into();
        assert_eq!(malformed.kind(), "extraction");
        assert!(!malformed.is_fatal());
    }

    #[test]
    fn test_verification_failure_mapped() {
        let err: OrganizeError = PlacerError::VerificationFailed {
            from: "/a".into(),
            to: "/b".into(),
        }
        .into();
        assert_eq!(err.kind(), "verification_failed");

        let other: OrganizeError = PlacerError::DestinationExists { path: "/b".into() }.into();
        assert_eq!(other.kind(), "placement");
    }

    #[test]
    fn test_fatal_errors() {
        let err = OrganizeError::InvalidRoot {
            path: "books".into(),
            reason: "not absolute".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Invalid root books: not absolute");
    }
}
