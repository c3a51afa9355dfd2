//! Testing utilities and mock collaborators.
//!
//! The mocks stand in for format sniffing, ISBN extraction, metadata
//! providers, and placement, so the organizer can be exercised against a
//! temporary directory without real PDFs, EPUBs, or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use arkivist_core::testing::{fixtures, MockExtractor, MockMetadataProvider};
//!
//! let extractor = MockExtractor::new();
//! extractor.register(b"bytes", FormatTag::Pdf, Some("9780596518189")).await;
//!
//! let provider = Arc::new(MockMetadataProvider::new("books"));
//! provider.add_book(fixtures::erlang_programming()).await;
//! ```

mod mock_extractor;
mod mock_metadata;
mod mock_placer;

pub use mock_extractor::MockExtractor;
pub use mock_metadata::MockMetadataProvider;
pub use mock_placer::{MockPlacer, RecordedPlacement};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::isbn::Isbn;
    use crate::metadata::BookMetadata;

    /// ISBN of the reference book used throughout the tests.
    pub const ERLANG_ISBN: &str = "9780596518189";

    /// Parse a known-good ISBN.
    pub fn isbn(raw: &str) -> Isbn {
        Isbn::parse(raw).unwrap_or_else(|e| panic!("fixture ISBN {} is invalid: {}", raw, e))
    }

    /// Complete metadata with reasonable defaults.
    pub fn book_metadata(isbn_raw: &str, title: &str, year: u16, publisher: &str) -> BookMetadata {
        BookMetadata {
            isbn: isbn(isbn_raw),
            title: Some(title.to_string()),
            year: Some(year),
            publisher: Some(publisher.to_string()),
        }
    }

    /// "Erlang Programming", O'Reilly, 2009.
    pub fn erlang_programming() -> BookMetadata {
        book_metadata(ERLANG_ISBN, "Erlang Programming", 2009, "O'Reilly")
    }

    /// Write `content` at `root/relative`, creating parent directories.
    pub fn write_file(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("cannot create {}: {}", parent.display(), e));
        }
        std::fs::write(&path, content)
            .unwrap_or_else(|e| panic!("cannot write {}: {}", path.display(), e));
        path
    }

    /// Every regular file under `root`, relative and sorted.
    pub fn list_files(root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();
        files.sort();
        files
    }
}
