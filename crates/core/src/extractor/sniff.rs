//! Content-based format detection.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::error::ExtractorError;
use super::traits::FormatDetector;
use super::types::{DetectedFormat, FormatTag};

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// EPUB (OCF) requires an uncompressed `mimetype` entry first in the archive,
/// so its name and contents sit at fixed offsets after the local header.
const EPUB_NAME_OFFSET: usize = 30;
const EPUB_MIMETYPE: &[u8] = b"mimetypeapplication/epub+zip";

/// Sniffs PDF and EPUB from their leading bytes, ignoring the file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl MagicSniffer {
    pub fn new() -> Self {
        Self
    }

    /// Classifies a file header.
    pub fn sniff(header: &[u8]) -> DetectedFormat {
        if header.is_empty() {
            return DetectedFormat::Unsupported("empty".to_string());
        }
        if header.starts_with(PDF_MAGIC) {
            return DetectedFormat::Known(FormatTag::Pdf);
        }
        if header.starts_with(ZIP_MAGIC) {
            let end = EPUB_NAME_OFFSET + EPUB_MIMETYPE.len();
            if header.len() >= end && &header[EPUB_NAME_OFFSET..end] == EPUB_MIMETYPE {
                return DetectedFormat::Known(FormatTag::Epub);
            }
            return DetectedFormat::Unsupported("zip".to_string());
        }
        DetectedFormat::Unsupported("unknown".to_string())
    }
}

#[async_trait]
impl FormatDetector for MagicSniffer {
    async fn detect_format(&self, path: &Path) -> Result<DetectedFormat, ExtractorError> {
        let mut file = File::open(path)
            .await
            .map_err(|e| ExtractorError::io(path, e))?;

        let mut header = [0u8; 64];
        let mut filled = 0;
        while filled < header.len() {
            let n = file
                .read(&mut header[filled..])
                .await
                .map_err(|e| ExtractorError::io(path, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(Self::sniff(&header[..filled]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn epub_header() -> Vec<u8> {
        let mut header = Vec::from(ZIP_MAGIC);
        header.resize(EPUB_NAME_OFFSET, 0);
        header.extend_from_slice(EPUB_MIMETYPE);
        header
    }

    #[test]
    fn test_sniff_pdf() {
        assert_eq!(
            MagicSniffer::sniff(b"%PDF-1.7\n%\xe2\xe3"),
            DetectedFormat::Known(FormatTag::Pdf)
        );
    }

    #[test]
    fn test_sniff_epub() {
        assert_eq!(
            MagicSniffer::sniff(&epub_header()),
            DetectedFormat::Known(FormatTag::Epub)
        );
    }

    #[test]
    fn test_sniff_plain_zip_and_unknown() {
        let mut zip = Vec::from(ZIP_MAGIC);
        zip.resize(64, 0);
        assert_eq!(
            MagicSniffer::sniff(&zip),
            DetectedFormat::Unsupported("zip".to_string())
        );
        assert_eq!(
            MagicSniffer::sniff(b"hello"),
            DetectedFormat::Unsupported("unknown".to_string())
        );
        assert_eq!(
            MagicSniffer::sniff(b""),
            DetectedFormat::Unsupported("empty".to_string())
        );
    }

    #[tokio::test]
    async fn test_detect_ignores_file_name() {
        let temp = TempDir::new().unwrap();
        let misnamed = temp.path().join("actually-a-pdf.epub");
        tokio::fs::write(&misnamed, b"%PDF-1.4 body").await.unwrap();

        let detected = MagicSniffer::new().detect_format(&misnamed).await.unwrap();
        assert_eq!(detected, DetectedFormat::Known(FormatTag::Pdf));
    }
}
