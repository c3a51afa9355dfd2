//! EPUB ISBN extraction.
//!
//! Looks at the package document's `dc:identifier` entries first, then at
//! the text of the first spine documents.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

use super::config::ExtractionConfig;
use super::error::ExtractorError;
use super::read_bounded;
use super::traits::BookExtractor;
use super::types::FormatTag;
use crate::isbn::{find_isbn_like, isbn_like_identifier};

const CONTAINER: &str = "META-INF/container.xml";
const XHTML: &str = "application/xhtml+xml";

static ROOTFILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<rootfile\b[^>]*\sfull-path\s*=\s*["']([^"']+)["']"#).unwrap()
});
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:dc:)?identifier\b[^>]*>(.*?)</(?:dc:)?identifier>").unwrap()
});
static ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<item\b[^>]*>").unwrap());
static ITEMREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<itemref\b[^>]*\sidref\s*=\s*["']([^"']+)["']"#).unwrap()
});
static ID_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\sid\s*=\s*["']([^"']*)["']"#).unwrap());
static HREF_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\shref\s*=\s*["']([^"']*)["']"#).unwrap());
static MEDIA_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\smedia-type\s*=\s*["']([^"']*)["']"#).unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Scans EPUB package metadata and leading content documents.
pub struct EpubExtractor {
    config: ExtractionConfig,
}

impl EpubExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    fn scan(path: &Path, bytes: Vec<u8>, pages: usize) -> Result<Option<String>, ExtractorError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractorError::malformed(path, "epub", e))?;

        let container = read_entry(&mut archive, CONTAINER)
            .map_err(|e| ExtractorError::malformed(path, "epub", e))?
            .ok_or_else(|| ExtractorError::malformed(path, "epub", "missing META-INF/container.xml"))?;
        let opf_path = ROOTFILE
            .captures(&container)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ExtractorError::malformed(path, "epub", "container has no rootfile"))?;
        let opf = read_entry(&mut archive, &opf_path)
            .map_err(|e| ExtractorError::malformed(path, "epub", e))?
            .ok_or_else(|| {
                ExtractorError::malformed(path, "epub", format!("missing package document {}", opf_path))
            })?;

        for caps in IDENTIFIER.captures_iter(&opf) {
            if let Some(token) = isbn_like_identifier(&caps[1]) {
                debug!("ISBN-like identifier in package metadata of {}", path.display());
                return Ok(Some(token.to_string()));
            }
        }

        let base = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        for href in content_documents(&opf).into_iter().take(pages) {
            let entry = if base.is_empty() {
                href.replace("%20", " ")
            } else {
                format!("{}/{}", base, href.replace("%20", " "))
            };
            let Some(document) = read_entry(&mut archive, &entry)
                .map_err(|e| ExtractorError::malformed(path, "epub", e))?
            else {
                debug!("Spine entry {} missing from {}", entry, path.display());
                continue;
            };
            let text = TAG.replace_all(&document, " ");
            if let Some(token) = find_isbn_like(&text) {
                return Ok(Some(token.to_string()));
            }
        }

        Ok(None)
    }
}

/// Content document hrefs in spine order, falling back to manifest order.
fn content_documents(opf: &str) -> Vec<String> {
    let mut manifest_order = Vec::new();
    let mut by_id = HashMap::new();
    for item in ITEM.find_iter(opf) {
        let tag = item.as_str();
        let attr = |re: &Regex| re.captures(tag).map(|c| c[1].to_string());
        if attr(&MEDIA_ATTR).as_deref() != Some(XHTML) {
            continue;
        }
        let (Some(id), Some(href)) = (attr(&ID_ATTR), attr(&HREF_ATTR)) else {
            continue;
        };
        manifest_order.push(href.clone());
        by_id.insert(id, href);
    }

    let spine: Vec<String> = ITEMREF
        .captures_iter(opf)
        .filter_map(|c| by_id.get(&c[1]).cloned())
        .collect();

    if spine.is_empty() {
        manifest_order
    } else {
        spine
    }
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<Vec<u8>>>,
    name: &str,
) -> Result<Option<String>, String> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    let mut raw = Vec::new();
    file.read_to_end(&mut raw).map_err(|e| e.to_string())?;
    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}

#[async_trait]
impl BookExtractor for EpubExtractor {
    fn format(&self) -> FormatTag {
        FormatTag::Epub
    }

    async fn extract_first_isbn(&self, path: &Path) -> Result<Option<String>, ExtractorError> {
        let bytes = read_bounded(path, self.config.max_file_size).await?;
        let pages = self.config.pages;
        let owned = path.to_path_buf();

        tokio::task::spawn_blocking(move || Self::scan(&owned, bytes, pages))
            .await
            .map_err(|e| ExtractorError::io(path, std::io::Error::other(e)))?
    }
}
