//! Candidate discovery: book-looking files under a root, one per storage object.
//!
//! [`Discovery`] is a lazy iterator over a sorted directory walk, so the
//! order (and therefore which hard link wins) is stable for a fixed tree.
//!
//! When links are followed, a symbolic link is replaced by the file it
//! points to, and only targets inside the library or archive root are
//! accepted. A dangling link has no content and is skipped.

mod identity;

pub use identity::IdentityToken;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// A discovered book file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub identity: IdentityToken,
}

impl CandidateFile {
    pub fn new(path: PathBuf, identity: IdentityToken) -> Self {
        Self { path, identity }
    }

    /// Builds a candidate by probing the file's identity.
    pub fn probe(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let identity = IdentityToken::of(&path)?;
        Ok(Self { path, identity })
    }
}

/// A per-entry failure during the walk. Never fatal for the traversal.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Cannot read {}: {source}", display_path(.path))]
    Walk {
        path: Option<PathBuf>,
        #[source]
        source: walkdir::Error,
    },

    #[error("Cannot identify {path}: {source}")]
    Identity {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Link {path} points outside the library: {target}")]
    LinkOutsideRoots { path: PathBuf, target: PathBuf },
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

impl DiscoveryError {
    /// The path the failure refers to, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Walk { path, .. } => path.as_deref(),
            Self::Identity { path, .. } => Some(path),
            Self::LinkOutsideRoots { path, .. } => Some(path),
        }
    }
}

/// A directory link targets may resolve into.
struct AllowedRoot {
    root: PathBuf,
    canonical: Option<PathBuf>,
}

impl AllowedRoot {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            canonical: std::fs::canonicalize(root).ok(),
        }
    }

    /// `target` (canonical) re-expressed under the configured root path.
    fn rebase(&self, target: &Path) -> Option<PathBuf> {
        let rel = target.strip_prefix(self.canonical.as_ref()?).ok()?;
        Some(self.root.join(rel))
    }
}

/// Lazy, finite walk yielding one [`CandidateFile`] per storage object.
pub struct Discovery {
    walker: walkdir::IntoIter,
    extensions: HashSet<String>,
    seen: HashSet<IdentityToken>,
    roots: Vec<AllowedRoot>,
}

impl Discovery {
    /// Walks `root` recursively, matching `extensions` case-insensitively.
    pub fn new<I, S>(root: &Path, extensions: I, follow_links: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let walker = WalkDir::new(root)
            .follow_links(follow_links)
            .sort_by_file_name()
            .into_iter();

        Self {
            walker,
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
            seen: HashSet::new(),
            roots: vec![AllowedRoot::new(root)],
        }
    }

    /// Also accepts link targets under `archive_root`.
    pub fn with_archive_root(mut self, archive_root: &Path) -> Self {
        if self.roots.iter().all(|r| r.root != archive_root) {
            self.roots.push(AllowedRoot::new(archive_root));
        }
        self
    }

    /// Replaces a symbolic link with the path of the file it points to.
    fn resolve_link(&self, link: PathBuf) -> Result<PathBuf, DiscoveryError> {
        let target = match std::fs::canonicalize(&link) {
            Ok(target) => target,
            Err(e) => return Err(DiscoveryError::Identity { path: link, source: e }),
        };
        self.roots
            .iter()
            .find_map(|r| r.rebase(&target))
            .ok_or(DiscoveryError::LinkOutsideRoots { path: link, target })
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Iterator for Discovery {
    type Item = Result<CandidateFile, DiscoveryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) if is_dangling_link(&e) => {
                    let link = e.path().map(Path::to_path_buf);
                    debug!("Skipping dangling link {}", display_path(&link));
                    continue;
                }
                Err(e) => {
                    return Some(Err(DiscoveryError::Walk {
                        path: e.path().map(Path::to_path_buf),
                        source: e,
                    }))
                }
            };

            if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
                continue;
            }

            let path = if entry.path_is_symlink() {
                match self.resolve_link(entry.into_path()) {
                    Ok(target) if self.matches_extension(&target) => target,
                    Ok(target) => {
                        debug!("Skipping link to {} (not a book extension)", target.display());
                        continue;
                    }
                    Err(e) => return Some(Err(e)),
                }
            } else {
                entry.into_path()
            };

            let identity = match IdentityToken::of(&path) {
                Ok(identity) => identity,
                // Already moved away through a link earlier in this walk.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Skipping {} (no longer present)", path.display());
                    continue;
                }
                Err(e) => return Some(Err(DiscoveryError::Identity { path, source: e })),
            };

            if !self.seen.insert(identity.clone()) {
                debug!("Skipping {} (another link to {} already seen)", path.display(), identity);
                continue;
            }

            return Some(Ok(CandidateFile { path, identity }));
        }
    }
}

/// A followed link whose target does not exist.
fn is_dangling_link(e: &walkdir::Error) -> bool {
    let missing = e
        .io_error()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false);
    missing
        && e.path()
            .and_then(|p| std::fs::symlink_metadata(p).ok())
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn collect(discovery: Discovery) -> Vec<PathBuf> {
        discovery.filter_map(Result::ok).map(|c| c.path).collect()
    }

    #[test]
    fn test_matches_book_extensions_recursively() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.pdf", b"a");
        touch(temp.path(), "nested/deeper/b.EPUB", b"b");
        touch(temp.path(), "notes.txt", b"c");

        let found = collect(Discovery::new(temp.path(), ["pdf", "epub"], false));
        assert_eq!(
            found,
            vec![temp.path().join("a.pdf"), temp.path().join("nested/deeper/b.EPUB")]
        );
    }

    #[test]
    fn test_custom_extension_set() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.pdf", b"a");
        touch(temp.path(), "b.djvu", b"b");

        let found = collect(Discovery::new(temp.path(), [".djvu"], false));
        assert_eq!(found, vec![temp.path().join("b.djvu")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_links_yield_once() {
        let temp = TempDir::new().unwrap();
        let first = touch(temp.path(), "a/book.pdf", b"same storage");
        std::fs::create_dir_all(temp.path().join("b")).unwrap();
        std::fs::hard_link(&first, temp.path().join("b/alias.pdf")).unwrap();

        let found = collect(Discovery::new(temp.path(), ["pdf"], false));
        assert_eq!(found, vec![first]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = touch(outside.path(), "real.pdf", b"x");
        std::os::unix::fs::symlink(&target, temp.path().join("link.pdf")).unwrap();
        std::os::unix::fs::symlink("gone.pdf", temp.path().join("dangling.pdf")).unwrap();
        let mine = touch(temp.path(), "mine.pdf", b"y");

        let results: Vec<_> = Discovery::new(temp.path(), ["pdf"], false).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().path, mine);
    }

    #[cfg(unix)]
    #[test]
    fn test_followed_link_yields_its_target() {
        let temp = TempDir::new().unwrap();
        let real = touch(temp.path(), "real.pdf", b"x");
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::os::unix::fs::symlink("../real.pdf", temp.path().join("a/link.pdf")).unwrap();

        let found: Vec<_> = Discovery::new(temp.path(), ["pdf"], true)
            .map(Result::unwrap)
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, real);
        assert_eq!(found[0].identity, IdentityToken::of(&real).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_followed_link_into_archive_root() {
        let library = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        let filed = touch(archive.path(), "No-ISBN/real.pdf", b"x");
        std::os::unix::fs::symlink(&filed, library.path().join("link.pdf")).unwrap();

        let found = collect(
            Discovery::new(library.path(), ["pdf"], true).with_archive_root(archive.path()),
        );
        assert_eq!(found, vec![filed]);
    }

    #[cfg(unix)]
    #[test]
    fn test_followed_link_outside_roots_is_reported() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = touch(outside.path(), "real.pdf", b"x");
        std::os::unix::fs::symlink(&target, temp.path().join("link.pdf")).unwrap();
        touch(temp.path(), "mine.pdf", b"y");

        let results: Vec<_> = Discovery::new(temp.path(), ["pdf"], true).collect();
        assert_eq!(results.len(), 2);
        match &results[0] {
            Err(DiscoveryError::LinkOutsideRoots { path, .. }) => {
                assert_eq!(path, &temp.path().join("link.pdf"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(results[1].as_ref().unwrap().path, temp.path().join("mine.pdf"));
        assert!(target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_skipped_when_followed() {
        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink("gone.pdf", temp.path().join("link.pdf")).unwrap();
        touch(temp.path(), "mine.pdf", b"y");

        let results: Vec<_> = Discovery::new(temp.path(), ["pdf"], true).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().path, temp.path().join("mine.pdf"));
    }

    #[test]
    fn test_missing_root_reports_error_and_ends() {
        let temp = TempDir::new().unwrap();
        let mut discovery = Discovery::new(&temp.path().join("missing"), ["pdf"], false);
        assert!(matches!(discovery.next(), Some(Err(DiscoveryError::Walk { .. }))));
        assert!(discovery.next().is_none());
    }
}
