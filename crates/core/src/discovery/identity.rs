//! Identity tokens: one value per underlying storage object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

/// A value shared by every path that reaches the same file.
///
/// On Unix this is the device and inode pair. Elsewhere the SHA-256 of
/// the content stands in, which also merges byte-identical copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityToken {
    Inode { device: u64, inode: u64 },
    ContentHash { sha256: String },
}

impl IdentityToken {
    /// Reads the identity of the file at `path`, following symlinks.
    pub fn of(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Self::from_metadata(path, &metadata)
    }

    /// Async flavour of [`IdentityToken::of`] for use inside the runtime.
    pub async fn probe(path: &Path) -> io::Result<Self> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::of(&owned))
            .await
            .map_err(io::Error::other)?
    }

    /// Like [`IdentityToken::probe`] but maps a missing file to `None`.
    pub async fn probe_existing(path: &Path) -> io::Result<Option<Self>> {
        match Self::probe(path).await {
            Ok(token) => Ok(Some(token)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[cfg(unix)]
    fn from_metadata(_path: &Path, metadata: &std::fs::Metadata) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;

        Ok(Self::Inode {
            device: metadata.dev(),
            inode: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(path: &Path, _metadata: &std::fs::Metadata) -> io::Result<Self> {
        use sha2::{Digest, Sha256};
        use std::io::Read;

        let mut file = std::fs::File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 1024 * 1024];
        loop {
            let n = file.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(Self::ContentHash {
            sha256: format!("{:x}", hasher.finalize()),
        })
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inode { device, inode } => write!(f, "{}:{}", device, inode),
            Self::ContentHash { sha256 } => write!(f, "sha256:{}", &sha256[..16.min(sha256.len())]),
        }
    }
}
