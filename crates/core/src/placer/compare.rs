//! Byte-for-byte file comparison.

use std::io;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;

/// True when both files have the same length and the same bytes.
///
/// Sizes are compared first; content is then read in `chunk_size` pieces
/// and the comparison stops at the first differing chunk.
pub async fn files_identical(a: &Path, b: &Path, chunk_size: usize) -> io::Result<bool> {
    let (meta_a, meta_b) = (fs::metadata(a).await?, fs::metadata(b).await?);
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }

    let chunk_size = chunk_size.max(1);
    let mut file_a = File::open(a).await?;
    let mut file_b = File::open(b).await?;
    let mut buf_a = vec![0u8; chunk_size];
    let mut buf_b = vec![0u8; chunk_size];

    loop {
        let n_a = read_full(&mut file_a, &mut buf_a).await?;
        let n_b = read_full(&mut file_b, &mut buf_b).await?;
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Fills `buf` unless EOF comes first; returns the number of bytes read.
async fn read_full(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_identical_across_chunk_boundaries() {
        let temp = TempDir::new().unwrap();
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let a = write(temp.path(), "a", &content).await;
        let b = write(temp.path(), "b", &content).await;

        assert!(files_identical(&a, &b, 64).await.unwrap());
        assert!(files_identical(&a, &b, 1024 * 1024).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_size_different_tail() {
        let temp = TempDir::new().unwrap();
        let mut other: Vec<u8> = vec![7u8; 4096];
        let a = write(temp.path(), "a", &other).await;
        other[4095] = 8;
        let b = write(temp.path(), "b", &other).await;

        assert!(!files_identical(&a, &b, 1000).await.unwrap());
    }

    #[tokio::test]
    async fn test_different_sizes() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a", b"short").await;
        let b = write(temp.path(), "b", b"shorter").await;
        assert!(!files_identical(&a, &b, 4).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_files_identical() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a", b"").await;
        let b = write(temp.path(), "b", b"").await;
        assert!(files_identical(&a, &b, 16).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a", b"x").await;
        assert!(files_identical(&a, &temp.path().join("missing"), 16)
            .await
            .is_err());
    }
}
