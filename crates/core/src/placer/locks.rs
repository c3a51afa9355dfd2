//! Per-directory mutual exclusion for placements.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>;

/// Hands out one async lock per destination directory.
///
/// Holding a directory's guard while deciding and executing keeps suffix
/// allocation consistent with the directory listing. An entry lives only
/// while some task holds or waits for it.
#[derive(Debug, Default)]
pub struct DirectoryLocks {
    locks: Arc<LockMap>,
}

/// Exclusive access to one directory. Releasing the last interest in the
/// directory drops its entry from the map.
#[derive(Debug)]
pub struct DirectoryGuard {
    guard: Option<OwnedMutexGuard<()>>,
    dir: PathBuf,
    locks: Arc<LockMap>,
}

impl Drop for DirectoryGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Map entry plus our guard; anyone else cloned it under this mutex.
        let idle = locks
            .get(&self.dir)
            .map(|lock| Arc::strong_count(lock) <= 2)
            .unwrap_or(false);
        if idle {
            locks.remove(&self.dir);
        }
        self.guard.take();
    }
}

impl DirectoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `dir`.
    pub async fn lock(&self, dir: &Path) -> DirectoryGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(dir.to_path_buf())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        DirectoryGuard {
            guard: Some(lock.lock_owned().await),
            dir: dir.to_path_buf(),
            locks: self.locks.clone(),
        }
    }

    /// Number of directories currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_directory_serialized() {
        let locks = Arc::new(DirectoryLocks::new());
        let guard = locks.lock(Path::new("/archive/By-ISBN/a")).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(Path::new("/archive/By-ISBN/a")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_directories_independent() {
        let locks = DirectoryLocks::new();
        let _a = locks.lock(Path::new("/archive/a")).await;
        let _b = tokio::time::timeout(Duration::from_secs(1), locks.lock(Path::new("/archive/b")))
            .await
            .unwrap();
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_directories_are_forgotten() {
        let locks = DirectoryLocks::new();
        for i in 0..100 {
            let dir = PathBuf::from(format!("/archive/By-ISBN/book-{i}"));
            let _guard = locks.lock(&dir).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = Arc::new(DirectoryLocks::new());
        let first = locks.lock(Path::new("/archive/a")).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(Path::new("/archive/a")).await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.len(), 1);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }
}
