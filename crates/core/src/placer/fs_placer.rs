//! File system placer implementation.

use async_trait::async_trait;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use super::compare::files_identical;
use super::config::PlacerConfig;
use super::error::PlacerError;
use super::locks::DirectoryLocks;
use super::traits::Placer;
use super::types::{
    AbandonReason, MoveMethod, NoOpReason, PlacementDecision, PlacementRequest, PlacementResult,
};
use crate::discovery::{CandidateFile, IdentityToken};

/// File system based placer implementation.
pub struct FsPlacer {
    config: PlacerConfig,
    locks: DirectoryLocks,
}

impl FsPlacer {
    /// Creates a new file system placer with the given configuration.
    pub fn new(config: PlacerConfig) -> Self {
        Self {
            config,
            locks: DirectoryLocks::new(),
        }
    }

    /// Creates a placer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PlacerConfig::default())
    }

    pub fn config(&self) -> &PlacerConfig {
        &self.config
    }

    /// Moves `source` to `destination` without copying bytes: a new link
    /// at the target, then removal of the source.
    ///
    /// Link creation fails when the target exists, so a file that appeared
    /// there (from any process) is never replaced. Returns `Ok(false)` when
    /// the volume cannot link the two paths.
    async fn try_link_move(source: &Path, destination: &Path) -> Result<bool, PlacerError> {
        match fs::hard_link(source, destination).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(PlacerError::DestinationExists {
                    path: destination.to_path_buf(),
                })
            }
            Err(e) if cannot_link(&e) => return Ok(false),
            Err(e) => {
                return Err(PlacerError::move_failed(
                    source.to_path_buf(),
                    destination.to_path_buf(),
                    e,
                ))
            }
        }

        if let Err(e) = fs::remove_file(source).await {
            // Roll back so the file keeps exactly one name.
            discard(destination).await;
            return Err(PlacerError::move_failed(
                source.to_path_buf(),
                destination.to_path_buf(),
                e,
            ));
        }
        Ok(true)
    }

    async fn identical(&self, source: &Path, other: &Path) -> Result<bool, PlacerError> {
        files_identical(source, other, self.config.compare_chunk_size)
            .await
            .map_err(|e| PlacerError::compare_failed(other.to_path_buf(), e))
    }

    async fn probe(path: &Path) -> Result<Option<IdentityToken>, PlacerError> {
        IdentityToken::probe_existing(path)
            .await
            .map_err(|e| PlacerError::compare_failed(path.to_path_buf(), e))
    }

    /// Creates parent directories for a path.
    async fn ensure_parent_dirs(&self, path: &Path) -> Result<(), PlacerError> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        if fs::metadata(parent).await.is_ok() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(self.config.directory_mode);

        builder
            .create(parent)
            .await
            .map_err(|e| PlacerError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })
    }

    /// Moves `from` to `to`, in place on the volume when possible, otherwise
    /// by a verified copy followed by removal of the source. Never replaces
    /// an existing `to`.
    async fn move_file(&self, from: &Path, to: &Path) -> Result<MoveMethod, PlacerError> {
        match fs::symlink_metadata(from).await {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(PlacerError::SymlinkSource {
                    path: from.to_path_buf(),
                })
            }
            Ok(_) => {}
            Err(_) => {
                return Err(PlacerError::SourceNotFound {
                    path: from.to_path_buf(),
                })
            }
        }

        self.ensure_parent_dirs(to).await?;

        if Self::try_link_move(from, to).await? {
            return Ok(MoveMethod::Rename);
        }

        debug!("Cannot link {} at {}, copying", from.display(), to.display());
        self.copy_verified(from, to).await?;

        fs::remove_file(from)
            .await
            .map_err(|e| PlacerError::CleanupFailed {
                path: from.to_path_buf(),
                to: to.to_path_buf(),
                source: e,
            })?;

        Ok(MoveMethod::CopyVerified)
    }

    /// Copies `from` to a new file at `to`, carries metadata over, and
    /// verifies the copy. On any failure the copy is removed and `from`
    /// is untouched.
    pub(crate) async fn copy_verified(&self, from: &Path, to: &Path) -> Result<(), PlacerError> {
        if let Err(e) = self.copy_file(from, to).await {
            discard(to).await;
            return Err(e);
        }
        if let Err(e) = self.copy_metadata(from, to).await {
            discard(to).await;
            return Err(PlacerError::copy_failed(from.to_path_buf(), to.to_path_buf(), e));
        }
        self.verify_copy(from, to).await
    }

    /// Copies a file in `compare_chunk_size` chunks and syncs it to disk.
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<u64, PlacerError> {
        let copy_failed = |e| PlacerError::copy_failed(from.to_path_buf(), to.to_path_buf(), e);

        let mut reader = File::open(from).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::SourceNotFound {
                    path: from.to_path_buf(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;

        let mut writer = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(to)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    PlacerError::DestinationExists {
                        path: to.to_path_buf(),
                    }
                } else {
                    copy_failed(e)
                }
            })?;

        let mut buffer = vec![0u8; self.config.compare_chunk_size.max(1)];
        let mut total_bytes = 0u64;
        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(copy_failed)?;
            if bytes_read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..bytes_read])
                .await
                .map_err(copy_failed)?;
            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(copy_failed)?;
        writer.sync_all().await.map_err(copy_failed)?;

        Ok(total_bytes)
    }

    async fn copy_metadata(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        let meta = fs::metadata(from).await?;
        if self.config.preserve_permissions {
            fs::set_permissions(to, meta.permissions()).await?;
        }
        if self.config.preserve_times {
            let atime = FileTime::from_last_access_time(&meta);
            let mtime = FileTime::from_last_modification_time(&meta);
            let owned = to.to_path_buf();
            tokio::task::spawn_blocking(move || filetime::set_file_times(&owned, atime, mtime))
                .await
                .map_err(std::io::Error::other)??;
        }
        Ok(())
    }

    /// Compares a fresh copy with its source; removes the copy on mismatch.
    async fn verify_copy(&self, from: &Path, to: &Path) -> Result<(), PlacerError> {
        match files_identical(from, to, self.config.compare_chunk_size).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                error!("Copy of {} at {} differs from the source", from.display(), to.display());
                discard(to).await;
                Err(PlacerError::VerificationFailed {
                    from: from.to_path_buf(),
                    to: to.to_path_buf(),
                })
            }
            Err(e) => {
                discard(to).await;
                Err(PlacerError::compare_failed(to.to_path_buf(), e))
            }
        }
    }
}

/// Best-effort removal of a partial or rejected copy.
async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove rejected copy {}: {}", path.display(), e);
        }
    }
}

/// Link errors that mean "use a copy instead": a different device, or a
/// file system without hard links.
fn cannot_link(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    // EXDEV is 18, EPERM is 1 and EOPNOTSUPP is 95 on Linux
    matches!(e.kind(), ErrorKind::CrossesDevices | ErrorKind::Unsupported)
        || matches!(e.raw_os_error(), Some(1) | Some(18) | Some(95))
}

/// `dir/name.ext` becomes `dir/name_{n}.ext`.
pub fn suffixed(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}

#[async_trait]
impl Placer for FsPlacer {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn decide(
        &self,
        file: &CandidateFile,
        destination: &Path,
    ) -> Result<PlacementDecision, PlacerError> {
        let from = file.path.clone();
        if fs::symlink_metadata(&from).await.is_err() {
            return Err(PlacerError::SourceNotFound { path: from });
        }

        match Self::probe(destination).await? {
            None => {
                return Ok(PlacementDecision::Move {
                    from,
                    to: destination.to_path_buf(),
                })
            }
            Some(identity) if identity == file.identity => {
                return Ok(PlacementDecision::NoOp {
                    from,
                    reason: NoOpReason::AlreadyInPlace {
                        path: destination.to_path_buf(),
                    },
                })
            }
            Some(_) => {}
        }

        if self.identical(&from, destination).await? {
            return Ok(PlacementDecision::NoOp {
                from,
                reason: NoOpReason::DuplicateAt {
                    path: destination.to_path_buf(),
                },
            });
        }

        // Every slot is inspected so a file already filed under a suffix
        // is recognised on later runs.
        let mut first_free = None;
        for n in 1..=self.config.max_suffix {
            let candidate = suffixed(destination, n);
            match Self::probe(&candidate).await? {
                None => {
                    if first_free.is_none() {
                        first_free = Some((n, candidate));
                    }
                }
                Some(identity) if identity == file.identity => {
                    return Ok(PlacementDecision::NoOp {
                        from,
                        reason: NoOpReason::AlreadyInPlace { path: candidate },
                    });
                }
                Some(_) => {
                    if self.identical(&from, &candidate).await? {
                        return Ok(PlacementDecision::NoOp {
                            from,
                            reason: NoOpReason::DuplicateAt { path: candidate },
                        });
                    }
                }
            }
        }

        Ok(match first_free {
            Some((suffix, to)) => PlacementDecision::MoveWithSuffix { from, to, suffix },
            None => PlacementDecision::Abandon {
                from,
                reason: AbandonReason::SuffixSpaceExhausted {
                    max_suffix: self.config.max_suffix,
                },
            },
        })
    }

    async fn execute(&self, decision: PlacementDecision) -> Result<PlacementResult, PlacerError> {
        let start = Instant::now();

        let method = match &decision {
            PlacementDecision::Move { from, to } | PlacementDecision::MoveWithSuffix { from, to, .. } => {
                let method = self.move_file(from, to).await?;
                info!("Moved {} -> {} ({:?})", from.display(), to.display(), method);
                Some(method)
            }
            PlacementDecision::NoOp { .. } | PlacementDecision::Abandon { .. } => None,
        };

        Ok(PlacementResult {
            decision,
            method,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn place(&self, request: PlacementRequest) -> Result<PlacementResult, PlacerError> {
        let start = Instant::now();
        let directory = request
            .destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let _guard = self.locks.lock(&directory).await;

        let decision = self.decide(&request.file, &request.destination).await?;
        debug!("{}: {}", request.file.path.display(), decision);

        if request.dry_run {
            return Ok(PlacementResult {
                decision,
                method: None,
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        let mut result = self.execute(decision).await?;
        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn validate(&self) -> Result<(), PlacerError> {
        if self.config.max_suffix == 0 {
            return Err(PlacerError::InvalidConfig(
                "max_suffix must be at least 1".to_string(),
            ));
        }
        if self.config.compare_chunk_size == 0 {
            return Err(PlacerError::InvalidConfig(
                "compare_chunk_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
