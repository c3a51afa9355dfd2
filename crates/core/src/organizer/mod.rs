//! The organize run: discover, classify, plan, place, one file at a time.
//!
//! A failure while processing one candidate is recorded in the
//! [`OrganizeReport`] and never stops the run. Only an unusable root (or
//! a misconfigured placer) is fatal, and that is checked before the walk.

mod error;
mod report;

pub use error::OrganizeError;
pub use report::{FileError, FileReport, FileStatus, OrganizeReport, StatusCounts};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::classifier::Classifier;
use crate::config::Config;
use crate::discovery::{CandidateFile, Discovery};
use crate::extractor::ExtractorSet;
use crate::metadata::MetadataResolver;
use crate::metrics;
use crate::placer::{AbandonReason, FsPlacer, PlacementDecision, PlacementRequest, Placer};
use crate::planner;

/// Roots and switches for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Directory walked for candidates.
    pub root: PathBuf,
    /// Directory the category folders live in.
    pub archive_root: PathBuf,
    pub extensions: Vec<String>,
    pub follow_links: bool,
    pub dry_run: bool,
}

impl OrganizerConfig {
    /// Organizes `root` in place with the default extension set.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            archive_root: root.clone(),
            root,
            extensions: vec!["pdf".to_string(), "epub".to_string()],
            follow_links: false,
            dry_run: false,
        }
    }

    pub fn with_archive_root(mut self, archive_root: impl Into<PathBuf>) -> Self {
        self.archive_root = archive_root.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Follow symbolic links; each link stands for the file it points to.
    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

/// Checks that `path` is absolute, exists, and is a directory.
pub fn validate_root(path: &Path) -> Result<(), OrganizeError> {
    let invalid = |reason: &str| OrganizeError::InvalidRoot {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if !path.is_absolute() {
        return Err(invalid("not absolute"));
    }
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(invalid("not a directory")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(invalid("does not exist")),
        Err(e) => Err(invalid(&e.to_string())),
    }
}

/// Drives one organize run over a library.
pub struct Organizer<P: Placer> {
    config: OrganizerConfig,
    classifier: Classifier,
    placer: Arc<P>,
}

impl Organizer<FsPlacer> {
    /// Builds the standard organizer: magic-byte extractors, configured
    /// providers, and the filesystem placer.
    pub fn from_config(config: &Config) -> Result<Self, OrganizeError> {
        let classifier = Classifier::new(
            ExtractorSet::standard(config.extraction.clone()),
            MetadataResolver::from_config(&config.providers)?,
        );
        Ok(Self::new(
            config.organizer_config(),
            classifier,
            Arc::new(FsPlacer::new(config.placement.clone())),
        ))
    }
}

impl<P: Placer> Organizer<P> {
    pub fn new(config: OrganizerConfig, classifier: Classifier, placer: Arc<P>) -> Self {
        Self {
            config,
            classifier,
            placer,
        }
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    /// Runs once over the library and returns the report.
    ///
    /// Returns `Err` only for fatal preconditions.
    pub async fn run(&self) -> Result<OrganizeReport, OrganizeError> {
        validate_root(&self.config.root)?;
        if !self.config.archive_root.is_absolute() {
            return Err(OrganizeError::InvalidRoot {
                path: self.config.archive_root.clone(),
                reason: "not absolute".to_string(),
            });
        }
        if self.config.archive_root.exists() {
            validate_root(&self.config.archive_root)?;
        }
        self.placer
            .validate()
            .await
            .map_err(|e| OrganizeError::Setup(e.to_string()))?;

        let mut report = OrganizeReport::new(
            &self.config.root,
            &self.config.archive_root,
            self.config.dry_run,
        );
        let span = info_span!("organize", run_id = %report.run_id);

        async {
            info!(
                "Organizing {} into {} (placer: {}, dry run: {})",
                self.config.root.display(),
                self.config.archive_root.display(),
                self.placer.name(),
                self.config.dry_run
            );

            let discovery = Discovery::new(
                &self.config.root,
                &self.config.extensions,
                self.config.follow_links,
            )
            .with_archive_root(&self.config.archive_root);
            for entry in discovery {
                match entry {
                    Ok(file) => {
                        metrics::FILES_DISCOVERED.inc();
                        report.record(self.process(&file).await);
                    }
                    Err(e) => {
                        warn!("Skipping entry: {}", e);
                        let path = e.path().map(Path::to_path_buf);
                        let err = OrganizeError::from(e);
                        metrics::FILE_FAILURES.with_label_values(&[err.kind()]).inc();
                        report.record(FileReport::from_error(path.as_deref(), &err));
                    }
                }
            }

            report.finish();
            info!(
                "Run finished: {} moved, {} suffixed, {} unchanged, {} abandoned, {} failed",
                report.counts.moved,
                report.counts.moved_with_suffix,
                report.counts.noop,
                report.counts.abandoned,
                report.counts.failed
            );
        }
        .instrument(span)
        .await;

        Ok(report)
    }

    /// Classifies, plans, and places one candidate. Never fails: errors
    /// are recorded on the returned entry.
    pub async fn process(&self, file: &CandidateFile) -> FileReport {
        let start = Instant::now();
        let mut entry = FileReport::new(file);

        if let Err(e) = self.try_process(file, &mut entry).await {
            warn!("Skipping {}: {}", file.path.display(), e);
            metrics::FILE_FAILURES.with_label_values(&[e.kind()]).inc();
            entry.fail(&e);
        }

        let elapsed = start.elapsed();
        metrics::FILE_DURATION
            .with_label_values(&[])
            .observe(elapsed.as_secs_f64());
        entry.duration_ms = elapsed.as_millis() as u64;
        entry
    }

    async fn try_process(
        &self,
        file: &CandidateFile,
        entry: &mut FileReport,
    ) -> Result<(), OrganizeError> {
        let classification = self.classifier.classify(file).await?;
        entry.set_classification(&classification);

        let relative =
            planner::source_relative(&file.path, &self.config.root, &self.config.archive_root)
                .ok_or_else(|| OrganizeError::OutsideRoot {
                    path: file.path.clone(),
                })?;
        let planned = planner::plan(&classification.outcome, classification.extension(), &relative);
        let destination = self.config.archive_root.join(planned);
        debug!(
            "{} classified {} -> {}",
            file.path.display(),
            classification.outcome.label(),
            destination.display()
        );
        entry.destination = Some(destination.clone());

        let result = self
            .placer
            .place(PlacementRequest {
                file: file.clone(),
                destination,
                dry_run: self.config.dry_run,
            })
            .await?;

        metrics::PLACEMENTS
            .with_label_values(&[result.decision.label()])
            .inc();
        entry.set_placement(&result);

        if let PlacementDecision::Abandon {
            reason: AbandonReason::SuffixSpaceExhausted { max_suffix },
            ..
        } = result.decision
        {
            return Err(OrganizeError::SuffixSpaceExhausted {
                path: file.path.clone(),
                max_suffix,
            });
        }

        Ok(())
    }
}
