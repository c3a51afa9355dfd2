//! Run report: one entry per candidate plus per-state counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::error::OrganizeError;
use crate::classifier::{Category, Classification, ClassificationOutcome};
use crate::discovery::{CandidateFile, IdentityToken};
use crate::extractor::FormatTag;
use crate::isbn::Isbn;
use crate::metadata::ProviderFailure;
use crate::placer::{MoveMethod, PlacementDecision, PlacementResult};

/// Terminal state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    NoOp,
    Moved,
    MovedWithSuffix,
    Abandoned,
    Failed,
}

/// Error recorded against a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub kind: String,
    pub message: String,
}

/// What happened to one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// `None` only for discovery failures with no known path.
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<Isbn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_errors: Vec<ProviderFailure>,
    /// Canonical destination before any suffix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<PlacementDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<MoveMethod>,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
    pub duration_ms: u64,
}

impl FileReport {
    /// Fresh entry for a candidate; stays `Failed` until a placement is recorded.
    pub fn new(file: &CandidateFile) -> Self {
        Self {
            path: Some(file.path.clone()),
            identity: Some(file.identity.clone()),
            format: None,
            category: None,
            isbn: None,
            provider_errors: Vec::new(),
            destination: None,
            decision: None,
            method: None,
            status: FileStatus::Failed,
            error: None,
            duration_ms: 0,
        }
    }

    /// Entry for a walk failure that never became a candidate.
    pub fn from_error(path: Option<&Path>, error: &OrganizeError) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            identity: None,
            format: None,
            category: None,
            isbn: None,
            provider_errors: Vec::new(),
            destination: None,
            decision: None,
            method: None,
            status: FileStatus::Failed,
            error: Some(FileError {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
            duration_ms: 0,
        }
    }

    pub fn set_classification(&mut self, classification: &Classification) {
        self.format = Some(classification.format);
        self.category = Some(classification.outcome.category());
        self.isbn = classification.outcome.isbn().cloned();
        if let ClassificationOutcome::NoMetadata {
            provider_errors, ..
        } = &classification.outcome
        {
            self.provider_errors = provider_errors.clone();
        }
    }

    pub fn set_placement(&mut self, result: &PlacementResult) {
        self.status = match result.decision {
            PlacementDecision::NoOp { .. } => FileStatus::NoOp,
            PlacementDecision::Move { .. } => FileStatus::Moved,
            PlacementDecision::MoveWithSuffix { .. } => FileStatus::MovedWithSuffix,
            PlacementDecision::Abandon { .. } => FileStatus::Abandoned,
        };
        self.decision = Some(result.decision.clone());
        self.method = result.method;
    }

    /// Records an error. An abandoned placement stays `Abandoned`.
    pub fn fail(&mut self, error: &OrganizeError) {
        if self.status != FileStatus::Abandoned {
            self.status = FileStatus::Failed;
        }
        self.error = Some(FileError {
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
    }

    fn display_path(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string())
    }
}

/// Per-state totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub noop: usize,
    pub moved: usize,
    pub moved_with_suffix: usize,
    pub abandoned: usize,
    pub failed: usize,
}

impl StatusCounts {
    fn record(&mut self, status: FileStatus) {
        match status {
            FileStatus::NoOp => self.noop += 1,
            FileStatus::Moved => self.moved += 1,
            FileStatus::MovedWithSuffix => self.moved_with_suffix += 1,
            FileStatus::Abandoned => self.abandoned += 1,
            FileStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.noop + self.moved + self.moved_with_suffix + self.abandoned + self.failed
    }
}

/// Everything an organize run did, or in a dry run would have done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub root: PathBuf,
    pub archive_root: PathBuf,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub counts: StatusCounts,
}

impl OrganizeReport {
    pub fn new(root: &Path, archive_root: &Path, dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            root: root.to_path_buf(),
            archive_root: archive_root.to_path_buf(),
            dry_run,
            files: Vec::new(),
            counts: StatusCounts::default(),
        }
    }

    pub fn record(&mut self, file: FileReport) {
        self.counts.record(file.status);
        self.files.push(file);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Files that moved (or would move, in a dry run).
    pub fn moves(&self) -> usize {
        self.counts.moved + self.counts.moved_with_suffix
    }

    pub fn has_failures(&self) -> bool {
        self.counts.failed > 0
    }

    /// Human-readable summary of the run.
    pub fn summary(&self) -> String {
        if self.files.is_empty() {
            return "Nothing to report".to_string();
        }

        let mut out = String::new();
        let verb = if self.dry_run { "would be" } else { "were" };
        let _ = writeln!(
            out,
            "Run {}{}: {} file(s) examined",
            self.run_id,
            if self.dry_run { " (dry run)" } else { "" },
            self.counts.total()
        );
        let _ = writeln!(out, "  {} {} moved", self.counts.moved, verb);
        let _ = writeln!(
            out,
            "  {} {} moved with a numeric suffix",
            self.counts.moved_with_suffix, verb
        );
        let _ = writeln!(out, "  {} already in place or duplicated", self.counts.noop);
        let _ = writeln!(out, "  {} abandoned", self.counts.abandoned);
        let _ = writeln!(out, "  {} failed", self.counts.failed);

        let problems: Vec<&FileReport> = self
            .files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Abandoned | FileStatus::Failed))
            .collect();
        if !problems.is_empty() {
            let _ = writeln!(out, "Skipped:");
            for file in problems {
                let message = file
                    .error
                    .as_ref()
                    .map(|e| e.message.as_str())
                    .unwrap_or("no reason recorded");
                let _ = writeln!(out, "  {}: {}", file.display_path(), message);
            }
        }

        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placer::{AbandonReason, NoOpReason};

    fn candidate(name: &str) -> CandidateFile {
        CandidateFile::new(
            PathBuf::from(format!("/library/{}", name)),
            IdentityToken::Inode {
                device: 1,
                inode: name.len() as u64,
            },
        )
    }

    fn placed(decision: PlacementDecision) -> PlacementResult {
        PlacementResult {
            decision,
            method: Some(MoveMethod::Rename),
            duration_ms: 1,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = OrganizeReport::new(Path::new("/library"), Path::new("/library"), false);
        assert_eq!(report.summary(), "Nothing to report");
        assert!(!report.has_failures());
    }

    #[test]
    fn test_counts_and_summary() {
        let mut report = OrganizeReport::new(Path::new("/library"), Path::new("/library"), false);

        let mut moved = FileReport::new(&candidate("a.pdf"));
        moved.set_placement(&placed(PlacementDecision::Move {
            from: "/library/a.pdf".into(),
            to: "/library/By-ISBN/x/A.pdf".into(),
        }));
        report.record(moved);

        let mut noop = FileReport::new(&candidate("bb.pdf"));
        noop.set_placement(&placed(PlacementDecision::NoOp {
            from: "/library/bb.pdf".into(),
            reason: NoOpReason::AlreadyInPlace {
                path: "/library/bb.pdf".into(),
            },
        }));
        report.record(noop);

        let mut abandoned = FileReport::new(&candidate("ccc.pdf"));
        abandoned.set_placement(&placed(PlacementDecision::Abandon {
            from: "/library/ccc.pdf".into(),
            reason: AbandonReason::SuffixSpaceExhausted { max_suffix: 9 },
        }));
        abandoned.fail(&OrganizeError::SuffixSpaceExhausted {
            path: "/library/ccc.pdf".into(),
            max_suffix: 9,
        });
        report.record(abandoned);

        let mut failed = FileReport::new(&candidate("dddd.pdf"));
        failed.fail(&OrganizeError::UnsupportedFormat {
            path: "/library/dddd.pdf".into(),
            format: "unknown".into(),
        });
        report.record(failed);

        assert_eq!(
            report.counts,
            StatusCounts {
                noop: 1,
                moved: 1,
                moved_with_suffix: 0,
                abandoned: 1,
                failed: 1,
            }
        );
        assert_eq!(report.moves(), 1);
        assert!(report.has_failures());

        let summary = report.summary();
        assert!(summary.contains("4 file(s) examined"));
        assert!(summary.contains("1 were moved"));
        assert!(summary.contains("/library/ccc.pdf: Suffix space exhausted"));
        assert!(summary.contains("/library/dddd.pdf: Unsupported format"));
    }

    #[test]
    fn test_dry_run_summary_wording() {
        let mut report = OrganizeReport::new(Path::new("/library"), Path::new("/library"), true);
        let mut moved = FileReport::new(&candidate("a.pdf"));
        moved.set_placement(&PlacementResult {
            decision: PlacementDecision::Move {
                from: "/library/a.pdf".into(),
                to: "/library/No-ISBN/a.pdf".into(),
            },
            method: None,
            duration_ms: 0,
        });
        report.record(moved);

        let summary = report.summary();
        assert!(summary.contains("(dry run)"));
        assert!(summary.contains("1 would be moved"));
    }

    #[test]
    fn test_report_serializes() {
        let mut report = OrganizeReport::new(Path::new("/library"), Path::new("/archive"), false);
        report.record(FileReport::new(&candidate("a.pdf")));
        report.finish();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["files"][0]["status"], "failed");
        assert_eq!(json["counts"]["failed"], 1);
        assert!(json["finished_at"].is_string());
    }
}
