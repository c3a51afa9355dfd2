//! Types for the placer module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::discovery::CandidateFile;

/// Why nothing needs to happen for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoOpReason {
    /// The file (or another link to it) already sits at `path`.
    AlreadyInPlace { path: PathBuf },
    /// Byte-identical content already occupies `path`. The source is kept.
    DuplicateAt { path: PathBuf },
}

/// Why a file was left where it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbandonReason {
    SuffixSpaceExhausted { max_suffix: u32 },
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuffixSpaceExhausted { max_suffix } => {
                write!(f, "suffix space exhausted (tried _1 to _{})", max_suffix)
            }
        }
    }
}

/// The action chosen for one file. Drives at most one filesystem mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PlacementDecision {
    NoOp {
        from: PathBuf,
        reason: NoOpReason,
    },
    Move {
        from: PathBuf,
        to: PathBuf,
    },
    MoveWithSuffix {
        from: PathBuf,
        to: PathBuf,
        suffix: u32,
    },
    Abandon {
        from: PathBuf,
        reason: AbandonReason,
    },
}

impl PlacementDecision {
    /// Metric and report label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoOp { .. } => "noop",
            Self::Move { .. } => "move",
            Self::MoveWithSuffix { .. } => "move_with_suffix",
            Self::Abandon { .. } => "abandon",
        }
    }

    pub fn source(&self) -> &Path {
        match self {
            Self::NoOp { from, .. }
            | Self::Move { from, .. }
            | Self::MoveWithSuffix { from, .. }
            | Self::Abandon { from, .. } => from,
        }
    }

    /// Target of a move, if this decision moves anything.
    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::Move { to, .. } | Self::MoveWithSuffix { to, .. } => Some(to),
            Self::NoOp { .. } | Self::Abandon { .. } => None,
        }
    }

    /// Where the content lives once the decision has been carried out.
    pub fn final_path(&self) -> &Path {
        match self {
            Self::Move { to, .. } | Self::MoveWithSuffix { to, .. } => to,
            Self::NoOp {
                reason: NoOpReason::AlreadyInPlace { path },
                ..
            } => path,
            Self::NoOp { from, .. } | Self::Abandon { from, .. } => from,
        }
    }
}

impl fmt::Display for PlacementDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp {
                reason: NoOpReason::AlreadyInPlace { path },
                ..
            } => write!(f, "already at {}", path.display()),
            Self::NoOp {
                reason: NoOpReason::DuplicateAt { path },
                ..
            } => write!(f, "identical copy at {}", path.display()),
            Self::Move { to, .. } => write!(f, "move to {}", to.display()),
            Self::MoveWithSuffix { to, suffix, .. } => {
                write!(f, "move to {} (suffix {})", to.display(), suffix)
            }
            Self::Abandon { reason, .. } => write!(f, "abandoned: {}", reason),
        }
    }
}

/// How a move was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveMethod {
    /// Same-volume move: link at the target, then unlink the source.
    Rename,
    /// Copy, verify, then remove the source.
    CopyVerified,
}

/// Input to [`Placer::place`](super::Placer::place).
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    pub file: CandidateFile,
    /// Absolute canonical destination (archive root joined with the planned path).
    pub destination: PathBuf,
    /// Decide only, never mutate.
    pub dry_run: bool,
}

/// Result of a placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub decision: PlacementDecision,
    /// Set when a move was actually performed.
    pub method: Option<MoveMethod>,
    pub duration_ms: u64,
}

impl PlacementResult {
    pub fn performed(&self) -> bool {
        self.method.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_path() {
        let from = PathBuf::from("/lib/in/a.pdf");
        let to = PathBuf::from("/lib/By-ISBN/x/A.pdf");

        let moved = PlacementDecision::Move {
            from: from.clone(),
            to: to.clone(),
        };
        assert_eq!(moved.final_path(), to.as_path());
        assert_eq!(moved.target(), Some(to.as_path()));

        let duplicate = PlacementDecision::NoOp {
            from: from.clone(),
            reason: NoOpReason::DuplicateAt { path: to.clone() },
        };
        assert_eq!(duplicate.final_path(), from.as_path());
        assert_eq!(duplicate.target(), None);
    }

    #[test]
    fn test_decision_serialization() {
        let decision = PlacementDecision::Abandon {
            from: PathBuf::from("/lib/a.pdf"),
            reason: AbandonReason::SuffixSpaceExhausted { max_suffix: 9 },
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], "abandon");
        assert_eq!(json["reason"]["reason"], "suffix_space_exhausted");
        assert_eq!(decision.label(), "abandon");
        assert_eq!(
            decision.to_string(),
            "abandoned: suffix space exhausted (tried _1 to _9)"
        );
    }
}
