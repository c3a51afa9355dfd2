//! Trait definitions for the placer module.

use async_trait::async_trait;
use std::path::Path;

use super::error::PlacerError;
use super::types::{PlacementDecision, PlacementRequest, PlacementResult};
use crate::discovery::CandidateFile;

/// Decides where a file goes relative to what already occupies its
/// destination, and carries that decision out.
#[async_trait]
pub trait Placer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Chooses the action for `file` given its absolute canonical destination.
    /// Only reads the filesystem.
    async fn decide(
        &self,
        file: &CandidateFile,
        destination: &Path,
    ) -> Result<PlacementDecision, PlacerError>;

    /// Performs at most one filesystem mutation for `decision`.
    async fn execute(&self, decision: PlacementDecision) -> Result<PlacementResult, PlacerError>;

    /// Decides and (unless `dry_run`) executes as one step.
    async fn place(&self, request: PlacementRequest) -> Result<PlacementResult, PlacerError>;

    /// Validates that the placer is properly configured and ready.
    async fn validate(&self) -> Result<(), PlacerError>;
}
