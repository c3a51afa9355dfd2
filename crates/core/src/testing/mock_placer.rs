//! Mock placer for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::discovery::CandidateFile;
use crate::placer::{
    AbandonReason, MoveMethod, PlacementDecision, PlacementRequest, PlacementResult, Placer,
    PlacerError,
};

/// A recorded placement request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPlacement {
    /// The request that was submitted.
    pub request: PlacementRequest,
    /// The decision taken, if the request got that far.
    pub decision: Option<PlacementDecision>,
    /// Whether the placement succeeded.
    pub success: bool,
}

/// Mock implementation of the Placer trait.
///
/// Never touches the filesystem. Every request is decided as a move to
/// the requested destination unless configured to abandon, and every
/// request is recorded.
///
/// # Example
///
/// ```rust,ignore
/// use arkivist_core::testing::MockPlacer;
///
/// let placer = Arc::new(MockPlacer::new());
/// let organizer = Organizer::new(config, classifier, placer.clone());
/// organizer.run().await?;
///
/// let placements = placer.recorded_placements().await;
/// assert!(placements[0].success);
/// ```
#[derive(Debug)]
pub struct MockPlacer {
    /// Recorded placements.
    placements: Arc<RwLock<Vec<RecordedPlacement>>>,
    /// If set, the next placement will fail with this error.
    next_error: Arc<RwLock<Option<PlacerError>>>,
    /// Decide `Abandon` for every request.
    abandon_all: Arc<RwLock<bool>>,
}

impl Default for MockPlacer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlacer {
    /// Create a new mock placer.
    pub fn new() -> Self {
        Self {
            placements: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            abandon_all: Arc::new(RwLock::new(false)),
        }
    }

    /// Get all recorded placements.
    pub async fn recorded_placements(&self) -> Vec<RecordedPlacement> {
        self.placements.read().await.clone()
    }

    /// Get the number of placements requested.
    pub async fn placement_count(&self) -> usize {
        self.placements.read().await.len()
    }

    /// Configure the next placement to fail with the given error.
    pub async fn set_next_error(&self, error: PlacerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every decision an `Abandon`.
    pub async fn set_abandon_all(&self, abandon: bool) {
        *self.abandon_all.write().await = abandon;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<PlacerError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Placer for MockPlacer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn decide(
        &self,
        file: &CandidateFile,
        destination: &Path,
    ) -> Result<PlacementDecision, PlacerError> {
        if *self.abandon_all.read().await {
            return Ok(PlacementDecision::Abandon {
                from: file.path.clone(),
                reason: AbandonReason::SuffixSpaceExhausted { max_suffix: 9 },
            });
        }
        Ok(PlacementDecision::Move {
            from: file.path.clone(),
            to: destination.to_path_buf(),
        })
    }

    async fn execute(&self, decision: PlacementDecision) -> Result<PlacementResult, PlacerError> {
        let method = decision.target().map(|_| MoveMethod::Rename);
        Ok(PlacementResult {
            decision,
            method,
            duration_ms: 0,
        })
    }

    async fn place(&self, request: PlacementRequest) -> Result<PlacementResult, PlacerError> {
        if let Some(err) = self.take_error().await {
            self.placements.write().await.push(RecordedPlacement {
                request,
                decision: None,
                success: false,
            });
            return Err(err);
        }

        let decision = self.decide(&request.file, &request.destination).await?;
        let result = if request.dry_run {
            PlacementResult {
                decision,
                method: None,
                duration_ms: 0,
            }
        } else {
            self.execute(decision).await?
        };

        self.placements.write().await.push(RecordedPlacement {
            request,
            decision: Some(result.decision.clone()),
            success: true,
        });

        Ok(result)
    }

    async fn validate(&self) -> Result<(), PlacerError> {
        Ok(())
    }
}
