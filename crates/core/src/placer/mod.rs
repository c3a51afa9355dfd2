//! Placement engine: decides what to do with a classified file and does it.
//!
//! A decision compares the file with whatever already occupies its
//! canonical destination:
//!
//! - same storage object, at the destination or a suffixed slot: nothing to do
//! - free destination: move
//! - byte-identical content already there: nothing to do, source kept
//! - different content: move to the first free `name_N.ext`, or abandon
//!   once `max_suffix` slots are taken
//!
//! Moves are a single rename on one volume. Across volumes the file is
//! copied, verified byte for byte, and only then removed from its source.
//!
//! # Example
//!
//! ```ignore
//! use arkivist_core::placer::{FsPlacer, Placer, PlacementRequest};
//!
//! let placer = FsPlacer::with_defaults();
//! let result = placer
//!     .place(PlacementRequest { file, destination, dry_run: false })
//!     .await?;
//! println!("{}", result.decision);
//! ```

mod compare;
mod config;
mod error;
mod fs_placer;
mod locks;
mod traits;
mod types;

pub use compare::files_identical;
pub use config::PlacerConfig;
pub use error::PlacerError;
pub use fs_placer::{suffixed, FsPlacer};
pub use locks::{DirectoryGuard, DirectoryLocks};
pub use traits::Placer;
pub use types::{
    AbandonReason, MoveMethod, NoOpReason, PlacementDecision, PlacementRequest, PlacementResult,
};
