pub mod classifier;
pub mod config;
pub mod discovery;
pub mod extractor;
pub mod isbn;
pub mod metadata;
pub mod metrics;
pub mod organizer;
pub mod placer;
pub mod planner;
pub mod testing;

pub use classifier::{Category, Classification, ClassificationOutcome, Classifier, ClassifyError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use discovery::{CandidateFile, Discovery, DiscoveryError, IdentityToken};
pub use isbn::{Isbn, IsbnError};
pub use metadata::{BibliographicRecord, BookMetadata, MetadataProvider, MetadataResolver};
pub use organizer::{
    validate_root, FileReport, FileStatus, OrganizeError, OrganizeReport, Organizer,
    OrganizerConfig,
};
pub use placer::{FsPlacer, PlacementDecision, Placer, PlacerConfig, PlacerError};
