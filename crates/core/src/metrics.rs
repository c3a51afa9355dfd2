//! Prometheus metrics for an organize run.
//!
//! Counters cover discovery, classification, provider lookups, placement
//! decisions, and per-file failures. [`encode_metrics`] renders the
//! registry in text exposition format for the CLI's `metrics_path`.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::warn;

/// Registry holding every metric below.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }
    registry
});

// =============================================================================
// Discovery and classification
// =============================================================================

/// Candidate files yielded by discovery.
pub static FILES_DISCOVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "arkivist_files_discovered_total",
        "Total candidate files discovered",
    )
    .unwrap()
});

/// Classification outcomes.
pub static CLASSIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "arkivist_classifications_total",
            "Total classifications by outcome",
        ),
        &["outcome"], // "classified", "no_isbn", "no_metadata"
    )
    .unwrap()
});

/// Metadata provider lookups.
pub static PROVIDER_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "arkivist_provider_lookups_total",
            "Total metadata provider lookups",
        ),
        &["provider", "result"], // result: "found", "incomplete", "empty", "error"
    )
    .unwrap()
});

// =============================================================================
// Placement
// =============================================================================

/// Placement decisions.
pub static PLACEMENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("arkivist_placements_total", "Total placement decisions"),
        &["decision"], // "noop", "move", "move_with_suffix", "abandon"
    )
    .unwrap()
});

/// Files skipped because of an error.
pub static FILE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("arkivist_file_failures_total", "Total per-file failures"),
        &["kind"],
    )
    .unwrap()
});

/// Wall time spent on one file, classification through placement.
pub static FILE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "arkivist_file_duration_seconds",
            "Duration of processing one candidate file",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0, 60.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(FILES_DISCOVERED.clone()),
        Box::new(CLASSIFICATIONS.clone()),
        Box::new(PROVIDER_LOOKUPS.clone()),
        Box::new(PLACEMENTS.clone()),
        Box::new(FILE_FAILURES.clone()),
        Box::new(FILE_DURATION.clone()),
    ]
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
