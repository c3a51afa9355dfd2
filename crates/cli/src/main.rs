use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arkivist_core::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use arkivist_core::{
    load_config, metrics, validate_config, Config, OrganizeReport, Organizer, SanitizedConfig,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    // Load configuration before logging: it decides the log format
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    init_logging(config.logging.json);
    info!("arkivist {} starting", VERSION);
    info!("Loaded configuration from {:?}", config_path);

    validate_config(&config).context("Configuration validation failed")?;
    log_config(&config);

    let organizer = Organizer::from_config(&config).context("Failed to build organizer")?;
    let report = organizer.run().await.context("Organize run aborted")?;

    println!("{}", report.summary());

    if let Some(path) = &config.organizer.report_path {
        write_report(&report, path).await?;
        info!("Report written to {:?}", path);
    }
    if let Some(path) = &config.organizer.metrics_path {
        let text = metrics::encode_metrics().context("Failed to encode metrics")?;
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
        info!("Metrics written to {:?}", path);
    }

    if report.has_failures() {
        warn!("{} file(s) could not be organized", report.counts.failed);
    }

    Ok(())
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn log_config(config: &Config) {
    let sanitized = SanitizedConfig::from(config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));

    info!("Library root: {:?}", config.library.root);
    info!("Archive root: {:?}", config.archive_root());
    info!(
        "Providers: {:?}",
        config.providers.iter().map(|p| p.kind()).collect::<Vec<_>>()
    );
    if config.organizer.dry_run {
        info!("Dry run: no file will be moved");
    }
    debug!("Configuration {}: {}", &config_hash[..16], config_json);
}

async fn write_report(report: &OrganizeReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write report to {:?}", path))
}
