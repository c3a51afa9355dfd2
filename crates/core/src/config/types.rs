use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::extractor::ExtractionConfig;
use crate::metadata::{default_providers, ProviderConfig};
use crate::organizer::OrganizerConfig;
use crate::placer::PlacerConfig;

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub placement: PlacerConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Metadata providers, in the order they are asked.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub organizer: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Where filed books go. Defaults to the library root.
    pub fn archive_root(&self) -> PathBuf {
        self.library
            .archive_root
            .clone()
            .unwrap_or_else(|| self.library.root.clone())
    }

    pub fn organizer_config(&self) -> OrganizerConfig {
        OrganizerConfig {
            root: self.library.root.clone(),
            archive_root: self.archive_root(),
            extensions: self.library.extensions.clone(),
            follow_links: self.library.follow_links,
            dry_run: self.organizer.dry_run,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory scanned for books. Must be absolute.
    pub root: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_root: Option<PathBuf>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub follow_links: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["pdf".to_string(), "epub".to_string()]
}

/// Per-run switches and outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Decide everything, move nothing.
    #[serde(default)]
    pub dry_run: bool,
    /// Write the JSON run report here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    /// Write Prometheus text metrics here after the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub library: LibraryConfig,
    pub placement: PlacerConfig,
    pub extraction: ExtractionConfig,
    pub providers: Vec<SanitizedProviderConfig>,
    pub organizer: RunConfig,
    pub logging: LoggingConfig,
}

/// Provider entry with the API key hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&ProviderConfig> for SanitizedProviderConfig {
    fn from(config: &ProviderConfig) -> Self {
        let (base_url, api_key_configured) = match config {
            ProviderConfig::GoogleBooks(c) => (
                c.base_url.clone(),
                c.api_key.as_deref().map(|k| !k.is_empty()).unwrap_or(false),
            ),
            ProviderConfig::OpenLibrary(c) => (c.base_url.clone(), false),
        };
        Self {
            kind: config.kind().to_string(),
            base_url,
            api_key_configured,
            timeout_secs: config.timeout_secs(),
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            library: config.library.clone(),
            placement: config.placement.clone(),
            extraction: config.extraction.clone(),
            providers: config.providers.iter().map(Into::into).collect(),
            organizer: config.organizer.clone(),
            logging: config.logging.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[library]
root = "/srv/books"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.library.root, PathBuf::from("/srv/books"));
        assert_eq!(config.library.extensions, vec!["pdf", "epub"]);
        assert!(!config.library.follow_links);
        assert_eq!(config.archive_root(), PathBuf::from("/srv/books"));
        assert_eq!(config.placement.max_suffix, 9);
        assert_eq!(config.extraction.pages, 5);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].kind(), "google_books");
        assert_eq!(config.providers[1].kind(), "open_library");
        assert!(!config.organizer.dry_run);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_deserialize_missing_library_fails() {
        let toml = r#"
[organizer]
dry_run = true
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_empty_provider_list() {
        let toml = r#"
providers = []

[library]
root = "/srv/books"
archive_root = "/srv/archive"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.providers.is_empty());
        assert_eq!(config.archive_root(), PathBuf::from("/srv/archive"));
    }

    #[test]
    fn test_organizer_config_from_sections() {
        let toml = r#"
[library]
root = "/srv/books"
extensions = ["pdf"]
follow_links = true

[organizer]
dry_run = true
report_path = "/tmp/report.json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let organizer = config.organizer_config();
        assert_eq!(organizer.root, PathBuf::from("/srv/books"));
        assert_eq!(organizer.archive_root, PathBuf::from("/srv/books"));
        assert_eq!(organizer.extensions, vec!["pdf"]);
        assert!(organizer.follow_links);
        assert!(organizer.dry_run);
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let toml = r#"
[library]
root = "/srv/books"

[[providers]]
kind = "google_books"
api_key = "super-secret"

[[providers]]
kind = "open_library"
base_url = "http://localhost:9000"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.providers[0].api_key_configured);
        assert!(!sanitized.providers[1].api_key_configured);
        assert_eq!(
            sanitized.providers[1].base_url.as_deref(),
            Some("http://localhost:9000")
        );

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
    }
}
