use super::{types::Config, ConfigError};
use crate::metadata::ProviderConfig;

/// Validate configuration
///
/// Rejects relative roots, an empty extension set, zero suffix or chunk
/// limits, zero page scans, and provider entries with a zero timeout or a
/// non-HTTP base URL. An empty provider list is allowed.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

    if !config.library.root.is_absolute() {
        return invalid(format!(
            "library.root must be absolute: {}",
            config.library.root.display()
        ));
    }
    if let Some(archive_root) = &config.library.archive_root {
        if !archive_root.is_absolute() {
            return invalid(format!(
                "library.archive_root must be absolute: {}",
                archive_root.display()
            ));
        }
    }
    if config.library.extensions.is_empty() {
        return invalid("library.extensions cannot be empty".to_string());
    }
    if config
        .library
        .extensions
        .iter()
        .any(|e| e.trim_start_matches('.').trim().is_empty())
    {
        return invalid("library.extensions cannot contain blank entries".to_string());
    }

    if config.placement.max_suffix == 0 {
        return invalid("placement.max_suffix must be at least 1".to_string());
    }
    if config.placement.compare_chunk_size == 0 {
        return invalid("placement.compare_chunk_size cannot be 0".to_string());
    }

    if config.extraction.pages == 0 {
        return invalid("extraction.pages cannot be 0".to_string());
    }
    if config.extraction.max_file_size == 0 {
        return invalid("extraction.max_file_size cannot be 0".to_string());
    }

    for (i, provider) in config.providers.iter().enumerate() {
        if provider.timeout_secs() == 0 {
            return invalid(format!("providers[{}].timeout_secs cannot be 0", i));
        }
        let base_url = match provider {
            ProviderConfig::GoogleBooks(c) => c.base_url.as_deref(),
            ProviderConfig::OpenLibrary(c) => c.base_url.as_deref(),
        };
        if let Some(url) = base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return invalid(format!(
                    "providers[{}].base_url must be an http(s) URL: {}",
                    i, url
                ));
            }
        }
    }

    Ok(())
}
