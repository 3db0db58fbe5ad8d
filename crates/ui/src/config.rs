use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

const CONFIG_DIR: &str = "trimdeck";
const CONFIG_FILE: &str = "trimdeck.toml";

/// Dashboard configuration; every field has a default so the app starts
/// without any config file present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the video-listing service.
    pub listing_base_url: String,
    /// Page size requested from the listing service.
    pub page_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listing_base_url: String::from("http://localhost:3000"),
            page_limit: 12,
        }
    }
}

impl AppConfig {
    /// Loads the config from the platform config directory. A missing or
    /// unreadable file falls back to defaults with a warning.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(raw) => Self::parse(&raw, &path),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?path, "no config file, using defaults");
                Self::default()
            }
            Err(error) => {
                warn!(path = ?path, %error, "config unreadable, using defaults");
                Self::default()
            }
        }
    }

    fn parse(raw: &str, path: &std::path::Path) -> Self {
        match toml::from_str(raw) {
            Ok(config) => config,
            Err(error) => {
                warn!(path = ?path, %error, "config invalid, using defaults");
                Self::default()
            }
        }
    }
}

fn config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(CONFIG_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::AppConfig;

    #[test]
    fn defaults_cover_every_field() {
        let config = AppConfig::default();
        assert_eq!(config.listing_base_url, "http://localhost:3000");
        assert_eq!(config.page_limit, 12);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config = AppConfig::parse(
            r#"listing_base_url = "https://videos.example""#,
            Path::new("trimdeck.toml"),
        );

        assert_eq!(config.listing_base_url, "https://videos.example");
        assert_eq!(config.page_limit, 12);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let config = AppConfig::parse("page_limit = \"not a number\"", Path::new("trimdeck.toml"));
        assert_eq!(config, AppConfig::default());
    }
}
