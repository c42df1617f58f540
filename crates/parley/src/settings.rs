//! Client configuration.
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `PARLEY_`-prefixed environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Default backend URL, matching the development server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

const DEFAULT_TIMEOUT_SECS: i64 = 30;

/// Resolved client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Base URL of the chat backend.
    pub server_url: String,
    /// Where the signed-in identity is persisted.
    pub identity_path: PathBuf,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Settings {
    /// Load settings, reading `override_path` instead of the default
    /// config location when given.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("server_url", DEFAULT_SERVER_URL)?
            .set_default(
                "identity_path",
                default_identity_path().display().to_string(),
            )?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?;

        if let Some(path) = override_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        } else if let Some(path) = default_config_path() {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(Environment::with_prefix("PARLEY").try_parsing(true));

        builder
            .build()
            .context("assembling configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("parley").join("config.toml"))
}

fn default_identity_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parley")
        .join("identity.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "server_url = \"http://example.test:9000\"").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.server_url, "http://example.test:9000");
        assert_eq!(settings.timeout_secs, 30);
    }
}
