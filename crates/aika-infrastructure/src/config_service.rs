//! Configuration service implementation.
//!
//! Loads [`AikaConfig`] from `config.toml` and applies environment
//! overrides on top.

use aika_core::Result;
use aika_core::config::{AikaConfig, normalize_base_url};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "AIKA_API_URL";

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration using the process environment.
    pub fn load(&self) -> Result<AikaConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Loads the configuration, resolving overrides through `env`.
    ///
    /// A missing or empty file yields the defaults. A file that does not
    /// parse is an error.
    pub fn load_with_env<F>(&self, env: F) -> Result<AikaConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => AikaConfig::default(),
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No config file, using defaults");
                AikaConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(url) = env(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            tracing::debug!(url = %url, "Backend URL overridden from environment");
            config.api.base_url = url;
        }
        config.api.base_url = normalize_base_url(&config.api.base_url);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));

        let config = service.load_with_env(no_env).unwrap();
        assert_eq!(config, AikaConfig::default());
    }

    #[test]
    fn test_file_values_and_env_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "http://10.0.0.5:8000/"

[chat]
temperature = 0.7
"#,
        )
        .unwrap();
        let service = ConfigService::new(&path);

        let config = service.load_with_env(no_env).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.chat.temperature, 0.7);

        let config = service
            .load_with_env(|key| (key == API_URL_ENV).then(|| "aika.example.com".to_string()))
            .unwrap();
        assert_eq!(config.api.base_url, "https://aika.example.com");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[api\nbase_url = ").unwrap();

        let err = ConfigService::new(&path).load_with_env(no_env).unwrap_err();
        assert!(err.is_serialization());
    }
}
