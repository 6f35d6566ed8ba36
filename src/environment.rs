// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::content::extractor::DEFAULT_FETCH_TIMEOUT_SECS;

const DEFAULT_CONFIG_FILE: &str = "job_digest.yaml";

/// Paths and timeouts for one deployment environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub feeds_path: PathBuf,
    pub profile_path: PathBuf,
    pub log_path: PathBuf,
    pub fetch_timeout_secs: u64,
    pub model_timeout_secs: u64,
    pub smtp_timeout_secs: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            feeds_path: PathBuf::from("rss_feeds.json"),
            profile_path: PathBuf::from("user_profile.json"),
            log_path: PathBuf::from("job_digest.log"),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            model_timeout_secs: 60,
            smtp_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: Option<EnvironmentConfig>,
    #[serde(default)]
    production: Option<EnvironmentConfig>,
}

impl EnvironmentConfig {
    /// Load from `config_path`, else `$JOB_DIGEST_CONFIG`, else `job_digest.yaml`,
    /// picking the section named by `JOB_DIGEST_ENV`. A missing file means defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path
            .or_else(|| std::env::var("JOB_DIGEST_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::load_from(&config_path, &Self::get_environment())
    }

    fn get_environment() -> String {
        std::env::var("JOB_DIGEST_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn load_from(config_path: &Path, environment: &str) -> Result<Self> {
        let base_dir = std::env::current_dir().context("Failed to get current directory")?;

        if !config_path.exists() {
            return Ok(Self::default().resolved(&base_dir));
        }

        let config_content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config_file: ConfigFile = serde_yaml::from_str(&config_content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        }
        .unwrap_or_default();

        Ok(env_config.resolved(&base_dir))
    }

    /// Make relative paths absolute against `base_dir`.
    fn resolved(self, base_dir: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        Self {
            feeds_path: resolve(self.feeds_path),
            profile_path: resolve(self.profile_path),
            log_path: resolve(self.log_path),
            ..self
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_secs)
    }
}
