// src/core/config_manager.rs
//! Configuration loading: service credentials from the environment, feeds and
//! the candidate profile from an ordered list of providers.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::feed_store::{self, FeedStore};
use super::FsOps;
use crate::analysis::llm::DEFAULT_GEMINI_MODEL;
use crate::environment::EnvironmentConfig;
use crate::report::SmtpSettings;
use crate::types::{CandidateProfile, FeedSource, UserConfig};
use crate::utils::{mask_secret, parse_flag, split_csv};

const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

/// Fatal configuration problems, raised before the pipeline starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("No RSS feeds configured. Configure feeds in rss_feeds.json or set RSS_FEEDS")]
    NoFeeds,

    #[error(
        "No user profile configured. \
         Configure user_profile.json or set YOUR_SKILLS, YOUR_JOB_TITLES"
    )]
    NoProfile,
}

// =============================================================================
// Service credentials
// =============================================================================

#[derive(Clone)]
pub struct ServiceConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub email_to: String,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("gemini_api_key", &mask_secret(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &mask_secret(&self.smtp_password))
            .field("email_to", &self.email_to)
            .finish()
    }
}

impl ServiceConfig {
    /// Build from any key lookup. Every missing required key is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |key: &str| {
            non_empty(key).unwrap_or_else(|| {
                missing.push(key.to_string());
                String::new()
            })
        };

        let gemini_api_key = required("GEMINI_API_KEY");
        let smtp_username = required("SMTP_USERNAME");
        let smtp_password = required("SMTP_PASSWORD");
        let email_to = required("EMAIL_TO");

        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing));
        }

        let smtp_port = match non_empty("SMTP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "SMTP_PORT".to_string(),
                    value: raw.clone(),
                })?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            gemini_api_key,
            gemini_model: non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            smtp_server: non_empty("SMTP_SERVER")
                .unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            smtp_port,
            smtp_username,
            smtp_password,
            email_to,
        })
    }

    pub fn smtp_settings(&self, timeout: Duration) -> SmtpSettings {
        SmtpSettings {
            server: self.smtp_server.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            timeout,
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

// =============================================================================
// Providers
// =============================================================================

/// One source of a configuration value. `Ok(None)` means "not configured here".
#[async_trait]
pub trait ConfigProvider<T: Send>: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self) -> Result<Option<T>>;
}

/// Try providers in order; the first one yielding a value wins. Provider
/// errors are logged and the next provider is tried.
pub async fn load_first<T: Send>(providers: &[Box<dyn ConfigProvider<T>>]) -> Option<T> {
    for provider in providers {
        match provider.load().await {
            Ok(Some(value)) => {
                info!("Loaded configuration from {}", provider.name());
                return Some(value);
            }
            Ok(None) => warn!("Nothing configured in {}", provider.name()),
            Err(e) => warn!("Failed to load {}: {:#}", provider.name(), e),
        }
    }
    None
}

pub struct JsonFeedProvider {
    store: FeedStore,
}

impl JsonFeedProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: FeedStore::new(path),
        }
    }
}

#[async_trait]
impl ConfigProvider<Vec<FeedSource>> for JsonFeedProvider {
    fn name(&self) -> &str {
        "feed document"
    }

    async fn load(&self) -> Result<Option<Vec<FeedSource>>> {
        Ok(self
            .store
            .load()
            .await?
            .map(|doc| doc.feeds)
            .filter(|feeds| !feeds.is_empty()))
    }
}

/// Comma-separated URLs, as found in `RSS_FEEDS`.
pub struct EnvFeedProvider {
    value: Option<String>,
}

impl EnvFeedProvider {
    pub fn new(value: Option<String>) -> Self {
        Self { value }
    }
}

#[async_trait]
impl ConfigProvider<Vec<FeedSource>> for EnvFeedProvider {
    fn name(&self) -> &str {
        "RSS_FEEDS"
    }

    async fn load(&self) -> Result<Option<Vec<FeedSource>>> {
        let urls = self.value.as_deref().map(split_csv).unwrap_or_default();
        if urls.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            urls.iter()
                .enumerate()
                .map(|(i, url)| FeedSource::from_bare_url(url, i + 1))
                .collect(),
        ))
    }
}

pub struct JsonProfileProvider {
    path: PathBuf,
}

impl JsonProfileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigProvider<UserConfig> for JsonProfileProvider {
    fn name(&self) -> &str {
        "profile document"
    }

    async fn load(&self) -> Result<Option<UserConfig>> {
        FsOps::read_json(&self.path).await
    }
}

/// Profile assembled from the `YOUR_*` variables.
#[derive(Debug, Default)]
pub struct EnvProfileProvider {
    pub skills: Option<String>,
    pub experience_years: Option<String>,
    pub preferred_locations: Option<String>,
    pub job_titles: Option<String>,
}

impl EnvProfileProvider {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            skills: lookup("YOUR_SKILLS"),
            experience_years: lookup("YOUR_EXPERIENCE_YEARS"),
            preferred_locations: lookup("YOUR_PREFERRED_LOCATIONS"),
            job_titles: lookup("YOUR_JOB_TITLES"),
        }
    }
}

#[async_trait]
impl ConfigProvider<UserConfig> for EnvProfileProvider {
    fn name(&self) -> &str {
        "YOUR_* variables"
    }

    async fn load(&self) -> Result<Option<UserConfig>> {
        let list = |value: &Option<String>| value.as_deref().map(split_csv).unwrap_or_default();

        let skills = list(&self.skills);
        let job_titles = list(&self.job_titles);
        if skills.is_empty() && job_titles.is_empty() {
            return Ok(None);
        }

        let profile = CandidateProfile {
            skills,
            job_titles,
            experience_years: self
                .experience_years
                .as_deref()
                .and_then(|v| v.trim().parse().ok()),
            preferred_locations: list(&self.preferred_locations),
            ..Default::default()
        };

        Ok(Some(UserConfig {
            profile,
            ..Default::default()
        }))
    }
}

// =============================================================================
// Manager
// =============================================================================

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub service: ServiceConfig,
    /// Enabled feeds, ascending priority.
    pub feeds: Vec<FeedSource>,
    pub user: UserConfig,
}

impl ConfigManager {
    /// Load everything a run needs from the process environment.
    pub async fn load(environment: EnvironmentConfig) -> Result<Self, ConfigError> {
        Self::load_with(environment, env_lookup).await
    }

    pub async fn load_with<F>(
        environment: EnvironmentConfig,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let feeds = Self::load_feeds(&environment, &lookup).await?;
        let user = Self::load_user_config(&environment, &lookup).await?;
        let service = ServiceConfig::from_lookup(&lookup)?;

        info!(
            "Configuration loaded: {} active feeds, model {}, report to {}",
            feeds.len(),
            service.gemini_model,
            service.email_to
        );

        Ok(Self {
            environment,
            service,
            feeds,
            user,
        })
    }

    /// Active feeds from the JSON document or `RSS_FEEDS`, JSON first unless
    /// `USE_JSON_FEEDS=false`.
    pub async fn load_feeds<F>(
        environment: &EnvironmentConfig,
        lookup: F,
    ) -> Result<Vec<FeedSource>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let json: Box<dyn ConfigProvider<Vec<FeedSource>>> =
            Box::new(JsonFeedProvider::new(environment.feeds_path.clone()));
        let env: Box<dyn ConfigProvider<Vec<FeedSource>>> =
            Box::new(EnvFeedProvider::new(lookup("RSS_FEEDS")));

        let prefer_json = parse_flag(lookup("USE_JSON_FEEDS").as_deref(), true);
        let providers = if prefer_json { vec![json, env] } else { vec![env, json] };

        let feeds = load_first(&providers).await.ok_or(ConfigError::NoFeeds)?;
        let active = feed_store::active_feeds(&feeds);
        if active.is_empty() {
            return Err(ConfigError::NoFeeds);
        }
        Ok(active)
    }

    /// Profile from the JSON document or the `YOUR_*` variables, JSON first
    /// unless `USE_JSON_PROFILE=false`.
    pub async fn load_user_config<F>(
        environment: &EnvironmentConfig,
        lookup: F,
    ) -> Result<UserConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let json: Box<dyn ConfigProvider<UserConfig>> =
            Box::new(JsonProfileProvider::new(environment.profile_path.clone()));
        let env: Box<dyn ConfigProvider<UserConfig>> =
            Box::new(EnvProfileProvider::from_lookup(&lookup));

        let prefer_json = parse_flag(lookup("USE_JSON_PROFILE").as_deref(), true);
        let providers = if prefer_json { vec![json, env] } else { vec![env, json] };

        load_first(&providers).await.ok_or(ConfigError::NoProfile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const CREDENTIALS: &[(&str, &str)] = &[
        ("GEMINI_API_KEY", "key-123456"),
        ("SMTP_USERNAME", "me@example.com"),
        ("SMTP_PASSWORD", "hunter22"),
        ("EMAIL_TO", "me@example.com"),
    ];

    fn environment_in(dir: &std::path::Path) -> EnvironmentConfig {
        EnvironmentConfig {
            feeds_path: dir.join("rss_feeds.json"),
            profile_path: dir.join("user_profile.json"),
            log_path: dir.join("job_digest.log"),
            ..Default::default()
        }
    }

    #[test]
    fn test_service_defaults() {
        let service = ServiceConfig::from_lookup(lookup_from(CREDENTIALS)).unwrap();
        assert_eq!(service.smtp_server, "smtp.gmail.com");
        assert_eq!(service.smtp_port, 587);
        assert_eq!(service.gemini_model, "gemini-pro");
        let debug = format!("{:?}", service);
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_missing_variables_all_listed() {
        let lookup = lookup_from(&[("SMTP_PASSWORD", "x"), ("EMAIL_TO", " ")]);
        let err = ServiceConfig::from_lookup(lookup).unwrap_err();
        match err {
            ConfigError::MissingVariables(names) => {
                assert_eq!(names, vec!["GEMINI_API_KEY", "SMTP_USERNAME", "EMAIL_TO"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("SMTP_PORT", "smtp"));
        let err = ServiceConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "SMTP_PORT"));
    }

    #[tokio::test]
    async fn test_env_feeds_normalized_to_sources() {
        let provider =
            EnvFeedProvider::new(Some("https://a.example/rss, ,https://b.example/rss".into()));
        let feeds = provider.load().await.unwrap().unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[1].name, "Feed 2");
        assert_eq!(feeds[1].priority, 2);
        assert!(feeds[1].enabled);

        assert!(EnvFeedProvider::new(None).load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_feed_provider_order() {
        let dir = tempfile::tempdir().unwrap();
        let environment = environment_in(dir.path());
        std::fs::write(
            &environment.feeds_path,
            r#"{"feeds": [
                {"name": "Json B", "url": "https://b.example/rss", "priority": 2},
                {"name": "Json A", "url": "https://a.example/rss", "priority": 1},
                {"name": "Json Off", "url": "https://off.example/rss", "enabled": false}
            ]}"#,
        )
        .unwrap();

        let pairs = [("RSS_FEEDS", "https://env.example/rss")];
        let feeds = ConfigManager::load_feeds(&environment, lookup_from(&pairs)).await.unwrap();
        let names: Vec<&str> = feeds.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Json A", "Json B"]);

        let pairs = [("RSS_FEEDS", "https://env.example/rss"), ("USE_JSON_FEEDS", "false")];
        let feeds = ConfigManager::load_feeds(&environment, lookup_from(&pairs)).await.unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].url, "https://env.example/rss");
    }

    #[tokio::test]
    async fn test_malformed_json_falls_back_to_env() {
        let dir = tempfile::tempdir().unwrap();
        let environment = environment_in(dir.path());
        std::fs::write(&environment.feeds_path, "{broken").unwrap();

        let pairs = [("RSS_FEEDS", "https://env.example/rss")];
        let feeds = ConfigManager::load_feeds(&environment, lookup_from(&pairs)).await.unwrap();
        assert_eq!(feeds[0].name, "Feed 1");
    }

    #[tokio::test]
    async fn test_no_feeds_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let environment = environment_in(dir.path());
        let err = ConfigManager::load_feeds(&environment, lookup_from(&[])).await.unwrap_err();
        assert!(matches!(err, ConfigError::NoFeeds));
    }

    #[tokio::test]
    async fn test_profile_provider_order() {
        let dir = tempfile::tempdir().unwrap();
        let environment = environment_in(dir.path());
        std::fs::write(
            &environment.profile_path,
            r#"{"profile": {"skills": ["Rust"], "experience_years": 7},
                "settings": {"max_jobs_to_analyze": 5}}"#,
        )
        .unwrap();

        let pairs = [
            ("YOUR_SKILLS", "Go, SQL"),
            ("YOUR_EXPERIENCE_YEARS", "three"),
            ("YOUR_JOB_TITLES", "Backend Engineer"),
        ];
        let user = ConfigManager::load_user_config(&environment, lookup_from(&pairs))
            .await
            .unwrap();
        assert_eq!(user.profile.skills, vec!["Rust"]);
        assert_eq!(user.settings.max_jobs_to_analyze, 5);
        assert_eq!(user.settings.days_back, 1);

        let mut pairs = pairs.to_vec();
        pairs.push(("USE_JSON_PROFILE", "FALSE"));
        let user = ConfigManager::load_user_config(&environment, lookup_from(&pairs))
            .await
            .unwrap();
        assert_eq!(user.profile.skills, vec!["Go", "SQL"]);
        assert_eq!(user.profile.experience_years, None);
        assert_eq!(user.profile.job_titles, vec!["Backend Engineer"]);
        assert_eq!(user.settings.max_jobs_to_analyze, 20);
    }

    #[tokio::test]
    async fn test_no_profile_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let environment = environment_in(dir.path());
        let err = ConfigManager::load_user_config(&environment, lookup_from(&[("YOUR_SKILLS", "")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoProfile));
    }

    #[tokio::test]
    async fn test_full_load() {
        let dir = tempfile::tempdir().unwrap();
        let environment = environment_in(dir.path());
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("RSS_FEEDS", "https://env.example/rss"));
        pairs.push(("YOUR_SKILLS", "Rust"));

        let config = ConfigManager::load_with(environment, lookup_from(&pairs)).await.unwrap();
        assert_eq!(config.feeds.len(), 1);
        assert_eq!(config.user.profile.skills, vec!["Rust"]);
        assert_eq!(config.service.email_to, "me@example.com");
    }
}
