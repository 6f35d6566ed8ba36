// src/cli.rs
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::analysis::{GeminiClient, LanguageModel};
use crate::core::{ConfigManager, FeedDocument, FeedStore, ServiceConfig};
use crate::environment::EnvironmentConfig;
use crate::feeds::{FeedFetcher, FeedNormalizer, HttpFeedFetcher, NormalizeReport};
use crate::logging::RunContext;
use crate::pipeline::{JobPipeline, PipelineDeps};
use crate::report::SmtpMailer;
use crate::types::FeedSource;
use crate::utils::{mask_secret, truncate_for_log};

#[derive(Parser, Debug)]
#[command(name = "job-digest")]
#[command(about = "Score new job postings from RSS feeds and email a daily digest")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Write logs to the log file only
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the YAML runtime configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run the full pipeline and email the report (default)
    Run,
    /// Manage and inspect the feed list
    Feeds {
        #[command(subcommand)]
        command: FeedsCommand,
    },
    /// Validate configuration and test the model and SMTP server
    Check,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum FeedsCommand {
    /// Show every configured feed
    List,
    /// Add a feed to the feed document
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value_t = 1)]
        priority: i32,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        disabled: bool,
    },
    /// Enable or disable the feed at a 1-based position
    Toggle { index: usize },
    /// Remove the feed at a 1-based position
    Remove { index: usize },
    /// Fetch every active feed and report what came back
    Test,
    /// Count recent jobs per active feed
    Jobs {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

/// Dispatch a parsed command. `Ok(false)` means the command ran but did not
/// succeed (report not delivered, a check failed, bad index).
pub async fn handle_command(command: Command, environment: EnvironmentConfig) -> Result<bool> {
    match command {
        Command::Run => run_digest(environment).await,
        Command::Feeds { command } => handle_feeds_command(command, &environment).await,
        Command::Check => run_checks(environment).await,
    }
}

async fn run_digest(environment: EnvironmentConfig) -> Result<bool> {
    let config = ConfigManager::load(environment).await?;

    info!("Candidate profile:");
    for line in config.user.profile.summary_lines() {
        info!("  {}", line);
    }
    for line in config.user.preferences.summary_lines() {
        info!("  {}", line);
    }
    info!(
        "Settings: days_back={}, max_jobs_to_analyze={}, min_match_score={}",
        config.user.settings.days_back,
        config.user.settings.max_jobs_to_analyze,
        config.user.settings.min_match_score
    );

    let deps = PipelineDeps::production(&config)?;
    let pipeline = JobPipeline::new(
        deps,
        config.feeds,
        config.user,
        config.service.email_to,
        Local::now().date_naive(),
        RunContext::new(),
    );

    let summary = pipeline.run().await;
    if !summary.delivered {
        error!("Failed to send email report");
    }
    Ok(summary.delivered)
}

pub async fn handle_feeds_command(
    command: FeedsCommand,
    environment: &EnvironmentConfig,
) -> Result<bool> {
    let store = FeedStore::new(environment.feeds_path.clone());

    match command {
        FeedsCommand::List => {
            let document = store.load_or_default().await?;
            print!("{}", format_feed_list(&document));
            Ok(true)
        }

        FeedsCommand::Add {
            name,
            url,
            priority,
            tags,
            description,
            disabled,
        } => {
            let mut document = store.load_or_default().await?;
            let mut feed = FeedSource::new(name.clone(), url)
                .with_priority(priority)
                .with_tags(tags);
            if let Some(description) = description {
                feed = feed.with_description(description);
            }
            if disabled {
                feed = feed.disabled();
            }
            document.add_feed(feed);
            store.save(&document).await?;
            println!("✅ Feed '{}' added", name);
            Ok(true)
        }

        FeedsCommand::Toggle { index } => {
            let mut document = store.load_or_default().await?;
            let Some((name, enabled)) = document
                .toggle(index)
                .map(|feed| (feed.name.clone(), feed.enabled))
            else {
                println!("❌ No feed at position {}", index);
                return Ok(false);
            };
            store.save(&document).await?;
            println!(
                "✅ Feed '{}' {}",
                name,
                if enabled { "enabled" } else { "disabled" }
            );
            Ok(true)
        }

        FeedsCommand::Remove { index } => {
            let mut document = store.load_or_default().await?;
            match document.remove(index) {
                Some(feed) => {
                    store.save(&document).await?;
                    println!("✅ Feed '{}' removed", feed.name);
                    Ok(true)
                }
                None => {
                    println!("❌ No feed at position {}", index);
                    Ok(false)
                }
            }
        }

        FeedsCommand::Test => {
            let feeds =
                ConfigManager::load_feeds(environment, |k| std::env::var(k).ok()).await?;
            let fetcher = HttpFeedFetcher::new(environment.fetch_timeout())?;
            Ok(test_feeds(&fetcher, &feeds).await)
        }

        FeedsCommand::Jobs { days } => {
            let feeds =
                ConfigManager::load_feeds(environment, |k| std::env::var(k).ok()).await?;
            let fetcher = Arc::new(HttpFeedFetcher::new(environment.fetch_timeout())?);
            let context = RunContext::new();
            let report = FeedNormalizer::new(fetcher, context.component("feeds"))
                .normalize(&feeds, days)
                .await;

            print!("{}", format_job_counts(&report, days));
            let all_reachable = report.failed_sources().next().is_none();
            Ok(all_reachable)
        }
    }
}

pub fn format_job_counts(report: &NormalizeReport, days: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nJobs in the last {} day(s):\n", days);
    for stats in &report.stats {
        match &stats.error {
            Some(e) => {
                let _ = writeln!(out, "  ❌ {}: {}", stats.name, e);
            }
            None => {
                let _ = writeln!(
                    out,
                    "  {}: {} of {} entries",
                    stats.name, stats.jobs_found, stats.total_entries
                );
            }
        }
    }
    let _ = writeln!(out, "\nTotal: {} jobs", report.postings.len());
    out
}

pub fn format_feed_list(document: &FeedDocument) -> String {
    let mut out = String::new();
    if document.feeds.is_empty() {
        out.push_str("No feeds configured.\n");
        return out;
    }

    let rule = "=".repeat(80);
    let _ = writeln!(out, "{}\n{:^80}\n{}\n", rule, "RSS FEEDS CONFIGURATION", rule);
    for (i, feed) in document.feeds.iter().enumerate() {
        let status = if feed.enabled { "✅ Enabled" } else { "❌ Disabled" };
        let _ = writeln!(out, "{}. {}", i + 1, feed.name);
        let _ = writeln!(out, "   Status: {}", status);
        let _ = writeln!(out, "   URL: {}", feed.url);
        let _ = writeln!(out, "   Priority: {}", feed.priority);
        let _ = writeln!(out, "   Tags: {}", feed.tags_display());
        let description = if feed.description.is_empty() {
            "N/A"
        } else {
            feed.description.as_str()
        };
        let _ = writeln!(out, "   Description: {}\n", description);
    }
    let _ = writeln!(out, "Total feeds: {}", document.feeds.len());
    let _ = writeln!(out, "Active feeds: {}", document.active_feeds().len());
    out
}

/// Fetch each feed once and print entry counts. True when every feed answered.
pub async fn test_feeds(fetcher: &dyn FeedFetcher, feeds: &[FeedSource]) -> bool {
    println!("\n=== Testing {} Active Feeds ===\n", feeds.len());
    let mut all_ok = true;

    for (i, feed) in feeds.iter().enumerate() {
        println!("{}. Testing: {}", i + 1, feed.name);
        println!("   URL: {}", feed.url);
        match fetcher.fetch(&feed.url).await {
            Ok(raw) => {
                if let Some(warning) = &raw.parse_warning {
                    println!("   ⚠️  Warning: {}", warning);
                }
                match raw.entries.first() {
                    Some(latest) => {
                        println!("   ✅ Success: {} entries found", raw.entries.len());
                        let title = latest.title.as_deref().unwrap_or("No title");
                        println!("   Latest: {}", truncate_for_log(title, 60));
                    }
                    None => println!("   ⚠️  No entries found (feed might be empty)"),
                }
            }
            Err(e) => {
                println!("   ❌ Error: {:#}", e);
                all_ok = false;
            }
        }
        println!();
    }
    all_ok
}

struct CheckReport {
    results: Vec<(&'static str, Result<String, String>)>,
}

impl CheckReport {
    fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    fn record(&mut self, name: &'static str, result: Result<String, String>) {
        match &result {
            Ok(detail) => println!("  ✅ {}: {}", name, detail),
            Err(reason) => println!("  ❌ {}: {}", name, reason),
        }
        self.results.push((name, result));
    }

    fn passed(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }
}

async fn run_checks(environment: EnvironmentConfig) -> Result<bool> {
    let lookup = |k: &str| std::env::var(k).ok();
    let mut report = CheckReport::new();

    println!("\nChecking configuration...\n");

    let service = ServiceConfig::from_lookup(lookup);
    report.record(
        "environment",
        service
            .as_ref()
            .map(|s| {
                format!(
                    "model {}, key {}, SMTP {}:{} as {}",
                    s.gemini_model,
                    mask_secret(&s.gemini_api_key),
                    s.smtp_server,
                    s.smtp_port,
                    s.smtp_username
                )
            })
            .map_err(|e| e.to_string()),
    );

    report.record(
        "profile",
        ConfigManager::load_user_config(&environment, lookup)
            .await
            .map(|user| {
                let mut lines = user.profile.summary_lines();
                lines.extend(user.preferences.summary_lines());
                lines.join("; ")
            })
            .map_err(|e| e.to_string()),
    );

    report.record(
        "feeds",
        ConfigManager::load_feeds(&environment, lookup)
            .await
            .map(|feeds| format!("{} active", feeds.len()))
            .map_err(|e| e.to_string()),
    );

    if let Ok(service) = &service {
        report.record("language model", check_model(service, &environment).await);
        report.record("smtp", check_smtp(service, &environment).await);
    }

    let passed = report.passed();
    println!(
        "\n{}",
        if passed {
            "✅ All checks passed"
        } else {
            "❌ Some checks failed"
        }
    );
    Ok(passed)
}

async fn check_model(
    service: &ServiceConfig,
    environment: &EnvironmentConfig,
) -> Result<String, String> {
    let attempt = async {
        let client = GeminiClient::new(
            service.gemini_api_key.clone(),
            service.gemini_model.clone(),
            environment.model_timeout(),
        )?;
        let reply = client
            .complete("Reply with the single word OK.")
            .await
            .context("Model test prompt failed")?;
        Ok::<_, anyhow::Error>(truncate_for_log(reply.trim(), 40))
    };
    attempt.await.map_err(|e| format!("{:#}", e))
}

async fn check_smtp(
    service: &ServiceConfig,
    environment: &EnvironmentConfig,
) -> Result<String, String> {
    let mailer = SmtpMailer::new(&service.smtp_settings(environment.smtp_timeout()))
        .map_err(|e| e.to_string())?;
    match mailer.test_connection().await {
        Ok(true) => Ok(format!("connected to {}", service.smtp_server)),
        Ok(false) => Err(format!("{} refused the connection", service.smtp_server)),
        Err(e) => Err(e.to_string()),
    }
}
