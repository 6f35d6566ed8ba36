// src/logging.rs
//! Subscriber setup and the per-run logging context.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, info_span, Span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

const SEPARATOR_WIDTH: usize = 60;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub file: PathBuf,
    pub console: bool,
    /// Used when `RUST_LOG` is not set.
    pub default_directive: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("job_digest.log"),
            console: true,
            default_directive: "info".to_string(),
        }
    }
}

/// Install the file + console subscriber. Fails if one is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)
        .with_context(|| format!("Failed to open log file {}", config.file.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_directive))
        .context("Invalid log directive")?;

    let console = config
        .console
        .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .with(console)
        .try_init()
        .context("Logging already initialized")?;

    info!("Log file: {}", config.file.display());
    Ok(())
}

/// Logging context handed to each pipeline component at construction.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    span: Span,
}

impl RunContext {
    pub fn new() -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            span: info_span!("run", run_id = %run_id),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Child span for one component, e.g. `"feeds"` or `"scorer"`.
    pub fn component(&self, name: &'static str) -> Span {
        info_span!(parent: &self.span, "component", component = name)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_separator(ch: char) {
    info!("{}", ch.to_string().repeat(SEPARATOR_WIDTH));
}

pub fn log_section(title: &str) {
    info!("");
    log_separator('=');
    info!("  {}", title);
    log_separator('=');
}

pub fn log_total_summary(total_jobs: usize, feed_count: usize) {
    log_separator('-');
    info!("TOTAL: {} jobs from {} feeds", total_jobs, feed_count);
    log_separator('-');
}
