// src/pipeline.rs
//! One pass of the daily digest: feeds, pages, scoring, report.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use crate::analysis::{GeminiClient, LanguageModel, SuitabilityScorer};
use crate::content::{ContentFetcher, HttpPageExtractor, PageExtractor};
use crate::core::ConfigManager;
use crate::feeds::{FeedFetcher, FeedNormalizer, FeedStats, HttpFeedFetcher};
use crate::logging::{log_section, RunContext};
use crate::report::{MailTransport, ReportRenderer, ReportSender, SmtpMailer};
use crate::types::{AnalysisResult, FeedSource, RunSettings, UserConfig};

/// External collaborators of a run.
#[derive(Clone)]
pub struct PipelineDeps {
    pub feed_fetcher: Arc<dyn FeedFetcher>,
    pub page_extractor: Arc<dyn PageExtractor>,
    pub model: Arc<dyn LanguageModel>,
    pub mail: Arc<dyn MailTransport>,
}

impl PipelineDeps {
    /// Network-backed collaborators built from loaded configuration.
    pub fn production(config: &ConfigManager) -> Result<Self> {
        let env = &config.environment;
        let service = &config.service;

        let model = GeminiClient::new(
            service.gemini_api_key.clone(),
            service.gemini_model.clone(),
            env.model_timeout(),
        )
        .context("Failed to create language model client")?;
        let mail = SmtpMailer::new(&service.smtp_settings(env.smtp_timeout()))
            .context("Failed to create SMTP transport")?;

        Ok(Self {
            feed_fetcher: Arc::new(HttpFeedFetcher::new(env.fetch_timeout())?),
            page_extractor: Arc::new(HttpPageExtractor::new(env.fetch_timeout())?),
            model: Arc::new(model),
            mail: Arc::new(mail),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Postings found in the feeds, before the analysis cap.
    pub total_jobs: usize,
    pub extracted: usize,
    /// Sorted by score, highest first.
    pub analyses: Vec<AnalysisResult>,
    pub feed_stats: Vec<FeedStats>,
    pub delivered: bool,
}

impl RunSummary {
    pub fn suitable_count(&self) -> usize {
        self.analyses.iter().filter(|a| a.is_suitable()).count()
    }
}

pub struct JobPipeline {
    normalizer: FeedNormalizer,
    content: ContentFetcher,
    scorer: SuitabilityScorer,
    sender: ReportSender,
    feeds: Vec<FeedSource>,
    settings: RunSettings,
    email_to: String,
    context: RunContext,
}

impl JobPipeline {
    pub fn new(
        deps: PipelineDeps,
        feeds: Vec<FeedSource>,
        user: UserConfig,
        email_to: impl Into<String>,
        report_date: NaiveDate,
        context: RunContext,
    ) -> Self {
        Self {
            normalizer: FeedNormalizer::new(deps.feed_fetcher, context.component("feeds")),
            content: ContentFetcher::new(deps.page_extractor, context.component("content")),
            scorer: SuitabilityScorer::new(deps.model, user.profile, context.component("scorer")),
            sender: ReportSender::new(
                deps.mail,
                ReportRenderer::new(report_date),
                context.component("report"),
            ),
            feeds,
            settings: user.settings,
            email_to: email_to.into(),
            context,
        }
    }

    /// Run every stage once. Only delivery outcome is reported as failure;
    /// every earlier problem is logged and skipped.
    pub async fn run(&self) -> RunSummary {
        let span = self.context.span().clone();
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> RunSummary {
        log_section("JOB DIGEST RUN");
        info!(
            "Run {} with {} feeds, looking back {} day(s), analyzing at most {} jobs",
            self.context.run_id,
            self.feeds.len(),
            self.settings.days_back,
            self.settings.max_jobs_to_analyze
        );

        let report = self
            .normalizer
            .normalize(&self.feeds, self.settings.days_back)
            .await;
        let total_jobs = report.postings.len();
        for failed in report.failed_sources() {
            warn!("Feed {} contributed no jobs", failed.name);
        }

        let selected = &report.postings[..total_jobs.min(self.settings.max_jobs_to_analyze)];
        if selected.is_empty() {
            info!("No new jobs found");
        } else {
            info!("Analyzing {} of {} jobs", selected.len(), total_jobs);
        }

        let extracted = self.content.extract_many(selected).await;
        let analyses = self.scorer.analyze_all(&extracted).await;

        let delivered = self
            .sender
            .send_job_report(&self.email_to, &analyses, total_jobs)
            .await;

        let summary = RunSummary {
            total_jobs,
            extracted: extracted.len(),
            analyses,
            feed_stats: report.stats,
            delivered,
        };

        log_section("RUN COMPLETE");
        info!(
            "{} jobs found, {} extracted, {} analyzed, {} suitable, report {}",
            summary.total_jobs,
            summary.extracted,
            summary.analyses.len(),
            summary.suitable_count(),
            if summary.delivered { "sent" } else { "NOT sent" }
        );
        summary
    }
}
