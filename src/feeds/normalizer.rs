// src/feeds/normalizer.rs
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument, Span};

use super::fetcher::{FeedFetcher, RawEntry};
use crate::logging::{log_section, log_total_summary};
use crate::types::{FeedSource, JobPosting};
use crate::utils::truncate_for_log;

/// Outcome for one source, kept for the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedStats {
    pub name: String,
    pub url: String,
    pub total_entries: usize,
    pub jobs_found: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub postings: Vec<JobPosting>,
    pub stats: Vec<FeedStats>,
}

impl NormalizeReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &FeedStats> {
        self.stats.iter().filter(|s| s.error.is_some())
    }
}

/// Turns configured feed sources into a flat list of recent postings.
pub struct FeedNormalizer {
    fetcher: Arc<dyn FeedFetcher>,
    span: Span,
}

impl FeedNormalizer {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, span: Span) -> Self {
        Self { fetcher, span }
    }

    /// Collect postings newer than `lookback_days`, in source order then
    /// entry order. A failing source is logged and contributes nothing.
    pub async fn normalize(&self, sources: &[FeedSource], lookback_days: u32) -> NormalizeReport {
        self.normalize_at(sources, lookback_days, Utc::now()).await
    }

    pub async fn normalize_at(
        &self,
        sources: &[FeedSource],
        lookback_days: u32,
        now: DateTime<Utc>,
    ) -> NormalizeReport {
        self.collect(sources, lookback_days, now)
            .instrument(self.span.clone())
            .await
    }

    async fn collect(
        &self,
        sources: &[FeedSource],
        lookback_days: u32,
        now: DateTime<Utc>,
    ) -> NormalizeReport {
        // A lookback reaching past the representable range means no cutoff.
        let cutoff = now
            .checked_sub_signed(Duration::days(i64::from(lookback_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut report = NormalizeReport::default();

        log_section("RSS FEED PARSING");
        info!(
            "Parsing {} RSS feeds (looking back {} day(s))",
            sources.len(),
            lookback_days
        );
        info!("Cutoff date: {}", cutoff.format("%Y-%m-%d %H:%M:%S"));

        for (idx, source) in sources.iter().enumerate() {
            info!(
                "[Feed {}/{}] Processing: {}",
                idx + 1,
                sources.len(),
                source.name
            );
            info!("  URL: {}", source.url);

            let feed = match self.fetcher.fetch(&source.url).await {
                Ok(feed) => feed,
                Err(e) => {
                    error!("  Error parsing feed {}: {:#}", source.name, e);
                    report.stats.push(FeedStats {
                        name: source.name.clone(),
                        url: source.url.clone(),
                        total_entries: 0,
                        jobs_found: 0,
                        error: Some(format!("{:#}", e)),
                    });
                    continue;
                }
            };

            if let Some(warning) = &feed.parse_warning {
                warn!("  Feed parsing warning: {}", warning);
            }

            let total_entries = feed.entries.len();
            info!("  Total entries in feed: {}", total_entries);

            let mut jobs_found = 0;
            for (entry_idx, entry) in feed.entries.into_iter().enumerate() {
                let entry_title = entry.title.clone().unwrap_or_default();
                match to_posting(entry, cutoff, &source.name) {
                    Some(posting) => {
                        info!(
                            "    [{}] Job: {}",
                            entry_idx + 1,
                            truncate_for_log(&posting.title, 60)
                        );
                        debug!("        Link: {}", posting.link);
                        report.postings.push(posting);
                        jobs_found += 1;
                    }
                    None => debug!(
                        "    [{}] Skipped (too old): {}",
                        entry_idx + 1,
                        truncate_for_log(&entry_title, 40)
                    ),
                }
            }

            info!(
                "  Summary: {} jobs found from {} entries",
                jobs_found, total_entries
            );
            report.stats.push(FeedStats {
                name: source.name.clone(),
                url: source.url.clone(),
                total_entries,
                jobs_found,
                error: None,
            });
        }

        log_section("FEED PARSING SUMMARY");
        for stats in &report.stats {
            match &stats.error {
                Some(e) => info!("  {}: ERROR - {}", stats.name, e),
                None => info!(
                    "  {}: {} jobs from {} entries",
                    stats.name, stats.jobs_found, stats.total_entries
                ),
            }
        }
        log_total_summary(report.postings.len(), sources.len());

        report
    }
}

/// Published time falls back to updated time. Undated entries are kept.
fn to_posting(entry: RawEntry, cutoff: DateTime<Utc>, feed_name: &str) -> Option<JobPosting> {
    let published = entry.published.or(entry.updated);
    if matches!(published, Some(ts) if ts < cutoff) {
        return None;
    }

    Some(JobPosting {
        title: entry.title.unwrap_or_else(|| "No Title".to_string()),
        link: entry.link.unwrap_or_default(),
        published,
        summary: entry.summary.unwrap_or_default(),
        source_feed: feed_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::RawFeed;
    use crate::test_support::MockFeedFetcher;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn entry(title: &str, published: Option<DateTime<Utc>>) -> RawEntry {
        RawEntry {
            title: Some(title.to_string()),
            link: Some(format!("https://jobs.example/{}", title)),
            published,
            ..Default::default()
        }
    }

    fn feed(entries: Vec<RawEntry>) -> RawFeed {
        RawFeed {
            entries,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cutoff_filters_only_dated_entries() {
        let old = now() - Duration::days(3);
        let fresh = now() - Duration::hours(2);
        let fetcher = MockFeedFetcher::new().with_feed(
            "https://a.example/rss",
            feed(vec![
                entry("old", Some(old)),
                entry("fresh", Some(fresh)),
                entry("undated", None),
            ]),
        );
        let normalizer = FeedNormalizer::new(Arc::new(fetcher), Span::none());
        let sources = [FeedSource::new("A", "https://a.example/rss")];

        let report = normalizer.normalize_at(&sources, 1, now()).await;
        let titles: Vec<&str> = report.postings.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["fresh", "undated"]);

        // Undated entries survive any lookback, even zero days.
        let report = normalizer.normalize_at(&sources, 0, now()).await;
        let titles: Vec<&str> = report.postings.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["undated"]);

        let report = normalizer.normalize_at(&sources, 30, now()).await;
        assert_eq!(report.postings.len(), 3);
        assert_eq!(report.stats[0].total_entries, 3);
        assert_eq!(report.stats[0].jobs_found, 3);
    }

    #[tokio::test]
    async fn test_huge_lookback_keeps_everything() {
        let ancient = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let fetcher = MockFeedFetcher::new().with_feed(
            "https://a.example/rss",
            feed(vec![entry("ancient", Some(ancient)), entry("undated", None)]),
        );
        let normalizer = FeedNormalizer::new(Arc::new(fetcher), Span::none());
        let sources = [FeedSource::new("A", "https://a.example/rss")];

        let report = normalizer.normalize_at(&sources, u32::MAX, now()).await;
        assert_eq!(report.postings.len(), 2);
        assert!(report.failed_sources().next().is_none());
    }

    #[tokio::test]
    async fn test_repaired_feed_is_kept() {
        let fetcher = MockFeedFetcher::new().with_feed(
            "https://a.example/rss",
            RawFeed {
                entries: vec![entry("repaired", None)],
                parse_warning: Some("unescaped ampersand".to_string()),
                ..Default::default()
            },
        );
        let normalizer = FeedNormalizer::new(Arc::new(fetcher), Span::none());
        let sources = [FeedSource::new("A", "https://a.example/rss")];

        let report = normalizer.normalize_at(&sources, 1, now()).await;
        assert_eq!(report.postings.len(), 1);
        assert_eq!(report.stats[0].jobs_found, 1);
        assert!(report.stats[0].error.is_none());
    }

    #[tokio::test]
    async fn test_updated_is_fallback_timestamp() {
        let old = now() - Duration::days(10);
        let fetcher = MockFeedFetcher::new().with_feed(
            "https://a.example/rss",
            feed(vec![
                RawEntry {
                    title: Some("stale".to_string()),
                    updated: Some(old),
                    ..Default::default()
                },
                RawEntry {
                    title: Some("published wins".to_string()),
                    published: Some(now()),
                    updated: Some(old),
                    ..Default::default()
                },
            ]),
        );
        let normalizer = FeedNormalizer::new(Arc::new(fetcher), Span::none());

        let report = normalizer
            .normalize_at(&[FeedSource::new("A", "https://a.example/rss")], 1, now())
            .await;
        assert_eq!(report.postings.len(), 1);
        assert_eq!(report.postings[0].title, "published wins");
        assert_eq!(report.postings[0].published, Some(now()));
    }

    #[tokio::test]
    async fn test_missing_fields_get_defaults() {
        let fetcher = MockFeedFetcher::new()
            .with_feed("https://a.example/rss", feed(vec![RawEntry::default()]));
        let normalizer = FeedNormalizer::new(Arc::new(fetcher), Span::none());

        let report = normalizer
            .normalize_at(&[FeedSource::new("Board", "https://a.example/rss")], 1, now())
            .await;
        let posting = &report.postings[0];
        assert_eq!(posting.title, "No Title");
        assert_eq!(posting.link, "");
        assert_eq!(posting.summary, "");
        assert_eq!(posting.source_feed, "Board");
        assert!(posting.published.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_source_is_skipped() {
        let fetcher = MockFeedFetcher::new()
            .with_feed(
                "https://a.example/rss",
                feed(vec![entry("a1", Some(now())), entry("a2", None)]),
            )
            .with_failure("https://down.example/rss", "connection refused")
            .with_feed("https://c.example/rss", feed(vec![entry("c1", None)]));
        let normalizer = FeedNormalizer::new(Arc::new(fetcher), Span::none());
        let sources = [
            FeedSource::new("A", "https://a.example/rss"),
            FeedSource::new("Down", "https://down.example/rss"),
            FeedSource::new("C", "https://c.example/rss"),
        ];

        let report = normalizer.normalize_at(&sources, 1, now()).await;

        let order: Vec<(&str, &str)> = report
            .postings
            .iter()
            .map(|p| (p.source_feed.as_str(), p.title.as_str()))
            .collect();
        assert_eq!(order, vec![("A", "a1"), ("A", "a2"), ("C", "c1")]);

        let failed: Vec<&FeedStats> = report.failed_sources().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "Down");
        assert_eq!(failed[0].jobs_found, 0);
        assert!(failed[0].error.as_deref().unwrap().contains("connection refused"));
        assert_eq!(report.stats.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_links_across_feeds_are_kept() {
        let shared = RawEntry {
            title: Some("Same".to_string()),
            link: Some("https://jobs.example/same".to_string()),
            ..Default::default()
        };
        let fetcher = MockFeedFetcher::new()
            .with_feed("https://a.example/rss", feed(vec![shared.clone()]))
            .with_feed("https://b.example/rss", feed(vec![shared]));
        let normalizer = FeedNormalizer::new(Arc::new(fetcher), Span::none());
        let sources = [
            FeedSource::new("A", "https://a.example/rss"),
            FeedSource::new("B", "https://b.example/rss"),
        ];

        let report = normalizer.normalize_at(&sources, 1, now()).await;
        assert_eq!(report.postings.len(), 2);
        assert_eq!(report.postings[0].link, report.postings[1].link);
    }
}
