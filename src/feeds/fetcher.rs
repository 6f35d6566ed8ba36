// src/feeds/fetcher.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// One entry as reported by a feed, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

/// Best-effort parse of one feed document. `parse_warning` is set when the
/// document only parsed after repair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeed {
    pub title: Option<String>,
    pub entries: Vec<RawEntry>,
    pub parse_warning: Option<String>,
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawFeed>;
}

/// Fetches over HTTP and parses RSS/Atom/JSON Feed with `feed-rs`.
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("job-digest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<RawFeed> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch feed {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read feed body")?;
        debug!("Fetched {} bytes from {}", body.len(), url);

        parse_feed_bytes(&body)
    }
}

/// Parse a feed document, retrying once on a repaired copy.
pub fn parse_feed_bytes(body: &[u8]) -> Result<RawFeed> {
    match feed_rs::parser::parse(body) {
        Ok(feed) => Ok(convert_feed(feed, None)),
        Err(first) => {
            let text = String::from_utf8_lossy(body);
            let repaired = sanitize_feed(&text);
            let feed = feed_rs::parser::parse(repaired.as_bytes())
                .with_context(|| format!("Malformed feed: {}", first))?;
            Ok(convert_feed(feed, Some(first.to_string())))
        }
    }
}

fn convert_feed(feed: feed_rs::model::Feed, parse_warning: Option<String>) -> RawFeed {
    let entries = feed
        .entries
        .into_iter()
        .map(|entry| RawEntry {
            title: entry.title.map(|t| t.content),
            link: entry.links.into_iter().next().map(|l| l.href),
            published: entry.published,
            updated: entry.updated,
            summary: entry
                .summary
                .map(|t| t.content)
                .or_else(|| entry.content.and_then(|c| c.body)),
        })
        .collect();

    RawFeed {
        title: feed.title.map(|t| t.content),
        entries,
        parse_warning,
    }
}

/// Drop anything before the first tag and escape `&` that does not start an
/// entity reference.
fn sanitize_feed(text: &str) -> String {
    let start = text.find('<').unwrap_or(0);
    let text = &text[start..];

    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if c == '&' && !starts_entity(&text[i + 1..]) {
            out.push_str("&amp;");
        } else {
            out.push(c);
        }
    }
    out
}

fn starts_entity(rest: &str) -> bool {
    let Some(end) = rest.find(';') else {
        return false;
    };
    let name = &rest[..end];
    if name.is_empty() || end > 32 {
        return false;
    }
    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(dec) = name.strip_prefix('#') {
        return !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit());
    }
    name.chars().all(|c| c.is_ascii_alphanumeric())
}
