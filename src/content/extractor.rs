// src/content/extractor.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Instrument, Span};

use super::readability::extract_readable;
use crate::types::{ExtractedContent, JobPosting};

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
);

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Fetch a page and reduce it to readable title + plain text.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedContent>;
}

pub struct HttpPageExtractor {
    client: Client,
}

impl HttpPageExtractor {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageExtractor for HttpPageExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedContent> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Timeout while fetching {}", url)
                } else {
                    anyhow::Error::new(e).context("Failed to fetch job post")
                }
            })?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;

        let readable = extract_readable(&html)?;

        Ok(ExtractedContent {
            title: readable.title,
            content: readable.text,
            url: url.to_string(),
        })
    }
}

/// Runs postings through a [`PageExtractor`], one at a time, dropping the
/// ones that fail.
pub struct ContentFetcher {
    extractor: Arc<dyn PageExtractor>,
    span: Span,
}

impl ContentFetcher {
    pub fn new(extractor: Arc<dyn PageExtractor>, span: Span) -> Self {
        Self { extractor, span }
    }

    pub async fn fetch(&self, url: &str) -> Option<ExtractedContent> {
        async {
            info!("Extracting content from: {}", url);
            match self.extractor.extract(url).await {
                Ok(content) => {
                    info!("Successfully extracted content from {}", url);
                    Some(content)
                }
                Err(e) => {
                    error!("Error extracting content from {}: {:#}", url, e);
                    None
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    pub async fn extract_many(&self, postings: &[JobPosting]) -> Vec<ExtractedContent> {
        let mut results = Vec::with_capacity(postings.len());
        for posting in postings {
            if let Some(content) = self.fetch(&posting.link).await {
                results.push(content);
            }
        }

        let _guard = self.span.enter();
        info!(
            "Successfully extracted {} out of {} pages",
            results.len(),
            postings.len()
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{posting, MockPageExtractor};

    #[tokio::test]
    async fn test_failed_pages_are_dropped_in_order() {
        let extractor = MockPageExtractor::new()
            .with_page("https://jobs.example/1", "One", "first body")
            .with_page("https://jobs.example/3", "Three", "third body");
        let fetcher = ContentFetcher::new(Arc::new(extractor), Span::none());

        let postings = vec![
            posting("a", "https://jobs.example/1"),
            posting("b", "https://jobs.example/2"),
            posting("c", "https://jobs.example/3"),
        ];
        let contents = fetcher.extract_many(&postings).await;

        let urls: Vec<&str> = contents.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://jobs.example/1", "https://jobs.example/3"]);
        assert_eq!(contents[1].title, "Three");
    }

    #[tokio::test]
    async fn test_every_call_refetches() {
        let extractor = Arc::new(MockPageExtractor::new().with_page(
            "https://jobs.example/1",
            "One",
            "body",
        ));
        let fetcher = ContentFetcher::new(extractor.clone(), Span::none());

        assert!(fetcher.fetch("https://jobs.example/1").await.is_some());
        assert!(fetcher.fetch("https://jobs.example/1").await.is_some());
        assert_eq!(extractor.calls().len(), 2);
    }
}
