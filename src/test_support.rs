// src/test_support.rs
// In-memory collaborators for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::analysis::LanguageModel;
use crate::content::PageExtractor;
use crate::feeds::{FeedFetcher, RawFeed};
use crate::report::{MailTransport, ReportError, ReportMessage};
use crate::types::{ExtractedContent, JobPosting};

pub fn posting(title: &str, link: &str) -> JobPosting {
    JobPosting {
        title: title.to_string(),
        link: link.to_string(),
        published: None,
        summary: String::new(),
        source_feed: "Test Feed".to_string(),
    }
}

// =============================================================================
// Feeds
// =============================================================================

pub struct MockFeedFetcher {
    feeds: HashMap<String, Result<RawFeed, String>>,
    calls: Mutex<Vec<String>>,
}

impl MockFeedFetcher {
    pub fn new() -> Self {
        Self {
            feeds: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_feed(mut self, url: &str, feed: RawFeed) -> Self {
        self.feeds.insert(url.to_string(), Ok(feed));
        self
    }

    pub fn with_failure(mut self, url: &str, reason: &str) -> Self {
        self.feeds.insert(url.to_string(), Err(reason.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedFetcher for MockFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<RawFeed> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.feeds.get(url) {
            Some(Ok(feed)) => Ok(feed.clone()),
            Some(Err(reason)) => Err(anyhow::anyhow!("{}", reason)),
            None => Err(anyhow::anyhow!("no mock feed for {}", url)),
        }
    }
}

// =============================================================================
// Pages
// =============================================================================

pub struct MockPageExtractor {
    pages: HashMap<String, ExtractedContent>,
    calls: Mutex<Vec<String>>,
}

impl MockPageExtractor {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(mut self, url: &str, title: &str, content: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            ExtractedContent {
                title: title.to_string(),
                content: content.to_string(),
                url: url.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageExtractor for MockPageExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedContent> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("HTTP error: 404 Not Found"))
    }
}

// =============================================================================
// Language model
// =============================================================================

/// Replies are handed out in call order; running out is an error.
pub struct MockLanguageModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(self, reply: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
        self
    }

    pub fn with_failure(self, reason: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(reason.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(anyhow::anyhow!("{}", reason)),
            None => Err(anyhow::anyhow!("no mock reply left")),
        }
    }
}

// =============================================================================
// Mail
// =============================================================================

pub struct MockMailTransport {
    failure: Option<String>,
    messages: Mutex<Vec<ReportMessage>>,
    attempts: Mutex<usize>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self {
            failure: None,
            messages: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::new()
        }
    }

    pub fn messages(&self) -> Vec<ReportMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, message: &ReportMessage) -> Result<(), ReportError> {
        *self.attempts.lock().unwrap() += 1;
        if let Some(reason) = &self.failure {
            return Err(ReportError::Transport(reason.clone()));
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
