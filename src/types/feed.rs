// src/types/feed.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured RSS/Atom endpoint. Identity is the url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    #[serde(default = "default_feed_name")]
    pub name: String,
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

fn default_feed_name() -> String {
    "Unnamed Feed".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    1
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
            priority: default_priority(),
            tags: Vec::new(),
            description: String::new(),
        }
    }

    /// Wrap a bare URL coming from a flat list (e.g. `RSS_FEEDS`).
    /// `position` is 1-based and doubles as the priority.
    pub fn from_bare_url(url: &str, position: usize) -> Self {
        Self {
            priority: i32::try_from(position).unwrap_or(i32::MAX),
            ..Self::new(format!("Feed {}", position), url.trim())
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn tags_display(&self) -> String {
        if self.tags.is_empty() {
            "none".to_string()
        } else {
            self.tags.join(", ")
        }
    }
}

/// One job listing surfaced by a feed. Stages correlate on `link` only, so
/// the same link arriving from two feeds yields two postings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub summary: String,
    pub source_feed: String,
}
