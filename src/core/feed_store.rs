// src/core/feed_store.rs
//! The feed list document (`rss_feeds.json`) and edits made to it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use super::FsOps;
use crate::types::FeedSource;

#[derive(Debug, Deserialize)]
struct RawFeedDocument {
    #[serde(default)]
    feeds: Vec<serde_json::Value>,
    #[serde(default)]
    settings: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedDocument {
    pub feeds: Vec<FeedSource>,
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl FeedDocument {
    /// Parse a document, skipping individual feed entries that are invalid.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawFeedDocument = serde_json::from_str(content)?;

        let feeds = raw
            .feeds
            .into_iter()
            .filter_map(|value| {
                let label = value
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                serde_json::from_value::<FeedSource>(value)
                    .map_err(|e| error!("Error loading feed {}: {}", label, e))
                    .ok()
            })
            .collect();

        Ok(Self {
            feeds,
            settings: raw.settings,
        })
    }

    /// Enabled feeds, lowest priority number first. Ties keep file order.
    pub fn active_feeds(&self) -> Vec<FeedSource> {
        active_feeds(&self.feeds)
    }


    pub fn add_feed(&mut self, feed: FeedSource) {
        self.feeds.push(feed);
    }

    /// Flip `enabled` on the feed at 1-based `position`; returns the new state.
    pub fn toggle(&mut self, position: usize) -> Option<&FeedSource> {
        let feed = self.feeds.get_mut(position.checked_sub(1)?)?;
        feed.enabled = !feed.enabled;
        Some(feed)
    }

    /// Remove the feed at 1-based `position`.
    pub fn remove(&mut self, position: usize) -> Option<FeedSource> {
        let index = position.checked_sub(1)?;
        (index < self.feeds.len()).then(|| self.feeds.remove(index))
    }
}

pub fn active_feeds(feeds: &[FeedSource]) -> Vec<FeedSource> {
    let mut active: Vec<FeedSource> = feeds.iter().filter(|f| f.enabled).cloned().collect();
    active.sort_by_key(|f| f.priority);
    active
}

/// Reads and writes the feed document at a fixed path.
pub struct FeedStore {
    path: PathBuf,
}

impl FeedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when the document does not exist.
    pub async fn load(&self) -> Result<Option<FeedDocument>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }
        let content = FsOps::read_file_safe(&self.path).await?;
        let document = FeedDocument::from_json_str(&content)?;
        info!(
            "Loaded {} feeds from {}",
            document.feeds.len(),
            self.path.display()
        );
        Ok(Some(document))
    }

    pub async fn load_or_default(&self) -> Result<FeedDocument> {
        Ok(self.load().await?.unwrap_or_default())
    }

    pub async fn save(&self, document: &FeedDocument) -> Result<()> {
        FsOps::write_json_pretty(&self.path, document).await?;
        info!(
            "Saved {} feeds to {}",
            document.feeds.len(),
            self.path.display()
        );
        Ok(())
    }
}
