// src/feeds/mod.rs
pub mod fetcher;
pub mod normalizer;

pub use fetcher::{FeedFetcher, HttpFeedFetcher, RawEntry, RawFeed};
pub use normalizer::{FeedNormalizer, FeedStats, NormalizeReport};
