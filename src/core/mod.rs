// src/core/mod.rs
//! Configuration loading and the JSON documents behind it

pub mod config_manager;
pub mod feed_store;
pub mod fs_ops;

pub use config_manager::{ConfigError, ConfigManager, ConfigProvider, ServiceConfig};
pub use feed_store::{FeedDocument, FeedStore};
pub use fs_ops::FsOps;
