// src/content/mod.rs
pub mod extractor;
pub mod readability;

pub use extractor::{ContentFetcher, HttpPageExtractor, PageExtractor};
