//! Daily job digest: read job feeds, fetch the postings, score them against a
//! candidate profile with a language model and email the suitable ones.

pub mod analysis;
pub mod cli;
pub mod content;
pub mod core;
pub mod environment;
pub mod feeds;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use pipeline::{JobPipeline, PipelineDeps, RunSummary};
pub use types::{AnalysisResult, CandidateProfile, ExtractedContent, FeedSource, JobPosting};
