// src/types/mod.rs
pub mod analysis;
pub mod feed;
pub mod profile;

pub use analysis::{AnalysisResult, ExtractedContent, SUITABILITY_THRESHOLD};
pub use feed::{FeedSource, JobPosting};
pub use profile::{CandidateProfile, ProfilePreferences, RunSettings, UserConfig};
