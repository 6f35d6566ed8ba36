// src/analysis/mod.rs
pub mod llm;
pub mod protocol;
pub mod scorer;

pub use llm::{GeminiClient, LanguageModel};
pub use protocol::ParseError;
pub use scorer::SuitabilityScorer;
