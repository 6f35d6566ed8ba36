// src/types/analysis.rs
use serde::{Deserialize, Serialize};

/// Score at or above which a posting is reported as suitable.
pub const SUITABILITY_THRESHOLD: u64 = 60;

/// Readable title and plain-text body of a posting page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    pub content: String,
    pub url: String,
}

/// Structured suitability analysis for one posting.
///
/// `score` and `suitable` are only settable together through the
/// constructors, so `suitable == (score >= SUITABILITY_THRESHOLD)` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub title: String,
    pub url: String,
    score: u64,
    pub matching_points: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendation: String,
    suitable: bool,
}

impl AnalysisResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        score: u64,
        matching_points: Vec<String>,
        gaps: Vec<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            score,
            matching_points,
            gaps,
            recommendation: recommendation.into(),
            suitable: score >= SUITABILITY_THRESHOLD,
        }
    }

    /// Record used when a model reply cannot be parsed.
    pub fn unparseable(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(title, url, 0, Vec::new(), Vec::new(), "Error analyzing job")
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn is_suitable(&self) -> bool {
        self.suitable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suitable_tracks_threshold() {
        for score in [0, 1, 59, 60, 61, 99, 100, 85100] {
            let result = AnalysisResult::new("t", "u", score, vec![], vec![], "r");
            assert_eq!(result.is_suitable(), score >= 60, "score {}", score);
        }
    }

    #[test]
    fn test_unparseable_record() {
        let result = AnalysisResult::unparseable("Rust Dev", "https://jobs.example/1");
        assert_eq!(result.score(), 0);
        assert!(!result.is_suitable());
        assert!(result.matching_points.is_empty());
        assert!(result.gaps.is_empty());
        assert_eq!(result.recommendation, "Error analyzing job");
    }

    #[test]
    fn test_serialized_form_carries_derived_flag() {
        let result = AnalysisResult::new("t", "u", 75, vec![], vec![], "r");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["score"], 75);
        assert_eq!(json["suitable"], true);
    }
}
