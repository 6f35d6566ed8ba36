// src/analysis/scorer.rs
use std::sync::Arc;
use tracing::{error, info, warn, Instrument, Span};

use super::llm::LanguageModel;
use super::protocol::{build_prompt, parse_response, PROTOCOL_VERSION};
use crate::types::{AnalysisResult, CandidateProfile, ExtractedContent};

/// Scores extracted postings against one candidate profile.
pub struct SuitabilityScorer {
    model: Arc<dyn LanguageModel>,
    profile: CandidateProfile,
    span: Span,
}

impl SuitabilityScorer {
    pub fn new(model: Arc<dyn LanguageModel>, profile: CandidateProfile, span: Span) -> Self {
        info!(parent: &span, "Using prompt protocol v{}", PROTOCOL_VERSION);
        Self {
            model,
            profile,
            span,
        }
    }

    /// Score one posting.
    ///
    /// Returns `None` only when the model call itself fails. A reply that
    /// cannot be parsed becomes [`AnalysisResult::unparseable`].
    pub async fn analyze(&self, job: &ExtractedContent) -> Option<AnalysisResult> {
        self.analyze_inner(job).instrument(self.span.clone()).await
    }

    async fn analyze_inner(&self, job: &ExtractedContent) -> Option<AnalysisResult> {
        info!("Analyzing job: {}", job.title);

        let prompt = build_prompt(&self.profile, job);
        let reply = match self.model.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error analyzing job {}: {:#}", job.url, e);
                return None;
            }
        };

        match parse_response(&reply, job) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Error parsing response for {}: {}", job.url, e);
                Some(AnalysisResult::unparseable(&job.title, &job.url))
            }
        }
    }

    /// Score every posting in order, then sort by score, highest first.
    /// Equal scores keep their analysis order.
    pub async fn analyze_all(&self, jobs: &[ExtractedContent]) -> Vec<AnalysisResult> {
        let mut analyses = Vec::with_capacity(jobs.len());
        for job in jobs {
            if let Some(analysis) = self.analyze(job).await {
                analyses.push(analysis);
            }
        }

        sort_by_score(&mut analyses);

        let _guard = self.span.enter();
        info!("Analyzed {} jobs successfully", analyses.len());
        analyses
    }
}

/// Stable sort, score descending.
pub fn sort_by_score(analyses: &mut [AnalysisResult]) {
    analyses.sort_by(|a, b| b.score().cmp(&a.score()));
}
