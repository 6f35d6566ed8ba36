// src/analysis/protocol.rs
//! Prompt template and reply grammar for suitability scoring.
//!
//! The two halves are versioned together: any change to the section labels in
//! [`build_prompt`] must be mirrored in [`parse_response`] and bump
//! [`PROTOCOL_VERSION`].

use thiserror::Error;

use crate::types::{AnalysisResult, CandidateProfile, ExtractedContent};

pub const PROTOCOL_VERSION: u32 = 1;

/// Body text sent to the model is cut at this many characters.
pub const MAX_CONTENT_CHARS: usize = 3000;

const NOT_SPECIFIED: &str = "Not specified";

const SCORE_LABEL: &str = "SCORE:";
const MATCHING_LABEL: &str = "MATCHING_POINTS:";
const GAPS_LABEL: &str = "GAPS:";
const RECOMMENDATION_LABEL: &str = "RECOMMENDATION:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("SCORE line contains no digits: {0:?}")]
    MissingScoreDigits(String),
    #[error("SCORE value out of range: {0}")]
    ScoreOverflow(String),
    #[error("response contains no recognizable section")]
    NoStructure,
}

/// Build the scoring prompt for one posting.
pub fn build_prompt(profile: &CandidateProfile, job: &ExtractedContent) -> String {
    let content: String = job.content.chars().take(MAX_CONTENT_CHARS).collect();
    let content = if content.is_empty() {
        "No content available".to_string()
    } else {
        content
    };

    format!(
        r#"
You are a job matching expert. Analyze the following job posting and determine if it's suitable for the candidate.

CANDIDATE PROFILE:
- Skills: {skills}
- Years of Experience: {experience}
- Preferred Locations: {locations}
- Preferred Job Titles: {titles}

JOB POSTING:
Title: {title}
URL: {url}

Content:
{content}

INSTRUCTIONS:
1. Analyze the job requirements and match them against the candidate's profile
2. Provide a suitability score from 0-100 (0 = not suitable, 100 = perfect match)
3. List key matching points
4. List any gaps or concerns
5. Provide a brief recommendation

Format your response EXACTLY as follows:
{SCORE_LABEL} [number 0-100]
{MATCHING_LABEL}
- [point 1]
- [point 2]
...
{GAPS_LABEL}
- [gap 1]
- [gap 2]
...
{RECOMMENDATION_LABEL} [brief recommendation in 1-2 sentences]
"#,
        skills = join_or_unspecified(&profile.skills),
        experience = profile
            .experience_years
            .map(|y| y.to_string())
            .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        locations = join_or_unspecified(&profile.preferred_locations),
        titles = join_or_unspecified(&profile.job_titles),
        title = or_unknown(&job.title),
        url = or_unknown(&job.url),
        content = content,
    )
}

fn join_or_unspecified(items: &[String]) -> String {
    if items.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        items.join(", ")
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "Unknown"
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Matching,
    Gaps,
    Recommendation,
}

/// Parse a model reply into an [`AnalysisResult`] for `job`.
///
/// Lines are handled one at a time; `-` bullets go to whichever of
/// MATCHING_POINTS / GAPS appeared most recently, and non-empty lines after
/// RECOMMENDATION extend it.
pub fn parse_response(text: &str, job: &ExtractedContent) -> Result<AnalysisResult, ParseError> {
    let mut score = 0u64;
    let mut matching_points = Vec::new();
    let mut gaps = Vec::new();
    let mut recommendation = String::new();
    let mut section: Option<Section> = None;
    let mut saw_header = false;

    for line in text.trim().lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(SCORE_LABEL) {
            score = parse_score(rest)?;
            saw_header = true;
        } else if line.starts_with(MATCHING_LABEL) {
            section = Some(Section::Matching);
            saw_header = true;
        } else if line.starts_with(GAPS_LABEL) {
            section = Some(Section::Gaps);
            saw_header = true;
        } else if let Some(rest) = line.strip_prefix(RECOMMENDATION_LABEL) {
            section = Some(Section::Recommendation);
            recommendation = rest.trim().to_string();
            saw_header = true;
        } else if let (Some(point), Some(Section::Matching)) = (line.strip_prefix('-'), section) {
            matching_points.push(point.trim().to_string());
        } else if let (Some(gap), Some(Section::Gaps)) = (line.strip_prefix('-'), section) {
            gaps.push(gap.trim().to_string());
        } else if section == Some(Section::Recommendation) && !line.is_empty() {
            recommendation.push(' ');
            recommendation.push_str(line);
        }
    }

    if !saw_header {
        return Err(ParseError::NoStructure);
    }

    Ok(AnalysisResult::new(
        or_unknown(&job.title),
        or_unknown(&job.url),
        score,
        matching_points,
        gaps,
        recommendation.trim(),
    ))
}

/// Concatenate every ASCII digit after the label. `[85]` is 85 and
/// `85/100` is 85100.
// TODO: require a token boundary after the first digit run once reply
// compatibility with existing reports is no longer needed.
fn parse_score(raw: &str) -> Result<u64, ParseError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ParseError::MissingScoreDigits(raw.trim().to_string()));
    }
    digits
        .parse::<u64>()
        .map_err(|_| ParseError::ScoreOverflow(digits))
}
