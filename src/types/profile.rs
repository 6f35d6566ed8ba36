// src/types/profile.rs
use serde::{Deserialize, Serialize};

/// Candidate the postings are scored against. Read-only for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub experience_years: Option<u32>,
    pub preferred_locations: Vec<String>,
    pub job_titles: Vec<String>,
    pub job_types: Vec<String>,
    pub salary_expectations: Option<SalaryExpectations>,
    pub work_preferences: WorkPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalaryExpectations {
    pub min: u64,
    pub max: u64,
    pub currency: String,
}

impl Default for SalaryExpectations {
    fn default() -> Self {
        Self {
            min: 0,
            max: 0,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkPreferences {
    pub remote_only: bool,
    pub willing_to_relocate: bool,
    pub visa_sponsorship_required: bool,
}

impl Default for WorkPreferences {
    fn default() -> Self {
        Self {
            remote_only: false,
            willing_to_relocate: true,
            visa_sponsorship_required: false,
        }
    }
}

/// Soft preferences kept alongside the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePreferences {
    pub company_size: Vec<String>,
    pub industries: Vec<String>,
    pub avoid_keywords: Vec<String>,
    pub required_keywords: Vec<String>,
    pub nice_to_have: Vec<String>,
}

/// Per-run knobs stored in the profile document's `settings` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub days_back: u32,
    pub max_jobs_to_analyze: usize,
    /// Displayed only; the suitability threshold is fixed.
    pub min_match_score: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            days_back: 1,
            max_jobs_to_analyze: 20,
            min_match_score: crate::types::SUITABILITY_THRESHOLD,
        }
    }
}

/// Whole user profile document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub profile: CandidateProfile,
    pub preferences: ProfilePreferences,
    pub settings: RunSettings,
}

impl CandidateProfile {
    /// Short multi-line description used by the CLI and start-up logs.
    pub fn summary_lines(&self) -> Vec<String> {
        let shown: Vec<&str> = self.skills.iter().take(5).map(String::as_str).collect();
        let more = if self.skills.len() > 5 { "..." } else { "" };

        vec![
            format!("Skills: {}{}", shown.join(", "), more),
            format!(
                "Experience: {} years",
                self.experience_years
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "?".to_string())
            ),
            format!("Locations: {}", self.preferred_locations.join(", ")),
            format!("Job Titles: {}", self.job_titles.join(", ")),
        ]
    }
}

impl ProfilePreferences {
    /// One line per non-empty list, for start-up logs and `check`.
    pub fn summary_lines(&self) -> Vec<String> {
        [
            ("Company size", &self.company_size),
            ("Industries", &self.industries),
            ("Avoid", &self.avoid_keywords),
            ("Required", &self.required_keywords),
            ("Nice to have", &self.nice_to_have),
        ]
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(label, values)| format!("{}: {}", label, values.join(", ")))
        .collect()
    }
}
