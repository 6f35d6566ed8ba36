// src/report/render.rs
use chrono::NaiveDate;
use std::fmt::Write;

use crate::types::{AnalysisResult, SUITABILITY_THRESHOLD};

const RULE_WIDTH: usize = 60;
const TEXT_MATCHING_POINTS: usize = 3;
const STRONG_SCORE: u64 = 80;

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .header { background-color: #4CAF50; color: white; padding: 20px; text-align: center; }
        .summary { background-color: #f4f4f4; padding: 15px; margin: 20px 0; border-radius: 5px; }
        .job-card { border: 1px solid #ddd; padding: 15px; margin: 15px 0; border-radius: 5px; }
        .job-title { color: #2196F3; font-size: 18px; font-weight: bold; }
        .score { font-size: 24px; font-weight: bold; color: #4CAF50; }
        .score-low { color: #ff9800; }
        .matching-points { color: #4CAF50; }
        .gaps { color: #f44336; }
        ul { margin: 10px 0; }
        .footer {
            text-align: center; color: #777; margin-top: 30px; padding: 20px;
            border-top: 1px solid #ddd;
        }"#;

/// Both renderings of one daily report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Renders analyses for a given report date. Rendering has no other inputs.
pub struct ReportRenderer {
    date: NaiveDate,
}

impl ReportRenderer {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn render(&self, analyses: &[AnalysisResult], total_jobs: usize) -> RenderedReport {
        RenderedReport {
            subject: self.subject(),
            text: self.render_text(analyses, total_jobs),
            html: self.render_html(analyses, total_jobs),
        }
    }

    pub fn subject(&self) -> String {
        format!("Daily Job Report - {}", self.date.format("%Y-%m-%d"))
    }

    pub fn render_text(&self, analyses: &[AnalysisResult], total_jobs: usize) -> String {
        let suitable = suitable_jobs(analyses);
        let rule = "=".repeat(RULE_WIDTH);
        let mut body = String::new();

        let _ = write!(
            body,
            "\n{}\n{}\n\nSummary:\n\
             - Total jobs processed: {}\n\
             - Jobs analyzed: {}\n\
             - Suitable jobs found: {}\n\n",
            self.subject(),
            rule,
            total_jobs,
            analyses.len(),
            suitable.len()
        );

        if suitable.is_empty() {
            body.push_str("\nNo suitable jobs found today.\n");
        } else {
            let _ = write!(
                body,
                "\nSUITABLE JOBS (Score >= {}):\n{}\n\n",
                SUITABILITY_THRESHOLD, rule
            );

            for (i, job) in suitable.iter().enumerate() {
                let _ = writeln!(body, "{}. {}", i + 1, job.title);
                let _ = writeln!(body, "   Score: {}/100", job.score());
                let _ = writeln!(body, "   URL: {}", job.url);
                let _ = writeln!(body, "   Recommendation: {}", job.recommendation);

                if !job.matching_points.is_empty() {
                    body.push_str("   Matching Points:\n");
                    for point in job.matching_points.iter().take(TEXT_MATCHING_POINTS) {
                        let _ = writeln!(body, "   - {}", point);
                    }
                }
                body.push('\n');
            }
        }

        let _ = write!(
            body,
            "\n{}\nThis is an automated report from your Job Automation System.\n",
            rule
        );
        body
    }

    pub fn render_html(&self, analyses: &[AnalysisResult], total_jobs: usize) -> String {
        let suitable = suitable_jobs(analyses);
        let mut html = String::new();

        let _ = write!(
            html,
            r#"
<html>
<head>
    <style>
{}
    </style>
</head>
<body>
    <div class="header">
        <h1>Daily Job Report</h1>
        <p>{}</p>
    </div>

    <div class="summary">
        <h2>Summary</h2>
        <ul>
            <li><strong>Total jobs processed:</strong> {}</li>
            <li><strong>Jobs analyzed:</strong> {}</li>
            <li><strong>Suitable jobs found:</strong> {}</li>
        </ul>
    </div>
"#,
            STYLE,
            self.date.format("%B %d, %Y"),
            total_jobs,
            analyses.len(),
            suitable.len()
        );

        if suitable.is_empty() {
            html.push_str(
                "<p>No suitable jobs found today. \
                 Keep your skills sharp and check back tomorrow!</p>",
            );
        } else {
            let _ = write!(
                html,
                "<h2>Suitable Jobs (Score &gt;= {})</h2>",
                SUITABILITY_THRESHOLD
            );

            for job in &suitable {
                let score_class = if job.score() >= STRONG_SCORE {
                    "score"
                } else {
                    "score-low"
                };
                let url = escape_html(&job.url);

                let _ = write!(
                    html,
                    r#"
    <div class="job-card">
        <div class="job-title">{}</div>
        <div class="{}">Score: {}/100</div>
        <p><strong>URL:</strong> <a href="{}">{}</a></p>
        <p><strong>Recommendation:</strong> {}</p>
"#,
                    escape_html(&job.title),
                    score_class,
                    job.score(),
                    url,
                    url,
                    escape_html(&job.recommendation)
                );

                write_list(
                    &mut html,
                    "matching-points",
                    "Matching Points:",
                    &job.matching_points,
                );
                write_list(&mut html, "gaps", "Gaps/Concerns:", &job.gaps);

                html.push_str("</div>");
            }
        }

        html.push_str(
            r#"
    <div class="footer">
        <p>This is an automated report from your Job Automation System.</p>
    </div>
</body>
</html>
"#,
        );
        html
    }
}

/// Selection shared by both renderings.
fn suitable_jobs(analyses: &[AnalysisResult]) -> Vec<&AnalysisResult> {
    analyses.iter().filter(|a| a.is_suitable()).collect()
}

fn write_list(html: &mut String, class: &str, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = write!(
        html,
        r#"<p class="{}"><strong>{}</strong></p><ul>"#,
        class, heading
    );
    for item in items {
        let _ = write!(html, "<li>{}</li>", escape_html(item));
    }
    html.push_str("</ul>");
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
