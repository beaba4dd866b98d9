//! Free-text adapter for oracle responses.
//!
//! The model answers in loosely formatted lines. Everything that interprets
//! that text lives here, behind explicit error paths.

use risk_core::{MapInsight, OracleError, RiskLevel, SourceLink, StrategicAssessment};

const MISSING_SUMMARY: &str = "No summary provided.";
const MISSING_WEATHER: &str = "No weather telemetry provided.";
const MISSING_NEWS: &str = "No news intelligence provided.";
const DEFAULT_GEOGRAPHY_SUMMARY: &str = "Geographic verification complete.";

/// Words that contradict a stable status when they appear in the summary.
const RISK_KEYWORDS: [&str; 6] = [
    "CONGESTION",
    "DELAY",
    "STRIKE",
    "WARNING",
    "RISK",
    "DISRUPTION",
];

/// Parse a strategic assessment out of the model's reply.
///
/// Expects `STATUS:`, `SUMMARY:`, `WEATHER:` and `NEWS:` lines in any order,
/// optionally wrapped in markdown emphasis. Missing text fields get neutral
/// placeholders; a missing or unrecognized status is an error.
///
/// A stable status whose summary names a risk is raised to caution.
pub fn parse_strategic_response(text: &str) -> Result<StrategicAssessment, OracleError> {
    let cleaned = text.replace('*', "");

    let raw_status = field(&cleaned, "STATUS")
        .ok_or_else(|| OracleError::Malformed("missing STATUS line".to_string()))?;
    // Models often decorate the label, e.g. "RED (Risky)" or "RED."
    let mut status: RiskLevel = raw_status
        .split(|c: char| !c.is_ascii_alphabetic())
        .find(|token| !token.is_empty())
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| OracleError::Malformed(format!("unrecognized status: {}", raw_status)))?;

    let summary = field(&cleaned, "SUMMARY").unwrap_or(MISSING_SUMMARY);
    let weather = field(&cleaned, "WEATHER").unwrap_or(MISSING_WEATHER);
    let news = field(&cleaned, "NEWS").unwrap_or(MISSING_NEWS);

    if status == RiskLevel::Stable && mentions_risk(summary) {
        status = RiskLevel::Caution;
    }

    Ok(StrategicAssessment::new(status, summary)
        .with_weather(weather)
        .with_news(news))
}

/// Build a map insight from the model's reply and its map citations.
pub fn parse_geography_response(text: &str, links: Vec<SourceLink>) -> MapInsight {
    let cleaned = text.replace('*', "");
    let summary = cleaned.trim();
    let summary = if summary.is_empty() {
        DEFAULT_GEOGRAPHY_SUMMARY
    } else {
        summary
    };
    MapInsight::new(summary, links)
}

/// Value after the first `:` on the first line starting with `prefix`.
fn field<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.lines()
        .find(|line| line.trim().to_ascii_uppercase().starts_with(prefix))
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn mentions_risk(summary: &str) -> bool {
    let upper = summary.to_ascii_uppercase();
    RISK_KEYWORDS.iter().any(|word| upper.contains(word))
}
