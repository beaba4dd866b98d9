//! Prompt builders for the two assessments.

use risk_core::Supplier;

/// Prompt for the search-grounded news and weather assessment.
///
/// The reply format is line-oriented so [`crate::parse_strategic_response`]
/// can pick fields out by prefix.
pub fn strategic_prompt(supplier: &Supplier, hq_location: Option<&str>) -> String {
    format!(
        r#"Audit current supply-chain risk for the supplier "{name}" located in "{location}".
Supplier sector: "{category}". Our operational HQ: "{hq}".

Classify the supplier with exactly one status:
- RED: active strikes, severe storms, natural disasters, or export blocks.
- YELLOW: port congestion, seasonal delays, emerging infrastructure issues, or minor weather warnings.
- GREEN: only when no active or emerging risk is found.

If any risk is found, do not answer GREEN. For YELLOW or RED, name the specific risk in the summary.

Reply using exactly these lines:
STATUS: [GREEN, YELLOW, or RED]
SUMMARY: [one or two sentence brief]
WEATHER: [weather telemetry for the location]
NEWS: [relevant news and signal intelligence]"#,
        name = supplier.name,
        location = supplier.location,
        category = supplier.category,
        hq = hq_location.unwrap_or("Unknown"),
    )
}

/// Prompt for the maps-grounded geographic assessment.
pub fn geography_prompt(supplier: &Supplier) -> String {
    format!(
        r#"Describe the geography around "{location}" for supply-chain planning.
Name the key nearby transport infrastructure (ports, rail hubs, highways)
and briefly summarize the geographic risk context given that proximity."#,
        location = supplier.location,
    )
}
