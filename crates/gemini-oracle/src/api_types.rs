//! Gemini `generateContent` request and response types.

use serde::{Deserialize, Serialize};

/// A text part of a content block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A content block (one turn).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    /// Role: "user" or "model"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a single-part user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

/// Grounding tool attached to a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    /// Google Search grounding.
    GoogleSearch(EmptyObject),
    /// Google Maps grounding.
    GoogleMaps(EmptyObject),
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyObject {}

impl Tool {
    pub fn google_search() -> Self {
        Self::GoogleSearch(EmptyObject {})
    }

    pub fn google_maps() -> Self {
        Self::GoogleMaps(EmptyObject {})
    }
}

/// Generation parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Response body from `generateContent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Grounding chunks of the first candidate.
    pub fn grounding_chunks(&self) -> &[GroundingChunk] {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.as_slice())
            .unwrap_or(&[])
    }
}

/// A response candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// Grounding metadata attached to a candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// One grounding citation, from web search or maps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<GroundingSource>,
    pub maps: Option<GroundingSource>,
}

/// Title and URI of a grounding citation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingSource {
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetails,
}

/// API error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    pub code: Option<u16>,
    pub message: String,
    pub status: Option<String>,
}
