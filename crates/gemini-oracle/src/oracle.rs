//! GeminiOracle implementation using the Gemini REST API.

use std::time::Duration;

use reqwest::Client;
use risk_core::{
    async_trait, MapInsight, OracleError, RiskOracle, SourceLink, StrategicAssessment, Supplier,
    MAX_MAP_LINKS,
};
use tracing::{debug, info};

use crate::api_types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GroundingChunk, Tool,
};
use crate::config::GeminiOracleConfig;
use crate::parse::{parse_geography_response, parse_strategic_response};
use crate::prompt::{geography_prompt, strategic_prompt};

/// A risk oracle backed by Google's Gemini models.
///
/// Stateless: each assessment is a single `generateContent` call with the
/// appropriate grounding tool attached.
pub struct GeminiOracle {
    client: Client,
    config: GeminiOracleConfig,
}

impl GeminiOracle {
    /// Create a new GeminiOracle with the given configuration.
    pub fn new(config: GeminiOracleConfig) -> Result<Self, OracleError> {
        if config.api_key.is_empty() {
            return Err(OracleError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| {
                OracleError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!(
            "GeminiOracle initialized with strategic model: {}, geography model: {}",
            config.strategic_model, config.geography_model
        );

        Ok(Self { client, config })
    }

    /// Create a GeminiOracle from environment variables.
    ///
    /// See [`GeminiOracleConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, OracleError> {
        let config = GeminiOracleConfig::from_env()?;
        Self::new(config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiOracleConfig {
        &self.config
    }

    fn build_request(&self, prompt: String, tool: Tool) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            tools: vec![tool],
            generation_config: self.config.temperature.map(|t| GenerationConfig {
                temperature: Some(t),
            }),
        }
    }

    /// Make a `generateContent` request against the given model.
    async fn generate(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, OracleError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            model
        );

        debug!("Sending request to Gemini API ({}): {:?}", model, request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(OracleError::Rejected(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.message
                )));
            }

            return Err(OracleError::Rejected(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let completion: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(format!("Failed to parse response: {}", e)))?;

        debug!(
            "Received response from Gemini API ({}): {} candidate(s)",
            model,
            completion.candidates.len()
        );

        Ok(completion)
    }
}

#[async_trait]
impl RiskOracle for GeminiOracle {
    async fn assess_strategic(
        &self,
        supplier: &Supplier,
        hq_location: Option<&str>,
    ) -> Result<StrategicAssessment, OracleError> {
        let request = self.build_request(
            strategic_prompt(supplier, hq_location),
            Tool::google_search(),
        );
        let response = self.generate(&self.config.strategic_model, request).await?;

        let text = response
            .text()
            .ok_or_else(|| OracleError::Malformed("empty strategic response".to_string()))?;

        let assessment = parse_strategic_response(&text)?;
        Ok(assessment.with_sources(web_sources(response.grounding_chunks())))
    }

    async fn assess_geography(&self, supplier: &Supplier) -> Result<MapInsight, OracleError> {
        let request = self.build_request(geography_prompt(supplier), Tool::google_maps());
        let response = self.generate(&self.config.geography_model, request).await?;

        let text = response.text().unwrap_or_default();
        Ok(parse_geography_response(
            &text,
            map_links(response.grounding_chunks()),
        ))
    }

    fn name(&self) -> &str {
        "GeminiOracle"
    }
}

/// Search citations from grounding chunks.
fn web_sources(chunks: &[GroundingChunk]) -> Vec<SourceLink> {
    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .map(|web| {
            SourceLink::new(
                web.title.as_deref().unwrap_or("Search Source"),
                web.uri.as_deref().unwrap_or("#"),
            )
        })
        .collect()
}

/// Map citations from grounding chunks, capped at [`MAX_MAP_LINKS`].
fn map_links(chunks: &[GroundingChunk]) -> Vec<SourceLink> {
    chunks
        .iter()
        .filter_map(|chunk| chunk.maps.as_ref())
        .take(MAX_MAP_LINKS)
        .map(|place| {
            SourceLink::new(
                place.title.as_deref().unwrap_or("Map Location"),
                place.uri.as_deref().unwrap_or("#"),
            )
        })
        .collect()
}
