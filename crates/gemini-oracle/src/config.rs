//! Configuration for GeminiOracle.

use risk_core::OracleError;
use std::env;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for the search-grounded strategic assessment.
pub const DEFAULT_STRATEGIC_MODEL: &str = "gemini-3-flash-preview";

/// Default model for the maps-grounded geographic assessment.
pub const DEFAULT_GEOGRAPHY_MODEL: &str = "gemini-2.5-flash";

/// Default HTTP timeout for API requests, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Configuration for GeminiOracle.
#[derive(Debug, Clone)]
pub struct GeminiOracleConfig {
    /// Gemini API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model used for news and weather assessment.
    pub strategic_model: String,

    /// Model used for geographic assessment.
    pub geography_model: String,

    /// Temperature for generation (0.0 - 2.0). Provider default when unset.
    pub temperature: Option<f32>,

    /// HTTP request timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for GeminiOracleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            strategic_model: DEFAULT_STRATEGIC_MODEL.to_string(),
            geography_model: DEFAULT_GEOGRAPHY_MODEL.to_string(),
            temperature: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl GeminiOracleConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `GEMINI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `GEMINI_API_URL` - API URL (default: https://generativelanguage.googleapis.com)
    /// - `GEMINI_STRATEGIC_MODEL` - Model for news/weather (default: gemini-3-flash-preview)
    /// - `GEMINI_GEOGRAPHY_MODEL` - Model for geography (default: gemini-2.5-flash)
    /// - `GEMINI_TEMPERATURE` - Temperature (default: provider default)
    /// - `GEMINI_HTTP_TIMEOUT_SECS` - HTTP timeout (default: 60)
    pub fn from_env() -> Result<Self, OracleError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| OracleError::Configuration("GEMINI_API_KEY not set".to_string()))?;

        let api_url = env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let strategic_model = env::var("GEMINI_STRATEGIC_MODEL")
            .unwrap_or_else(|_| DEFAULT_STRATEGIC_MODEL.to_string());

        let geography_model = env::var("GEMINI_GEOGRAPHY_MODEL")
            .unwrap_or_else(|_| DEFAULT_GEOGRAPHY_MODEL.to_string());

        let temperature = env::var("GEMINI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok());

        let http_timeout_secs = env::var("GEMINI_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            api_key,
            strategic_model,
            geography_model,
            temperature,
            http_timeout_secs,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> GeminiOracleConfigBuilder {
        GeminiOracleConfigBuilder::default()
    }
}

/// Builder for GeminiOracleConfig.
#[derive(Debug, Default)]
pub struct GeminiOracleConfigBuilder {
    config: GeminiOracleConfig,
}

impl GeminiOracleConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the strategic model.
    pub fn strategic_model(mut self, model: impl Into<String>) -> Self {
        self.config.strategic_model = model.into();
        self
    }

    /// Set the geography model.
    pub fn geography_model(mut self, model: impl Into<String>) -> Self {
        self.config.geography_model = model.into();
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the HTTP timeout in seconds.
    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GeminiOracleConfig {
        self.config
    }
}
