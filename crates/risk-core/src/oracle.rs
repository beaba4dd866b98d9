//! The RiskOracle trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::model::{MapInsight, RiskLevel, SourceLink, Supplier};

/// Result of the strategic (news and weather) assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicAssessment {
    pub status: RiskLevel,
    pub summary: String,
    pub weather_details: String,
    pub news_details: String,
    #[serde(default)]
    pub sources: Vec<SourceLink>,
}

impl StrategicAssessment {
    /// Assessment with neutral detail text and no sources.
    pub fn new(status: RiskLevel, summary: impl Into<String>) -> Self {
        Self {
            status,
            summary: summary.into(),
            weather_details: "No weather telemetry provided.".to_string(),
            news_details: "No news intelligence provided.".to_string(),
            sources: Vec::new(),
        }
    }

    pub fn with_weather(mut self, details: impl Into<String>) -> Self {
        self.weather_details = details.into();
        self
    }

    pub fn with_news(mut self, details: impl Into<String>) -> Self {
        self.news_details = details.into();
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceLink>) -> Self {
        self.sources = sources;
        self
    }
}

/// An external service that assesses supplier risk.
///
/// Implementations range from fixed test doubles to a generative-AI backend.
/// This trait is object-safe and can be used with `Arc<dyn RiskOracle>`.
///
/// The two assessments are independent; [`crate::assess_supplier_risk`]
/// issues them concurrently and joins the results.
#[async_trait]
pub trait RiskOracle: Send + Sync {
    /// Assess news and weather risk for a supplier.
    ///
    /// # Arguments
    ///
    /// * `supplier` - The supplier to assess.
    /// * `hq_location` - The company's HQ location, if configured.
    async fn assess_strategic(
        &self,
        supplier: &Supplier,
        hq_location: Option<&str>,
    ) -> Result<StrategicAssessment, OracleError>;

    /// Describe the geography and nearby infrastructure around a supplier.
    async fn assess_geography(&self, supplier: &Supplier) -> Result<MapInsight, OracleError>;

    /// Get a human-readable name for this oracle implementation.
    fn name(&self) -> &str;

    /// Check if the oracle is ready to take requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: RiskOracle + ?Sized> RiskOracle for std::sync::Arc<T> {
    async fn assess_strategic(
        &self,
        supplier: &Supplier,
        hq_location: Option<&str>,
    ) -> Result<StrategicAssessment, OracleError> {
        (**self).assess_strategic(supplier, hq_location).await
    }

    async fn assess_geography(&self, supplier: &Supplier) -> Result<MapInsight, OracleError> {
        (**self).assess_geography(supplier).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn is_ready(&self) -> bool {
        (**self).is_ready().await
    }
}
