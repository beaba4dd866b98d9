//! Delayed oracle implementation - wraps another oracle with artificial delay.

use std::collections::HashMap;
use std::time::Duration;

use risk_core::{
    async_trait, MapInsight, OracleError, RiskOracle, StrategicAssessment, Supplier,
};
use tokio::time::sleep;

/// An oracle that wraps another oracle and adds artificial delay.
///
/// Useful for testing timeout handling and out-of-order completion. Individual
/// suppliers can be given their own delay.
pub struct DelayedOracle<O: RiskOracle> {
    inner: O,
    delay: Duration,
    per_supplier: HashMap<String, Duration>,
}

impl<O: RiskOracle> DelayedOracle<O> {
    /// Create a new DelayedOracle wrapping the given oracle with the specified delay.
    pub fn new(inner: O, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            per_supplier: HashMap::new(),
        }
    }

    /// Create an oracle with a delay in milliseconds.
    pub fn with_millis(inner: O, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Override the delay for one supplier.
    pub fn with_supplier_delay(mut self, supplier_id: impl Into<String>, delay: Duration) -> Self {
        self.per_supplier.insert(supplier_id.into(), delay);
        self
    }

    /// Get the wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    fn delay_for(&self, supplier: &Supplier) -> Duration {
        self.per_supplier
            .get(&supplier.id)
            .copied()
            .unwrap_or(self.delay)
    }
}

#[async_trait]
impl<O: RiskOracle> RiskOracle for DelayedOracle<O> {
    async fn assess_strategic(
        &self,
        supplier: &Supplier,
        hq_location: Option<&str>,
    ) -> Result<StrategicAssessment, OracleError> {
        sleep(self.delay_for(supplier)).await;
        self.inner.assess_strategic(supplier, hq_location).await
    }

    async fn assess_geography(&self, supplier: &Supplier) -> Result<MapInsight, OracleError> {
        sleep(self.delay_for(supplier)).await;
        self.inner.assess_geography(supplier).await
    }

    fn name(&self) -> &str {
        "DelayedOracle"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}
