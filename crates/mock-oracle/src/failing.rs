//! Failing oracle implementation - every call errors.

use std::sync::atomic::{AtomicUsize, Ordering};

use risk_core::{
    async_trait, MapInsight, OracleError, RiskOracle, StrategicAssessment, Supplier,
};

/// An oracle whose calls always fail with the same error.
///
/// Useful for testing that failures leave previous state untouched.
#[derive(Debug)]
pub struct FailingOracle {
    error: OracleError,
    calls: AtomicUsize,
}

impl FailingOracle {
    pub fn new(error: OracleError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail with [`OracleError::Unavailable`].
    pub fn unavailable() -> Self {
        Self::new(OracleError::Unavailable("mock oracle offline".to_string()))
    }

    /// Number of strategic assessments attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskOracle for FailingOracle {
    async fn assess_strategic(
        &self,
        _supplier: &Supplier,
        _hq_location: Option<&str>,
    ) -> Result<StrategicAssessment, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn assess_geography(&self, _supplier: &Supplier) -> Result<MapInsight, OracleError> {
        Err(self.error.clone())
    }

    fn name(&self) -> &str {
        "FailingOracle"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk_core::{SequentialIds, SupplierCategory, SystemClock};

    #[tokio::test]
    async fn test_always_fails() {
        let oracle = FailingOracle::new(OracleError::Rejected("quota".to_string()));
        let supplier = Supplier::register(
            "A",
            "B",
            SupplierCategory::Textiles,
            &SequentialIds::default(),
            &SystemClock,
        );

        let result = oracle.assess_strategic(&supplier, Some("HQ")).await;
        assert_eq!(result, Err(OracleError::Rejected("quota".to_string())));
        assert!(oracle.assess_geography(&supplier).await.is_err());
        assert_eq!(oracle.calls(), 1);
        assert!(!oracle.is_ready().await);
    }
}
