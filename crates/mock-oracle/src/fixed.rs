//! Fixed oracle implementation - returns configured assessments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use risk_core::{
    async_trait, MapInsight, OracleError, RiskLevel, RiskOracle, StrategicAssessment, Supplier,
};
use tokio::sync::RwLock;

/// An oracle that answers from a lookup table.
///
/// Suppliers with an entry get that entry (which may be an error); everyone
/// else gets the default assessment. Entries can be changed between calls to
/// script a sequence of refreshes.
pub struct FixedOracle {
    default: StrategicAssessment,
    overrides: RwLock<HashMap<String, Result<StrategicAssessment, OracleError>>>,
    geography: MapInsight,
    calls: AtomicUsize,
}

impl FixedOracle {
    /// Answer every supplier with `status` and `summary`.
    pub fn new(status: RiskLevel, summary: impl Into<String>) -> Self {
        Self {
            default: StrategicAssessment::new(status, summary),
            overrides: RwLock::new(HashMap::new()),
            geography: MapInsight::new("Mock geography", Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// An oracle that reports every supplier as stable.
    pub fn stable() -> Self {
        Self::new(RiskLevel::Stable, "Safe Zone. Operations nominal.")
    }

    /// Builder-style per-supplier answer.
    pub fn with_supplier(
        mut self,
        supplier_id: impl Into<String>,
        status: RiskLevel,
        summary: impl Into<String>,
    ) -> Self {
        self.overrides
            .get_mut()
            .insert(supplier_id.into(), Ok(StrategicAssessment::new(status, summary)));
        self
    }

    /// Builder-style per-supplier failure.
    pub fn with_failure(mut self, supplier_id: impl Into<String>, error: OracleError) -> Self {
        self.overrides
            .get_mut()
            .insert(supplier_id.into(), Err(error));
        self
    }

    /// Change the answer for one supplier.
    pub async fn set(&self, supplier_id: &str, status: RiskLevel, summary: impl Into<String>) {
        self.overrides.write().await.insert(
            supplier_id.to_string(),
            Ok(StrategicAssessment::new(status, summary)),
        );
    }

    /// Make one supplier fail from now on.
    pub async fn fail(&self, supplier_id: &str, error: OracleError) {
        self.overrides
            .write()
            .await
            .insert(supplier_id.to_string(), Err(error));
    }

    /// Number of strategic assessments served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskOracle for FixedOracle {
    async fn assess_strategic(
        &self,
        supplier: &Supplier,
        _hq_location: Option<&str>,
    ) -> Result<StrategicAssessment, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.overrides.read().await.get(&supplier.id) {
            Some(answer) => answer.clone(),
            None => Ok(self.default.clone()),
        }
    }

    async fn assess_geography(&self, _supplier: &Supplier) -> Result<MapInsight, OracleError> {
        Ok(self.geography.clone())
    }

    fn name(&self) -> &str {
        "FixedOracle"
    }
}
