//! Concurrent risk refresh.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::future::join_all;
use risk_core::{
    assess_supplier_risk, Clock, IdGenerator, RiskAnalysis, RiskLevel, RiskOracle, Supplier,
    SystemClock, UuidIds,
};
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::alerts::synchronize;
use crate::config::RefreshConfig;
use crate::error::RefreshError;
use crate::registry::{RegistryEvent, SupplierRegistry};
use crate::state::RiskState;

/// Capacity of the refresh event channel.
const EVENT_CAPACITY: usize = 256;

/// Per-supplier outcome, published as soon as it is known.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    /// A fresh analysis was published.
    AnalysisUpdated {
        supplier_id: String,
        status: RiskLevel,
    },
    /// The refresh failed; previous state is kept and the supplier is stale.
    RefreshFailed { supplier_id: String, error: String },
}

/// Outcome of a batch refresh.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Supplier ids with a newly published analysis.
    pub succeeded: Vec<String>,
    /// Supplier ids whose refresh failed, with the reason.
    pub failed: Vec<(String, RefreshError)>,
}

impl RefreshReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Marks one batch as in flight until dropped.
struct BatchGuard<'a> {
    in_flight: &'a AtomicUsize,
    refreshing: &'a watch::Sender<bool>,
}

impl<'a> BatchGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, refreshing: &'a watch::Sender<bool>) -> Self {
        if in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            refreshing.send_replace(true);
        }
        Self {
            in_flight,
            refreshing,
        }
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.refreshing.send_replace(false);
        }
    }
}

/// Owns the supplier registry and the published risk state, and keeps the
/// latter in step with the oracle.
///
/// Every refresh publishes its own result the moment it completes, so one
/// slow supplier never holds back the others. Results for the same supplier
/// are applied in completion order.
pub struct RefreshOrchestrator<O: RiskOracle + ?Sized> {
    oracle: Arc<O>,
    config: RefreshConfig,
    registry: SupplierRegistry,
    state: RwLock<RiskState>,
    hq_location: RwLock<Option<String>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    in_flight: AtomicUsize,
    refreshing: watch::Sender<bool>,
    events: broadcast::Sender<RefreshEvent>,
}

impl<O: RiskOracle + ?Sized> RefreshOrchestrator<O> {
    /// Create an orchestrator over `suppliers` using the wall clock and random ids.
    pub fn new(oracle: Arc<O>, config: RefreshConfig, suppliers: Vec<Supplier>) -> Self {
        Self::with_sources(
            oracle,
            config,
            suppliers,
            Arc::new(SystemClock),
            Arc::new(UuidIds),
        )
    }

    /// Create an orchestrator with an injected clock and id generator.
    pub fn with_sources(
        oracle: Arc<O>,
        config: RefreshConfig,
        suppliers: Vec<Supplier>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let (refreshing, _) = watch::channel(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            oracle,
            config,
            registry: SupplierRegistry::new(suppliers),
            state: RwLock::new(RiskState::default()),
            hq_location: RwLock::new(None),
            clock,
            ids,
            in_flight: AtomicUsize::new(0),
            refreshing,
            events,
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn registry(&self) -> &SupplierRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    /// Set the reference location passed to the oracle.
    pub async fn set_hq_location(&self, location: Option<String>) {
        *self.hq_location.write().await = location;
    }

    pub async fn hq_location(&self) -> Option<String> {
        self.hq_location.read().await.clone()
    }

    /// A consistent copy of the published state.
    pub async fn snapshot(&self) -> RiskState {
        self.state.read().await.clone()
    }

    /// Replace the published state wholesale, e.g. with one saved by an
    /// earlier session.
    pub async fn restore(&self, state: RiskState) {
        debug!(
            analyses = state.analyses.len(),
            alerts = state.alerts.len(),
            stale = state.stale.len(),
            "Restoring risk state"
        );
        *self.state.write().await = state;
    }

    /// Whether any batch is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        *self.refreshing.borrow()
    }

    /// Observe the "is refreshing" flag.
    pub fn watch_refreshing(&self) -> watch::Receiver<bool> {
        self.refreshing.subscribe()
    }

    /// Receive per-supplier refresh outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }

    /// Refresh a registered supplier by id.
    pub async fn refresh_supplier(&self, supplier_id: &str) -> Result<RiskAnalysis, RefreshError> {
        let supplier = self
            .registry
            .get(supplier_id)
            .await
            .ok_or_else(|| RefreshError::UnknownSupplier(supplier_id.to_string()))?;
        self.refresh_one(&supplier).await
    }

    /// Assess one supplier and publish the result.
    ///
    /// On success the analysis replaces the previous one, the alert feed is
    /// resynchronized and the supplier stops being stale. On failure
    /// (oracle error or timeout) nothing published changes except that the
    /// supplier is marked stale.
    pub async fn refresh_one(&self, supplier: &Supplier) -> Result<RiskAnalysis, RefreshError> {
        let hq = self.hq_location().await;

        debug!(
            supplier_id = %supplier.id,
            hq = ?hq,
            timeout = ?self.config.oracle_timeout,
            "Refreshing supplier"
        );

        let assessment = timeout(
            self.config.oracle_timeout,
            assess_supplier_risk(
                self.oracle.as_ref(),
                supplier,
                hq.as_deref(),
                self.clock.as_ref(),
            ),
        )
        .await;

        let result = match assessment {
            Ok(Ok(analysis)) => Ok(analysis),
            Ok(Err(e)) => Err(RefreshError::Oracle(e)),
            Err(_) => Err(RefreshError::Timeout(self.config.oracle_timeout)),
        };

        match result {
            Ok(analysis) => {
                self.publish(supplier, &analysis).await;
                Ok(analysis)
            }
            Err(e) => {
                self.mark_stale(supplier, &e).await;
                Err(e)
            }
        }
    }

    async fn publish(&self, supplier: &Supplier, analysis: &RiskAnalysis) {
        {
            let mut state = self.state.write().await;
            let alerts = synchronize(
                &state.alerts,
                supplier,
                analysis,
                self.config.alert_cap,
                self.clock.as_ref(),
                self.ids.as_ref(),
            );
            state
                .analyses
                .insert(supplier.id.clone(), analysis.clone());
            state.alerts = alerts;
            state.stale.remove(&supplier.id);
        }

        info!(
            supplier_id = %supplier.id,
            status = %analysis.status,
            "Published risk analysis"
        );

        let _ = self.events.send(RefreshEvent::AnalysisUpdated {
            supplier_id: supplier.id.clone(),
            status: analysis.status,
        });
    }

    async fn mark_stale(&self, supplier: &Supplier, error: &RefreshError) {
        self.state.write().await.stale.insert(supplier.id.clone());

        warn!(
            supplier_id = %supplier.id,
            error = %error,
            "Risk refresh failed, keeping previous state"
        );

        let _ = self.events.send(RefreshEvent::RefreshFailed {
            supplier_id: supplier.id.clone(),
            error: error.to_string(),
        });
    }

    /// Refresh every registered supplier concurrently.
    pub async fn refresh_all(&self) -> RefreshReport {
        let suppliers = self.registry.list().await;
        self.refresh_batch(&suppliers).await
    }

    /// Refresh `suppliers` concurrently.
    ///
    /// The refreshing flag is raised before the first call goes out and
    /// lowered once every batch in flight has settled. Individual failures
    /// are collected, never propagated.
    pub async fn refresh_batch(&self, suppliers: &[Supplier]) -> RefreshReport {
        let _guard = BatchGuard::enter(&self.in_flight, &self.refreshing);

        info!(count = suppliers.len(), "Starting refresh batch");

        let outcomes = join_all(suppliers.iter().map(|supplier| async move {
            (supplier.id.clone(), self.refresh_one(supplier).await)
        }))
        .await;

        let mut report = RefreshReport::default();
        for (supplier_id, outcome) in outcomes {
            match outcome {
                Ok(_) => report.succeeded.push(supplier_id),
                Err(e) => report.failed.push((supplier_id, e)),
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Refresh batch settled"
        );

        report
    }
}

impl<O: RiskOracle + ?Sized + 'static> RefreshOrchestrator<O> {
    /// Refresh each newly registered supplier in the background.
    ///
    /// Only the added supplier is refreshed, not the whole registry. The
    /// task ends once the orchestrator is dropped.
    pub fn spawn_auto_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.registry.subscribe();
        let orchestrator: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(RegistryEvent::SupplierAdded(supplier)) => {
                        let Some(orchestrator) = orchestrator.upgrade() else {
                            break;
                        };
                        debug!(supplier_id = %supplier.id, "Auto-refreshing new supplier");
                        // Failures are already logged and broadcast
                        let _ = orchestrator.refresh_one(&supplier).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auto-refresh fell behind registry events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Auto-refresh task stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use mock_oracle::{DelayedOracle, FailingOracle, FixedOracle};
    use risk_core::{
        async_trait, Alert, FixedClock, MapInsight, OracleError, SequentialIds,
        StrategicAssessment, SupplierCategory,
    };

    /// Answers strategic calls from a script, one entry per call in call order.
    struct ScriptedOracle {
        script: Mutex<VecDeque<(Duration, RiskLevel, &'static str)>>,
    }

    impl ScriptedOracle {
        fn new(script: impl IntoIterator<Item = (Duration, RiskLevel, &'static str)>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl RiskOracle for ScriptedOracle {
        async fn assess_strategic(
            &self,
            _supplier: &Supplier,
            _hq_location: Option<&str>,
        ) -> Result<StrategicAssessment, OracleError> {
            let next = self.script.lock().unwrap().pop_front();
            let (delay, status, summary) =
                next.ok_or_else(|| OracleError::Unavailable("script exhausted".to_string()))?;
            tokio::time::sleep(delay).await;
            Ok(StrategicAssessment::new(status, summary))
        }

        async fn assess_geography(&self, supplier: &Supplier) -> Result<MapInsight, OracleError> {
            Ok(MapInsight::new(format!("{} surroundings", supplier.name), Vec::new()))
        }

        fn name(&self) -> &str {
            "ScriptedOracle"
        }
    }

    fn supplier(id: &str, category: SupplierCategory) -> Supplier {
        Supplier::new(
            id,
            format!("Supplier {id}"),
            format!("City {id}"),
            category,
            chrono::DateTime::UNIX_EPOCH,
        )
    }

    fn suppliers() -> Vec<Supplier> {
        vec![
            supplier("a", SupplierCategory::Electronics),
            supplier("b", SupplierCategory::Logistics),
            supplier("c", SupplierCategory::Textiles),
        ]
    }

    fn orchestrator<O: RiskOracle>(oracle: O, config: RefreshConfig) -> RefreshOrchestrator<O> {
        RefreshOrchestrator::with_sources(
            Arc::new(oracle),
            config,
            suppliers(),
            Arc::new(FixedClock::at_timestamp(1_700_000_000)),
            Arc::new(SequentialIds::with_prefix("alert")),
        )
    }

    #[tokio::test]
    async fn test_refresh_all_publishes_and_alerts() {
        let oracle = FixedOracle::stable()
            .with_supplier("a", RiskLevel::Risky, "Port strike ongoing.")
            .with_supplier("b", RiskLevel::Caution, "Customs backlog.");
        let orch = orchestrator(oracle, RefreshConfig::default());

        let report = orch.refresh_all().await;
        assert_eq!(report.total(), 3);
        assert!(report.is_complete());

        let state = orch.snapshot().await;
        assert_eq!(state.analyses.len(), 3);
        assert_eq!(state.analysis("a").unwrap().status, RiskLevel::Risky);
        assert_eq!(state.analysis("c").unwrap().status, RiskLevel::Stable);
        assert_eq!(state.alerts.len(), 2);
        assert!(state.alerts.iter().all(|a| a.supplier_id != "c"));
        assert!(!orch.is_refreshing());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_state_and_marks_stale() {
        let oracle = Arc::new(FixedOracle::new(RiskLevel::Risky, "Flooding."));
        let orch = RefreshOrchestrator::with_sources(
            Arc::clone(&oracle),
            RefreshConfig::default(),
            suppliers(),
            Arc::new(FixedClock::at_timestamp(0)),
            Arc::new(SequentialIds::default()),
        );

        orch.refresh_all().await;
        let before = orch.snapshot().await;

        oracle
            .fail("a", OracleError::Network("connection reset".to_string()))
            .await;
        let report = orch.refresh_all().await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "a");
        assert!(matches!(report.failed[0].1, RefreshError::Oracle(_)));

        let after = orch.snapshot().await;
        assert_eq!(after.analysis("a"), before.analysis("a"));
        assert!(after.alerts.iter().any(|x| x.supplier_id == "a"));
        assert!(after.is_stale("a"));
        assert!(!after.is_stale("b"));

        // Recovery clears the stale mark
        oracle.set("a", RiskLevel::Stable, "Water receded.").await;
        orch.refresh_supplier("a").await.unwrap();
        let recovered = orch.snapshot().await;
        assert!(!recovered.is_stale("a"));
        assert!(recovered.alerts.iter().all(|x| x.supplier_id != "a"));
    }

    #[tokio::test]
    async fn test_failure_without_history_leaves_nothing() {
        let orch = orchestrator(FailingOracle::unavailable(), RefreshConfig::default());

        let report = orch.refresh_all().await;
        assert_eq!(report.failed.len(), 3);
        assert!(report.succeeded.is_empty());

        let state = orch.snapshot().await;
        assert!(state.analyses.is_empty());
        assert!(state.alerts.is_empty());
        assert_eq!(state.stale.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_failure() {
        let oracle = DelayedOracle::new(FixedOracle::stable(), Duration::from_millis(10))
            .with_supplier_delay("b", Duration::from_secs(3600));
        let config = RefreshConfig::builder()
            .oracle_timeout(Duration::from_secs(1))
            .build();
        let orch = orchestrator(oracle, config);

        let report = orch.refresh_all().await;
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].1,
            RefreshError::Timeout(d) if d == Duration::from_secs(1)
        ));
        assert!(orch.snapshot().await.is_stale("b"));
        assert!(!orch.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_results_visible_before_batch_settles() {
        let oracle = DelayedOracle::new(
            FixedOracle::new(RiskLevel::Caution, "Congestion."),
            Duration::from_millis(10),
        )
        .with_supplier_delay("c", Duration::from_secs(10));
        let orch = Arc::new(orchestrator(oracle, RefreshConfig::default()));
        let mut refreshing = orch.watch_refreshing();

        let batch = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.refresh_all().await }
        });

        refreshing.changed().await.unwrap();
        assert!(*refreshing.borrow_and_update());

        tokio::time::sleep(Duration::from_secs(1)).await;
        let partial = orch.snapshot().await;
        assert!(partial.analysis("a").is_some());
        assert!(partial.analysis("b").is_some());
        assert!(partial.analysis("c").is_none());
        assert!(orch.is_refreshing());

        let report = batch.await.unwrap();
        assert!(report.is_complete());
        assert!(!orch.is_refreshing());
        assert!(!*refreshing.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_supplier_results_apply_in_completion_order() {
        let oracle = ScriptedOracle::new([
            (Duration::from_secs(5), RiskLevel::Risky, "Slow answer"),
            (Duration::from_secs(1), RiskLevel::Caution, "Quick answer"),
        ]);
        let orch = Arc::new(orchestrator(oracle, RefreshConfig::default()));

        let slow = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.refresh_supplier("a").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let quick = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.refresh_supplier("a").await }
        });

        quick.await.unwrap().unwrap();
        let early = orch.snapshot().await;
        assert_eq!(early.analysis("a").unwrap().summary, "Quick answer");
        assert_eq!(early.alerts.len(), 1);

        slow.await.unwrap().unwrap();
        let state = orch.snapshot().await;
        let analysis = state.analysis("a").unwrap();
        assert_eq!(analysis.status, RiskLevel::Risky);
        assert_eq!(analysis.summary, "Slow answer");

        let for_a: Vec<&Alert> = state.alerts.iter().filter(|a| a.supplier_id == "a").collect();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].message, "Slow answer");
        assert_eq!(for_a[0].severity, RiskLevel::Risky);
        assert!(!state.is_stale("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_batches_keep_flag_raised() {
        let oracle = DelayedOracle::new(FixedOracle::stable(), Duration::from_secs(1))
            .with_supplier_delay("a", Duration::from_secs(5));
        let orch = Arc::new(orchestrator(oracle, RefreshConfig::default()));

        let slow = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.refresh_all().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let quick = orch.refresh_batch(&[supplier("b", SupplierCategory::Logistics)]).await;
        assert!(quick.is_complete());
        assert!(orch.is_refreshing());

        slow.await.unwrap();
        assert!(!orch.is_refreshing());
    }

    #[tokio::test]
    async fn test_events_report_each_outcome() {
        let oracle = FixedOracle::stable()
            .with_failure("b", OracleError::Malformed("missing STATUS line".to_string()));
        let orch = orchestrator(oracle, RefreshConfig::default());
        let mut events = orch.subscribe();

        orch.refresh_all().await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen.len(), 3);
        assert!(seen.contains(&RefreshEvent::AnalysisUpdated {
            supplier_id: "a".to_string(),
            status: RiskLevel::Stable,
        }));
        assert!(seen.iter().any(|e| matches!(
            e,
            RefreshEvent::RefreshFailed { supplier_id, .. } if supplier_id == "b"
        )));
    }

    #[tokio::test]
    async fn test_hq_location_reaches_oracle_call() {
        let orch = orchestrator(FixedOracle::stable(), RefreshConfig::default());
        assert_eq!(orch.hq_location().await, None);

        orch.set_hq_location(Some("Austin, TX".to_string())).await;
        assert_eq!(orch.hq_location().await.as_deref(), Some("Austin, TX"));
        orch.refresh_supplier("a").await.unwrap();
        assert_eq!(orch.oracle().calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_supplier() {
        let orch = orchestrator(FixedOracle::stable(), RefreshConfig::default());
        assert!(matches!(
            orch.refresh_supplier("nope").await,
            Err(RefreshError::UnknownSupplier(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn test_alert_cap_applies() {
        let oracle = FixedOracle::new(RiskLevel::Risky, "Strike.");
        let config = RefreshConfig::builder().alert_cap(2).build();
        let orch = orchestrator(oracle, config);

        orch.refresh_all().await;
        assert_eq!(orch.snapshot().await.alerts.len(), 2);
    }

    #[tokio::test]
    async fn test_auto_refresh_only_new_supplier() {
        let oracle = Arc::new(FixedOracle::new(RiskLevel::Caution, "Delays."));
        let orch = Arc::new(RefreshOrchestrator::with_sources(
            Arc::clone(&oracle),
            RefreshConfig::default(),
            suppliers(),
            Arc::new(FixedClock::at_timestamp(0)),
            Arc::new(SequentialIds::default()),
        ));
        let handle = orch.spawn_auto_refresh();
        let mut events = orch.subscribe();

        orch.registry()
            .add(supplier("d", SupplierCategory::Manufacturing))
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            RefreshEvent::AnalysisUpdated {
                supplier_id: "d".to_string(),
                status: RiskLevel::Caution,
            }
        );
        assert_eq!(oracle.calls(), 1);

        let state = orch.snapshot().await;
        assert_eq!(state.analyses.len(), 1);
        assert!(state.analysis("d").is_some());

        handle.abort();
    }
}
