//! Application state facade driven by the presentation layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use risk_core::{
    Alert, Clock, CompanyInfo, IdGenerator, RiskAnalysis, RiskOracle, Supplier, SupplierCategory,
    SystemClock, UuidIds,
};
use storage::settings::{self, PersistedState};
use storage::KeyValueStore;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::aggregate::{self, CategoryFilter, DashboardStats, StatusFilter, TimeWindow};
use crate::config::RefreshConfig;
use crate::error::RefreshError;
use crate::orchestrator::{RefreshOrchestrator, RefreshReport};
use crate::state::RiskState;

/// User-level settings mirrored to storage.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    company: Option<CompanyInfo>,
    visible_sectors: Vec<SupplierCategory>,
    authenticated: bool,
}

/// Result of registering a supplier through the dashboard.
#[derive(Debug)]
pub struct AddedSupplier {
    pub supplier: Supplier,
    /// Outcome of the immediate refresh, or `None` when the dashboard was
    /// not ready to refresh (signed out or no company profile).
    pub refresh: Option<Result<RiskAnalysis, RefreshError>>,
}

/// An alert with the records it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDetail {
    pub alert: Alert,
    /// `None` for orphaned alerts.
    pub supplier: Option<Supplier>,
    pub analysis: Option<RiskAnalysis>,
}

/// The dashboard's whole application state.
///
/// Owns the refresh orchestrator (and through it the registry and published
/// risk state) plus the user settings. Every change to settings or the
/// registry is written to the store before the call returns. The published
/// risk state is saved after each refresh so alert ids stay valid across
/// sessions.
pub struct Dashboard<O: RiskOracle + ?Sized> {
    orchestrator: Arc<RefreshOrchestrator<O>>,
    store: Arc<dyn KeyValueStore>,
    settings: RwLock<Settings>,
    /// Serializes list-save-register so a slow save never overwrites a newer list.
    registry_writes: Mutex<()>,
    /// Serializes risk state saves so the last write holds the newest snapshot.
    risk_writes: Mutex<()>,
}

impl<O: RiskOracle + ?Sized> Dashboard<O> {
    /// Restore state from `store` and build the dashboard.
    pub async fn load(
        oracle: Arc<O>,
        config: RefreshConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self::load_with_sources(
            oracle,
            config,
            store,
            Arc::new(SystemClock),
            Arc::new(UuidIds),
        )
        .await
    }

    /// Restore state with an injected clock and id generator.
    pub async fn load_with_sources(
        oracle: Arc<O>,
        config: RefreshConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let persisted = PersistedState::load(store.as_ref(), clock.as_ref()).await;

        let orchestrator = Arc::new(RefreshOrchestrator::with_sources(
            oracle,
            config,
            persisted.suppliers,
            clock,
            ids,
        ));
        orchestrator
            .set_hq_location(persisted.company.as_ref().map(|c| c.location.clone()))
            .await;
        orchestrator
            .restore(RiskState::from_snapshot(persisted.risk))
            .await;

        info!(
            suppliers = orchestrator.registry().len().await,
            authenticated = persisted.authenticated,
            "Dashboard loaded"
        );

        Self {
            orchestrator,
            store,
            settings: RwLock::new(Settings {
                company: persisted.company,
                visible_sectors: persisted.visible_sectors,
                authenticated: persisted.authenticated,
            }),
            registry_writes: Mutex::new(()),
            risk_writes: Mutex::new(()),
        }
    }

    pub fn orchestrator(&self) -> &Arc<RefreshOrchestrator<O>> {
        &self.orchestrator
    }

    pub async fn is_authenticated(&self) -> bool {
        self.settings.read().await.authenticated
    }

    pub async fn company(&self) -> Option<CompanyInfo> {
        self.settings.read().await.company.clone()
    }

    pub async fn visible_categories(&self) -> Vec<SupplierCategory> {
        self.settings.read().await.visible_sectors.clone()
    }

    pub async fn login(&self) -> Result<(), RefreshError> {
        settings::save_authenticated(self.store.as_ref(), true).await?;
        self.settings.write().await.authenticated = true;
        info!("Signed in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), RefreshError> {
        settings::save_authenticated(self.store.as_ref(), false).await?;
        self.settings.write().await.authenticated = false;
        info!("Signed out");
        Ok(())
    }

    /// Set the company profile; its location becomes the oracle's reference point.
    pub async fn set_company(
        &self,
        name: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<CompanyInfo, RefreshError> {
        let name: String = name.into();
        let location: String = location.into();
        let company = CompanyInfo::new(name.trim(), location.trim());
        if company.name.is_empty() || company.location.is_empty() {
            return Err(RefreshError::InvalidInput(
                "company name and location are required".to_string(),
            ));
        }

        settings::save_company(self.store.as_ref(), &company).await?;
        self.settings.write().await.company = Some(company.clone());
        self.orchestrator
            .set_hq_location(Some(company.location.clone()))
            .await;

        info!(company = %company.name, location = %company.location, "Company profile set");
        Ok(company)
    }

    /// Replace the set of visible sectors. Duplicates are dropped.
    pub async fn set_visible_categories(
        &self,
        categories: impl IntoIterator<Item = SupplierCategory>,
    ) -> Result<(), RefreshError> {
        let mut visible: Vec<SupplierCategory> = Vec::new();
        for category in categories {
            if !visible.contains(&category) {
                visible.push(category);
            }
        }

        settings::save_visible_sectors(self.store.as_ref(), &visible).await?;
        info!(count = visible.len(), "Visible sectors updated");
        self.settings.write().await.visible_sectors = visible;
        Ok(())
    }

    /// Register a supplier, persist the registry and refresh just that supplier.
    ///
    /// The extended list is saved before the supplier is registered, so a
    /// failed save leaves the registry untouched and announces nothing.
    pub async fn add_supplier(
        &self,
        name: &str,
        location: &str,
        category: SupplierCategory,
    ) -> Result<AddedSupplier, RefreshError> {
        let supplier = Supplier::register(
            name.trim(),
            location.trim(),
            category,
            self.orchestrator.ids(),
            self.orchestrator.clock(),
        );

        {
            let _writes = self.registry_writes.lock().await;
            let registry = self.orchestrator.registry();
            registry.check(&supplier).await?;

            let mut suppliers = registry.list().await;
            suppliers.push(supplier.clone());
            settings::save_suppliers(self.store.as_ref(), &suppliers).await?;

            registry.add(supplier.clone()).await?;
        }

        let refresh = match self.ensure_ready().await {
            Ok(()) => {
                let result = self.orchestrator.refresh_one(&supplier).await;
                self.save_risk_state().await;
                Some(result)
            }
            Err(reason) => {
                warn!(supplier_id = %supplier.id, %reason, "Skipping refresh of new supplier");
                None
            }
        };

        Ok(AddedSupplier { supplier, refresh })
    }

    /// Refresh every supplier. Requires a signed-in user with a company profile.
    pub async fn refresh_all(&self) -> Result<RefreshReport, RefreshError> {
        self.ensure_ready().await?;
        let report = self.orchestrator.refresh_all().await;
        self.save_risk_state().await;
        Ok(report)
    }

    /// Refresh one supplier by id. Same preconditions as [`Dashboard::refresh_all`].
    pub async fn refresh_supplier(&self, supplier_id: &str) -> Result<RiskAnalysis, RefreshError> {
        self.ensure_ready().await?;
        let result = self.orchestrator.refresh_supplier(supplier_id).await;
        if !matches!(result, Err(RefreshError::UnknownSupplier(_))) {
            self.save_risk_state().await;
        }
        result
    }

    /// Save the published risk state.
    ///
    /// A failed save is logged and otherwise ignored: the refresh itself
    /// succeeded and the in-memory state stays current.
    async fn save_risk_state(&self) {
        let _writes = self.risk_writes.lock().await;
        let snapshot = self.orchestrator.snapshot().await.to_snapshot();
        if let Err(e) = settings::save_risk_snapshot(self.store.as_ref(), &snapshot).await {
            warn!(error = %e, "Failed to save risk state");
        }
    }

    async fn ensure_ready(&self) -> Result<(), RefreshError> {
        let settings = self.settings.read().await;
        if !settings.authenticated {
            return Err(RefreshError::NotAuthenticated);
        }
        if settings.company.is_none() {
            return Err(RefreshError::MissingCompany);
        }
        Ok(())
    }

    /// Look up an alert together with its supplier and current analysis.
    pub async fn select_alert(&self, alert_id: &str) -> Option<AlertDetail> {
        let state = self.orchestrator.snapshot().await;
        let alert = state.alert(alert_id)?.clone();
        let supplier = self.orchestrator.registry().get(&alert.supplier_id).await;
        let analysis = state.analysis(&alert.supplier_id).cloned();

        Some(AlertDetail {
            alert,
            supplier,
            analysis,
        })
    }

    pub async fn stats(&self) -> DashboardStats {
        let suppliers = self.orchestrator.registry().list().await;
        let state = self.orchestrator.snapshot().await;
        let visible = self.visible_categories().await;

        aggregate::dashboard_stats(&suppliers, &state.analyses, &visible, |id| {
            state.is_stale(id)
        })
    }

    /// Suppliers matching the registry filters, in registration order.
    pub async fn suppliers(
        &self,
        query: &str,
        status: StatusFilter,
        category: CategoryFilter,
    ) -> Vec<Supplier> {
        let suppliers = self.orchestrator.registry().list().await;
        let state = self.orchestrator.snapshot().await;
        let visible = self.visible_categories().await;

        aggregate::filtered_suppliers(&suppliers, &state.analyses, query, status, category, &visible)
            .into_iter()
            .cloned()
            .collect()
    }

    /// The alert feed restricted to `window` and the visible sectors.
    pub async fn alerts(&self, window: TimeWindow) -> Vec<Alert> {
        let suppliers = self.orchestrator.registry().list().await;
        let state = self.orchestrator.snapshot().await;
        let visible = self.visible_categories().await;
        let now = self.orchestrator.clock().now();

        aggregate::filtered_alerts(&state.alerts, window, &visible, &suppliers, now)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn last_global_update(&self) -> Option<DateTime<Utc>> {
        aggregate::last_global_update(&self.orchestrator.snapshot().await.analyses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use mock_oracle::FixedOracle;
    use risk_core::{async_trait, FixedClock, OracleError, RiskLevel, SequentialIds};
    use storage::settings::{AUTH_KEY, COMPANY_KEY, SUPPLIERS_KEY};
    use storage::{MemoryStore, StorageError};

    use crate::aggregate::Filter;

    /// Delays the first supplier-list write and optionally fails every one.
    struct FlakySuppliersStore {
        inner: Arc<MemoryStore>,
        delay_first: Option<Duration>,
        fail: bool,
        delayed: AtomicBool,
    }

    impl FlakySuppliersStore {
        fn slow(inner: Arc<MemoryStore>, delay: Duration) -> Self {
            Self {
                inner,
                delay_first: Some(delay),
                fail: false,
                delayed: AtomicBool::new(false),
            }
        }

        fn broken(inner: Arc<MemoryStore>) -> Self {
            Self {
                inner,
                delay_first: None,
                fail: true,
                delayed: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakySuppliersStore {
        async fn get(&self, key: &str) -> storage::Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: &str) -> storage::Result<()> {
            if key == SUPPLIERS_KEY {
                if self.fail {
                    let cause = serde_json::from_str::<u8>("disk full").unwrap_err();
                    return Err(StorageError::Serialization(cause));
                }
                if let Some(delay) = self.delay_first {
                    if !self.delayed.swap(true, Ordering::SeqCst) {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
            self.inner.put(key, value).await
        }

        async fn remove(&self, key: &str) -> storage::Result<()> {
            self.inner.remove(key).await
        }
    }

    async fn dashboard(
        oracle: FixedOracle,
        store: Arc<dyn KeyValueStore>,
    ) -> Dashboard<FixedOracle> {
        Dashboard::load_with_sources(
            Arc::new(oracle),
            RefreshConfig::default(),
            store,
            Arc::new(FixedClock::at_timestamp(1_700_000_000)),
            Arc::new(SequentialIds::with_prefix("id")),
        )
        .await
    }

    async fn ready_dashboard(oracle: FixedOracle) -> (Dashboard<FixedOracle>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let dash = dashboard(oracle, store.clone()).await;
        dash.login().await.unwrap();
        dash.set_company("Acme", "Austin, TX").await.unwrap();
        (dash, store)
    }

    #[tokio::test]
    async fn test_fresh_store_starts_with_defaults() {
        let dash = dashboard(FixedOracle::stable(), Arc::new(MemoryStore::new())).await;

        assert!(!dash.is_authenticated().await);
        assert_eq!(dash.company().await, None);
        assert_eq!(dash.visible_categories().await, SupplierCategory::ALL.to_vec());

        let names: Vec<String> = dash
            .suppliers("", Filter::All, Filter::All)
            .await
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Zhongshan Electronics", "Nordic Logistics Co"]);
    }

    #[tokio::test]
    async fn test_refresh_requires_login_and_company() {
        let store = Arc::new(MemoryStore::new());
        let dash = dashboard(FixedOracle::stable(), store).await;

        assert!(matches!(
            dash.refresh_all().await,
            Err(RefreshError::NotAuthenticated)
        ));

        dash.login().await.unwrap();
        assert!(matches!(
            dash.refresh_all().await,
            Err(RefreshError::MissingCompany)
        ));

        dash.set_company("Acme", "Austin, TX").await.unwrap();
        let report = dash.refresh_all().await.unwrap();
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(
            dash.orchestrator().hq_location().await.as_deref(),
            Some("Austin, TX")
        );
    }

    #[tokio::test]
    async fn test_add_supplier_persists_and_refreshes() {
        let oracle = FixedOracle::new(RiskLevel::Risky, "Export ban announced.");
        let (dash, store) = ready_dashboard(oracle).await;

        let added = dash
            .add_supplier("Delta Textiles", "Dhaka, Bangladesh", SupplierCategory::Textiles)
            .await
            .unwrap();
        assert_eq!(added.supplier.id, "id-1");
        let analysis = added.refresh.unwrap().unwrap();
        assert_eq!(analysis.status, RiskLevel::Risky);

        // Only the new supplier was assessed
        assert_eq!(dash.orchestrator().oracle().calls(), 1);

        let alerts = dash.alerts(TimeWindow::All).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].supplier_name, "Delta Textiles");

        // A second dashboard over the same store sees the new supplier
        let reloaded = dashboard(FixedOracle::stable(), store).await;
        assert_eq!(
            reloaded.suppliers("dhaka", Filter::All, Filter::All).await.len(),
            1
        );
        assert!(reloaded.is_authenticated().await);
        assert_eq!(
            reloaded.company().await,
            Some(CompanyInfo::new("Acme", "Austin, TX"))
        );
    }

    #[tokio::test]
    async fn test_add_supplier_when_signed_out_skips_refresh() {
        let dash = dashboard(FixedOracle::stable(), Arc::new(MemoryStore::new())).await;

        let added = dash
            .add_supplier("Ore Co", "Perth, Australia", SupplierCategory::RawMaterials)
            .await
            .unwrap();
        assert!(added.refresh.is_none());
        assert_eq!(dash.orchestrator().oracle().calls(), 0);
    }

    #[tokio::test]
    async fn test_add_supplier_rejects_blank_name() {
        let (dash, _) = ready_dashboard(FixedOracle::stable()).await;
        assert!(matches!(
            dash.add_supplier("   ", "Somewhere", SupplierCategory::Textiles)
                .await,
            Err(RefreshError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_visible_categories_drive_views() {
        let oracle = FixedOracle::new(RiskLevel::Caution, "Congestion at port.");
        let (dash, store) = ready_dashboard(oracle).await;
        dash.refresh_all().await.unwrap();

        assert_eq!(dash.stats().await.total, 2);
        assert_eq!(dash.alerts(TimeWindow::Day).await.len(), 2);

        dash.set_visible_categories([
            SupplierCategory::Logistics,
            SupplierCategory::Logistics,
        ])
        .await
        .unwrap();
        assert_eq!(dash.visible_categories().await, vec![SupplierCategory::Logistics]);

        let stats = dash.stats().await;
        assert_eq!(stats.total, 1);
        assert_eq!(stats.caution, 1);
        assert!(!stats.is_disrupted());

        let alerts = dash.alerts(TimeWindow::All).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].supplier_name, "Nordic Logistics Co");

        let reloaded = dashboard(FixedOracle::stable(), store).await;
        assert_eq!(
            reloaded.visible_categories().await,
            vec![SupplierCategory::Logistics]
        );
    }

    #[tokio::test]
    async fn test_select_alert() {
        let oracle = FixedOracle::stable().with_supplier("1", RiskLevel::Risky, "Typhoon landfall.");
        let (dash, _) = ready_dashboard(oracle).await;
        dash.refresh_all().await.unwrap();

        let alerts = dash.alerts(TimeWindow::All).await;
        assert_eq!(alerts.len(), 1);

        let detail = dash.select_alert(&alerts[0].id).await.unwrap();
        assert_eq!(detail.alert.message, "Typhoon landfall.");
        assert_eq!(detail.supplier.unwrap().name, "Zhongshan Electronics");
        assert_eq!(detail.analysis.unwrap().status, RiskLevel::Risky);

        assert!(dash.select_alert("missing").await.is_none());
        assert!(dash.last_global_update().await.is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_flag() {
        let (dash, store) = ready_dashboard(FixedOracle::stable()).await;
        dash.logout().await.unwrap();

        assert!(!dash.is_authenticated().await);
        assert_eq!(store.get(AUTH_KEY).await.unwrap(), None);
        assert!(store.get(COMPANY_KEY).await.unwrap().is_some());
        assert!(matches!(
            dash.refresh_all().await,
            Err(RefreshError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_set_company_validates() {
        let dash = dashboard(FixedOracle::stable(), Arc::new(MemoryStore::new())).await;
        assert!(dash.set_company("", "Austin").await.is_err());
        assert!(dash.set_company("Acme", "  ").await.is_err());
        assert_eq!(dash.company().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_adds_keep_every_supplier_persisted() {
        let memory = Arc::new(MemoryStore::new());
        let store = Arc::new(FlakySuppliersStore::slow(
            Arc::clone(&memory),
            Duration::from_millis(200),
        ));
        let dash = dashboard(FixedOracle::stable(), store).await;

        let (first, second) = tokio::join!(
            dash.add_supplier("Alpha Metals", "Perth, Australia", SupplierCategory::RawMaterials),
            dash.add_supplier("Beta Freight", "Antwerp, Belgium", SupplierCategory::Logistics),
        );
        first.unwrap();
        second.unwrap();
        assert_eq!(dash.orchestrator().registry().len().await, 4);

        let reloaded = dashboard(FixedOracle::stable(), memory).await;
        let mut names: Vec<String> = reloaded
            .suppliers("", Filter::All, Filter::All)
            .await
            .into_iter()
            .map(|s| s.name)
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "Alpha Metals",
                "Beta Freight",
                "Nordic Logistics Co",
                "Zhongshan Electronics"
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_save_leaves_registry_untouched() {
        let memory = Arc::new(MemoryStore::new());
        let store = Arc::new(FlakySuppliersStore::broken(Arc::clone(&memory)));
        let dash = dashboard(FixedOracle::stable(), store).await;
        dash.login().await.unwrap();
        dash.set_company("Acme", "Austin, TX").await.unwrap();
        let mut events = dash.orchestrator().registry().subscribe();

        let result = dash
            .add_supplier("Delta Textiles", "Dhaka, Bangladesh", SupplierCategory::Textiles)
            .await;

        assert!(matches!(result, Err(RefreshError::Storage(_))));
        assert_eq!(dash.orchestrator().registry().len().await, 2);
        assert!(matches!(
            events.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
        assert_eq!(dash.orchestrator().oracle().calls(), 0);
        assert_eq!(memory.get(SUPPLIERS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_alerts_survive_reload() {
        let oracle = FixedOracle::stable().with_supplier("2", RiskLevel::Risky, "Rail strike.");
        let (dash, store) = ready_dashboard(oracle).await;
        dash.refresh_all().await.unwrap();
        let alert_id = dash.alerts(TimeWindow::All).await[0].id.clone();

        let reloaded = dashboard(FixedOracle::stable(), store).await;

        let detail = reloaded.select_alert(&alert_id).await.unwrap();
        assert_eq!(detail.alert.message, "Rail strike.");
        assert_eq!(detail.supplier.unwrap().name, "Nordic Logistics Co");
        assert_eq!(detail.analysis.unwrap().status, RiskLevel::Risky);

        let stats = reloaded.stats().await;
        assert_eq!(stats.risky, 1);
        assert_eq!(stats.stable, 1);
        assert_eq!(reloaded.last_global_update().await, dash.last_global_update().await);
        assert_eq!(reloaded.orchestrator().oracle().calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_marks_survive_reload() {
        let oracle = FixedOracle::stable();
        oracle.fail("1", OracleError::Unavailable("quota".to_string())).await;
        let (dash, store) = ready_dashboard(oracle).await;
        dash.refresh_all().await.unwrap();

        let reloaded = dashboard(FixedOracle::stable(), store).await;
        assert!(reloaded.orchestrator().snapshot().await.is_stale("1"));
        assert_eq!(reloaded.stats().await.stale, 1);
    }
}
