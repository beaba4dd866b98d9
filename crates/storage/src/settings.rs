//! Typed records persisted by the dashboard.
//!
//! Each record is stored as JSON under a fixed key. Reads never fail: a
//! missing, unreadable or unparsable record falls back to its default.

use risk_core::{Alert, Clock, CompanyInfo, RiskAnalysis, Supplier, SupplierCategory};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::KeyValueStore;
use crate::Result;

/// Key of the supplier registry record.
pub const SUPPLIERS_KEY: &str = "suppliers";
/// Key of the company identity record.
pub const COMPANY_KEY: &str = "company";
/// Key of the visible-sector record.
pub const VISIBLE_SECTORS_KEY: &str = "visible_sectors";
/// Key of the authentication flag.
pub const AUTH_KEY: &str = "auth";
/// Key of the last published analyses and alert feed.
pub const RISK_STATE_KEY: &str = "risk_state";

/// The published risk state as last saved.
///
/// Written as one record so analyses and alerts are always restored as a
/// consistent pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSnapshot {
    #[serde(default)]
    pub analyses: Vec<RiskAnalysis>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub stale: Vec<String>,
}

/// Everything the dashboard restores at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub suppliers: Vec<Supplier>,
    pub company: Option<CompanyInfo>,
    pub visible_sectors: Vec<SupplierCategory>,
    pub authenticated: bool,
    pub risk: RiskSnapshot,
}

impl PersistedState {
    /// Built-in defaults: two sample suppliers, every sector visible, no
    /// company, signed out, nothing assessed yet.
    pub fn defaults(clock: &dyn Clock) -> Self {
        Self {
            suppliers: default_suppliers(clock),
            company: None,
            visible_sectors: SupplierCategory::ALL.to_vec(),
            authenticated: false,
            risk: RiskSnapshot::default(),
        }
    }

    /// Load every record, substituting defaults where needed.
    pub async fn load(store: &dyn KeyValueStore, clock: &dyn Clock) -> Self {
        let suppliers =
            load_record(store, SUPPLIERS_KEY).await.unwrap_or_else(|| default_suppliers(clock));
        let company = load_record(store, COMPANY_KEY).await;
        let visible_sectors = load_record(store, VISIBLE_SECTORS_KEY)
            .await
            .unwrap_or_else(|| SupplierCategory::ALL.to_vec());
        let authenticated = load_record(store, AUTH_KEY).await.unwrap_or(false);
        let risk: RiskSnapshot = load_record(store, RISK_STATE_KEY).await.unwrap_or_default();

        debug!(
            suppliers = suppliers.len(),
            has_company = company.is_some(),
            visible_sectors = visible_sectors.len(),
            authenticated,
            analyses = risk.analyses.len(),
            alerts = risk.alerts.len(),
            "Loaded persisted state"
        );

        Self {
            suppliers,
            company,
            visible_sectors,
            authenticated,
            risk,
        }
    }
}

/// Sample registry used when nothing has been saved yet.
pub fn default_suppliers(clock: &dyn Clock) -> Vec<Supplier> {
    let now = clock.now();
    vec![
        Supplier::new(
            "1",
            "Zhongshan Electronics",
            "Guangdong, China",
            SupplierCategory::Electronics,
            now,
        ),
        Supplier::new(
            "2",
            "Nordic Logistics Co",
            "Hamburg, Germany",
            SupplierCategory::Logistics,
            now,
        ),
    ]
}

/// Read and decode a record, or `None` if it is absent or unusable.
pub async fn load_record<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Failed to read record, using default");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Failed to parse record, using default");
            None
        }
    }
}

/// Encode and write a record.
pub async fn save_record<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.put(key, &raw).await
}

pub async fn save_suppliers(store: &dyn KeyValueStore, suppliers: &[Supplier]) -> Result<()> {
    save_record(store, SUPPLIERS_KEY, suppliers).await
}

pub async fn save_company(store: &dyn KeyValueStore, company: &CompanyInfo) -> Result<()> {
    save_record(store, COMPANY_KEY, company).await
}

pub async fn save_visible_sectors(
    store: &dyn KeyValueStore,
    sectors: &[SupplierCategory],
) -> Result<()> {
    save_record(store, VISIBLE_SECTORS_KEY, sectors).await
}

pub async fn save_risk_snapshot(store: &dyn KeyValueStore, snapshot: &RiskSnapshot) -> Result<()> {
    save_record(store, RISK_STATE_KEY, snapshot).await
}

/// Persist the sign-in flag. Signing out removes the record entirely.
pub async fn save_authenticated(store: &dyn KeyValueStore, authenticated: bool) -> Result<()> {
    if authenticated {
        save_record(store, AUTH_KEY, &true).await
    } else {
        store.remove(AUTH_KEY).await
    }
}
