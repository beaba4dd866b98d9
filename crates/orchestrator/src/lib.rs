//! Risk refresh orchestration for ChainGuard.
//!
//! This crate turns per-supplier oracle assessments into the state the
//! dashboard renders: the latest analysis per supplier, a deduplicated and
//! bounded alert feed, and aggregate counts and filtered views.
//!
//! # Features
//!
//! - Refreshes one or all suppliers concurrently, each under a deadline
//! - Publishes each result as soon as it completes
//! - Keeps at most one alert per supplier, newest first, capped in length
//! - Marks suppliers stale when a refresh fails instead of assuming stable
//! - Announces new suppliers so they can be refreshed on their own
//! - Persists settings and the registry on every change, and the risk state after each refresh
//!
//! # Architecture
//!
//! ```text
//! Presentation (CLI, UI)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        DASHBOARD                            │
//! │  settings (company, sectors, auth)  ──save──▶  storage      │
//! │         ↓                                                   │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │               REFRESH ORCHESTRATOR                    │  │
//! │  │                                                       │  │
//! │  │  registry ──SupplierAdded──▶ auto refresh (optional)  │  │
//! │  │     ↓                                                 │  │
//! │  │  join_all(refresh_one) ──▶ oracle (timeout each)      │  │
//! │  │     ↓ per completion                                  │  │
//! │  │  analyses[id] = analysis; alerts = synchronize(..)    │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │         ↓                                                   │
//! │  aggregate: stats, filtered suppliers, filtered alerts      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mock_oracle::FixedOracle;
//! use orchestrator::{Dashboard, RefreshConfig, TimeWindow};
//! use storage::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let oracle = Arc::new(FixedOracle::stable());
//!     let store = Arc::new(MemoryStore::new());
//!     let dashboard = Dashboard::load(oracle, RefreshConfig::from_env(), store).await;
//!
//!     dashboard.login().await?;
//!     dashboard.set_company("Acme", "Austin, TX").await?;
//!
//!     let report = dashboard.refresh_all().await?;
//!     println!("{} refreshed, {} failed", report.succeeded.len(), report.failed.len());
//!
//!     for alert in dashboard.alerts(TimeWindow::Day).await {
//!         println!("[{}] {}: {}", alert.severity, alert.supplier_name, alert.message);
//!     }
//!     Ok(())
//! }
//! ```

mod aggregate;
mod alerts;
mod config;
mod dashboard;
mod error;
mod orchestrator;
mod registry;
mod state;

pub use aggregate::{
    dashboard_stats, filtered_alerts, filtered_suppliers, last_global_update, CategoryFilter,
    DashboardStats, Filter, StatusFilter, TimeWindow,
};
pub use alerts::synchronize;
pub use config::{
    RefreshConfig, RefreshConfigBuilder, DEFAULT_ALERT_CAP, DEFAULT_ORACLE_TIMEOUT_SECS,
};
pub use dashboard::{AddedSupplier, AlertDetail, Dashboard};
pub use error::RefreshError;
pub use orchestrator::{RefreshEvent, RefreshOrchestrator, RefreshReport};
pub use registry::{RegistryEvent, SupplierRegistry};
pub use state::RiskState;

// Re-export core types for convenience
pub use risk_core::{
    Alert, CompanyInfo, RiskAnalysis, RiskLevel, RiskOracle, Supplier, SupplierCategory,
};
