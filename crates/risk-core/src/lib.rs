//! Core types and trait for ChainGuard risk assessment.
//!
//! This crate provides the shared vocabulary for every other crate in the
//! workspace. It defines:
//!
//! - [`Supplier`], [`RiskAnalysis`], [`Alert`] - the records the dashboard works with
//! - [`RiskOracle`] - the trait an external risk-assessment service implements
//! - [`OracleError`] - error types for oracle calls
//! - [`assess_supplier_risk`] - runs the strategic and geographic assessments
//!   concurrently and merges them into one [`RiskAnalysis`]
//! - [`Clock`] / [`IdGenerator`] - injectable time and id sources
//!
//! # Example
//!
//! ```rust
//! use risk_core::{async_trait, MapInsight, OracleError, RiskLevel, RiskOracle,
//!     StrategicAssessment, Supplier};
//!
//! struct AlwaysStable;
//!
//! #[async_trait]
//! impl RiskOracle for AlwaysStable {
//!     async fn assess_strategic(
//!         &self,
//!         _supplier: &Supplier,
//!         _hq_location: Option<&str>,
//!     ) -> Result<StrategicAssessment, OracleError> {
//!         Ok(StrategicAssessment::new(RiskLevel::Stable, "Safe Zone"))
//!     }
//!
//!     async fn assess_geography(&self, _supplier: &Supplier) -> Result<MapInsight, OracleError> {
//!         Ok(MapInsight::pending())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "AlwaysStable"
//!     }
//! }
//! ```

mod assess;
mod clock;
mod error;
mod model;
mod oracle;

pub use assess::{assess_supplier_risk, synthesize_trend, synthesize_trend_with, TREND_LEN};
pub use clock::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, UuidIds};
pub use error::OracleError;
pub use model::{
    Alert, AlertKind, CompanyInfo, MapInsight, ParseLevelError, RiskAnalysis, RiskLevel,
    SourceLink, Supplier, SupplierCategory, MAX_MAP_LINKS,
};
pub use oracle::{RiskOracle, StrategicAssessment};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
