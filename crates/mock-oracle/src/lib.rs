//! Mock risk oracles for testing.
//!
//! This crate provides mock implementations of the `RiskOracle` trait:
//! - `FixedOracle` - Returns configured assessments, per supplier or by default
//! - `FailingOracle` - Always fails with a configured error
//! - `DelayedOracle` - Wraps another oracle with artificial delay
//!
//! For production assessments, use the `gemini-oracle` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_oracle::{FixedOracle, RiskLevel, RiskOracle};
//! use risk_core::{SequentialIds, Supplier, SupplierCategory, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), risk_core::OracleError> {
//!     let oracle = FixedOracle::new(RiskLevel::Caution, "Port congestion");
//!     let supplier = Supplier::register(
//!         "Zhongshan Electronics",
//!         "Guangdong, China",
//!         SupplierCategory::Electronics,
//!         &SequentialIds::default(),
//!         &SystemClock,
//!     );
//!
//!     let assessment = oracle.assess_strategic(&supplier, None).await?;
//!     assert_eq!(assessment.status, RiskLevel::Caution);
//!     Ok(())
//! }
//! ```

mod delayed;
mod failing;
mod fixed;

// Re-export risk-core types for convenience
pub use risk_core::{
    async_trait, MapInsight, OracleError, RiskLevel, RiskOracle, StrategicAssessment, Supplier,
};

// Export mock implementations
pub use delayed::DelayedOracle;
pub use failing::FailingOracle;
pub use fixed::FixedOracle;
