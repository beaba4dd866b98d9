//! Gemini-based risk oracle.
//!
//! This crate provides a [`RiskOracle`] implementation that asks Google's
//! Gemini `generateContent` API about a supplier, using search grounding for
//! the strategic assessment and maps grounding for the geographic one.
//!
//! # Features
//!
//! - Two independent calls per supplier (strategic and geographic), each with
//!   its own model
//! - Free-text responses are parsed by one fallible adapter
//!   ([`parse_strategic_response`]); anything without a usable status is
//!   reported as [`OracleError::Malformed`], never guessed as stable
//! - Configurable via environment variables
//!
//! # Usage
//!
//! ```rust,no_run
//! use gemini_oracle::GeminiOracle;
//! use risk_core::{assess_supplier_risk, Supplier, SupplierCategory, SystemClock, UuidIds};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let oracle = GeminiOracle::from_env()?;
//!     let supplier = Supplier::register(
//!         "Zhongshan Electronics",
//!         "Guangdong, China",
//!         SupplierCategory::Electronics,
//!         &UuidIds,
//!         &SystemClock,
//!     );
//!     let analysis = assess_supplier_risk(&oracle, &supplier, Some("Austin, TX"), &SystemClock).await?;
//!     println!("{}: {}", analysis.status, analysis.summary);
//!     Ok(())
//! }
//! ```

mod api_types;
mod config;
mod oracle;
mod parse;
mod prompt;

pub use config::GeminiOracleConfig;
pub use oracle::GeminiOracle;
pub use parse::{parse_geography_response, parse_strategic_response};
pub use prompt::{geography_prompt, strategic_prompt};

// Re-export risk-core types for convenience
pub use risk_core::{async_trait, OracleError, RiskOracle};
