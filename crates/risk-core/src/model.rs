//! Records shared by the registry, the oracle, and the alert feed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{Clock, IdGenerator};

/// Maximum number of map links kept on a [`MapInsight`].
pub const MAX_MAP_LINKS: usize = 3;

/// Severity of a supplier's current risk, ordered `Stable < Caution < Risky`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// No active or emerging disruption.
    #[serde(alias = "GREEN")]
    Stable,
    /// Congestion, seasonal delays, minor warnings.
    #[serde(alias = "YELLOW")]
    Caution,
    /// Strikes, severe weather, export blocks.
    #[serde(alias = "RED")]
    Risky,
}

impl RiskLevel {
    /// All levels in ascending severity.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Stable, RiskLevel::Caution, RiskLevel::Risky];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "STABLE",
            Self::Caution => "CAUTION",
            Self::Risky => "RISKY",
        }
    }

    /// Whether this level produces an alert.
    pub fn is_alerting(&self) -> bool {
        !matches!(self, Self::Stable)
    }

    /// Baseline value used when synthesizing a trend series.
    pub fn baseline(&self) -> f64 {
        match self {
            Self::Stable => 10.0,
            Self::Caution => 50.0,
            Self::Risky => 90.0,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level or category name is not recognized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized {kind}: {value}")]
pub struct ParseLevelError {
    kind: &'static str,
    value: String,
}

impl FromStr for RiskLevel {
    type Err = ParseLevelError;

    /// Accepts both the severity names and the traffic-light names the
    /// oracle uses, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STABLE" | "GREEN" => Ok(Self::Stable),
            "CAUTION" | "YELLOW" => Ok(Self::Caution),
            "RISKY" | "RED" => Ok(Self::Risky),
            _ => Err(ParseLevelError {
                kind: "risk level",
                value: s.to_string(),
            }),
        }
    }
}

/// Industry sector of a supplier. Used for visibility filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplierCategory {
    Electronics,
    #[serde(rename = "Raw Materials")]
    RawMaterials,
    Logistics,
    Manufacturing,
    Textiles,
    #[serde(rename = "Food & Beverage")]
    FoodAndBeverage,
}

impl SupplierCategory {
    /// Every category, in display order. Also the default visible set.
    pub const ALL: [SupplierCategory; 6] = [
        SupplierCategory::Electronics,
        SupplierCategory::RawMaterials,
        SupplierCategory::Logistics,
        SupplierCategory::Manufacturing,
        SupplierCategory::Textiles,
        SupplierCategory::FoodAndBeverage,
    ];

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::RawMaterials => "Raw Materials",
            Self::Logistics => "Logistics",
            Self::Manufacturing => "Manufacturing",
            Self::Textiles => "Textiles",
            Self::FoodAndBeverage => "Food & Beverage",
        }
    }
}

impl fmt::Display for SupplierCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupplierCategory {
    type Err = ParseLevelError;

    /// Matches display names loosely: case and punctuation are ignored, so
    /// `"Food & Beverage"`, `"food-beverage"` and `"FOODBEVERAGE"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Self::ALL
            .into_iter()
            .find(|category| {
                let name: String = category
                    .as_str()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                name == key || (key == "foodandbeverage" && *category == Self::FoodAndBeverage)
            })
            .ok_or_else(|| ParseLevelError {
                kind: "supplier category",
                value: s.to_string(),
            })
    }
}

/// A registered supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    /// Opaque unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text location (e.g. "Hamburg, Germany").
    pub location: String,
    /// Industry sector.
    pub category: SupplierCategory,
    /// When the supplier was added to the registry.
    pub registered_at: DateTime<Utc>,
}

impl Supplier {
    /// Create a supplier with an explicit id and registration time.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
        category: SupplierCategory,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
            category,
            registered_at,
        }
    }

    /// Create a supplier with a freshly generated id, registered now.
    pub fn register(
        name: impl Into<String>,
        location: impl Into<String>,
        category: SupplierCategory,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Self {
        Self::new(ids.next_id(), name, location, category, clock.now())
    }

    /// Case-insensitive substring match against name or location.
    ///
    /// An empty query matches every supplier.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.location.to_lowercase().contains(&needle)
    }
}

/// A cited source (search result or map place).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub title: String,
    pub uri: String,
}

impl SourceLink {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// Geographic context around a supplier's location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInsight {
    pub summary: String,
    pub nearby_infrastructure: String,
    /// At most [`MAX_MAP_LINKS`] entries.
    pub links: Vec<SourceLink>,
}

impl MapInsight {
    /// Build an insight, keeping only the first [`MAX_MAP_LINKS`] links.
    pub fn new(summary: impl Into<String>, mut links: Vec<SourceLink>) -> Self {
        links.truncate(MAX_MAP_LINKS);
        Self {
            summary: summary.into(),
            nearby_infrastructure: "Infrastructure maps verified.".to_string(),
            links,
        }
    }

    /// Placeholder used when the geographic assessment is unavailable.
    pub fn pending() -> Self {
        Self {
            summary: "Geographic verification pending.".to_string(),
            nearby_infrastructure: "N/A".to_string(),
            links: Vec::new(),
        }
    }
}

/// The latest assessment for exactly one supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    pub supplier_id: String,
    pub status: RiskLevel,
    pub summary: String,
    pub weather_details: String,
    pub news_details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_insights: Option<MapInsight>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub sources: Vec<SourceLink>,
    /// Sparkline values in `0..=100`.
    #[serde(default)]
    pub trend: Vec<u8>,
}

/// Where an alert came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    Weather,
    News,
    #[default]
    System,
}

/// A notification derived from a non-stable [`RiskAnalysis`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub supplier_id: String,
    /// Copied from the supplier so the feed renders without a join.
    pub supplier_name: String,
    #[serde(rename = "type", default)]
    pub kind: AlertKind,
    /// Never [`RiskLevel::Stable`].
    pub severity: RiskLevel,
    /// The analysis summary at generation time.
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// The user's own company; its location is the oracle's reference point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub location: String,
}

impl CompanyInfo {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}
