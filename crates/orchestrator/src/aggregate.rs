//! Read-only dashboard projections.
//!
//! Everything here is a pure function of its arguments and an explicit
//! `now`, so the presentation layer can recompute views freely.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use risk_core::{Alert, RiskAnalysis, RiskLevel, Supplier, SupplierCategory};
use serde::{Deserialize, Serialize};

use crate::error::RefreshError;

/// Headline counts over the visible suppliers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Visible suppliers, analysed or not.
    pub total: usize,
    pub risky: usize,
    pub caution: usize,
    pub stable: usize,
    /// Visible suppliers whose most recent refresh failed.
    pub stale: usize,
}

impl DashboardStats {
    /// Whether any visible supplier is currently risky.
    pub fn is_disrupted(&self) -> bool {
        self.risky > 0
    }

    /// Visible suppliers with no analysis yet.
    pub fn pending(&self) -> usize {
        self.total - (self.risky + self.caution + self.stable)
    }
}

/// Compute headline counts.
///
/// Suppliers outside `visible` are ignored entirely. A visible supplier
/// without an analysis counts toward `total` only.
pub fn dashboard_stats(
    suppliers: &[Supplier],
    analyses: &HashMap<String, RiskAnalysis>,
    visible: &[SupplierCategory],
    stale: impl Fn(&str) -> bool,
) -> DashboardStats {
    suppliers
        .iter()
        .filter(|s| visible.contains(&s.category))
        .fold(DashboardStats::default(), |mut stats, s| {
            stats.total += 1;
            match analyses.get(&s.id).map(|a| a.status) {
                Some(RiskLevel::Risky) => stats.risky += 1,
                Some(RiskLevel::Caution) => stats.caution += 1,
                Some(RiskLevel::Stable) => stats.stable += 1,
                None => {}
            }
            if stale(&s.id) {
                stats.stale += 1;
            }
            stats
        })
}

/// Either every value or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Filter<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }

    /// Whether this filter lets anything through unconditionally.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<T: FromStr> FromStr for Filter<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Filter on the current analysis status.
pub type StatusFilter = Filter<RiskLevel>;

/// Filter on the supplier category.
pub type CategoryFilter = Filter<SupplierCategory>;

/// Suppliers matching every criterion, in registry order.
///
/// A supplier without an analysis only passes [`Filter::All`] for status.
pub fn filtered_suppliers<'a>(
    suppliers: &'a [Supplier],
    analyses: &HashMap<String, RiskAnalysis>,
    query: &str,
    status: StatusFilter,
    category: CategoryFilter,
    visible: &[SupplierCategory],
) -> Vec<&'a Supplier> {
    suppliers
        .iter()
        .filter(|s| s.matches_query(query))
        .filter(|s| match status {
            Filter::All => true,
            Filter::Only(wanted) => analyses.get(&s.id).is_some_and(|a| a.status == wanted),
        })
        .filter(|s| category.accepts(&s.category))
        .filter(|s| visible.contains(&s.category))
        .collect()
}

/// How far back the alert feed reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "24H")]
    Day,
    #[serde(rename = "7D")]
    Week,
    #[default]
    #[serde(rename = "ALL")]
    All,
}

impl TimeWindow {
    /// Maximum alert age, or `None` when unbounded.
    pub fn span(&self) -> Option<Duration> {
        match self {
            Self::Day => Some(Duration::hours(24)),
            Self::Week => Some(Duration::days(7)),
            Self::All => None,
        }
    }

    /// Whether an alert stamped `at` is inside the window ending at `now`.
    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.span().map_or(true, |span| now - at < span)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::All => "all",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = RefreshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" | "day" => Ok(Self::Day),
            "7d" | "week" => Ok(Self::Week),
            "all" => Ok(Self::All),
            other => Err(RefreshError::InvalidInput(format!(
                "unknown time window '{other}' (expected 24h, 7d or all)"
            ))),
        }
    }
}

/// Alerts inside `window` whose supplier sector is visible, feed order kept.
///
/// Alerts whose supplier is no longer registered are kept so orphans stay
/// visible.
pub fn filtered_alerts<'a>(
    alerts: &'a [Alert],
    window: TimeWindow,
    visible: &[SupplierCategory],
    suppliers: &[Supplier],
    now: DateTime<Utc>,
) -> Vec<&'a Alert> {
    let categories: HashMap<&str, SupplierCategory> = suppliers
        .iter()
        .map(|s| (s.id.as_str(), s.category))
        .collect();

    alerts
        .iter()
        .filter(|a| window.contains(a.timestamp, now))
        .filter(|a| {
            categories
                .get(a.supplier_id.as_str())
                .map_or(true, |category| visible.contains(category))
        })
        .collect()
}

/// Most recent `last_updated` over all analyses.
pub fn last_global_update(analyses: &HashMap<String, RiskAnalysis>) -> Option<DateTime<Utc>> {
    analyses.values().map(|a| a.last_updated).max()
}
