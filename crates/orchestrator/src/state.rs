//! Published risk state.

use std::collections::{HashMap, HashSet};

use risk_core::{Alert, RiskAnalysis};
use storage::RiskSnapshot;

/// The latest analyses, the alert feed and the set of stale suppliers.
///
/// Replaced field-by-field under one write lock, so readers always see a
/// consistent pairing of analyses and alerts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskState {
    /// Latest analysis per supplier id.
    pub analyses: HashMap<String, RiskAnalysis>,
    /// Newest first, at most one entry per supplier.
    pub alerts: Vec<Alert>,
    /// Suppliers whose most recent refresh failed.
    pub stale: HashSet<String>,
}

impl RiskState {
    pub fn analysis(&self, supplier_id: &str) -> Option<&RiskAnalysis> {
        self.analyses.get(supplier_id)
    }

    pub fn is_stale(&self, supplier_id: &str) -> bool {
        self.stale.contains(supplier_id)
    }

    pub fn alert(&self, alert_id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == alert_id)
    }

    /// Rebuild published state from a saved snapshot.
    ///
    /// Analyses are keyed by supplier id; on duplicates the later entry wins.
    pub fn from_snapshot(snapshot: RiskSnapshot) -> Self {
        Self {
            analyses: snapshot
                .analyses
                .into_iter()
                .map(|a| (a.supplier_id.clone(), a))
                .collect(),
            alerts: snapshot.alerts,
            stale: snapshot.stale.into_iter().collect(),
        }
    }

    /// Flatten into the persisted form, sorted by supplier id.
    pub fn to_snapshot(&self) -> RiskSnapshot {
        let mut analyses: Vec<RiskAnalysis> = self.analyses.values().cloned().collect();
        analyses.sort_by(|a, b| a.supplier_id.cmp(&b.supplier_id));
        let mut stale: Vec<String> = self.stale.iter().cloned().collect();
        stale.sort();

        RiskSnapshot {
            analyses,
            alerts: self.alerts.clone(),
            stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use risk_core::{AlertKind, RiskLevel};

    fn analysis(supplier_id: &str, status: RiskLevel) -> RiskAnalysis {
        RiskAnalysis {
            supplier_id: supplier_id.to_string(),
            status,
            summary: format!("{supplier_id} summary"),
            weather_details: String::new(),
            news_details: String::new(),
            map_insights: None,
            last_updated: DateTime::UNIX_EPOCH,
            sources: Vec::new(),
            trend: Vec::new(),
        }
    }

    #[test]
    fn test_snapshot_restores_lookups() {
        let alert = Alert {
            id: "alert-7".to_string(),
            supplier_id: "b".to_string(),
            supplier_name: "Beta".to_string(),
            kind: AlertKind::System,
            severity: RiskLevel::Caution,
            message: "b summary".to_string(),
            timestamp: DateTime::UNIX_EPOCH,
        };
        let snapshot = RiskSnapshot {
            analyses: vec![analysis("b", RiskLevel::Caution), analysis("a", RiskLevel::Stable)],
            alerts: vec![alert.clone()],
            stale: vec!["c".to_string()],
        };

        let state = RiskState::from_snapshot(snapshot);

        assert_eq!(state.analysis("b").map(|a| a.status), Some(RiskLevel::Caution));
        assert_eq!(state.alert("alert-7"), Some(&alert));
        assert!(state.is_stale("c"));
        assert!(!state.is_stale("a"));

        let saved = state.to_snapshot();
        assert_eq!(saved.analyses[0].supplier_id, "a");
        assert_eq!(saved.analyses[1].supplier_id, "b");
        assert_eq!(saved.stale, vec!["c".to_string()]);
    }
}
