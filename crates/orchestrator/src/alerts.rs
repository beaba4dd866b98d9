//! Alert synchronization.
//!
//! The alert feed holds at most one live alert per supplier, newest first,
//! bounded by a cap. Each new analysis replaces whatever the feed held for
//! its supplier: a stable analysis simply removes it, anything else puts a
//! fresh alert at the head.

use risk_core::{Alert, AlertKind, Clock, IdGenerator, RiskAnalysis, Supplier};
use tracing::debug;

/// Produce the next alert feed after `analysis` arrives for `supplier`.
///
/// Every existing entry for the supplier is discarded, including duplicates
/// a caller may have introduced. Entries for other suppliers keep their
/// relative order. The result never exceeds `cap`; truncation drops the
/// oldest entries from the tail.
pub fn synchronize(
    current: &[Alert],
    supplier: &Supplier,
    analysis: &RiskAnalysis,
    cap: usize,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
) -> Vec<Alert> {
    debug_assert_eq!(analysis.supplier_id, supplier.id);

    let others = current.iter().filter(|alert| alert.supplier_id != supplier.id);

    let mut next: Vec<Alert> = if analysis.status.is_alerting() {
        let alert = Alert {
            id: ids.next_id(),
            supplier_id: supplier.id.clone(),
            supplier_name: supplier.name.clone(),
            kind: AlertKind::System,
            severity: analysis.status,
            message: analysis.summary.clone(),
            timestamp: clock.now(),
        };
        std::iter::once(alert).chain(others.cloned()).collect()
    } else {
        others.cloned().collect()
    };

    next.truncate(cap);

    debug!(
        supplier_id = %supplier.id,
        status = %analysis.status,
        before = current.len(),
        after = next.len(),
        "Synchronized alerts"
    );

    next
}
