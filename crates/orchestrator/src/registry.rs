//! The supplier registry and its change notifications.

use risk_core::Supplier;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

use crate::error::RefreshError;

/// Capacity of the registry event channel.
const EVENT_CAPACITY: usize = 64;

/// Something changed in the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    /// A supplier was appended.
    SupplierAdded(Supplier),
}

/// Ordered list of registered suppliers.
///
/// Suppliers are never removed or edited. Every successful [`add`] is
/// announced on the event channel so observers can react to just that
/// supplier.
///
/// [`add`]: SupplierRegistry::add
pub struct SupplierRegistry {
    suppliers: RwLock<Vec<Supplier>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl SupplierRegistry {
    pub fn new(initial: Vec<Supplier>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            suppliers: RwLock::new(initial),
            events,
        }
    }

    /// Validate a supplier without registering it.
    ///
    /// Rejects blank names or locations and ids that are already taken.
    pub async fn check(&self, supplier: &Supplier) -> Result<(), RefreshError> {
        check_fields(supplier)?;
        check_unique(&self.suppliers.read().await, supplier)
    }

    /// Append a supplier and announce it.
    ///
    /// Applies the same rules as [`check`](SupplierRegistry::check).
    pub async fn add(&self, supplier: Supplier) -> Result<(), RefreshError> {
        check_fields(&supplier)?;

        {
            let mut suppliers = self.suppliers.write().await;
            check_unique(&suppliers, &supplier)?;
            suppliers.push(supplier.clone());
        }

        info!(
            supplier_id = %supplier.id,
            name = %supplier.name,
            category = %supplier.category,
            "Registered supplier"
        );

        // Nobody listening is fine
        let _ = self.events.send(RegistryEvent::SupplierAdded(supplier));
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<Supplier> {
        self.suppliers
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Snapshot of every supplier in registration order.
    pub async fn list(&self) -> Vec<Supplier> {
        self.suppliers.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.suppliers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.suppliers.read().await.is_empty()
    }

    /// Receive future registry events.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }
}

fn check_fields(supplier: &Supplier) -> Result<(), RefreshError> {
    if supplier.name.trim().is_empty() {
        return Err(RefreshError::InvalidInput("supplier name is empty".to_string()));
    }
    if supplier.location.trim().is_empty() {
        return Err(RefreshError::InvalidInput(
            "supplier location is empty".to_string(),
        ));
    }
    Ok(())
}

fn check_unique(suppliers: &[Supplier], supplier: &Supplier) -> Result<(), RefreshError> {
    if suppliers.iter().any(|s| s.id == supplier.id) {
        return Err(RefreshError::InvalidInput(format!(
            "supplier id '{}' already registered",
            supplier.id
        )));
    }
    Ok(())
}
