//! Scan Ordering
//!
//! Devices that already carry a prepared role are scanned first so that a
//! re-run reaffirms them before consuming fresh devices.

use crate::domain::model::Inventory;

/// Inventory identifiers in scan order: prepared devices first, then the
/// rest, each group in lexicographic order.
pub fn scan_order(inventory: &Inventory) -> Vec<&str> {
    let (prepared, fresh): (Vec<_>, Vec<_>) = inventory.iter().partition(|d| d.prepared);

    prepared
        .into_iter()
        .chain(fresh)
        .map(|d| d.id.as_str())
        .collect()
}
