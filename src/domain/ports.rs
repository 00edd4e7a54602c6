//! Domain Ports - collaborator trait definitions
//!
//! The matching engine never touches the operating system. Anything that
//! inspects partitions or the device namespace sits behind these traits.

use super::model::Inventory;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// Partition Probe Port
// =============================================================================

/// Port for checking whether a partition already carries a claimed role
#[async_trait]
pub trait PartitionProbe: Send + Sync {
    /// Returns true when the partition at `partition_path` bears the
    /// prepared-role marker. Failures are fatal to the invocation.
    async fn is_prepared(&self, partition_path: &str) -> Result<bool>;

    /// Name used in logs and error messages
    fn name(&self) -> &str;
}

// =============================================================================
// Persistent Naming Port
// =============================================================================

/// Port for rewriting kernel device names to stable identifiers
pub trait PersistentNameResolver: Send + Sync {
    /// Re-key the inventory by persistent names where one exists
    fn resolve(&self, inventory: Inventory) -> Result<Inventory>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type PartitionProbeRef = Arc<dyn PartitionProbe>;
pub type PersistentNameResolverRef = Arc<dyn PersistentNameResolver>;
