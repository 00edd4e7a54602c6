//! Host Facts Inventory
//!
//! Builds the allocatable inventory from host-reported device facts: keeps
//! devices that are unpartitioned, or whose partitions all belong to a
//! previously prepared role, and resolves their block-device path.

use crate::domain::model::{Inventory, InventoryDevice};
use crate::domain::ports::PartitionProbeRef;
use crate::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Raw facts: device name to attribute map, as reported by the host
pub type HostFacts = BTreeMap<String, Value>;

const PARTITIONS_KEY: &str = "partitions";

// =============================================================================
// Selector Configuration
// =============================================================================

/// Configuration for free-device selection
#[derive(Debug, Clone)]
pub struct FactsConfig {
    /// Directory holding the kernel block-device nodes
    pub dev_dir: PathBuf,
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            dev_dir: PathBuf::from("/dev"),
        }
    }
}

// =============================================================================
// Free Device Selector
// =============================================================================

/// Filters host facts down to devices eligible for allocation
pub struct FreeDeviceSelector {
    config: FactsConfig,
    probe: PartitionProbeRef,
}

impl FreeDeviceSelector {
    pub fn new(config: FactsConfig, probe: PartitionProbeRef) -> Self {
        Self { config, probe }
    }

    /// Keep only free (or previously prepared) devices
    pub async fn select(&self, facts: &HostFacts) -> Result<Inventory> {
        info!("Detecting free devices");
        let mut inventory = Inventory::new();

        for (name, raw) in facts {
            let Some(attributes) = raw.as_object() else {
                info!(" Ignoring {:>10} : Device facts are not a mapping", name);
                continue;
            };

            let Some(partitions) = attributes.get(PARTITIONS_KEY) else {
                info!(" Ignoring {:>10} : Device doesnt support partitioning", name);
                continue;
            };
            let partitions = partition_names(partitions);

            let mut prepared = false;
            if !partitions.is_empty() {
                for partition in &partitions {
                    let partition_path = self.dev_path(partition);
                    if self.probe.is_prepared(&partition_path).await? {
                        prepared = true;
                        break;
                    }
                }

                if !prepared {
                    info!(" Ignoring {:>10} : Device have existing partitions", name);
                    continue;
                }
            }

            let mut device = InventoryDevice::new(name.clone()).with_path(self.dev_path(name));
            device.partitions = partitions;
            device.prepared = prepared;
            device.attributes = attributes
                .iter()
                .filter(|(key, _)| key.as_str() != PARTITIONS_KEY)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

            if prepared {
                info!(" Adding   {:>10} : Prepared disk detected", name);
            } else {
                info!(" Adding   {:>10} : {}", name, device.display_path());
            }
            inventory.insert(device);
        }

        Ok(inventory)
    }

    fn dev_path(&self, name: &str) -> String {
        self.config.dev_dir.join(name).to_string_lossy().to_string()
    }
}

/// Partition names from a facts entry: a mapping keyed by partition name
/// or a plain list of names
fn partition_names(raw: &Value) -> Vec<String> {
    match raw {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::PartitionProbe;
    use crate::error::Error;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct FakeProbe {
        prepared: HashSet<String>,
        fail: bool,
    }

    #[async_trait]
    impl PartitionProbe for FakeProbe {
        async fn is_prepared(&self, partition_path: &str) -> Result<bool> {
            if self.fail {
                return Err(Error::collaborator("fake", "probe failed"));
            }
            Ok(self.prepared.contains(partition_path))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn selector(prepared: &[&str], fail: bool) -> FreeDeviceSelector {
        FreeDeviceSelector::new(
            FactsConfig::default(),
            Arc::new(FakeProbe {
                prepared: prepared.iter().map(|s| s.to_string()).collect(),
                fail,
            }),
        )
    }

    fn facts() -> HostFacts {
        serde_json::from_value(json!({
            "sda": {"partitions": {"sda1": {"size": "1 GB"}}, "rotational": "1"},
            "sdb": {"partitions": {}, "rotational": "1", "size": "1.82 TB"},
            "sdc": {"partitions": {"sdc1": {}, "sdc2": {}}, "rotational": "0"},
            "sr0": {"rotational": "1"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_select_free_and_prepared_devices() {
        let inventory = selector(&["/dev/sdc2"], false).select(&facts()).await.unwrap();

        let ids: Vec<_> = inventory.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["sdb", "sdc"]);

        let sdb = inventory.get("sdb").unwrap();
        assert!(!sdb.prepared);
        assert_eq!(sdb.path.as_deref(), Some("/dev/sdb"));
        assert_eq!(sdb.attribute("size").as_deref(), Some("1.82 TB"));
        assert!(!sdb.attributes.contains_key("partitions"));

        let sdc = inventory.get("sdc").unwrap();
        assert!(sdc.prepared);
        assert_eq!(sdc.partitions, vec!["sdc1", "sdc2"]);
    }

    #[tokio::test]
    async fn test_probe_failure_is_fatal() {
        let result = selector(&[], true).select(&facts()).await;
        assert_matches!(result, Err(Error::Collaborator { .. }));
    }

    #[test]
    fn test_partition_names_accepts_list() {
        assert_eq!(partition_names(&json!(["sda1", "sda2"])), vec!["sda1", "sda2"]);
        assert!(partition_names(&json!(null)).is_empty());
    }
}
