//! Selection Orchestrator
//!
//! Runs one selection end to end:
//! - builds the allocatable inventory from host facts
//! - turns native or legacy requirements into slots
//! - runs the matcher and reports the result
//! - shapes the outcome for the invoking framework

use super::envelope::{SelectionOutcome, SelectionRequest, Syntax};
use crate::domain::model::{Assignment, ExpandedRequirement, Inventory, Role};
use crate::domain::ports::{PartitionProbeRef, PersistentNameResolverRef};
use crate::error::{Error, Result};
use crate::hardware::allocation::{expand, Matcher, SelectionReport};
use crate::hardware::discovery::{
    legacy_declarations, ByIdResolver, FactsConfig, FreeDeviceSelector, LsblkConfig, LsblkProbe,
    DEFAULT_BY_ID_DIR, DEFAULT_PREPARED_LABEL,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

// =============================================================================
// Selection Configuration
// =============================================================================

/// Configuration for the selection pipeline
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Directory holding kernel block-device nodes
    pub dev_dir: PathBuf,
    /// Directory of persistent aliases
    pub by_id_dir: PathBuf,
    /// lsblk binary used by the partition probe
    pub lsblk: String,
    /// Partition label marking a prepared device
    pub prepared_label: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            dev_dir: PathBuf::from("/dev"),
            by_id_dir: PathBuf::from(DEFAULT_BY_ID_DIR),
            lsblk: "lsblk".to_string(),
            prepared_label: DEFAULT_PREPARED_LABEL.to_string(),
        }
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Selection pipeline with its collaborators
pub struct Orchestrator {
    selector: FreeDeviceSelector,
    resolver: PersistentNameResolverRef,
}

impl Orchestrator {
    /// Create an orchestrator using lsblk and the by-id directory
    pub fn new(config: SelectionConfig) -> Self {
        let probe = Arc::new(LsblkProbe::new(LsblkConfig {
            binary: config.lsblk.clone(),
            prepared_label: config.prepared_label.clone(),
        }));
        let resolver = Arc::new(ByIdResolver::new(config.by_id_dir.clone()));
        Self::with_collaborators(config, probe, resolver)
    }

    /// Create an orchestrator with explicit collaborators
    pub fn with_collaborators(
        config: SelectionConfig,
        probe: PartitionProbeRef,
        resolver: PersistentNameResolverRef,
    ) -> Self {
        let selector = FreeDeviceSelector::new(
            FactsConfig {
                dev_dir: config.dev_dir,
            },
            probe,
        );
        Self { selector, resolver }
    }

    /// Run one selection
    pub async fn run(&self, request: &SelectionRequest) -> Result<SelectionOutcome> {
        let inventory = self.selector.select(&request.facts).await?;

        let (syntax, inventory, slots) = match (request.native_disks(), request.legacy_devices()) {
            (Some(_), Some(_)) => {
                return Err(Error::Configuration(
                    "disks and devices options are exclusive while both are defined".into(),
                ))
            }
            (Some(disks), None) => {
                info!("Native syntax");
                info!(" disks : {:?}", disks.keys().collect::<Vec<_>>());
                let slots = expand(disks, None)?;
                let inventory = self.resolver.resolve(inventory)?;
                (Syntax::Native, inventory, slots)
            }
            (None, Some(devices)) => {
                info!("Legacy syntax");
                info!(" devices : {:?}", devices);
                let mut slots = expand(&legacy_declarations(devices, Role::Data), Some(Role::Data))?;
                if let Some(journals) = request.legacy_journal_devices() {
                    info!(" raw_journal_devices : {:?}", journals);
                    slots.extend(expand(
                        &legacy_declarations(journals, Role::Journal),
                        Some(Role::Journal),
                    )?);
                }
                (Syntax::Legacy, inventory, slots)
            }
            (None, None) => {
                return Err(Error::Configuration(
                    "no 'disks' or 'devices' variables found in request".into(),
                ))
            }
        };

        select(syntax, &inventory, &slots)
    }
}

/// Match slots against the inventory and shape the outcome
pub fn select(
    syntax: Syntax,
    inventory: &Inventory,
    slots: &[ExpandedRequirement],
) -> Result<SelectionOutcome> {
    debug!("Looking for {} slot(s) in {} device(s)", slots.len(), inventory.len());

    let outcome = Matcher::new(inventory).run(slots)?;
    let report = SelectionReport::new(&outcome.assignment, inventory);
    report.log();

    let (matched, expected) = (outcome.matched_slots(), outcome.expected_slots());
    let assignment = outcome.into_assignment()?;

    let prepared = assignment.devices().filter(|d| d.prepared).count();
    info!("{}/{} disks already configured", prepared, assignment.len());

    let msg = "All searched devices were found".to_string();
    info!("{}", msg);

    Ok(SelectionOutcome {
        msg,
        changed: prepared != assignment.len(),
        syntax,
        facts: device_facts(syntax, &assignment),
        assignment,
        matched,
        expected,
        report,
    })
}

/// Split assigned paths into data, journal and to-activate lists
fn device_facts(syntax: Syntax, assignment: &Assignment) -> BTreeMap<String, Vec<String>> {
    let (data_key, journal_key, activate_key) = syntax.fact_keys();
    let mut data = Vec::new();
    let mut journal = Vec::new();
    let mut activate = Vec::new();

    for device in assignment.devices() {
        let path = device.display_path().to_string();
        if device.prepared {
            activate.push(path);
            continue;
        }
        match device.role {
            Some(Role::Data) => data.push(path),
            Some(Role::Journal) => journal.push(path),
            None => {}
        }
    }

    BTreeMap::from([
        (data_key.to_string(), data),
        (journal_key.to_string(), journal),
        (activate_key.to_string(), activate),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Inventory, InventoryDevice};
    use crate::domain::ports::{PartitionProbe, PersistentNameResolver};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;

    struct LabelProbe;

    #[async_trait]
    impl PartitionProbe for LabelProbe {
        async fn is_prepared(&self, partition_path: &str) -> Result<bool> {
            Ok(partition_path.ends_with("sdd1"))
        }

        fn name(&self) -> &str {
            "label"
        }
    }

    /// Prefixes every identifier, standing in for by-id aliases
    struct PrefixResolver;

    impl PersistentNameResolver for PrefixResolver {
        fn resolve(&self, inventory: Inventory) -> Result<Inventory> {
            Ok(inventory
                .into_iter()
                .map(|mut d| {
                    d.id = format!("ata-{}", d.id);
                    d.path = Some(format!("/dev/disk/by-id/{}", d.id));
                    d
                })
                .collect())
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::with_collaborators(
            SelectionConfig::default(),
            Arc::new(LabelProbe),
            Arc::new(PrefixResolver),
        )
    }

    fn request(extra: serde_json::Value) -> SelectionRequest {
        let mut base = json!({
            "facts": {
                "sda": {"partitions": {}, "rotational": "1", "size": "1.82 TB"},
                "sdb": {"partitions": {}, "rotational": "1", "size": "1.82 TB"},
                "sdc": {"partitions": {}, "rotational": "0", "size": "372.61 GB"},
                "sdd": {"partitions": {"sdd1": {}}, "rotational": "1", "size": "1.82 TB"},
                "sde": {"partitions": {"sde1": {}}, "rotational": "1", "size": "1.82 TB"}
            }
        });
        for (k, v) in extra.as_object().unwrap() {
            base[k] = v.clone();
        }
        serde_json::from_value(base).unwrap()
    }

    #[tokio::test]
    async fn test_native_selection() {
        let req = request(json!({
            "disks": {
                "storage": {"count": "*", "role": "data", "rotational": "1"},
                "journal": {"count": 1, "role": "journal", "rotational": "0"}
            }
        }));

        let outcome = orchestrator().run(&req).await.unwrap();
        assert_eq!(outcome.syntax, Syntax::Native);
        assert!(outcome.changed);
        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.expected, 2);

        assert_eq!(outcome.facts["journal_devices"], vec!["/dev/disk/by-id/ata-sdc"]);
        assert_eq!(
            outcome.facts["storage_devices"],
            vec!["/dev/disk/by-id/ata-sda", "/dev/disk/by-id/ata-sdb"]
        );
        assert_eq!(outcome.facts["devices_to_activate"], vec!["/dev/disk/by-id/ata-sdd"]);

        // prepared sdd is scanned first by the unbounded slot
        assert_eq!(outcome.assignment.get("storage_000_000").unwrap().id, "ata-sdd");
        // sde has foreign partitions
        assert!(!outcome.assignment.contains_device("ata-sde"));
    }

    #[tokio::test]
    async fn test_legacy_selection() {
        let req = request(json!({
            "devices": ["/dev/sda", "/dev/sdb"],
            "raw_journal_devices": ["/dev/sdc"]
        }));

        let outcome = orchestrator().run(&req).await.unwrap();
        assert_eq!(outcome.syntax, Syntax::Legacy);
        assert_eq!(outcome.facts["legacy_devices"], vec!["/dev/sda", "/dev/sdb"]);
        assert_eq!(outcome.facts["legacy_raw_journal_devices"], vec!["/dev/sdc"]);
        assert!(outcome.facts["devices_to_activate"].is_empty());
        assert!(outcome.assignment.get("data_0_000").is_some());
        assert!(outcome.assignment.get("journal_0_000").is_some());
    }

    #[tokio::test]
    async fn test_all_prepared_is_unchanged() {
        let req = request(json!({"devices": ["/dev/sdd"]}));

        let outcome = orchestrator().run(&req).await.unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.facts["devices_to_activate"], vec!["/dev/sdd"]);
    }

    #[tokio::test]
    async fn test_exclusive_syntaxes() {
        let req = request(json!({
            "disks": {"storage": {"count": 1, "role": "data"}},
            "devices": ["/dev/sda"]
        }));
        assert_matches!(orchestrator().run(&req).await, Err(Error::Configuration(_)));

        let req = request(json!({}));
        assert_matches!(orchestrator().run(&req).await, Err(Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_shortfall() {
        let req = request(json!({
            "disks": {"ssd": {"count": 2, "role": "journal", "rotational": "0"}}
        }));
        assert_matches!(
            orchestrator().run(&req).await,
            Err(Error::AllocationShortfall { matched: 1, expected: 2 })
        );
    }

    #[test]
    fn test_select_without_collaborators() {
        let inventory: Inventory = vec![
            InventoryDevice::new("sda")
                .with_path("/dev/sda")
                .with_attribute("rotational", "0"),
        ]
        .into_iter()
        .collect();
        let slots = vec![ExpandedRequirement {
            slot: "ssd_000".into(),
            constraints: BTreeMap::from([("rotational".to_string(), "0".to_string())]),
            role: Role::Journal,
            unbounded: false,
        }];

        let outcome = select(Syntax::Native, &inventory, &slots).unwrap();
        assert_eq!(outcome.facts["journal_devices"], vec!["/dev/sda"]);
        assert!(outcome.report.unmatched.is_empty());
    }
}
