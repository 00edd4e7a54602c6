//! Selection Report
//!
//! Summarizes which device paths were matched and which inventory devices
//! were left over. Purely observational: building or logging a report never
//! changes the assignment.

use crate::domain::model::{Assignment, Inventory};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

/// One matched entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedDevice {
    /// Final slot name
    pub name: String,
    /// Device path
    pub path: String,
    /// Device already carried a prepared role
    pub prepared: bool,
}

/// Matched vs unmatched summary of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionReport {
    /// Matched entries, by slot name
    pub matched: Vec<MatchedDevice>,
    /// Paths of inventory devices nobody claimed, sorted
    pub unmatched: Vec<String>,
}

impl SelectionReport {
    /// Build the report for an assignment over its inventory
    pub fn new(assignment: &Assignment, inventory: &Inventory) -> Self {
        let matched: Vec<MatchedDevice> = assignment
            .iter()
            .map(|(name, device)| MatchedDevice {
                name: name.clone(),
                path: device.display_path().to_string(),
                prepared: device.prepared,
            })
            .collect();

        let claimed: BTreeSet<&str> = matched.iter().map(|m| m.path.as_str()).collect();
        let unmatched: BTreeSet<String> = inventory
            .iter()
            .map(|d| d.display_path())
            .filter(|path| !claimed.contains(path))
            .map(str::to_string)
            .collect();

        Self {
            matched,
            unmatched: unmatched.into_iter().collect(),
        }
    }

    /// Emit the report through tracing
    pub fn log(&self) {
        info!("Matched devices   : {:>3}", self.matched.len());
        for entry in &self.matched {
            let extra = if entry.prepared { " (prepared)" } else { "" };
            info!(" {} : {}{}", entry.name, entry.path, extra);
        }

        info!("Unmatched devices : {:>3}", self.unmatched.len());
        for path in &self.unmatched {
            info!(" {}", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::InventoryDevice;

    #[test]
    fn test_report_matched_and_unmatched() {
        let inventory: Inventory = vec![
            InventoryDevice::new("sda").with_path("/dev/sda"),
            InventoryDevice::new("sdb").with_path("/dev/sdb").prepared(),
            InventoryDevice::new("sdc").with_path("/dev/sdc"),
        ]
        .into_iter()
        .collect();

        let mut assignment = Assignment::new();
        assignment.insert("data_000", inventory.get("sdb").unwrap().clone());

        let before = assignment.clone();
        let report = SelectionReport::new(&assignment, &inventory);
        report.log();

        assert_eq!(
            report.matched,
            vec![MatchedDevice {
                name: "data_000".into(),
                path: "/dev/sdb".into(),
                prepared: true,
            }]
        );
        assert_eq!(report.unmatched, vec!["/dev/sda", "/dev/sdc"]);
        assert_eq!(assignment, before);
    }

    #[test]
    fn test_report_empty_assignment() {
        let inventory: Inventory = vec![InventoryDevice::new("sda").with_path("/dev/sda")]
            .into_iter()
            .collect();

        let report = SelectionReport::new(&Assignment::new(), &inventory);
        assert!(report.matched.is_empty());
        assert_eq!(report.unmatched, vec!["/dev/sda"]);
    }
}
