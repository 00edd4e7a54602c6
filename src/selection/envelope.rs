//! Request / Response Envelope
//!
//! The shapes exchanged with the invoking provisioning framework: the
//! request carrying host facts plus requirements, and the success or failure
//! document written back.

use crate::domain::model::{Assignment, RequirementSet};
use crate::error::{Error, ErrorKind, Result};
use crate::hardware::allocation::SelectionReport;
use crate::hardware::discovery::HostFacts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// Request
// =============================================================================

/// Input of one selection run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// Host device facts
    pub facts: HostFacts,
    /// Declarative requirements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disks: Option<RequirementSet>,
    /// Legacy data device paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<String>>,
    /// Legacy journal device paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_journal_devices: Option<Vec<String>>,
}

impl SelectionRequest {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Load from a file; `.yaml`/`.yml` are read as YAML, anything else as JSON
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            _ => Self::from_json_str(&raw),
        }
    }

    /// Declarative requirements, when present and non-empty
    pub fn native_disks(&self) -> Option<&RequirementSet> {
        self.disks.as_ref().filter(|d| !d.is_empty())
    }

    /// Legacy data paths, when present and non-empty
    pub fn legacy_devices(&self) -> Option<&[String]> {
        self.devices.as_deref().filter(|d| !d.is_empty())
    }

    /// Legacy journal paths, when present and non-empty
    pub fn legacy_journal_devices(&self) -> Option<&[String]> {
        self.raw_journal_devices.as_deref().filter(|d| !d.is_empty())
    }
}

// =============================================================================
// Response
// =============================================================================

/// Which input syntax produced the requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    Native,
    Legacy,
}

impl Syntax {
    /// Fact names for data, journal and to-activate device lists
    pub fn fact_keys(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            Syntax::Native => ("storage_devices", "journal_devices", "devices_to_activate"),
            Syntax::Legacy => (
                "legacy_devices",
                "legacy_raw_journal_devices",
                "devices_to_activate",
            ),
        }
    }
}

/// Successful selection
#[derive(Debug, Clone, Serialize)]
pub struct SelectionOutcome {
    /// Human readable summary
    pub msg: String,
    /// False when every selected device was already prepared
    pub changed: bool,
    /// Input syntax
    pub syntax: Syntax,
    /// Device path lists keyed by fact name
    pub facts: BTreeMap<String, Vec<String>>,
    /// Full assignment
    pub assignment: Assignment,
    /// Slots that claimed a device
    pub matched: usize,
    /// Slots that were requested
    pub expected: usize,
    /// Matched vs unmatched summary
    pub report: SelectionReport,
}

/// Failed selection
#[derive(Debug, Clone, Serialize)]
pub struct SelectionFailure {
    pub failed: bool,
    pub msg: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<usize>,
}

impl From<&Error> for SelectionFailure {
    fn from(error: &Error) -> Self {
        let kind = match error.kind() {
            ErrorKind::Configuration => "configuration",
            ErrorKind::AllocationShortfall => "allocation_shortfall",
            ErrorKind::Collaborator => "collaborator",
            ErrorKind::Internal => "internal",
        };
        let (matched, expected) = match error {
            Error::AllocationShortfall { matched, expected } => (Some(*matched), Some(*expected)),
            _ => (None, None),
        };

        Self {
            failed: true,
            msg: error.to_string(),
            kind: kind.to_string(),
            matched,
            expected,
        }
    }
}
