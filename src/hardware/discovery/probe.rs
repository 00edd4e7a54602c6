//! Partition Role Probe
//!
//! Asks `lsblk` for a partition's label to tell whether the partition was
//! created by a previous provisioning run.

use crate::domain::ports::PartitionProbe;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Label carried by partitions of an already prepared data device
pub const DEFAULT_PREPARED_LABEL: &str = "ceph data";

/// Configuration for the lsblk probe
#[derive(Debug, Clone)]
pub struct LsblkConfig {
    /// lsblk binary (name or path)
    pub binary: String,
    /// Substring of PARTLABEL that marks a prepared partition
    pub prepared_label: String,
}

impl Default for LsblkConfig {
    fn default() -> Self {
        Self {
            binary: "lsblk".to_string(),
            prepared_label: DEFAULT_PREPARED_LABEL.to_string(),
        }
    }
}

/// Partition probe backed by `lsblk -no PARTLABEL`
pub struct LsblkProbe {
    config: LsblkConfig,
}

impl LsblkProbe {
    pub fn new(config: LsblkConfig) -> Self {
        Self { config }
    }

    /// Whether lsblk output carries the prepared label
    fn label_matches(&self, stdout: &str) -> bool {
        stdout.contains(&self.config.prepared_label)
    }
}

impl Default for LsblkProbe {
    fn default() -> Self {
        Self::new(LsblkConfig::default())
    }
}

#[async_trait]
impl PartitionProbe for LsblkProbe {
    async fn is_prepared(&self, partition_path: &str) -> Result<bool> {
        let output = Command::new(&self.config.binary)
            .args(["-no", "PARTLABEL", partition_path])
            .output()
            .await
            .map_err(|e| Error::collaborator(self.name(), format!("{}: {}", partition_path, e)))?;

        if !output.status.success() {
            return Err(Error::collaborator(
                self.name(),
                format!(
                    "{} exited with {}: {}",
                    partition_path,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("lsblk {} -> {:?}", partition_path, stdout.trim());
        Ok(self.label_matches(&stdout))
    }

    fn name(&self) -> &str {
        "lsblk"
    }
}
