//! Persistent Device Naming
//!
//! Replaces short kernel names (`sda`) by their `/dev/disk/by-id` alias so
//! the assignment survives device renumbering across reboots.

use crate::domain::model::Inventory;
use crate::domain::ports::PersistentNameResolver;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default directory of persistent aliases
pub const DEFAULT_BY_ID_DIR: &str = "/dev/disk/by-id";

/// Resolver backed by a directory of symlinks to block devices
pub struct ByIdResolver {
    directory: PathBuf,
}

impl ByIdResolver {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Kernel device name to the aliases pointing at it, aliases sorted
    fn aliases(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let pattern = format!(
            "{}/*",
            glob::Pattern::escape(&self.directory.to_string_lossy())
        );
        let entries = glob::glob(&pattern)
            .map_err(|e| Error::Configuration(format!("Invalid by-id directory: {}", e)))?;

        let mut aliases: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in entries {
            let link = entry.map_err(|e| Error::collaborator("by-id resolver", e.to_string()))?;
            let Some(alias) = file_name(&link) else {
                continue;
            };
            let target = match fs::read_link(&link) {
                Ok(target) => target,
                Err(e) => {
                    debug!("Skipping {}: {}", link.display(), e);
                    continue;
                }
            };
            if let Some(device) = file_name(&target) {
                aliases.entry(device).or_default().push(alias);
            }
        }

        for names in aliases.values_mut() {
            names.sort();
        }
        Ok(aliases)
    }
}

impl Default for ByIdResolver {
    fn default() -> Self {
        Self::new(DEFAULT_BY_ID_DIR)
    }
}

impl PersistentNameResolver for ByIdResolver {
    fn resolve(&self, inventory: Inventory) -> Result<Inventory> {
        info!("Finding persistent disks name");

        if !self.directory.is_dir() {
            info!(" Cannot open {}", self.directory.display());
            return Ok(inventory);
        }

        let aliases = self.aliases()?;
        let mut resolved = Inventory::new();

        for mut device in inventory {
            if let Some(alias) = aliases.get(&device.id).and_then(|names| names.first()) {
                info!(" Renaming {:>10} to {:>50}", device.id, alias);
                device.path = Some(self.directory.join(alias).to_string_lossy().to_string());
                device.id = alias.clone();
            }
            resolved.insert(device);
        }

        Ok(resolved)
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::model::InventoryDevice;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn inventory() -> Inventory {
        vec![
            InventoryDevice::new("sda").with_path("/dev/sda"),
            InventoryDevice::new("sdb").with_path("/dev/sdb"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_resolve_renames_to_first_alias() {
        let dir = TempDir::new().unwrap();
        symlink("../../sda", dir.path().join("wwn-0x5000c500a1b2c3d4")).unwrap();
        symlink("../../sda", dir.path().join("ata-ST2000NM0055_ZC20ABCD")).unwrap();
        symlink("../../sda1", dir.path().join("ata-ST2000NM0055_ZC20ABCD-part1")).unwrap();

        let resolver = ByIdResolver::new(dir.path());
        let resolved = resolver.resolve(inventory()).unwrap();

        let ids: Vec<_> = resolved.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["ata-ST2000NM0055_ZC20ABCD", "sdb"]);

        let expected = dir.path().join("ata-ST2000NM0055_ZC20ABCD");
        let renamed = resolved.get("ata-ST2000NM0055_ZC20ABCD").unwrap();
        assert_eq!(
            renamed.path.as_deref(),
            Some(expected.to_string_lossy().to_string().as_str())
        );
        assert_eq!(resolved.get("sdb").unwrap().path.as_deref(), Some("/dev/sdb"));
    }

    #[test]
    fn test_missing_directory_leaves_inventory_unchanged() {
        let dir = TempDir::new().unwrap();
        let resolver = ByIdResolver::new(dir.path().join("missing"));
        assert_eq!(resolver.resolve(inventory()).unwrap(), inventory());
    }

    #[test]
    fn test_regular_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("not-a-link"), b"").unwrap();

        let resolver = ByIdResolver::new(dir.path());
        assert_eq!(resolver.resolve(inventory()).unwrap(), inventory());
    }
}
