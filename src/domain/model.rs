//! Domain Model - inventory, requirements and assignments
//!
//! All of these are transient: built from scratch for one invocation and
//! never persisted.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute name under which a device's resolved path is matched
pub const PATH_ATTRIBUTE: &str = "path";

/// Token in a `count` that requests as many devices as are available
pub const UNBOUNDED_COUNT: char = '*';

// =============================================================================
// Role
// =============================================================================

/// Role a selected device plays in the provisioned storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Data,
    Journal,
}

impl Role {
    /// Parse a role name, `None` when it is not one of the known roles
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "data" => Some(Role::Data),
            "journal" => Some(Role::Journal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Data => write!(f, "data"),
            Role::Journal => write!(f, "journal"),
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// A discovered block device eligible for allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDevice {
    /// Identifier, unique within the inventory (kernel name or by-id alias)
    pub id: String,
    /// Raw host-reported attributes (size, rotational, model, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Partition names, in host order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<String>,
    /// Device already carries a previously claimed role
    #[serde(default)]
    pub prepared: bool,
    /// Resolved block-device or persistent-name path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Role attached when the device is assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl InventoryDevice {
    /// Create a device with no attributes
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
            partitions: Vec::new(),
            prepared: false,
            path: None,
            role: None,
        }
    }

    /// Builder: set a raw attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: set the resolved path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Builder: mark as prepared
    pub fn prepared(mut self) -> Self {
        self.prepared = true;
        self
    }

    /// Look up an attribute in string form.
    ///
    /// The resolved path is exposed as the `path` attribute so legacy
    /// path-only requirements can match against it.
    pub fn attribute(&self, name: &str) -> Option<String> {
        if name == PATH_ATTRIBUTE {
            if let Some(path) = &self.path {
                return Some(path.clone());
            }
        }
        self.attributes.get(name).map(value_to_string)
    }

    /// Path if resolved, otherwise the identifier
    pub fn display_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.id)
    }
}

/// Render a raw attribute or constraint value in string form
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// The pool of devices considered in one invocation, keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Inventory {
    devices: BTreeMap<String, InventoryDevice>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, replacing any device with the same identifier
    pub fn insert(&mut self, device: InventoryDevice) {
        self.devices.insert(device.id.clone(), device);
    }

    pub fn get(&self, id: &str) -> Option<&InventoryDevice> {
        self.devices.get(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in lexicographic identifier order
    pub fn iter(&self) -> impl Iterator<Item = &InventoryDevice> {
        self.devices.values()
    }
}

impl FromIterator<InventoryDevice> for Inventory {
    fn from_iter<I: IntoIterator<Item = InventoryDevice>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for device in iter {
            inventory.insert(device);
        }
        inventory
    }
}

impl IntoIterator for Inventory {
    type Item = InventoryDevice;
    type IntoIter = std::collections::btree_map::IntoValues<String, InventoryDevice>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.into_values()
    }
}

// =============================================================================
// Requirements
// =============================================================================

/// How many devices a declaration asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    /// Exactly this many slots
    Fixed(u32),
    /// One slot that may claim every remaining match
    Unbounded,
}

impl Count {
    /// Interpret a raw `count` value (integer, numeric string or wildcard)
    pub fn from_value(name: &str, raw: &Value) -> Result<Self> {
        let invalid = || {
            Error::Configuration(format!(
                "disk '{}' has an invalid 'count' value: {}",
                name, raw
            ))
        };

        let count = match raw {
            Value::String(s) if s.trim().contains(UNBOUNDED_COUNT) => return Ok(Count::Unbounded),
            Value::String(s) => s.trim().parse::<u32>().map_err(|_| invalid())?,
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(invalid)?,
            _ => return Err(invalid()),
        };

        if count == 0 {
            return Err(invalid());
        }
        Ok(Count::Fixed(count))
    }
}

/// A compact, possibly multi-device requirement as written by the operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementDeclaration {
    /// Number of devices, or the `*` wildcard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Value>,
    /// Role name; validated during expansion
    #[serde(default, alias = "ceph_type", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Attribute name to constraint expression
    #[serde(flatten)]
    pub constraints: BTreeMap<String, Value>,
}

impl RequirementDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the count
    pub fn with_count(mut self, count: impl Into<Value>) -> Self {
        self.count = Some(count.into());
        self
    }

    /// Builder: set the role name
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Builder: add an attribute constraint
    pub fn constrain(mut self, attribute: impl Into<String>, expression: impl Into<Value>) -> Self {
        self.constraints.insert(attribute.into(), expression.into());
        self
    }
}

/// Declarations keyed by name
pub type RequirementSet = BTreeMap<String, RequirementDeclaration>;

/// One individually named slot awaiting a device
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRequirement {
    /// Declaration name plus zero-padded sequence index
    pub slot: String,
    /// Attribute name to constraint expression
    pub constraints: BTreeMap<String, String>,
    /// Role attached to whatever this slot claims
    pub role: Role,
    /// May claim more than one device
    pub unbounded: bool,
}

// =============================================================================
// Assignment
// =============================================================================

/// Final slot name to assigned device (tagged with its role)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Assignment {
    entries: BTreeMap<String, InventoryDevice>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, device: InventoryDevice) {
        self.entries.insert(name.into(), device);
    }

    pub fn get(&self, name: &str) -> Option<&InventoryDevice> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in lexicographic name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &InventoryDevice)> {
        self.entries.iter()
    }

    /// Assigned devices in name order
    pub fn devices(&self) -> impl Iterator<Item = &InventoryDevice> {
        self.entries.values()
    }

    /// Whether a device identifier has been assigned to any slot
    pub fn contains_device(&self, id: &str) -> bool {
        self.entries.values().any(|d| d.id == id)
    }
}
