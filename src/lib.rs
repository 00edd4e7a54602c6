//! Disk Chooser - declarative block device selection
//!
//! Picks, from the block devices discovered on a host, the subset that
//! satisfies a declarative set of per-role requirements (for example "every
//! rotational disk for data, one SSD for journal") and returns a stable
//! slot name to device assignment for a provisioning pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        Selection Orchestrator                        │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  ┌────────────────────┐                ┌──────────────────────────┐  │
//! │  │  Host Facts        │                │  Requirements            │  │
//! │  │  (free devices,    │                │  (native disks or legacy │  │
//! │  │   probe, by-id)    │                │   device lists)          │  │
//! │  └─────────┬──────────┘                └────────────┬─────────────┘  │
//! │            │ Inventory                              │ Expansion      │
//! │  ┌─────────┴──────────┐                ┌────────────┴─────────────┐  │
//! │  │  Scan Ordering     │                │  Slots (name_000, ...)   │  │
//! │  │  (prepared first)  │                │                          │  │
//! │  └─────────┬──────────┘                └────────────┬─────────────┘  │
//! │            └──────────────────┬─────────────────────┘                │
//! │                    ┌──────────┴──────────┐                           │
//! │                    │   Greedy Matcher    │◄── constraints + units    │
//! │                    └──────────┬──────────┘                           │
//! │                    ┌──────────┴──────────┐                           │
//! │                    │ Assignment + Report │                           │
//! │                    └─────────────────────┘                           │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`hardware`]: inventory discovery adapters and the allocation engine
//! - [`selection`]: end-to-end runs and the request/response envelope
//! - [`domain`]: core types and collaborator traits
//! - [`error`]: error types and handling

pub mod domain;
pub mod error;
pub mod hardware;
pub mod selection;

// Re-export commonly used types
pub use domain::model::{
    Assignment, Count, ExpandedRequirement, Inventory, InventoryDevice, RequirementDeclaration,
    RequirementSet, Role,
};

pub use domain::ports::{PartitionProbe, PersistentNameResolver};

pub use error::{Error, ErrorKind, Result};

pub use hardware::{
    allocate, expand, normalize, scan_order, ByIdResolver, Constraint, FreeDeviceSelector,
    LsblkProbe, MatchOutcome, Matcher, Operator, SelectionReport,
};

pub use selection::{
    Orchestrator, SelectionConfig, SelectionFailure, SelectionOutcome, SelectionRequest, Syntax,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
