//! Hardware Discovery Module
//!
//! Adapters that turn host facts into an allocatable inventory: free-device
//! selection, the partition role probe, persistent naming and the legacy
//! device-list syntax.

pub mod facts;
pub mod legacy;
pub mod persistent;
pub mod probe;

pub use facts::*;
pub use legacy::*;
pub use persistent::*;
pub use probe::*;
