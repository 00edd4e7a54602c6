//! Hardware Module
//!
//! Inventory discovery adapters and the allocation engine that matches the
//! inventory against requirement slots.

pub mod allocation;
pub mod discovery;

pub use allocation::*;
pub use discovery::*;
