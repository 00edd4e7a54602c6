//! Domain layer - Core types and port definitions
//!
//! `model` holds the transient inventory/requirement/assignment types the
//! matching engine works on; `ports` defines the collaborator traits that
//! adapters implement.

pub mod model;
pub mod ports;

pub use model::*;
pub use ports::*;
