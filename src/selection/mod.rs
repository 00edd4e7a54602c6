//! Selection Module
//!
//! End-to-end selection runs and the request/response envelope exchanged
//! with the invoking provisioning framework.

pub mod envelope;
pub mod orchestrator;

pub use envelope::*;
pub use orchestrator::*;
