//! Allocation Module
//!
//! The matching engine: unit normalization, constraint parsing, requirement
//! expansion, scan ordering, the greedy matcher and the result report.

pub mod allocator;
pub mod constraint;
pub mod expansion;
pub mod ordering;
pub mod report;
pub mod units;

pub use allocator::*;
pub use constraint::*;
pub use expansion::*;
pub use ordering::*;
pub use report::*;
pub use units::*;
