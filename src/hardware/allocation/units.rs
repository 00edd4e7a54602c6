//! Storage Unit Normalization
//!
//! Turns magnitudes such as `"1.82 TB"` into plain byte counts so that they
//! can be compared against constraint operands.
//!
//! The suffix table is kept exactly as deployed requirement files expect it:
//! the two-letter suffixes (`kb`, `mb`, ...) are the 1024-based factors and the
//! `*ib` suffixes are the 1000-based ones.

use crate::error::{Error, Result};

// =============================================================================
// Unit Table
// =============================================================================

const K2: f64 = 1024.0;
const K10: f64 = 1000.0;

/// Recognized suffixes and their byte factors
pub const STORAGE_UNITS: [(&str, f64); 10] = [
    ("kb", K2),
    ("kib", K10),
    ("mb", K2 * K2),
    ("mib", K10 * K10),
    ("gb", K2 * K2 * K2),
    ("gib", K10 * K10 * K10),
    ("tb", K2 * K2 * K2 * K2),
    ("tib", K10 * K10 * K10 * K10),
    ("pb", K2 * K2 * K2 * K2 * K2),
    ("pib", K10 * K10 * K10 * K10 * K10),
];

/// Byte factor for a (lowercase) unit suffix
pub fn unit_factor(unit: &str) -> Option<f64> {
    STORAGE_UNITS
        .iter()
        .find(|(suffix, _)| *suffix == unit)
        .map(|(_, factor)| *factor)
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalize a value for comparison.
///
/// A value ending in a storage-unit suffix (case-insensitive, separated from
/// the magnitude by one space) is returned as its byte count. Anything else is
/// returned unchanged.
pub fn normalize(value: &str) -> Result<String> {
    let lowered = value.trim().to_lowercase();

    let mut parts = lowered.split(' ');
    let (magnitude, factor) = match (parts.next(), parts.next(), parts.next()) {
        (Some(magnitude), Some(unit), None) => match unit_factor(unit) {
            Some(factor) => (magnitude, factor),
            None => return Ok(value.to_string()),
        },
        _ => return Ok(value.to_string()),
    };

    let magnitude: f64 = magnitude.parse().map_err(|_| Error::InvalidMagnitude {
        value: value.to_string(),
        reason: "magnitude is not a number".to_string(),
    })?;

    Ok(format_number(magnitude * factor))
}

/// Normalize and interpret as a floating-point number
pub fn normalize_numeric(value: &str) -> Result<f64> {
    let normalized = normalize(value)?;
    normalized
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::NonNumericOperand {
            value: value.to_string(),
        })
}

/// Render a byte count; integral values keep a trailing `.0`
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
