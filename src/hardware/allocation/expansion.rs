//! Requirement Expansion
//!
//! Turns compact declarations (`{count: 2, role: data, size: "gte(1 tb)"}`)
//! into individually named slots (`name_000`, `name_001`). Declarations are
//! never mutated; every slot is built as a new value.

use crate::domain::model::{
    value_to_string, Count, ExpandedRequirement, RequirementDeclaration, RequirementSet, Role,
};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Format a slot name from its declaration name and index
pub fn slot_name(name: &str, index: u32) -> String {
    format!("{}_{:03}", name, index)
}

/// Expand declarations into slots.
///
/// With `forced_role` (legacy, role-implicit input) every declaration yields
/// exactly one slot of that role and any declared count or role is ignored.
/// Otherwise each declaration must carry a `count` and a valid `role`.
pub fn expand(
    declarations: &RequirementSet,
    forced_role: Option<Role>,
) -> Result<Vec<ExpandedRequirement>> {
    let mut slots = Vec::new();

    for (name, declaration) in declarations {
        let (count, role) = match forced_role {
            Some(role) => (Count::Fixed(1), role),
            None => resolve_count_and_role(name, declaration)?,
        };

        let constraints: BTreeMap<String, String> = declaration
            .constraints
            .iter()
            .map(|(attribute, expression)| (attribute.clone(), value_to_string(expression)))
            .collect();

        let (total, unbounded) = match count {
            Count::Fixed(n) => (n, false),
            Count::Unbounded => (1, true),
        };

        for index in 0..total {
            slots.push(ExpandedRequirement {
                slot: slot_name(name, index),
                constraints: constraints.clone(),
                role,
                unbounded,
            });
        }

        debug!(
            "Expanded {} into {} slot(s) as {}{}",
            name,
            total,
            role,
            if unbounded { " (unbounded)" } else { "" }
        );
    }

    Ok(slots)
}

fn resolve_count_and_role(
    name: &str,
    declaration: &RequirementDeclaration,
) -> Result<(Count, Role)> {
    let raw_count = declaration.count.as_ref().ok_or_else(|| {
        Error::Configuration(format!("disk '{}' should have a 'count' value defined", name))
    })?;

    let raw_role = declaration.role.as_deref().ok_or_else(|| {
        Error::Configuration(format!(
            "disk '{}' should have a 'role' value defined : {{data | journal}}",
            name
        ))
    })?;

    let role = Role::parse(raw_role).ok_or_else(|| {
        Error::Configuration(format!(
            "disk '{}' doesn't have a valid 'role' defined, it should be : {{data | journal}}",
            name
        ))
    })?;

    Ok((Count::from_value(name, raw_count)?, role))
}
