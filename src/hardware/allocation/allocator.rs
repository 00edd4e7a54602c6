//! Main Matching Engine
//!
//! Greedy assignment of inventory devices to requirement slots. Slots are
//! visited in name order; for each slot the inventory is scanned in priority
//! order and the first full match is claimed (every full match, for an
//! unbounded slot). A claimed device is never offered to another slot.
//!
//! The pass itself only fails on constraint errors. Whether enough slots were
//! filled is decided afterwards by [`MatchOutcome::into_assignment`].

use super::constraint::Constraint;
use super::expansion::slot_name;
use super::ordering::scan_order;
use crate::domain::model::{Assignment, ExpandedRequirement, Inventory, InventoryDevice, Role};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

// =============================================================================
// Slot Outcome
// =============================================================================

/// Final state of one slot after the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Claimed at least one device
    Matched,
    /// Scanned the free devices without a full match
    Exhausted,
    /// Not scanned: every device was already claimed
    Skipped,
}

/// What a slot ended up with
#[derive(Debug, Clone)]
pub struct SlotOutcome {
    /// Slot name
    pub slot: String,
    /// Role of the slot
    pub role: Role,
    /// Final state
    pub state: SlotState,
    /// Identifiers of the claimed devices, in claim order
    pub claimed: Vec<String>,
}

/// Result of a full matching pass
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Final names to claimed devices
    pub assignment: Assignment,
    /// Per-slot results, in slot order
    pub slots: Vec<SlotOutcome>,
}

impl MatchOutcome {
    /// Number of slots that claimed at least one device
    pub fn matched_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Matched)
            .count()
    }

    /// Number of slots that were requested
    pub fn expected_slots(&self) -> usize {
        self.slots.len()
    }

    /// Whether every slot claimed a device
    pub fn is_complete(&self) -> bool {
        self.matched_slots() == self.expected_slots()
    }

    /// The assignment, or [`Error::AllocationShortfall`] when some slot
    /// stayed empty
    pub fn into_assignment(self) -> Result<Assignment> {
        let (matched, expected) = (self.matched_slots(), self.expected_slots());
        if matched < expected {
            return Err(Error::AllocationShortfall { matched, expected });
        }
        Ok(self.assignment)
    }
}

// =============================================================================
// Matcher
// =============================================================================

/// Greedy slot matcher over one inventory
pub struct Matcher<'a> {
    inventory: &'a Inventory,
    order: Vec<&'a str>,
}

impl<'a> Matcher<'a> {
    /// Create a matcher; the scan order is fixed at construction
    pub fn new(inventory: &'a Inventory) -> Self {
        Self {
            inventory,
            order: scan_order(inventory),
        }
    }

    /// Device identifiers in the order they are offered to each slot
    pub fn scan_order(&self) -> &[&'a str] {
        &self.order
    }

    /// Run the matching pass
    pub fn run(&self, requirements: &[ExpandedRequirement]) -> Result<MatchOutcome> {
        info!("Looking for matches");

        // Parse everything first: a bad expression fails the run before any claim
        let mut slots = requirements
            .iter()
            .map(|r| -> Result<_> { Ok((r, parse_constraints(r)?)) })
            .collect::<Result<Vec<_>>>()?;
        slots.sort_by(|(a, _), (b, _)| a.slot.cmp(&b.slot));

        let mut consumed: HashSet<&str> = HashSet::new();
        let mut outcomes = Vec::with_capacity(slots.len());

        for (requirement, constraints) in slots {
            if consumed.len() == self.inventory.len() {
                warn!(" Skipping {} as no more free devices to match", requirement.slot);
                outcomes.push(SlotOutcome {
                    slot: requirement.slot.clone(),
                    role: requirement.role,
                    state: SlotState::Skipped,
                    claimed: Vec::new(),
                });
                continue;
            }

            info!(" Inspecting {}", requirement.slot);
            let claimed = self.scan_slot(requirement, &constraints, &mut consumed)?;

            outcomes.push(SlotOutcome {
                slot: requirement.slot.clone(),
                role: requirement.role,
                state: if claimed.is_empty() {
                    SlotState::Exhausted
                } else {
                    SlotState::Matched
                },
                claimed,
            });
        }

        let assignment = self.build_assignment(&outcomes)?;
        Ok(MatchOutcome {
            assignment,
            slots: outcomes,
        })
    }

    /// Scan free devices for one slot, claiming full matches
    fn scan_slot(
        &self,
        requirement: &ExpandedRequirement,
        constraints: &[Constraint],
        consumed: &mut HashSet<&'a str>,
    ) -> Result<Vec<String>> {
        let mut claimed = Vec::new();

        for &id in &self.order {
            if consumed.contains(id) {
                continue;
            }
            let Some(device) = self.inventory.get(id) else {
                continue;
            };

            let score = score_device(device, constraints)?;
            if score.is_full() {
                info!("  {:>50} matched", id);
                consumed.insert(id);
                claimed.push(id.to_string());
                if !requirement.unbounded {
                    break;
                }
            } else if score.matched > 0 {
                info!(
                    "  {:>50} partially matched with {}/{} items",
                    id, score.matched, score.evaluated
                );
            } else {
                info!("  {:>50} no devices matched", id);
            }
        }

        Ok(claimed)
    }

    /// Name claimed devices: the slot name, or slot name plus index when an
    /// unbounded slot claimed several. A final name produced by two slots is
    /// a configuration error.
    fn build_assignment(&self, outcomes: &[SlotOutcome]) -> Result<Assignment> {
        let mut assignment = Assignment::new();
        let mut owners: BTreeMap<String, &str> = BTreeMap::new();

        for outcome in outcomes {
            let many = outcome.claimed.len() > 1;
            for (index, id) in outcome.claimed.iter().enumerate() {
                let Some(device) = self.inventory.get(id) else {
                    continue;
                };
                let name = if many {
                    slot_name(&outcome.slot, index as u32)
                } else {
                    outcome.slot.clone()
                };
                if let Some(owner) = owners.insert(name.clone(), &outcome.slot) {
                    return Err(Error::Configuration(format!(
                        "slots '{}' and '{}' both produce the device name '{}'",
                        owner, outcome.slot, name
                    )));
                }
                let mut device = device.clone();
                device.role = Some(outcome.role);
                assignment.insert(name, device);
            }
        }

        Ok(assignment)
    }
}

/// Match then check for shortfall in one call
pub fn allocate(inventory: &Inventory, requirements: &[ExpandedRequirement]) -> Result<Assignment> {
    Matcher::new(inventory).run(requirements)?.into_assignment()
}

// =============================================================================
// Scoring
// =============================================================================

/// Constraint tally for one device against one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeviceScore {
    /// Constraints the device satisfied
    matched: usize,
    /// Constraints whose attribute the device exposes
    evaluated: usize,
}

impl DeviceScore {
    /// Attributes the device does not expose are not counted against it
    fn is_full(&self) -> bool {
        self.matched == self.evaluated
    }
}

fn parse_constraints(requirement: &ExpandedRequirement) -> Result<Vec<Constraint>> {
    requirement
        .constraints
        .iter()
        .map(|(attribute, expression)| Constraint::parse(attribute, expression))
        .collect()
}

fn score_device(device: &InventoryDevice, constraints: &[Constraint]) -> Result<DeviceScore> {
    let mut score = DeviceScore {
        matched: 0,
        evaluated: 0,
    };

    for constraint in constraints {
        let Some(value) = device.attribute(&constraint.attribute) else {
            continue;
        };
        score.evaluated += 1;

        if constraint.is_satisfied_by(&value)? {
            debug!(
                "  {} : match  {} {} {}",
                device.id, value, constraint.operator, constraint.operand
            );
            score.matched += 1;
        } else {
            debug!(
                "  {} : no match  {} {} {}",
                device.id, value, constraint.operator, constraint.operand
            );
        }
    }

    Ok(score)
}
