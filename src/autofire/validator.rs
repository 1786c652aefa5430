//! Rosette hardware checks run before a plan is committed.
//!
//! Validation only rejects; it never trims or reorders a plan.

use std::collections::HashSet;

use crate::model::{AutoFireError, FirePlan};

/// Checks `plan` against a rosette with `capacity` bottle positions.
///
/// Fails with `TooManyDepths` when the plan has more entries than positions,
/// and with `DuplicateBottle` for the first bottle number seen twice.
pub fn validate(plan: &FirePlan, capacity: usize) -> Result<(), AutoFireError> {
    if plan.len() > capacity {
        return Err(AutoFireError::TooManyDepths {
            depths: plan.len(),
            capacity,
        });
    }

    let mut seen = HashSet::with_capacity(plan.len());
    for entry in plan.iter() {
        if !seen.insert(entry.bottle_number) {
            return Err(AutoFireError::DuplicateBottle { bottle: entry.bottle_number });
        }
    }
    Ok(())
}
