//! Validation of declared faculty availability.
//!
//! A submission is accepted only if every slot names a distinct day and a
//! non-empty set of periods inside the configured period axis. Accepted slots
//! are normalized (periods ascending, no duplicates) so later conflict scans
//! and the engine can rely on clean input.

use crate::data::{AvailabilitySlot, Day, Period};
use std::collections::HashSet;

pub fn validate_availability(
    slots: &[AvailabilitySlot],
    number_of_periods: Period,
) -> Result<Vec<AvailabilitySlot>, String> {
    if slots.is_empty() {
        return Err("At least one availability slot is required".to_string());
    }

    let mut seen_days: HashSet<Day> = HashSet::new();
    let mut normalized = Vec::with_capacity(slots.len());

    for slot in slots {
        if !seen_days.insert(slot.day) {
            return Err(format!(
                "Availability lists {} more than once; declare each day once",
                slot.day
            ));
        }
        if slot.periods.is_empty() {
            return Err(format!("No periods selected for {}", slot.day));
        }
        if let Some(bad) = slot
            .periods
            .iter()
            .find(|p| **p == 0 || **p > number_of_periods)
        {
            return Err(format!(
                "Period {} on {} is out of range; periods run from 1 to {}",
                bad, slot.day, number_of_periods
            ));
        }

        let mut periods = slot.periods.clone();
        periods.sort_unstable();
        periods.dedup();
        normalized.push(AvailabilitySlot::new(slot.day, periods));
    }

    Ok(normalized)
}
