//! Conflict detection for faculty availability.
//!
//! Two classes of conflict keep a record out of the store:
//! - the same person (by trimmed, case-insensitive name) booked twice at one
//!   day/period across any sections;
//! - two records staffing the same section at one day/period.
//!
//! Both checks are pure; the caller rejects the write when either fires.

use crate::data::{AvailabilitySlot, Day, FacultyId, FacultyRecord, Period, SectionId};
use itertools::Itertools;
use serde::Serialize;
use std::fmt;

/// A day on which existing and proposed availability overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub day: Day,
    pub periods: Vec<Period>,
}

/// Returns the first overlap between `existing` and `proposed`.
///
/// Scans `proposed` in order and, for each slot, the first `existing` slot on
/// the same day sharing a period. The reported periods are `existing`'s
/// periods (in their order) that also appear in the proposed slot.
pub fn detect_conflict(
    existing: &[AvailabilitySlot],
    proposed: &[AvailabilitySlot],
) -> Option<Conflict> {
    for new_slot in proposed {
        let clash = existing.iter().find(|slot| {
            slot.day == new_slot.day && slot.periods.iter().any(|p| new_slot.includes(*p))
        });

        if let Some(slot) = clash {
            let periods = slot
                .periods
                .iter()
                .copied()
                .filter(|p| new_slot.includes(*p))
                .collect();
            return Some(Conflict {
                day: slot.day,
                periods,
            });
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictKind {
    /// The submitting person already teaches another section at that time.
    FacultyDoubleBooked,
    /// Someone else already teaches the target section at that time.
    SectionDoubleStaffed,
}

/// A rejected submission, naming the record it collided with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConflict {
    pub kind: ConflictKind,
    pub faculty_name: String,
    pub section_code: String,
    pub day: Day,
    pub periods: Vec<Period>,
}

impl ScheduleConflict {
    fn against(kind: ConflictKind, record: &FacultyRecord, conflict: Conflict) -> Self {
        Self {
            kind,
            faculty_name: record.name.clone(),
            section_code: record.section_code.clone(),
            day: conflict.day,
            periods: conflict.periods,
        }
    }
}

impl fmt::Display for ScheduleConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time slot conflict: {} is already teaching section {} on {}, Period(s) {}",
            self.faculty_name,
            self.section_code,
            self.day,
            self.periods.iter().join(", ")
        )?;
        if self.kind == ConflictKind::FacultyDoubleBooked {
            f.write_str(". A faculty member cannot teach multiple sections at the same time.")?;
        }
        Ok(())
    }
}

impl std::error::Error for ScheduleConflict {}

/// The record being created or updated, as seen by the conflict checks.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Set on update so the record never conflicts with itself.
    pub id: Option<FacultyId>,
    pub name: &'a str,
    pub section_id: &'a SectionId,
    pub availability: &'a [AvailabilitySlot],
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Runs the name check, then the section check, over `existing` in order.
pub fn check_submission(
    candidate: &Candidate<'_>,
    existing: &[FacultyRecord],
) -> Result<(), ScheduleConflict> {
    let name = normalize_name(candidate.name);
    let others = || {
        existing
            .iter()
            .filter(move |record| Some(record.id) != candidate.id)
    };

    for record in others().filter(|record| normalize_name(&record.name) == name) {
        if let Some(conflict) = detect_conflict(&record.availability, candidate.availability) {
            return Err(ScheduleConflict::against(
                ConflictKind::FacultyDoubleBooked,
                record,
                conflict,
            ));
        }
    }

    for record in others().filter(|record| &record.section_id == candidate.section_id) {
        if let Some(conflict) = detect_conflict(&record.availability, candidate.availability) {
            return Err(ScheduleConflict::against(
                ConflictKind::SectionDoubleStaffed,
                record,
                conflict,
            ));
        }
    }

    Ok(())
}
