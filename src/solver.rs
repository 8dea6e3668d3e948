use crate::data::{Day, FacultyRecord, Period, SlotAssignment, WeekGrid};
use crate::usage::UsageBalancer;
use itertools::{Itertools, iproduct};
use log::{info, trace};
use std::time::Instant;

/// Fills a Day × Period grid from the faculty of one department and section.
///
/// Single greedy pass: cells are visited Monday to Friday, period 1 upwards.
/// Each cell goes to the least-used faculty available at that time, ties going
/// to the earlier record in `faculty`. There is no backtracking, so coverage
/// is not maximised. Returns `None` when there is no faculty to place.
///
/// Availability is assumed valid; it is checked when records are written.
pub fn generate(faculty: &[FacultyRecord], number_of_periods: Period) -> Option<WeekGrid> {
    if faculty.is_empty() {
        return None;
    }

    let start_time = Instant::now();
    info!(
        "Generating timetable from {} faculty assignments over {} periods per day...",
        faculty.len(),
        number_of_periods
    );

    let mut grid = WeekGrid::empty(number_of_periods);
    let mut balancer = UsageBalancer::new(faculty.iter().map(|f| f.id));

    for (day, period) in iproduct!(Day::ALL, 1..=number_of_periods) {
        let candidates = faculty
            .iter()
            .filter(|f| f.is_available(day, period))
            .collect_vec();

        let Some(selected) = balancer.pick(candidates) else {
            continue;
        };

        if grid.assign(day, period, SlotAssignment::for_faculty(selected)) {
            balancer.record(selected.id);
        }
    }

    trace!(
        "Faculty usage ({} cells): {}",
        balancer.total(),
        faculty
            .iter()
            .map(|f| format!("{}={}", f.name, balancer.usage(&f.id)))
            .join(", ")
    );
    info!(
        "Filled {} out of {} slots in {:.2?}",
        grid.filled_slots(),
        grid.total_slots(),
        start_time.elapsed()
    );

    Some(grid)
}
