use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// Type aliases for clarity
pub type FacultyId = Uuid;
pub type DepartmentId = String;
pub type SectionId = String;
pub type SubjectId = String;
pub type Period = u8;

/// A teaching day. Ordered Monday first so maps keyed by day iterate in week order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// The fixed day axis of every timetable.
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The periods a faculty member teaches on one day.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AvailabilitySlot {
    pub day: Day,
    pub periods: Vec<Period>,
}

impl AvailabilitySlot {
    pub fn new(day: Day, periods: impl Into<Vec<Period>>) -> Self {
        Self {
            day,
            periods: periods.into(),
        }
    }

    pub fn includes(&self, period: Period) -> bool {
        self.periods.contains(&period)
    }
}

/// A subject from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub code: String,
    pub name: String,
    pub department_id: DepartmentId,
}

/// A persisted faculty assignment: one person teaching one subject to one section.
///
/// The same name may appear on several records (one per section); the
/// conflict detector keeps their time commitments disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyRecord {
    pub id: FacultyId,
    pub name: String,
    pub subject: Subject,
    pub department_id: DepartmentId,
    pub section_id: SectionId,
    pub section_code: String,
    pub availability: Vec<AvailabilitySlot>,
}

impl FacultyRecord {
    /// The periods this record declares for `day`, if it teaches that day at all.
    pub fn periods_on(&self, day: Day) -> Option<&[Period]> {
        self.availability
            .iter()
            .find(|slot| slot.day == day)
            .map(|slot| slot.periods.as_slice())
    }

    pub fn is_available(&self, day: Day, period: Period) -> bool {
        self.periods_on(day)
            .is_some_and(|periods| periods.contains(&period))
    }
}

/// Incoming availability submission for create and update.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultySubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject_code: String,
    #[serde(default)]
    pub section: SectionId,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
}

/// What occupies one timetable cell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    pub faculty_id: FacultyId,
    pub faculty_name: String,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub subject_code: String,
}

impl SlotAssignment {
    pub fn for_faculty(faculty: &FacultyRecord) -> Self {
        Self {
            faculty_id: faculty.id,
            faculty_name: faculty.name.clone(),
            subject_id: faculty.subject.id.clone(),
            subject_name: faculty.subject.name.clone(),
            subject_code: faculty.subject.code.clone(),
        }
    }
}

/// Day × Period grid. Every period of every day is present; `None` marks an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct WeekGrid(BTreeMap<Day, BTreeMap<Period, Option<SlotAssignment>>>);

impl WeekGrid {
    /// An empty grid with `number_of_periods` cells on each day.
    pub fn empty(number_of_periods: Period) -> Self {
        let days = Day::ALL
            .iter()
            .map(|day| (*day, (1..=number_of_periods).map(|p| (p, None)).collect()))
            .collect();
        Self(days)
    }

    pub fn cell(&self, day: Day, period: Period) -> Option<&SlotAssignment> {
        self.0.get(&day)?.get(&period)?.as_ref()
    }

    /// Fills a cell that is still empty. Returns false if the cell is taken or off the grid.
    pub fn assign(&mut self, day: Day, period: Period, assignment: SlotAssignment) -> bool {
        match self.0.get_mut(&day).and_then(|periods| periods.get_mut(&period)) {
            Some(cell) if cell.is_none() => {
                *cell = Some(assignment);
                true
            }
            _ => false,
        }
    }

    pub fn periods_per_day(&self, day: Day) -> usize {
        self.0.get(&day).map_or(0, BTreeMap::len)
    }

    pub fn total_slots(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn filled_slots(&self) -> usize {
        self.0
            .values()
            .flat_map(BTreeMap::values)
            .filter(|cell| cell.is_some())
            .count()
    }
}

/// The persisted timetable of one (department, section) pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableGrid {
    pub department_id: DepartmentId,
    pub section_id: SectionId,
    pub grid: WeekGrid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(name: &str) -> SlotAssignment {
        SlotAssignment {
            faculty_id: Uuid::new_v4(),
            faculty_name: name.to_string(),
            subject_id: "cse-dsa".to_string(),
            subject_name: "Data Structures & Algorithms".to_string(),
            subject_code: "DSA".to_string(),
        }
    }

    #[test]
    fn test_empty_grid_shape() {
        let grid = WeekGrid::empty(4);
        assert_eq!(grid.total_slots(), 20);
        assert_eq!(grid.filled_slots(), 0);
        for day in Day::ALL {
            assert_eq!(grid.periods_per_day(day), 4);
        }
    }

    #[test]
    fn test_assign_only_fills_empty_cells() {
        let mut grid = WeekGrid::empty(2);
        assert!(grid.assign(Day::Tuesday, 2, assignment("Kim")));
        assert!(!grid.assign(Day::Tuesday, 2, assignment("Lee")));
        assert!(!grid.assign(Day::Tuesday, 3, assignment("Lee")));
        assert_eq!(grid.cell(Day::Tuesday, 2).unwrap().faculty_name, "Kim");
        assert_eq!(grid.filled_slots(), 1);
    }

    #[test]
    fn test_grid_json_uses_day_names_and_null_cells() {
        let grid = WeekGrid::empty(1);
        let json = serde_json::to_value(&grid).unwrap();
        assert!(json["Monday"]["1"].is_null());
        assert!(json["Friday"].as_object().unwrap().contains_key("1"));

        let back: WeekGrid = serde_json::from_value(json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_submission_accepts_camel_case() {
        let submission: FacultySubmission = serde_json::from_str(
            r#"{"name":"Smith","subjectCode":"DSA","section":"cse-2a",
                "availability":[{"day":"Monday","periods":[1,2]}]}"#,
        )
        .unwrap();
        assert_eq!(submission.subject_code, "DSA");
        assert_eq!(submission.availability[0].day, Day::Monday);
        assert_eq!(submission.availability[0].periods, vec![1, 2]);
    }
}
