//! Storage collaborators for faculty records, timetables and settings.
//!
//! `MemoryStore` keeps everything behind a single lock and can mirror its
//! state to a JSON snapshot file after each write.

use crate::conflict::normalize_name;
use crate::data::{DepartmentId, FacultyId, FacultyRecord, Period, SectionId, TimetableGrid};
use crate::settings::ScheduleConfig;
use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store snapshot is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for `FacultyStore::find_faculty`. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct FacultyFilter {
    pub department_id: Option<DepartmentId>,
    pub section_id: Option<SectionId>,
    /// Compared trimmed and case-insensitively.
    pub name: Option<String>,
    pub exclude_id: Option<FacultyId>,
}

impl FacultyFilter {
    pub fn matches(&self, record: &FacultyRecord) -> bool {
        self.department_id
            .as_ref()
            .is_none_or(|d| &record.department_id == d)
            && self.section_id.as_ref().is_none_or(|s| &record.section_id == s)
            && self
                .name
                .as_ref()
                .is_none_or(|n| normalize_name(&record.name) == normalize_name(n))
            && self.exclude_id.is_none_or(|id| record.id != id)
    }
}

pub trait FacultyStore: Send + Sync {
    /// All records in insertion order.
    fn list_faculty(&self) -> StoreResult<Vec<FacultyRecord>>;
    fn find_faculty(&self, filter: &FacultyFilter) -> StoreResult<Vec<FacultyRecord>>;
    fn get_faculty(&self, id: FacultyId) -> StoreResult<Option<FacultyRecord>>;
    fn insert_faculty(&self, record: FacultyRecord) -> StoreResult<()>;
    /// Replaces the record with the same id in place. Returns false if absent.
    fn replace_faculty(&self, record: FacultyRecord) -> StoreResult<bool>;
    fn remove_faculty(&self, id: FacultyId) -> StoreResult<Option<FacultyRecord>>;
}

/// One grid per (department, section).
pub trait TimetableStore: Send + Sync {
    fn find_timetable(&self, department_id: &str, section_id: &str) -> StoreResult<Option<TimetableGrid>>;
    fn upsert_timetable(&self, timetable: TimetableGrid) -> StoreResult<()>;
    fn remove_timetable(&self, department_id: &str, section_id: &str) -> StoreResult<bool>;
}

pub trait SettingsStore: Send + Sync {
    /// Returns the settings, creating the default document if none exists.
    fn get_settings(&self) -> StoreResult<ScheduleConfig>;
    fn put_settings(&self, config: ScheduleConfig) -> StoreResult<()>;
    /// Discards the current settings in favour of the default document.
    fn reset_settings(&self) -> StoreResult<ScheduleConfig>;
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreState {
    faculty: Vec<FacultyRecord>,
    timetables: Vec<TimetableGrid>,
    settings: Option<ScheduleConfig>,
}

#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    snapshot: Option<PathBuf>,
    default_periods: Period,
}

impl MemoryStore {
    pub fn new(default_periods: Period) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            snapshot: None,
            default_periods,
        }
    }

    /// A store persisted to `path`, loading the existing snapshot if there is one.
    pub fn open(path: impl Into<PathBuf>, default_periods: Period) -> StoreResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let state: StoreState = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
            info!(
                "Loaded {} faculty records and {} timetables from {}",
                state.faculty.len(),
                state.timetables.len(),
                path.display()
            );
            state
        } else {
            StoreState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            snapshot: Some(path),
            default_periods,
        })
    }

    fn default_settings(&self) -> ScheduleConfig {
        ScheduleConfig::with_periods(self.default_periods)
    }

    /// Applies `change` under the write lock. With a snapshot configured the
    /// change is made on a copy, and the copy only replaces the live state once
    /// it has been written to disk.
    fn write<T>(&self, change: impl FnOnce(&mut StoreState) -> T) -> StoreResult<T> {
        let mut state = self.state.write();
        let Some(path) = &self.snapshot else {
            return Ok(change(&mut state));
        };
        let mut next = state.clone();
        let out = change(&mut next);
        persist(path, &next)?;
        *state = next;
        Ok(out)
    }
}

fn persist(path: &Path, state: &StoreState) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(state)?;
    // write-then-rename so a crash never leaves a truncated snapshot
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    debug!("Snapshot written to {}", path.display());
    Ok(())
}

impl FacultyStore for MemoryStore {
    fn list_faculty(&self) -> StoreResult<Vec<FacultyRecord>> {
        Ok(self.state.read().faculty.clone())
    }

    fn find_faculty(&self, filter: &FacultyFilter) -> StoreResult<Vec<FacultyRecord>> {
        Ok(self
            .state
            .read()
            .faculty
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn get_faculty(&self, id: FacultyId) -> StoreResult<Option<FacultyRecord>> {
        Ok(self.state.read().faculty.iter().find(|r| r.id == id).cloned())
    }

    fn insert_faculty(&self, record: FacultyRecord) -> StoreResult<()> {
        self.write(|state| state.faculty.push(record))
    }

    fn replace_faculty(&self, record: FacultyRecord) -> StoreResult<bool> {
        self.write(|state| match state.faculty.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        })
    }

    fn remove_faculty(&self, id: FacultyId) -> StoreResult<Option<FacultyRecord>> {
        self.write(|state| {
            let index = state.faculty.iter().position(|r| r.id == id)?;
            Some(state.faculty.remove(index))
        })
    }
}

impl TimetableStore for MemoryStore {
    fn find_timetable(&self, department_id: &str, section_id: &str) -> StoreResult<Option<TimetableGrid>> {
        Ok(self
            .state
            .read()
            .timetables
            .iter()
            .find(|t| t.department_id == department_id && t.section_id == section_id)
            .cloned())
    }

    fn upsert_timetable(&self, timetable: TimetableGrid) -> StoreResult<()> {
        self.write(|state| {
            match state.timetables.iter_mut().find(|t| {
                t.department_id == timetable.department_id && t.section_id == timetable.section_id
            }) {
                Some(existing) => *existing = timetable,
                None => state.timetables.push(timetable),
            }
        })
    }

    fn remove_timetable(&self, department_id: &str, section_id: &str) -> StoreResult<bool> {
        self.write(|state| {
            let before = state.timetables.len();
            state
                .timetables
                .retain(|t| !(t.department_id == department_id && t.section_id == section_id));
            state.timetables.len() != before
        })
    }
}

impl SettingsStore for MemoryStore {
    fn get_settings(&self) -> StoreResult<ScheduleConfig> {
        if let Some(settings) = &self.state.read().settings {
            return Ok(settings.clone());
        }
        // Another writer may have created it between the two locks; keep theirs.
        self.write(|state| {
            state
                .settings
                .get_or_insert_with(|| {
                    info!("Created default settings");
                    self.default_settings()
                })
                .clone()
        })
    }

    fn put_settings(&self, config: ScheduleConfig) -> StoreResult<()> {
        self.write(|state| state.settings = Some(config))
    }

    fn reset_settings(&self) -> StoreResult<ScheduleConfig> {
        let defaults = self.default_settings();
        self.write(|state| {
            state.settings = Some(defaults.clone());
            defaults
        })
    }
}
