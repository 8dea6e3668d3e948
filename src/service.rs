//! Request-level operations over the catalog and the stores.

use crate::availability::validate_availability;
use crate::catalog::{Catalog, Section};
use crate::conflict::{Candidate, check_submission};
use crate::data::{
    AvailabilitySlot, FacultyId, FacultyRecord, FacultySubmission, Subject, TimetableGrid,
};
use crate::error::ScheduleError;
use crate::settings::ScheduleConfig;
use crate::solver;
use crate::store::{FacultyFilter, FacultyStore, SettingsStore, TimetableStore};
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

pub struct Scheduler {
    catalog: Catalog,
    faculty: Arc<dyn FacultyStore>,
    timetables: Arc<dyn TimetableStore>,
    settings: Arc<dyn SettingsStore>,
    /// Held across read-check-write of faculty records so two requests cannot
    /// both pass the conflict checks and then both write.
    faculty_writes: Mutex<()>,
}

/// A submission that passed field validation and catalog resolution.
struct ResolvedSubmission {
    name: String,
    subject: Subject,
    section: Section,
    availability: Vec<AvailabilitySlot>,
}

impl Scheduler {
    pub fn new(
        catalog: Catalog,
        faculty: Arc<dyn FacultyStore>,
        timetables: Arc<dyn TimetableStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            catalog,
            faculty,
            timetables,
            settings,
            faculty_writes: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn list_faculty(&self) -> ScheduleResult<Vec<FacultyRecord>> {
        let faculty = self.faculty.list_faculty()?;
        info!("Retrieved {} faculty members", faculty.len());
        Ok(faculty)
    }

    pub fn get_faculty(&self, id: FacultyId) -> ScheduleResult<FacultyRecord> {
        self.faculty
            .get_faculty(id)?
            .ok_or_else(|| ScheduleError::not_found("Faculty not found"))
    }

    pub fn create_faculty(&self, submission: &FacultySubmission) -> ScheduleResult<FacultyRecord> {
        let resolved = self.resolve(submission)?;

        let _guard = self.faculty_writes.lock();
        self.check_conflicts(None, &resolved)?;

        let record = resolved.into_record(Uuid::new_v4());
        self.faculty.insert_faculty(record.clone())?;
        info!(
            "Faculty created: {} ({}) for section {}",
            record.name, record.subject.code, record.section_code
        );
        Ok(record)
    }

    /// Replaces name, subject, section and availability of an existing record.
    pub fn update_faculty(
        &self,
        id: FacultyId,
        submission: &FacultySubmission,
    ) -> ScheduleResult<FacultyRecord> {
        let resolved = self.resolve(submission)?;

        let _guard = self.faculty_writes.lock();
        if self.faculty.get_faculty(id)?.is_none() {
            return Err(ScheduleError::not_found("Faculty not found"));
        }
        self.check_conflicts(Some(id), &resolved)?;

        let record = resolved.into_record(id);
        if !self.faculty.replace_faculty(record.clone())? {
            return Err(ScheduleError::not_found("Faculty not found"));
        }
        info!("Faculty updated: {}", record.name);
        Ok(record)
    }

    pub fn delete_faculty(&self, id: FacultyId) -> ScheduleResult<FacultyRecord> {
        let _guard = self.faculty_writes.lock();
        let removed = self
            .faculty
            .remove_faculty(id)?
            .ok_or_else(|| ScheduleError::not_found("Faculty not found"))?;
        info!("Faculty deleted: {}", removed.name);
        Ok(removed)
    }

    /// Regenerates and stores the timetable of one department and section.
    pub fn generate_timetable(
        &self,
        department_id: Option<&str>,
        section_id: Option<&str>,
    ) -> ScheduleResult<TimetableGrid> {
        let (department_id, section_id) = required_keys(department_id, section_id)?;
        let settings = self.settings.get_settings()?;

        let faculty = self.faculty.find_faculty(&FacultyFilter {
            department_id: Some(department_id.to_string()),
            section_id: Some(section_id.to_string()),
            ..Default::default()
        })?;
        info!(
            "Found {} faculty assignments for department {} section {}",
            faculty.len(),
            department_id,
            section_id
        );

        let Some(grid) = solver::generate(&faculty, settings.number_of_periods) else {
            warn!("No faculty found for section {section_id}");
            return Err(ScheduleError::not_found(
                "No faculty found for this section. Please add faculty members first.",
            ));
        };

        let timetable = TimetableGrid {
            department_id: department_id.to_string(),
            section_id: section_id.to_string(),
            grid,
        };
        self.timetables.upsert_timetable(timetable.clone())?;
        Ok(timetable)
    }

    pub fn get_timetable(
        &self,
        department_id: Option<&str>,
        section_id: Option<&str>,
    ) -> ScheduleResult<TimetableGrid> {
        let (department_id, section_id) = required_keys(department_id, section_id)?;
        self.timetables
            .find_timetable(department_id, section_id)?
            .ok_or_else(|| {
                ScheduleError::not_found(
                    "No timetable found for this section. Please generate one first.",
                )
            })
    }

    pub fn delete_timetable(
        &self,
        department_id: Option<&str>,
        section_id: Option<&str>,
    ) -> ScheduleResult<()> {
        let (department_id, section_id) = required_keys(department_id, section_id)?;
        if !self.timetables.remove_timetable(department_id, section_id)? {
            return Err(ScheduleError::not_found("No timetable found to delete"));
        }
        info!("Timetable deleted for department {department_id} section {section_id}");
        Ok(())
    }

    pub fn settings(&self) -> ScheduleResult<ScheduleConfig> {
        Ok(self.settings.get_settings()?)
    }

    pub fn update_settings(&self, config: ScheduleConfig) -> ScheduleResult<ScheduleConfig> {
        config.validate().map_err(ScheduleError::Validation)?;
        self.settings.put_settings(config.clone())?;
        info!(
            "Settings updated: {} periods of {} minutes",
            config.number_of_periods, config.period_duration
        );
        Ok(config)
    }

    pub fn reset_settings(&self) -> ScheduleResult<ScheduleConfig> {
        let config = self.settings.reset_settings()?;
        info!("Settings reset to default");
        Ok(config)
    }

    /// Field checks, catalog lookups and availability validation. Reads no faculty records.
    fn resolve(&self, submission: &FacultySubmission) -> ScheduleResult<ResolvedSubmission> {
        let name = submission.name.trim();
        if name.is_empty()
            || submission.subject_code.trim().is_empty()
            || submission.section.trim().is_empty()
        {
            return Err(ScheduleError::validation(
                "Name, subject, section, and availability are required",
            ));
        }

        let subject = self
            .catalog
            .subject_by_code(&submission.subject_code)
            .ok_or_else(|| {
                ScheduleError::not_found(format!(
                    "Subject with code \"{}\" not found",
                    submission.subject_code.trim()
                ))
            })?;
        let section = self.catalog.section(submission.section.trim()).ok_or_else(|| {
            ScheduleError::not_found(format!("Section \"{}\" not found", submission.section.trim()))
        })?;
        if subject.department_id != section.department_id {
            return Err(ScheduleError::validation(format!(
                "Subject {} is not offered to section {} of department {}",
                subject.code, section.code, section.department_id
            )));
        }

        let number_of_periods = self.settings.get_settings()?.number_of_periods;
        let availability = validate_availability(&submission.availability, number_of_periods)
            .map_err(ScheduleError::Validation)?;

        Ok(ResolvedSubmission {
            name: name.to_string(),
            subject: subject.clone(),
            section: section.clone(),
            availability,
        })
    }

    fn check_conflicts(
        &self,
        id: Option<FacultyId>,
        resolved: &ResolvedSubmission,
    ) -> ScheduleResult<()> {
        let same_name = self.faculty.find_faculty(&FacultyFilter {
            name: Some(resolved.name.clone()),
            exclude_id: id,
            ..Default::default()
        })?;
        let same_section = self.faculty.find_faculty(&FacultyFilter {
            section_id: Some(resolved.section.id.clone()),
            exclude_id: id,
            ..Default::default()
        })?;
        let candidate = Candidate {
            id,
            name: &resolved.name,
            section_id: &resolved.section.id,
            availability: &resolved.availability,
        };
        // Same-name records first. A same-name record in the same section would
        // already have tripped the name check, so the two passes stay in order.
        check_submission(&candidate, &same_name)?;
        check_submission(&candidate, &same_section)?;
        Ok(())
    }
}

impl ResolvedSubmission {
    fn into_record(self, id: FacultyId) -> FacultyRecord {
        FacultyRecord {
            id,
            name: self.name,
            department_id: self.subject.department_id.clone(),
            subject: self.subject,
            section_id: self.section.id,
            section_code: self.section.code,
            availability: self.availability,
        }
    }
}

fn required_keys<'a>(
    department_id: Option<&'a str>,
    section_id: Option<&'a str>,
) -> ScheduleResult<(&'a str, &'a str)> {
    let department_id = department_id
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ScheduleError::validation("Department ID is required"))?;
    let section_id = section_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScheduleError::validation("Section ID is required"))?;
    Ok((department_id, section_id))
}
