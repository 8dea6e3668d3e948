//! Read-only department, subject and section catalog.

use crate::data::{DepartmentId, SectionId, Subject};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../catalog.json");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Department {
    pub id: DepartmentId,
    pub code: String,
    pub name: String,
}

/// A student cohort, the unit a timetable is generated for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub code: String,
    pub name: String,
    pub department_id: DepartmentId,
    pub year: u8,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    departments: Vec<Department>,
    #[serde(default)]
    subjects: Vec<Subject>,
    #[serde(default)]
    sections: Vec<Section>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut catalog: Catalog = serde_json::from_str(json)?;
        for subject in &mut catalog.subjects {
            subject.code = subject.code.trim().to_uppercase();
        }
        Ok(catalog)
    }

    pub fn builtin() -> Result<Self, serde_json::Error> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(std::io::Error::other)
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn sections(&self, department_id: Option<&str>) -> Vec<&Section> {
        self.sections
            .iter()
            .filter(|s| department_id.is_none_or(|d| s.department_id == d))
            .collect()
    }

    /// Case-insensitive lookup by subject code.
    pub fn subject_by_code(&self, code: &str) -> Option<&Subject> {
        let code = code.trim().to_uppercase();
        self.subjects.iter().find(|s| s.code == code)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.departments().is_empty());
        assert!(catalog.section("cse-2a").is_some());
        assert!(catalog.subjects().iter().all(|s| {
            catalog.departments().iter().any(|d| d.id == s.department_id)
        }));
    }

    #[test]
    fn test_subject_lookup_ignores_case() {
        let catalog = Catalog::builtin().unwrap();
        let subject = catalog.subject_by_code(" dsa ").unwrap();
        assert_eq!(subject.code, "DSA");
        assert_eq!(subject.department_id, "cse");
        assert!(catalog.subject_by_code("NOPE").is_none());
    }

    #[test]
    fn test_codes_uppercased_on_load() {
        let catalog = Catalog::from_json(
            r#"{"subjects":[{"id":"x","code":"ml","name":"Machine Learning","departmentId":"cse"}]}"#,
        )
        .unwrap();
        assert_eq!(catalog.subjects()[0].code, "ML");
        assert!(catalog.departments().is_empty());
    }

    #[test]
    fn test_sections_by_department() {
        let catalog = Catalog::builtin().unwrap();
        let ece = catalog.sections(Some("ece"));
        assert!(!ece.is_empty());
        assert!(ece.iter().all(|s| s.department_id == "ece"));
        assert!(catalog.sections(None).len() > ece.len());
    }
}
