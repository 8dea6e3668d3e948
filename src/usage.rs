use crate::data::{FacultyId, FacultyRecord};
use std::collections::HashMap;

/// Per-run count of cells assigned to each faculty record.
///
/// Lives only for one `generate` call; drives the least-used tie-break.
#[derive(Debug, Default)]
pub struct UsageBalancer {
    counts: HashMap<FacultyId, u32>,
}

impl UsageBalancer {
    pub fn new(ids: impl IntoIterator<Item = FacultyId>) -> Self {
        Self {
            counts: ids.into_iter().map(|id| (id, 0)).collect(),
        }
    }

    pub fn usage(&self, id: &FacultyId) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// The least-used candidate. Ties go to whichever came first in `candidates`.
    pub fn pick<'a>(&self, mut candidates: Vec<&'a FacultyRecord>) -> Option<&'a FacultyRecord> {
        // sort_by_key is stable
        candidates.sort_by_key(|faculty| self.usage(&faculty.id));
        candidates.into_iter().next()
    }

    pub fn record(&mut self, id: FacultyId) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}
