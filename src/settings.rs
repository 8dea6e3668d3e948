use crate::data::Period;
use serde::{Deserialize, Serialize};

pub const MIN_PERIOD_DURATION: u32 = 30;
pub const MAX_PERIOD_DURATION: u32 = 120;
pub const MAX_PERIODS: Period = 9;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakTime {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Process-wide schedule settings. Exactly one exists; the store creates the
/// default document on first read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub working_hours: WorkingHours,
    /// Minutes per period.
    pub period_duration: u32,
    pub number_of_periods: Period,
    #[serde(default)]
    pub break_times: Vec<BreakTime>,
}

impl ScheduleConfig {
    /// The default settings document with a caller-supplied period count.
    pub fn with_periods(number_of_periods: Period) -> Self {
        Self {
            working_hours: WorkingHours {
                start_time: "9:00 AM".to_string(),
                end_time: "5:00 PM".to_string(),
            },
            period_duration: 60,
            number_of_periods,
            break_times: vec![
                BreakTime {
                    name: "Lunch Break".to_string(),
                    start_time: "1:00 PM".to_string(),
                    end_time: "2:00 PM".to_string(),
                    enabled: true,
                },
                BreakTime {
                    name: "Short Break".to_string(),
                    start_time: "11:00 AM".to_string(),
                    end_time: "11:15 AM".to_string(),
                    enabled: false,
                },
            ],
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.working_hours.start_time.trim().is_empty()
            || self.working_hours.end_time.trim().is_empty()
        {
            return Err("Working hours (start and end time) are required".to_string());
        }
        if !(MIN_PERIOD_DURATION..=MAX_PERIOD_DURATION).contains(&self.period_duration) {
            return Err(format!(
                "Period duration must be between {MIN_PERIOD_DURATION} and {MAX_PERIOD_DURATION} minutes"
            ));
        }
        if !(1..=MAX_PERIODS).contains(&self.number_of_periods) {
            return Err(format!("Number of periods must be between 1 and {MAX_PERIODS}"));
        }
        if let Some(incomplete) = self.break_times.iter().find(|b| {
            b.name.trim().is_empty() || b.start_time.trim().is_empty() || b.end_time.trim().is_empty()
        }) {
            return Err(format!(
                "Break time '{}' needs a name, start time and end time",
                incomplete.name
            ));
        }
        Ok(())
    }
}
