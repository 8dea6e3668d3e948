//! Process configuration read from the environment.
//!
//! # Environment Variables
//! - `TIMETABLE_BIND_ADDR` (default `127.0.0.1:8080`)
//! - `TIMETABLE_STATE_FILE` (optional): JSON snapshot path; in-memory only when unset
//! - `TIMETABLE_CATALOG` (optional): catalog JSON; the built-in catalog when unset
//! - `TIMETABLE_DEFAULT_PERIODS` (default 6): periods per day in freshly created settings
//! - `TIMETABLE_REQUEST_TIMEOUT_SECS` (default 10)
//! - `RUST_LOG` (default `info`)

use crate::data::Period;
use crate::settings::MAX_PERIODS;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_PERIODS: Period = 6;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub state_file: Option<PathBuf>,
    pub catalog_file: Option<PathBuf>,
    pub default_periods: Period,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from any variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = parse(
            "TIMETABLE_BIND_ADDR",
            get("TIMETABLE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        let default_periods: Period = match get("TIMETABLE_DEFAULT_PERIODS") {
            Some(raw) => parse("TIMETABLE_DEFAULT_PERIODS", raw)?,
            None => DEFAULT_PERIODS,
        };
        if !(1..=MAX_PERIODS).contains(&default_periods) {
            return Err(ConfigError::Invalid {
                var: "TIMETABLE_DEFAULT_PERIODS",
                value: default_periods.to_string(),
                reason: format!("must be between 1 and {MAX_PERIODS}"),
            });
        }

        let timeout_secs: u64 = match get("TIMETABLE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse("TIMETABLE_REQUEST_TIMEOUT_SECS", raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            bind_addr,
            state_file: get("TIMETABLE_STATE_FILE").map(PathBuf::from),
            catalog_file: get("TIMETABLE_CATALOG").map(PathBuf::from),
            default_periods,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse<T>(var: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value: raw,
    })
}
