//! Calendar arithmetic for revision-stamped observations
//!
//! Observation tables use one of two integer-encoded time units:
//!
//! - Day: `YYYYMMDD`
//! - Week: CDC/MMWR epiweek `YYYYWW`
//!
//! Issues are expressed in the same unit as the time value of the table,
//! so `lag = issue - time_value` is computed on the calendar, never on the
//! raw integers (`201501 - 201450` is 4 weeks, not 51).

mod day;
mod epiweek;

use serde::{Deserialize, Serialize};

pub use day::{parse_date, yyyymmdd_to_date, date_to_yyyymmdd};
pub use epiweek::Epiweek;

/// The unit a table's time values and issues are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// `YYYYMMDD`
    Day,
    /// `YYYYWW`
    Week,
}

impl TimeUnit {
    /// Returns the parameter spelling used by requests (`day` / `week`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
        }
    }

    /// Parses the request spelling of a time unit.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(TimeUnit::Day),
            "week" => Some(TimeUnit::Week),
            _ => None,
        }
    }

    /// Number of units from `time_value` to `issue`.
    ///
    /// Returns `None` if either value is not a valid encoding for this unit.
    pub fn lag(&self, issue: i64, time_value: i64) -> Option<i64> {
        match self {
            TimeUnit::Day => {
                let issue = yyyymmdd_to_date(issue)?;
                let time = yyyymmdd_to_date(time_value)?;
                Some((issue - time).num_days())
            }
            TimeUnit::Week => {
                let issue = Epiweek::from_yyyyww(issue)?;
                let time = Epiweek::from_yyyyww(time_value)?;
                Some(issue.weeks_since(time))
            }
        }
    }

    /// The value `lag` units after `time_value`.
    pub fn shift(&self, time_value: i64, lag: i64) -> Option<i64> {
        match self {
            TimeUnit::Day => {
                let date = yyyymmdd_to_date(time_value)?;
                let shifted = date.checked_add_signed(chrono::Duration::days(lag))?;
                Some(date_to_yyyymmdd(shifted))
            }
            TimeUnit::Week => {
                let week = Epiweek::from_yyyyww(time_value)?;
                Some(week.add_weeks(lag)?.to_yyyyww())
            }
        }
    }

    /// Checks that `value` is a well-formed encoding for this unit.
    pub fn is_valid(&self, value: i64) -> bool {
        match self {
            TimeUnit::Day => yyyymmdd_to_date(value).is_some(),
            TimeUnit::Week => Epiweek::from_yyyyww(value).is_some(),
        }
    }
}
