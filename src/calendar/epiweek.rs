//! CDC/MMWR epiweeks
//!
//! Weeks run Sunday through Saturday. Week 1 of a year is the week that
//! contains January 4th, so a year has either 52 or 53 weeks.

use chrono::{Datelike, Duration, NaiveDate};

/// A validated epiweek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epiweek {
    year: i32,
    week: u32,
}

impl Epiweek {
    /// Creates an epiweek if `week` exists in `year`.
    pub fn new(year: i32, week: u32) -> Option<Self> {
        if week == 0 || week > weeks_in_year(year)? {
            return None;
        }
        Some(Self { year, week })
    }

    /// Decodes a `YYYYWW` integer.
    pub fn from_yyyyww(value: i64) -> Option<Self> {
        if value < 0 {
            return None;
        }
        let year = i32::try_from(value / 100).ok()?;
        let week = u32::try_from(value % 100).ok()?;
        Self::new(year, week)
    }

    /// Encodes as a `YYYYWW` integer.
    pub fn to_yyyyww(&self) -> i64 {
        i64::from(self.year) * 100 + i64::from(self.week)
    }

    /// The epiweek containing `date`.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        let mut year = date.year();
        if date < year_start(year)? {
            year -= 1;
        } else if date >= year_start(year + 1)? {
            year += 1;
        }
        let days = (date - year_start(year)?).num_days();
        let week = u32::try_from(days / 7 + 1).ok()?;
        Some(Self { year, week })
    }

    /// The Sunday this epiweek starts on.
    pub fn start_date(&self) -> Option<NaiveDate> {
        year_start(self.year)?.checked_add_signed(Duration::weeks(i64::from(self.week) - 1))
    }

    /// Whole weeks from `earlier` to `self` (negative if `self` is earlier).
    pub fn weeks_since(&self, earlier: Epiweek) -> i64 {
        match (self.start_date(), earlier.start_date()) {
            (Some(a), Some(b)) => (a - b).num_days() / 7,
            // Unreachable for validated weeks; fall back to year/week counting.
            _ => {
                (i64::from(self.year) - i64::from(earlier.year)) * 52
                    + (i64::from(self.week) - i64::from(earlier.week))
            }
        }
    }

    /// The epiweek `weeks` later.
    pub fn add_weeks(&self, weeks: i64) -> Option<Self> {
        let start = self.start_date()?.checked_add_signed(Duration::weeks(weeks))?;
        Self::from_date(start)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }
}

/// First day (a Sunday) of epiweek 1 of `year`.
fn year_start(year: i32) -> Option<NaiveDate> {
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4)?;
    let offset = i64::from(jan4.weekday().num_days_from_sunday());
    jan4.checked_sub_signed(Duration::days(offset))
}

/// 52 or 53.
fn weeks_in_year(year: i32) -> Option<u32> {
    let days = (year_start(year + 1)? - year_start(year)?).num_days();
    u32::try_from(days / 7).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_53_week_years() {
        assert_eq!(weeks_in_year(2014), Some(53));
        assert_eq!(weeks_in_year(2015), Some(52));
        assert_eq!(weeks_in_year(2020), Some(53));
    }

    #[test]
    fn test_week_bounds() {
        assert!(Epiweek::from_yyyyww(201453).is_some());
        assert!(Epiweek::from_yyyyww(201553).is_none());
        assert!(Epiweek::from_yyyyww(201500).is_none());
    }

    #[test]
    fn test_known_start_dates() {
        // MMWR 2015 week 1 begins Sunday 2015-01-04
        let w = Epiweek::from_yyyyww(201501).unwrap();
        assert_eq!(w.start_date(), NaiveDate::from_ymd_opt(2015, 1, 4));
        // MMWR 2014 week 53 covers 2014-12-28 .. 2015-01-03
        let jan2 = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
        assert_eq!(Epiweek::from_date(jan2).unwrap().to_yyyyww(), 201453);
    }

    #[test]
    fn test_add_and_difference() {
        let a = Epiweek::from_yyyyww(201450).unwrap();
        let b = a.add_weeks(4).unwrap();
        assert_eq!(b.to_yyyyww(), 201501);
        assert_eq!(b.weeks_since(a), 4);
        assert_eq!(a.weeks_since(b), -4);
    }
}
