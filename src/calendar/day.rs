//! `YYYYMMDD` day encoding

use chrono::{Datelike, NaiveDate};

/// Decodes a `YYYYMMDD` integer into a date.
pub fn yyyymmdd_to_date(value: i64) -> Option<NaiveDate> {
    if value < 0 {
        return None;
    }
    let year = i32::try_from(value / 10_000).ok()?;
    let month = u32::try_from((value / 100) % 100).ok()?;
    let day = u32::try_from(value % 100).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Encodes a date as a `YYYYMMDD` integer.
pub fn date_to_yyyymmdd(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// Parses `YYYY-MM-DD` or `YYYYMMDD` into the `YYYYMMDD` integer form.
pub fn parse_date(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.len() == 10 {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
        return Some(date_to_yyyymmdd(date));
    }
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let value: i64 = s.parse().ok()?;
        return yyyymmdd_to_date(value).map(date_to_yyyymmdd);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_date_spellings() {
        assert_eq!(parse_date("2020-04-01"), Some(20200401));
        assert_eq!(parse_date("20200401"), Some(20200401));
    }

    #[test]
    fn test_rejects_impossible_dates() {
        assert_eq!(parse_date("2020-02-30"), None);
        assert_eq!(parse_date("20201301"), None);
        assert_eq!(parse_date("2020041"), None);
        assert_eq!(parse_date("april"), None);
    }

    #[test]
    fn test_encode_decode() {
        let date = yyyymmdd_to_date(20191231).unwrap();
        assert_eq!(date_to_yyyymmdd(date), 20191231);
        assert!(yyyymmdd_to_date(-20191231).is_none());
    }
}
