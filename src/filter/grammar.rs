//! Range/value list grammar
//!
//! ```text
//! list    := "*" | item ("," item)*
//! item    := value | value "-" value          (ordered kinds only)
//! date    := YYYY-MM-DD | YYYYMMDD
//! dates   := date | date ":" date | date "-" date
//! ```
//!
//! Parsing only builds a [`FilterSpec`]; validity of ranges is decided by
//! the compiler.

use crate::calendar::{parse_date, Epiweek, TimeUnit};

use super::errors::{FilterError, FilterResult};
use super::spec::{Alternative, FieldKind, FilterSpec, Scalar};

/// Parses a comma-separated list for a field of the given kind.
pub fn parse_list(field: &str, kind: FieldKind, text: &str) -> FilterResult<FilterSpec> {
    parse_items(field, text, |item| match kind {
        FieldKind::Integer => parse_integer_item(field, item),
        FieldKind::OrderedString => Ok(match item.split_once('-') {
            Some((lo, hi)) if !lo.is_empty() && !hi.is_empty() => {
                Alternative::range(lo.trim(), hi.trim())
            }
            _ => Alternative::value(item),
        }),
        FieldKind::PlainString => Ok(Alternative::value(item)),
    })
}

/// Parses a list of time values in `unit`: dates for days, `YYYYWW` for
/// weeks. Every endpoint is validated against the calendar.
pub fn parse_time_list(field: &str, unit: TimeUnit, text: &str) -> FilterResult<FilterSpec> {
    match unit {
        TimeUnit::Day => parse_items(field, text, |item| parse_date_item(field, item)),
        TimeUnit::Week => parse_items(field, text, |item| {
            let alt = parse_integer_item(field, item)?;
            let valid = match &alt {
                Alternative::Value(Scalar::Int(v)) => Epiweek::from_yyyyww(*v).is_some(),
                Alternative::Range(Scalar::Int(lo), Scalar::Int(hi)) => {
                    Epiweek::from_yyyyww(*lo).is_some() && Epiweek::from_yyyyww(*hi).is_some()
                }
                _ => false,
            };
            if valid {
                Ok(alt)
            } else {
                Err(FilterError::malformed(field, item))
            }
        }),
    }
}

/// Parses a single scalar time value (`as_of`, `release_date`, ...).
pub fn parse_time_value(field: &str, unit: TimeUnit, text: &str) -> FilterResult<i64> {
    let text = text.trim();
    let value = match unit {
        TimeUnit::Day => parse_date(text),
        TimeUnit::Week => text.parse::<i64>().ok().filter(|v| unit.is_valid(*v)),
    };
    value.ok_or_else(|| FilterError::malformed(field, text))
}

/// Parses a single signed integer.
pub fn parse_integer(field: &str, text: &str) -> FilterResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| FilterError::malformed(field, text))
}

fn parse_items<F>(field: &str, text: &str, mut item: F) -> FilterResult<FilterSpec>
where
    F: FnMut(&str) -> FilterResult<Alternative>,
{
    let text = text.trim();
    if text == "*" {
        return Ok(FilterSpec::Any);
    }
    if text.is_empty() {
        return Ok(FilterSpec::Alternatives(Vec::new()));
    }
    let mut alternatives = Vec::new();
    for raw in text.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FilterError::malformed(field, text));
        }
        alternatives.push(item(raw)?);
    }
    Ok(FilterSpec::Alternatives(alternatives))
}

fn parse_integer_item(field: &str, item: &str) -> FilterResult<Alternative> {
    let int = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| FilterError::malformed(field, item))
    };
    match item.split_once('-') {
        Some((lo, hi)) => Ok(Alternative::Range(Scalar::Int(int(lo)?), Scalar::Int(int(hi)?))),
        None => Ok(Alternative::Value(Scalar::Int(int(item)?))),
    }
}

fn parse_date_item(field: &str, item: &str) -> FilterResult<Alternative> {
    let date = |s: &str| parse_date(s).ok_or_else(|| FilterError::malformed(field, item));

    if let Some((lo, hi)) = item.split_once(':') {
        return Ok(Alternative::Range(Scalar::Int(date(lo)?), Scalar::Int(date(hi)?)));
    }
    // YYYYMMDD-YYYYMMDD
    if item.len() == 17 && item.as_bytes()[8] == b'-' {
        return Ok(Alternative::Range(
            Scalar::Int(date(&item[..8])?),
            Scalar::Int(date(&item[9..])?),
        ));
    }
    // YYYY-MM-DD-YYYY-MM-DD
    if item.len() == 21 && item.as_bytes()[10] == b'-' {
        return Ok(Alternative::Range(
            Scalar::Int(date(&item[..10])?),
            Scalar::Int(date(&item[11..])?),
        ));
    }
    Ok(Alternative::Value(Scalar::Int(date(item)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterCompiler, FilterErrorCode};

    #[test]
    fn test_integer_list() {
        let spec = parse_list("epiweek", FieldKind::Integer, "201440-201445, 201450").unwrap();
        assert_eq!(
            spec,
            FilterSpec::Alternatives(vec![
                Alternative::range(201440, 201445),
                Alternative::value(201450),
            ])
        );
    }

    #[test]
    fn test_wildcard_and_empty() {
        assert_eq!(parse_list("r", FieldKind::PlainString, "*").unwrap(), FilterSpec::Any);
        assert_eq!(
            parse_list("r", FieldKind::PlainString, "").unwrap(),
            FilterSpec::Alternatives(vec![])
        );
    }

    #[test]
    fn test_plain_strings_never_split() {
        let spec = parse_list("region", FieldKind::PlainString, "nat,hhs-1").unwrap();
        assert_eq!(spec, FilterSpec::values(["nat", "hhs-1"]));
    }

    #[test]
    fn test_dangling_comma_is_malformed() {
        let err = parse_list("epiweek", FieldKind::Integer, "201401,,201402").unwrap_err();
        assert_eq!(err.code(), FilterErrorCode::EpiFilterMalformed);
    }

    #[test]
    fn test_inverted_range_parses_then_fails_compile() {
        let spec = parse_list("lag", FieldKind::Integer, "20-10").unwrap();
        let err = FilterCompiler::compile("lag", FieldKind::Integer, &spec).unwrap_err();
        assert_eq!(err.code(), FilterErrorCode::EpiFilterInvertedRange);
    }

    #[test]
    fn test_date_forms() {
        let expected = FilterSpec::range(20200401, 20200410);
        assert_eq!(
            parse_time_list("d", TimeUnit::Day, "2020-04-01:2020-04-10").unwrap(),
            expected
        );
        assert_eq!(
            parse_time_list("d", TimeUnit::Day, "20200401-20200410").unwrap(),
            expected
        );
        assert_eq!(
            parse_time_list("d", TimeUnit::Day, "2020-04-01-2020-04-10").unwrap(),
            expected
        );
        assert_eq!(
            parse_time_list("d", TimeUnit::Day, "20200401:2020-04-10").unwrap(),
            expected
        );
        assert_eq!(
            parse_time_list("d", TimeUnit::Day, "2020-04-01").unwrap(),
            FilterSpec::single(20200401)
        );
    }

    #[test]
    fn test_invalid_epiweek_rejected() {
        assert!(parse_time_list("w", TimeUnit::Week, "201501-201553").is_err());
        assert!(parse_time_list("w", TimeUnit::Week, "201401-201453").is_ok());
        assert!(parse_time_list("w", TimeUnit::Week, "201460").is_err());
    }

    #[test]
    fn test_single_time_value() {
        assert_eq!(parse_time_value("as_of", TimeUnit::Week, "201501").unwrap(), 201501);
        assert_eq!(
            parse_time_value("as_of", TimeUnit::Day, "2020-05-01").unwrap(),
            20200501
        );
        assert!(parse_time_value("as_of", TimeUnit::Week, "201599").is_err());
    }
}
