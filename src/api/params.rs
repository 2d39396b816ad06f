//! Request parameters
//!
//! A flat name → value map, as delivered by a query string. Typed accessors
//! route through the filter grammar so every dataset parses lists, dates
//! and version selectors identically.

use std::collections::HashMap;

use crate::calendar::TimeUnit;
use crate::filter::{parse_integer, parse_list, parse_time_list, parse_time_value, FieldKind, FilterSpec};
use crate::printer::OutputFormat;
use crate::version::VersionRequest;

use super::errors::{ApiError, ApiResult};

/// Parameter carrying the auth token
pub const TOKEN_PARAM: &str = "auth";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: HashMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn require(&self, name: &str) -> ApiResult<&str> {
        self.get(name)
            .ok_or_else(|| ApiError::missing_parameter(name))
    }

    /// Value list of a required parameter.
    pub fn filter(&self, name: &str, kind: FieldKind) -> ApiResult<FilterSpec> {
        Ok(parse_list(name, kind, self.require(name)?)?)
    }

    /// Time list of a required parameter, validated against `unit`.
    pub fn time_filter(&self, name: &str, unit: TimeUnit) -> ApiResult<FilterSpec> {
        Ok(parse_time_list(name, unit, self.require(name)?)?)
    }

    /// Optional single time value.
    pub fn time_value(&self, name: &str, unit: TimeUnit) -> ApiResult<Option<i64>> {
        self.get(name)
            .map(|v| parse_time_value(name, unit, v).map_err(ApiError::from))
            .transpose()
    }

    /// Comma-separated plain names, empty items dropped.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `issues`, `lag` and `as_of`, with issues and cutoff in `unit`.
    pub fn version_request(&self, unit: TimeUnit) -> ApiResult<VersionRequest> {
        let issues = self
            .get("issues")
            .map(|v| parse_time_list("issues", unit, v))
            .transpose()?;
        let lag = self
            .get("lag")
            .map(|v| parse_integer("lag", v))
            .transpose()?;
        let as_of = self.time_value("as_of", unit)?;
        Ok(VersionRequest { issues, lag, as_of })
    }

    /// Requested field subset, if any.
    pub fn fields(&self) -> Option<Vec<String>> {
        self.has("fields").then(|| self.list("fields"))
    }

    pub fn format(&self) -> ApiResult<OutputFormat> {
        Ok(OutputFormat::from_param(self.get("format"))?)
    }

    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_PARAM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Alternative;

    #[test]
    fn test_require() {
        let p = QueryParams::new().with("regions", "nat");
        assert_eq!(p.require("regions").unwrap(), "nat");
        assert_eq!(p.require("epiweeks").unwrap_err().code(), "EPI_MISSING_PARAMETER");
    }

    #[test]
    fn test_version_request_parsing() {
        let p = QueryParams::new()
            .with("issues", "201450-201501")
            .with("lag", "2");
        let req = p.version_request(TimeUnit::Week).unwrap();
        assert_eq!(
            req.issues,
            Some(FilterSpec::Alternatives(vec![Alternative::range(201450, 201501)]))
        );
        assert_eq!(req.lag, Some(2));
        assert!(req.into_spec().is_err());

        let p = QueryParams::new().with("as_of", "2020-04-01");
        assert_eq!(p.version_request(TimeUnit::Day).unwrap().as_of, Some(20200401));
    }

    #[test]
    fn test_inverted_range_is_validation_error() {
        let p = QueryParams::new().with("epiweeks", "201445-201440");
        let spec = p.time_filter("epiweeks", TimeUnit::Week).unwrap();
        let err = crate::filter::FilterCompiler::compile("epiweek", FieldKind::Integer, &spec)
            .unwrap_err();
        assert_eq!(ApiError::from(err).http_status(), 400);
    }

    #[test]
    fn test_fields_and_list() {
        let p = QueryParams::new().with("fields", "value, signal,,");
        assert_eq!(p.fields(), Some(vec!["value".to_string(), "signal".to_string()]));
        assert_eq!(QueryParams::new().fields(), None);
    }
}
