//! Revision selection modes

use crate::filter::FilterSpec;

use super::errors::{VersionError, VersionResult};

/// Exactly one revision-selection mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// `issue ∈ spec`; may yield several rows per dimension-key
    Issues(FilterSpec),
    /// `issue - time_value == lag`
    Lag(i64),
    /// Per dimension-key, the greatest issue `<= cutoff`
    AsOf(i64),
    /// Per dimension-key, the greatest issue
    Latest,
}

impl VersionSpec {
    pub fn mode_name(&self) -> &'static str {
        match self {
            VersionSpec::Issues(_) => "issues",
            VersionSpec::Lag(_) => "lag",
            VersionSpec::AsOf(_) => "as_of",
            VersionSpec::Latest => "latest",
        }
    }
}

/// Request-supplied selectors before mode resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRequest {
    pub issues: Option<FilterSpec>,
    pub lag: Option<i64>,
    pub as_of: Option<i64>,
}

impl VersionRequest {
    pub fn latest() -> Self {
        Self::default()
    }

    pub fn issues(spec: FilterSpec) -> Self {
        Self {
            issues: Some(spec),
            ..Self::default()
        }
    }

    pub fn lag(lag: i64) -> Self {
        Self {
            lag: Some(lag),
            ..Self::default()
        }
    }

    pub fn as_of(cutoff: i64) -> Self {
        Self {
            as_of: Some(cutoff),
            ..Self::default()
        }
    }

    /// Resolves to a single mode. Supplying more than one selector is
    /// rejected rather than silently prioritised.
    pub fn into_spec(self) -> VersionResult<VersionSpec> {
        let mut present = Vec::new();
        if self.issues.is_some() {
            present.push("issues");
        }
        if self.lag.is_some() {
            present.push("lag");
        }
        if self.as_of.is_some() {
            present.push("as_of");
        }
        if present.len() > 1 {
            return Err(VersionError::conflict(&present));
        }

        Ok(match (self.issues, self.lag, self.as_of) {
            (Some(issues), _, _) => VersionSpec::Issues(issues),
            (None, Some(lag), _) => VersionSpec::Lag(lag),
            (None, None, Some(cutoff)) => VersionSpec::AsOf(cutoff),
            (None, None, None) => VersionSpec::Latest,
        })
    }
}
