//! Norovirus outbreak counts, published as a chain of corrections
//!
//! Restricted: every request needs a global token.

use std::sync::Arc;

use crate::api::{ApiResult, QueryParams};
use crate::auth::AuthRequirement;
use crate::calendar::TimeUnit;
use crate::filter::{FieldKind, PredicateSet};
use crate::stream::{ChainColumns, FieldType, SubQuery, TableLayout};
use crate::version::VersionRequest;

use super::{projection, DatasetDescriptor, PlanChecks};

fn layout() -> TableLayout {
    TableLayout::new("norostat_point", "epiweek", TimeUnit::Week, "location")
        .chain(ChainColumns {
            release_field: "release_date".to_string(),
            parse_order_field: "parse_order".to_string(),
            retracted_field: Some("retracted".to_string()),
        })
        .field("release_date", FieldType::Int)
        .field("epiweek", FieldType::Int)
        .field("location", FieldType::Str)
        .field("value", FieldType::Int)
}

pub(super) fn descriptor() -> DatasetDescriptor {
    DatasetDescriptor::new("norostat", layout(), &["location", "epiweeks"], plan)
        .optional(&["release_date", "fields"])
        .auth(AuthRequirement::Global)
        .tree_field("location")
}

fn plan(layout: &Arc<TableLayout>, params: &QueryParams) -> ApiResult<Vec<SubQuery>> {
    let mut checks = PlanChecks::new();
    let locations = params.filter("location", FieldKind::PlainString)?;
    let epiweeks = params.time_filter("epiweeks", TimeUnit::Week)?;
    let predicates = PredicateSet::new()
        .with(checks.filter(layout.geo_field(), FieldKind::PlainString, &locations)?)
        .with(checks.filter(layout.time_field(), FieldKind::Integer, &epiweeks)?);

    // release dates are days even though the table is weekly
    let request = match params.time_value("release_date", TimeUnit::Day)? {
        Some(cutoff) => VersionRequest::as_of(cutoff),
        None => VersionRequest::latest(),
    };
    let version = checks.version(layout, request, None)?;
    let fields = projection(layout, params)?;

    checks.finish(vec![SubQuery::new(layout.clone(), predicates, version, fields)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ResolvedVersion;

    #[test]
    fn test_release_date_is_chain_cutoff() {
        let layout = descriptor().layout;
        let params = QueryParams::new()
            .with("location", "Minnesota, Ohio")
            .with("epiweeks", "201440-201450");
        let queries = plan(&layout, &params).unwrap();
        assert_eq!(queries[0].version, ResolvedVersion::DiffChain(None));

        let params = params.with("release_date", "2014-12-01");
        let queries = plan(&layout, &params).unwrap();
        assert_eq!(queries[0].version, ResolvedVersion::DiffChain(Some(20141201)));
    }

    #[test]
    fn test_empty_location_does_not_hide_later_errors() {
        let layout = descriptor().layout;
        let empty = QueryParams::new().with("location", "").with("epiweeks", "201440");

        let err = plan(&layout, &empty.clone().with("epiweeks", "201450-201440")).unwrap_err();
        assert_eq!(err.code(), "EPI_FILTER_INVERTED_RANGE");

        let err = plan(&layout, &empty.clone().with("release_date", "2014-13-01")).unwrap_err();
        assert_eq!(err.code(), "EPI_FILTER_MALFORMED");

        assert!(plan(&layout, &empty).unwrap_err().is_empty_match());
    }

    #[test]
    fn test_requires_global_token() {
        assert_eq!(descriptor().auth, AuthRequirement::Global);
    }
}
