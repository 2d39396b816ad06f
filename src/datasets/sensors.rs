//! Digital surveillance sensor readings
//!
//! Sensors are not revised. Each sensor name is a separately protected
//! sub-resource.

use std::sync::Arc;

use crate::api::{ApiResult, QueryParams};
use crate::auth::AuthRequirement;
use crate::calendar::TimeUnit;
use crate::filter::{FieldKind, PredicateSet};
use crate::stream::{FieldType, SubQuery, TableLayout};

use super::{projection, DatasetDescriptor, PlanChecks};

fn layout() -> TableLayout {
    TableLayout::new("sensors", "epiweek", TimeUnit::Week, "location")
        .dimension("name")
        .field("name", FieldType::Str)
        .field("location", FieldType::Str)
        .field("epiweek", FieldType::Int)
        .field("value", FieldType::Float)
}

pub(super) fn descriptor() -> DatasetDescriptor {
    DatasetDescriptor::new("sensors", layout(), &["names", "locations", "epiweeks"], plan)
        .optional(&["fields"])
        .auth(AuthRequirement::Granular {
            param: "names".to_string(),
        })
        .tree_field("name")
}

fn plan(layout: &Arc<TableLayout>, params: &QueryParams) -> ApiResult<Vec<SubQuery>> {
    let mut checks = PlanChecks::new();
    let names = params.filter("names", FieldKind::PlainString)?;
    let locations = params.filter("locations", FieldKind::PlainString)?;
    let epiweeks = params.time_filter("epiweeks", TimeUnit::Week)?;
    let predicates = PredicateSet::new()
        .with(checks.filter("name", FieldKind::PlainString, &names)?)
        .with(checks.filter(layout.geo_field(), FieldKind::PlainString, &locations)?)
        .with(checks.filter(layout.time_field(), FieldKind::Integer, &epiweeks)?);

    let version = checks.version(layout, params.version_request(TimeUnit::Week)?, None)?;
    let fields = projection(layout, params)?;

    checks.finish(vec![SubQuery::new(layout.clone(), predicates, version, fields)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ResolvedVersion;

    fn params() -> QueryParams {
        QueryParams::new()
            .with("names", "ght,twtr")
            .with("locations", "nat")
            .with("epiweeks", "201501-201510")
    }

    #[test]
    fn test_unversioned() {
        let queries = plan(&descriptor().layout, &params()).unwrap();
        assert_eq!(queries[0].version, ResolvedVersion::Unversioned);
    }

    #[test]
    fn test_version_parameter_unsupported() {
        let err = plan(&descriptor().layout, &params().with("issues", "201505")).unwrap_err();
        assert_eq!(err.code(), "EPI_VERSION_UNSUPPORTED");
    }

    #[test]
    fn test_empty_location_does_not_hide_later_errors() {
        let empty = params().with("locations", "");

        let err = plan(&descriptor().layout, &empty.clone().with("lag", "1")).unwrap_err();
        assert_eq!(err.code(), "EPI_VERSION_UNSUPPORTED");

        let err = plan(&descriptor().layout, &empty.clone().with("epiweeks", "201510-201501"))
            .unwrap_err();
        assert_eq!(err.code(), "EPI_FILTER_INVERTED_RANGE");

        assert!(plan(&descriptor().layout, &empty).unwrap_err().is_empty_match());
    }

    #[test]
    fn test_auth_resources_are_names() {
        let d = descriptor();
        assert_eq!(d.auth_resources(&params()), vec!["ght", "twtr"]);
    }
}
