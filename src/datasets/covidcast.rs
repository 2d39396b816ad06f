//! COVID indicators by source, signal and geography
//!
//! Rows carry their own time type; the request names one, and time values,
//! issues and lags are read on that calendar.

use std::sync::Arc;

use crate::api::{ApiError, ApiResult, QueryParams};
use crate::calendar::TimeUnit;
use crate::filter::{FieldKind, Predicate, PredicateSet};
use crate::stream::{FieldType, SubQuery, TableLayout};

use super::{projection, DatasetDescriptor, PlanChecks};

fn layout() -> TableLayout {
    TableLayout::new("covidcast", "time_value", TimeUnit::Day, "geo_value")
        .dimension("source")
        .dimension("signal")
        .dimension("time_type")
        .dimension("geo_type")
        .issue("issue")
        .lag_column("lag")
        .current_flag("is_latest_issue")
        .field("source", FieldType::Str)
        .field("signal", FieldType::Str)
        .field("time_type", FieldType::Str)
        .field("geo_type", FieldType::Str)
        .field("time_value", FieldType::Int)
        .field("geo_value", FieldType::Str)
        .field("value", FieldType::Float)
        .field("stderr", FieldType::Float)
        .field("sample_size", FieldType::Float)
        .field("direction", FieldType::Int)
        .field("issue", FieldType::Int)
        .field("lag", FieldType::Int)
}

pub(super) fn descriptor() -> DatasetDescriptor {
    DatasetDescriptor::new(
        "covidcast",
        layout(),
        &[
            "data_source",
            "signals",
            "time_type",
            "geo_type",
            "time_values",
            "geo_value",
        ],
        plan,
    )
    .optional(&["issues", "lag", "as_of", "fields"])
    .tree_field("signal")
}

fn plan(layout: &Arc<TableLayout>, params: &QueryParams) -> ApiResult<Vec<SubQuery>> {
    let time_type = params.require("time_type")?;
    let unit = TimeUnit::parse(time_type)
        .ok_or_else(|| ApiError::invalid_request(format!("unknown time_type: {}", time_type)))?;
    let layout = if unit == layout.time_unit() {
        layout.clone()
    } else {
        Arc::new(layout.with_time_unit(unit))
    };

    let mut checks = PlanChecks::new();
    let sources = params.filter("data_source", FieldKind::PlainString)?;
    let signals = params.filter("signals", FieldKind::PlainString)?;
    let geo_types = params.filter("geo_type", FieldKind::PlainString)?;
    let time_values = params.time_filter("time_values", unit)?;
    let geo_values = params.filter("geo_value", FieldKind::PlainString)?;

    let predicates = PredicateSet::new()
        .with(checks.filter("source", FieldKind::PlainString, &sources)?)
        .with(checks.filter("signal", FieldKind::PlainString, &signals)?)
        .with(Predicate::eq("time_type", unit.as_str()))
        .with(checks.filter("geo_type", FieldKind::PlainString, &geo_types)?)
        .with(checks.filter(layout.time_field(), FieldKind::Integer, &time_values)?)
        .with(checks.filter(layout.geo_field(), FieldKind::PlainString, &geo_values)?);

    let version = checks.version(&layout, params.version_request(unit)?, None)?;
    let fields = projection(&layout, params)?;

    checks.finish(vec![SubQuery::new(layout, predicates, version, fields)])
}
