//! ILINet surveillance by epiweek and region
//!
//! Regions fall into four classes that are queried separately and always
//! emitted in the same order: national, HHS regions, census divisions,
//! then states and cities.

use std::sync::Arc;

use crate::api::{ApiError, ApiResult, QueryParams};
use crate::calendar::TimeUnit;
use crate::filter::{FieldKind, FilterCompiler, FilterSpec, PredicateSet, Scalar};
use crate::stream::{FieldType, SubQuery, TableLayout};
use crate::version::LatestStrategy;

use super::{projection, DatasetDescriptor, PlanChecks};

const STATES: &[&str] = &[
    "ak", "al", "ar", "az", "ca", "co", "ct", "dc", "de", "fl", "ga", "hi", "ia", "id", "il",
    "in", "jfk", "ks", "ky", "la", "ma", "md", "me", "mi", "mn", "mo", "ms", "mt", "nc", "nd",
    "ne", "nh", "nj", "nm", "nv", "ny", "ny_minus_jfk", "oh", "ok", "or", "pa", "pr", "ri", "sc",
    "sd", "tn", "tx", "ut", "va", "vi", "vt", "wa", "wi", "wv", "wy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionClass {
    National,
    Hhs,
    Census,
    State,
}

impl RegionClass {
    /// Emission order.
    pub const ALL: [RegionClass; 4] = [
        RegionClass::National,
        RegionClass::Hhs,
        RegionClass::Census,
        RegionClass::State,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RegionClass::National => "nat",
            RegionClass::Hhs => "hhs",
            RegionClass::Census => "cen",
            RegionClass::State => "state",
        }
    }

    pub fn of(region: &str) -> Option<Self> {
        if region == "nat" {
            return Some(RegionClass::National);
        }
        if numbered(region, "hhs", 10) {
            return Some(RegionClass::Hhs);
        }
        if numbered(region, "cen", 9) {
            return Some(RegionClass::Census);
        }
        STATES.contains(&region).then_some(RegionClass::State)
    }

    pub fn members(&self) -> Vec<String> {
        match self {
            RegionClass::National => vec!["nat".to_string()],
            RegionClass::Hhs => (1..=10).map(|i| format!("hhs{}", i)).collect(),
            RegionClass::Census => (1..=9).map(|i| format!("cen{}", i)).collect(),
            RegionClass::State => STATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn numbered(region: &str, prefix: &str, max: u32) -> bool {
    region
        .strip_prefix(prefix)
        .filter(|n| !n.starts_with('0'))
        .and_then(|n| n.parse::<u32>().ok())
        .is_some_and(|n| (1..=max).contains(&n))
}

fn layout() -> TableLayout {
    TableLayout::new("fluview", "epiweek", TimeUnit::Week, "region")
        .issue("issue")
        .lag_column("lag")
        .field("release_date", FieldType::Str)
        .field("region", FieldType::Str)
        .field("issue", FieldType::Int)
        .field("epiweek", FieldType::Int)
        .field("lag", FieldType::Int)
        .field("num_ili", FieldType::Int)
        .field("num_patients", FieldType::Int)
        .field("num_providers", FieldType::Int)
        .field("wili", FieldType::Float)
        .field("ili", FieldType::Float)
}

pub(super) fn descriptor() -> DatasetDescriptor {
    DatasetDescriptor::new("fluview", layout(), &["epiweeks", "regions"], plan)
        .optional(&["issues", "lag", "as_of", "fields"])
        .tree_field("region")
}

fn plan(layout: &Arc<TableLayout>, params: &QueryParams) -> ApiResult<Vec<SubQuery>> {
    let mut checks = PlanChecks::new();
    let epiweeks = params.time_filter("epiweeks", TimeUnit::Week)?;
    let epiweek_pred = checks.filter(layout.time_field(), FieldKind::Integer, &epiweeks)?;

    let regions = params.filter("regions", FieldKind::PlainString)?;
    // validates the list as a whole: an empty one is an empty match
    checks.filter(layout.geo_field(), FieldKind::PlainString, &regions)?;

    let version = checks.version(
        layout,
        params.version_request(TimeUnit::Week)?,
        Some(LatestStrategy::GroupMax),
    )?;
    let fields = projection(layout, params)?;

    let mut by_class: Vec<(RegionClass, Vec<String>)> =
        RegionClass::ALL.iter().map(|c| (*c, Vec::new())).collect();
    match &regions {
        FilterSpec::Any => {
            for (class, names) in by_class.iter_mut() {
                *names = class.members();
            }
        }
        FilterSpec::Alternatives(_) => {
            for value in regions.scalars() {
                let name = match value {
                    Scalar::Str(s) => s.to_lowercase(),
                    Scalar::Int(i) => i.to_string(),
                };
                let class = RegionClass::of(&name)
                    .ok_or_else(|| ApiError::invalid_request(format!("unknown region: {}", name)))?;
                if let Some((_, names)) = by_class.iter_mut().find(|(c, _)| *c == class) {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
    }

    let mut queries = Vec::new();
    for (class, names) in by_class.into_iter().filter(|(_, n)| !n.is_empty()) {
        let region_pred = FilterCompiler::compile(
            layout.geo_field(),
            FieldKind::PlainString,
            &FilterSpec::values(names),
        )?;
        let predicates = PredicateSet::new()
            .with(epiweek_pred.clone())
            .with(region_pred);
        queries.push(
            SubQuery::new(layout.clone(), predicates, version.clone(), fields.clone())
                .with_label(class.label()),
        );
    }
    checks.finish(queries)
}
