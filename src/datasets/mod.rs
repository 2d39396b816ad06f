//! # Dataset dispatch table
//!
//! Each source name maps to a descriptor: which parameters it needs, what
//! auth it demands, and a planner that turns request parameters into the
//! ordered sub-queries of one response.
//!
//! The registry is built once at startup and shared read-only.

mod covidcast;
mod fluview;
mod norostat;
mod sensors;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::api::{ApiError, ApiResult, QueryParams};
use crate::auth::AuthRequirement;
use crate::filter::{FieldKind, FilterCompiler, FilterSpec, Predicate};
use crate::stream::{FieldDef, SubQuery, TableLayout};
use crate::version::{LatestStrategy, ResolvedVersion, VersionRequest, VersionResolver};

pub use fluview::RegionClass;

/// Builds the sub-queries for one request against `layout`.
pub type PlanFn = fn(&Arc<TableLayout>, &QueryParams) -> ApiResult<Vec<SubQuery>>;

/// One servable source
#[derive(Clone)]
pub struct DatasetDescriptor {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub auth: AuthRequirement,
    /// Group field of the tree format
    pub tree_field: Option<&'static str>,
    pub layout: Arc<TableLayout>,
    plan: PlanFn,
}

impl DatasetDescriptor {
    pub fn new(
        name: &'static str,
        layout: TableLayout,
        required: &'static [&'static str],
        plan: PlanFn,
    ) -> Self {
        Self {
            name,
            required,
            optional: &[],
            auth: AuthRequirement::None,
            tree_field: None,
            layout: Arc::new(layout),
            plan,
        }
    }

    pub fn optional(mut self, optional: &'static [&'static str]) -> Self {
        self.optional = optional;
        self
    }

    pub fn auth(mut self, auth: AuthRequirement) -> Self {
        self.auth = auth;
        self
    }

    pub fn tree_field(mut self, field: &'static str) -> Self {
        self.tree_field = Some(field);
        self
    }

    /// Fails on the first absent required parameter, in declaration order.
    pub fn check_required(&self, params: &QueryParams) -> ApiResult<()> {
        for name in self.required {
            params.require(name)?;
        }
        Ok(())
    }

    /// Sub-resources the auth requirement is checked against.
    pub fn auth_resources(&self, params: &QueryParams) -> Vec<String> {
        match &self.auth {
            AuthRequirement::Granular { param } => params.list(param),
            _ => Vec::new(),
        }
    }

    pub fn plan(&self, params: &QueryParams) -> ApiResult<Vec<SubQuery>> {
        (self.plan)(&self.layout, params)
    }
}

impl fmt::Debug for DatasetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetDescriptor")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("auth", &self.auth)
            .field("tree_field", &self.tree_field)
            .field("table", &self.layout.name())
            .finish()
    }
}

/// Source name to descriptor
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    datasets: BTreeMap<&'static str, DatasetDescriptor>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shipped sources.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(fluview::descriptor());
        registry.register(covidcast::descriptor());
        registry.register(norostat::descriptor());
        registry.register(sensors::descriptor());
        registry
    }

    /// Adds a source; returns false if the name is already taken.
    pub fn register(&mut self, descriptor: DatasetDescriptor) -> bool {
        if self.datasets.contains_key(descriptor.name) {
            return false;
        }
        self.datasets.insert(descriptor.name, descriptor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&DatasetDescriptor> {
        self.datasets.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.datasets.keys().copied().collect()
    }

    /// Table layouts backing the sources, one per table.
    pub fn layouts(&self) -> Vec<Arc<TableLayout>> {
        let mut layouts: Vec<Arc<TableLayout>> = Vec::new();
        for d in self.datasets.values() {
            if !layouts.iter().any(|l| l.name() == d.layout.name()) {
                layouts.push(d.layout.clone());
            }
        }
        layouts
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// `issues`/`lag`/`as_of` resolved against `layout`. `strategy` overrides
/// the layout's preferred LATEST computation.
fn resolve_version(
    layout: &TableLayout,
    request: VersionRequest,
    strategy: Option<LatestStrategy>,
) -> ApiResult<ResolvedVersion> {
    let spec = request.into_spec()?;
    let resolved = match strategy {
        Some(s) => VersionResolver::resolve_with(layout, &spec, s)?,
        None => VersionResolver::resolve(layout, &spec)?,
    };
    Ok(resolved)
}

/// Validation state of one plan.
///
/// An empty filter list means the response has no rows, but the request
/// may still be malformed elsewhere. The empty match is held back, a
/// match-nothing stand-in takes its place, and [`PlanChecks::finish`]
/// reports it only once every parameter has been validated.
#[derive(Debug, Default)]
pub(crate) struct PlanChecks {
    empty: Option<ApiError>,
}

impl PlanChecks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn hold(&mut self, err: ApiError) {
        if self.empty.is_none() {
            self.empty = Some(err);
        }
    }

    pub(crate) fn filter(
        &mut self,
        field: &str,
        kind: FieldKind,
        spec: &FilterSpec,
    ) -> ApiResult<Predicate> {
        match FilterCompiler::compile(field, kind, spec) {
            Ok(predicate) => Ok(predicate),
            Err(err) if err.is_empty_match() => {
                self.hold(err.into());
                Ok(Predicate::none(field))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Version selection; an empty `issues` list selects no revision.
    pub(crate) fn version(
        &mut self,
        layout: &TableLayout,
        request: VersionRequest,
        strategy: Option<LatestStrategy>,
    ) -> ApiResult<ResolvedVersion> {
        match resolve_version(layout, request, strategy) {
            Err(err) if err.is_empty_match() => {
                self.hold(err);
                let field = layout.issue_field().unwrap_or(layout.time_field());
                Ok(ResolvedVersion::Explicit(Predicate::none(field)))
            }
            other => other,
        }
    }

    /// The planned queries, or the held-back empty match.
    pub(crate) fn finish(self, queries: Vec<SubQuery>) -> ApiResult<Vec<SubQuery>> {
        match self.empty {
            Some(err) => Err(err),
            None => Ok(queries),
        }
    }
}

/// Requested `fields` intersected with the layout. An intersection with
/// nothing left is rejected rather than answered with empty rows.
pub(crate) fn projection(layout: &TableLayout, params: &QueryParams) -> ApiResult<Vec<FieldDef>> {
    let requested = params.fields();
    let fields = layout.project(requested.as_deref());
    if fields.is_empty() {
        return Err(ApiError::invalid_request(
            "none of the requested fields exist",
        ));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry() {
        let registry = DatasetRegistry::standard();
        assert_eq!(
            registry.names(),
            vec!["covidcast", "fluview", "norostat", "sensors"]
        );
        assert_eq!(registry.layouts().len(), 4);
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = DatasetRegistry::standard();
        assert!(!registry.register(sensors::descriptor()));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_required_params_in_order() {
        let registry = DatasetRegistry::standard();
        let fluview = registry.get("fluview").unwrap();
        let err = fluview
            .check_required(&QueryParams::new().with("regions", "nat"))
            .unwrap_err();
        assert_eq!(err.message(), "missing parameter: epiweeks");
    }

    #[test]
    fn test_empty_projection_rejected() {
        let registry = DatasetRegistry::standard();
        let layout = &registry.get("sensors").unwrap().layout;
        let err = projection(layout, &QueryParams::new().with("fields", "bogus")).unwrap_err();
        assert_eq!(err.http_status(), 400);

        let some = projection(layout, &QueryParams::new().with("fields", "value,bogus")).unwrap();
        assert_eq!(some.len(), 1);
    }
}
