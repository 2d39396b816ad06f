//! Version Resolution Tests
//!
//! Revision selection through the store and the request handler:
//! - LATEST returns the greatest issue per dimension-key
//! - AS_OF ignores issues after the cutoff, and drops keys with none before
//! - LAG is computed on the table's calendar
//! - Both LATEST strategies agree under out-of-order inserts
//! - Correction chains resolve to the latest non-superseded record

use std::sync::Arc;

use epiquery::api::{ApiHandler, QueryParams, ServiceState};
use epiquery::auth::{TokenConfig, TokenRegistry};
use epiquery::calendar::TimeUnit;
use epiquery::datasets::DatasetRegistry;
use epiquery::filter::{Predicate, PredicateSet};
use epiquery::stream::{FieldType, MemoryStore, Row, SubQuery, TableLayout, TableStore};
use epiquery::version::{LatestStrategy, ResolvedVersion};
use serde_json::Value;

// =============================================================================
// Helper Functions
// =============================================================================

fn obs_layout() -> Arc<TableLayout> {
    Arc::new(
        TableLayout::new("obs", "epiweek", TimeUnit::Week, "region")
            .issue("issue")
            .current_flag("is_latest_issue")
            .field("epiweek", FieldType::Int)
            .field("region", FieldType::Str)
            .field("issue", FieldType::Int)
            .field("value", FieldType::Float),
    )
}

fn obs_row(epiweek: i64, region: &str, issue: i64, value: f64) -> Row {
    Row::new()
        .with("epiweek", epiweek)
        .with("region", region)
        .with("issue", issue)
        .with("value", value)
}

fn store_with(rows: Vec<Row>) -> MemoryStore {
    let store = MemoryStore::new();
    store.create_table(obs_layout()).unwrap();
    store.insert_all("obs", rows).unwrap();
    store
}

fn run(store: &MemoryStore, version: ResolvedVersion) -> Vec<Row> {
    let layout = obs_layout();
    let query = SubQuery::new(
        layout.clone(),
        PredicateSet::new(),
        version,
        layout.fields().to_vec(),
    );
    store
        .execute(&query, 100)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn issues(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .map(|r| r.get("issue").and_then(|v| v.as_i64()).unwrap())
        .collect()
}

fn fluview_handler(rows: Vec<Row>) -> ApiHandler {
    let datasets = DatasetRegistry::standard();
    let store = MemoryStore::new();
    for layout in datasets.layouts() {
        store.create_table(layout).unwrap();
    }
    store.insert_all("fluview", rows).unwrap();
    ApiHandler::new(ServiceState::new(
        Arc::new(store),
        Arc::new(datasets),
        Arc::new(TokenRegistry::default()),
    ))
}

fn body(handler: &ApiHandler, source: &str, params: &QueryParams) -> Value {
    let response = handler.handle(source, params);
    serde_json::from_slice(&response.body).unwrap()
}

// =============================================================================
// LATEST / AS_OF
// =============================================================================

/// Issues {10, 11, 12}: LATEST picks 12 under both strategies.
#[test]
fn test_latest_picks_greatest_issue() {
    let store = store_with(vec![
        obs_row(201440, "nat", 10, 1.0),
        obs_row(201440, "nat", 11, 1.1),
        obs_row(201440, "nat", 12, 1.2),
    ]);

    for strategy in [LatestStrategy::GroupMax, LatestStrategy::CurrentFlag] {
        let rows = run(&store, ResolvedVersion::Latest(strategy));
        assert_eq!(issues(&rows), vec![12], "strategy {:?}", strategy);
    }
}

/// AS_OF(11) picks 11; AS_OF(9) leaves the key out entirely.
#[test]
fn test_as_of_cutoff() {
    let store = store_with(vec![
        obs_row(201440, "nat", 10, 1.0),
        obs_row(201440, "nat", 11, 1.1),
        obs_row(201440, "nat", 12, 1.2),
    ]);

    assert_eq!(issues(&run(&store, ResolvedVersion::AsOf(11))), vec![11]);
    assert!(run(&store, ResolvedVersion::AsOf(9)).is_empty());
}

/// Inserting an older issue after a newer one must not move the flag.
#[test]
fn test_strategies_agree_after_out_of_order_inserts() {
    let store = store_with(vec![
        obs_row(201440, "nat", 12, 1.2),
        obs_row(201440, "nat", 10, 1.0),
        obs_row(201441, "nat", 11, 2.1),
        obs_row(201440, "hhs1", 11, 3.1),
        obs_row(201441, "nat", 13, 2.3),
    ]);

    let group_max = run(&store, ResolvedVersion::Latest(LatestStrategy::GroupMax));
    let flagged = run(&store, ResolvedVersion::Latest(LatestStrategy::CurrentFlag));
    assert_eq!(group_max, flagged);
    assert_eq!(issues(&group_max), vec![11, 12, 13]);
}

// =============================================================================
// LAG / EXPLICIT
// =============================================================================

/// Lag 3 from 201440 is issue 201443; lag 4 from 201450 crosses the
/// 53-week year 2014 and lands on 201501, not 201454.
#[test]
fn test_lag_on_epiweek_calendar() {
    let store = store_with(vec![
        obs_row(201440, "nat", 201441, 1.0),
        obs_row(201440, "nat", 201443, 1.1),
        obs_row(201440, "nat", 201444, 1.2),
        obs_row(201450, "nat", 201501, 2.0),
        obs_row(201450, "nat", 201502, 2.1),
    ]);

    let rows = run(&store, ResolvedVersion::Lag(3));
    assert_eq!(issues(&rows), vec![201443]);

    let rows = run(&store, ResolvedVersion::Lag(4));
    assert_eq!(issues(&rows), vec![201444, 201501]);
}

/// Explicit issues may return several rows per key, ordered by issue.
#[test]
fn test_explicit_issues_multi_row() {
    let store = store_with(vec![
        obs_row(201440, "nat", 12, 1.2),
        obs_row(201440, "nat", 10, 1.0),
        obs_row(201440, "nat", 11, 1.1),
    ]);
    let predicate = Predicate::AnyOf {
        field: "issue".to_string(),
        conditions: vec![
            epiquery::filter::Condition::Eq(12.into()),
            epiquery::filter::Condition::Eq(10.into()),
        ],
    };
    let rows = run(&store, ResolvedVersion::Explicit(predicate));
    assert_eq!(issues(&rows), vec![10, 12]);
}

// =============================================================================
// End-to-end through the handler
// =============================================================================

/// Epiweeks 201440..201445 at "nat", each with issues 201450 and 201501:
/// LATEST returns six rows carrying the 201501 values in epiweek order.
#[test]
fn test_latest_end_to_end() {
    let mut rows = Vec::new();
    // newer issues first, to exercise ordering
    for issue in [201501, 201450] {
        for epiweek in (201440..=201445).rev() {
            let wili = if issue == 201501 { 2.0 } else { 1.0 };
            rows.push(
                Row::new()
                    .with("epiweek", epiweek)
                    .with("region", "nat")
                    .with("issue", issue)
                    .with("wili", wili),
            );
        }
    }
    let handler = fluview_handler(rows);

    let params = QueryParams::new()
        .with("epiweeks", "201440-201445")
        .with("regions", "nat");
    let body = body(&handler, "fluview", &params);
    assert_eq!(body["result"], 1);
    assert_eq!(body["message"], "success");

    let epidata = body["epidata"].as_array().unwrap();
    assert_eq!(epidata.len(), 6);
    for (i, row) in epidata.iter().enumerate() {
        assert_eq!(row["epiweek"], 201440 + i as i64);
        assert_eq!(row["issue"], 201501);
        assert_eq!(row["wili"], 2.0);
    }
}

/// The same data at as_of=201460 is invalid (no such epiweek), and at
/// as_of=201452 sees only the older issue.
#[test]
fn test_as_of_end_to_end() {
    let rows = vec![
        Row::new()
            .with("epiweek", 201440)
            .with("region", "nat")
            .with("issue", 201450)
            .with("wili", 1.0),
        Row::new()
            .with("epiweek", 201440)
            .with("region", "nat")
            .with("issue", 201501)
            .with("wili", 2.0),
    ];
    let handler = fluview_handler(rows);
    let params = QueryParams::new()
        .with("epiweeks", "201440")
        .with("regions", "nat");

    let body_ok = body(&handler, "fluview", &params.clone().with("as_of", "201452"));
    assert_eq!(body_ok["epidata"][0]["issue"], 201450);

    let rejected = handler.handle("fluview", &params.with("as_of", "201460"));
    assert_eq!(rejected.status, 400);
}

// =============================================================================
// Correction chains
// =============================================================================

/// A later parse of an earlier release restates it; retracted records
/// never win; the release_date cutoff hides later releases.
#[test]
fn test_norostat_chain() {
    let datasets = DatasetRegistry::standard();
    let store = MemoryStore::new();
    for layout in datasets.layouts() {
        store.create_table(layout).unwrap();
    }
    let point = |release: i64, parse_order: i64, retracted: i64, value: i64| {
        Row::new()
            .with("release_date", release)
            .with("parse_order", parse_order)
            .with("retracted", retracted)
            .with("epiweek", 201445)
            .with("location", "Minnesota")
            .with("value", value)
    };
    store
        .insert_all(
            "norostat_point",
            vec![
                point(20141201, 1, 0, 5),
                point(20141208, 2, 0, 7),
                point(20141201, 3, 0, 6),
                point(20141215, 4, 1, 99),
            ],
        )
        .unwrap();

    let tokens = TokenRegistry::from_config(&TokenConfig {
        global: vec!["admin".to_string()],
        ..TokenConfig::default()
    });
    let handler = ApiHandler::new(ServiceState::new(
        Arc::new(store),
        Arc::new(datasets),
        Arc::new(tokens),
    ));

    let params = QueryParams::new()
        .with("location", "Minnesota")
        .with("epiweeks", "201445")
        .with("auth", "admin");

    // parse 3 restates release 20141201 and supersedes parse 2
    let latest = body(&handler, "norostat", &params);
    assert_eq!(latest["epidata"][0]["value"], 6);
    assert_eq!(latest["epidata"][0]["release_date"], 20141201);

    let early = body(&handler, "norostat", &params.clone().with("release_date", "2014-12-05"));
    assert_eq!(early["epidata"][0]["value"], 6);

    let none = body(&handler, "norostat", &params.with("release_date", "20141130"));
    assert_eq!(none["result"], -2);
}
