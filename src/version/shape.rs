//! SQL rendering of a resolved query
//!
//! Produces the parameterised statement a relational store executes for a
//! sub-query. Text only contains validated identifiers and `?`
//! placeholders; every value is in `params`, in placeholder order.

use crate::filter::{is_identifier, quote_column, FilterError, PredicateSet, Scalar};
use crate::stream::{FieldDef, TableLayout};

use super::errors::{VersionError, VersionResult};
use super::resolver::{LatestStrategy, ResolvedVersion};

/// A statement plus its bound parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    pub text: String,
    pub params: Vec<Scalar>,
}

/// Renders the statement for one sub-query, fetching at most `limit` rows.
pub fn render_sql(
    layout: &TableLayout,
    predicates: &PredicateSet,
    version: &ResolvedVersion,
    projection: &[FieldDef],
    limit: usize,
) -> VersionResult<SqlQuery> {
    check_identifier(layout.name())?;
    for name in layout.dimension_keys() {
        check_identifier(name)?;
    }
    for def in projection {
        check_identifier(&def.name)?;
    }

    let table = format!("`{}`", layout.name());
    let columns = if projection.is_empty() {
        "x.*".to_string()
    } else {
        projection
            .iter()
            .map(|f| quote_column(Some("x"), &f.name))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut params = Vec::new();
    let mut text = format!("SELECT {} FROM {} x", columns, table);

    match version {
        ResolvedVersion::Unversioned => {
            text.push_str(&format!(" WHERE {}", predicates.render_sql(Some("x"), &mut params)));
        }
        ResolvedVersion::Explicit(issue) => {
            text.push_str(&format!(
                " WHERE {} AND {}",
                predicates.render_sql(Some("x"), &mut params),
                issue.render_sql(Some("x"), &mut params)
            ));
        }
        ResolvedVersion::Lag(lag) => {
            let lag_field = layout
                .lag_field()
                .ok_or_else(|| VersionError::unsupported(layout.name(), "lag"))?;
            check_identifier(lag_field)?;
            text.push_str(&format!(
                " WHERE {} AND {} = ?",
                predicates.render_sql(Some("x"), &mut params),
                quote_column(Some("x"), lag_field)
            ));
            params.push(Scalar::Int(*lag));
        }
        ResolvedVersion::Latest(LatestStrategy::CurrentFlag) => {
            let flag = layout
                .current_flag_field()
                .ok_or_else(|| VersionError::unsupported(layout.name(), "current-flag"))?;
            check_identifier(flag)?;
            text.push_str(&format!(
                " WHERE {} AND {} = ?",
                predicates.render_sql(Some("x"), &mut params),
                quote_column(Some("x"), flag)
            ));
            params.push(Scalar::Int(1));
        }
        ResolvedVersion::AsOf(_) | ResolvedVersion::Latest(LatestStrategy::GroupMax) => {
            let issue = layout
                .issue_field()
                .ok_or_else(|| VersionError::unsupported(layout.name(), "as_of"))?;
            check_identifier(issue)?;
            let mut inner = predicates.render_sql(None, &mut params);
            if let ResolvedVersion::AsOf(cutoff) = version {
                inner.push_str(&format!(" AND `{}` <= ?", issue));
                params.push(Scalar::Int(*cutoff));
            }
            text = ranked_select(&columns, &table, layout, issue, &inner)?;
            params.push(Scalar::Int(1));
        }
        ResolvedVersion::DiffChain(cutoff) => {
            // The non-superseded record with the greatest (release, parse
            // order) is the eligible record with the greatest parse order.
            let chain = layout
                .chain_columns()
                .ok_or_else(|| VersionError::unsupported(layout.name(), "diff-chain"))?;
            check_identifier(&chain.release_field)?;
            check_identifier(&chain.parse_order_field)?;
            let mut inner = predicates.render_sql(None, &mut params);
            if let Some(retracted) = &chain.retracted_field {
                check_identifier(retracted)?;
                inner.push_str(&format!(" AND `{}` = ?", retracted));
                params.push(Scalar::Int(0));
            }
            if let Some(cutoff) = cutoff {
                inner.push_str(&format!(" AND `{}` <= ?", chain.release_field));
                params.push(Scalar::Int(*cutoff));
            }
            text = ranked_select(&columns, &table, layout, &chain.parse_order_field, &inner)?;
            params.push(Scalar::Int(1));
        }
    }

    let mut order = vec![
        quote_column(Some("x"), layout.time_field()),
        quote_column(Some("x"), layout.geo_field()),
    ];
    if version.is_multi_row() {
        if let Some(issue) = layout.issue_field() {
            check_identifier(issue)?;
            order.push(quote_column(Some("x"), issue));
        }
    }
    text.push_str(&format!(" ORDER BY {} ASC LIMIT ?", order.join(" ASC, ")));
    params.push(Scalar::Int(i64::try_from(limit).unwrap_or(i64::MAX)));

    Ok(SqlQuery { text, params })
}

/// Keeps one row per dimension-key: the greatest `column`, and among rows
/// sharing it the lowest row id.
///
/// `SELECT cols FROM (SELECT t.*, ROW_NUMBER() OVER (PARTITION BY dims
/// ORDER BY col DESC, id ASC) AS version_rank FROM table t WHERE ...) x
/// WHERE x.version_rank = ?`
fn ranked_select(
    columns: &str,
    table: &str,
    layout: &TableLayout,
    column: &str,
    inner_where: &str,
) -> VersionResult<String> {
    let row_id = layout.row_id_field();
    check_identifier(row_id)?;
    let dims: Vec<String> = layout
        .dimension_keys()
        .iter()
        .map(|d| format!("`{}`", d))
        .collect();
    Ok(format!(
        "SELECT {columns} FROM (SELECT t.*, ROW_NUMBER() OVER (PARTITION BY {dims} \
         ORDER BY `{col}` DESC, `{row_id}` ASC) AS `version_rank` FROM {table} t WHERE {inner}) x \
         WHERE x.`version_rank` = ?",
        columns = columns,
        dims = dims.join(", "),
        col = column,
        row_id = row_id,
        table = table,
        inner = inner_where,
    ))
}

fn check_identifier(name: &str) -> VersionResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(FilterError::bad_identifier(name).into())
    }
}
