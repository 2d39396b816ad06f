//! Predicate AST and the filter compiler
//!
//! A compiled predicate is a disjunction of conditions over one field.
//! Predicates over different fields are combined by conjunction in a
//! [`PredicateSet`].
//!
//! Rendering never interpolates values: SQL text only ever contains
//! validated identifiers and `?` placeholders, and the values travel in a
//! separate parameter list.

use std::cmp::Ordering;

use crate::stream::{FieldValue, Row};

use super::errors::{FilterError, FilterResult};
use super::spec::{Alternative, FieldKind, FilterSpec, Scalar};

/// One condition inside a disjunction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Eq(Scalar),
    /// Inclusive on both ends, `lo < hi`
    Between(Scalar, Scalar),
}

impl Condition {
    fn matches(&self, value: &FieldValue) -> bool {
        match self {
            Condition::Eq(expected) => expected.cmp_value(value) == Some(Ordering::Equal),
            Condition::Between(lo, hi) => {
                matches!(
                    lo.cmp_value(value),
                    Some(Ordering::Greater) | Some(Ordering::Equal)
                ) && matches!(
                    hi.cmp_value(value),
                    Some(Ordering::Less) | Some(Ordering::Equal)
                )
            }
        }
    }
}

/// Compiled constraint over a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Wildcard: always true
    Any { field: String },
    /// True if any condition holds
    AnyOf {
        field: String,
        conditions: Vec<Condition>,
    },
}

impl Predicate {
    /// Equality on a single value, bypassing request grammar.
    pub fn eq(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Predicate::AnyOf {
            field: field.into(),
            conditions: vec![Condition::Eq(value.into())],
        }
    }

    /// Matches nothing: a disjunction with no conditions.
    pub fn none(field: impl Into<String>) -> Self {
        Predicate::AnyOf {
            field: field.into(),
            conditions: Vec::new(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Predicate::Any { field } | Predicate::AnyOf { field, .. } => field,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Predicate::Any { .. })
    }

    /// Evaluates against a row. Missing and null fields never match a
    /// non-wildcard predicate.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Any { .. } => true,
            Predicate::AnyOf { field, .. } => match row.get(field) {
                Some(value) => self.matches_value(value),
                None => false,
            },
        }
    }

    /// Evaluates against a single cell value.
    pub fn matches_value(&self, value: &FieldValue) -> bool {
        match self {
            Predicate::Any { .. } => true,
            Predicate::AnyOf { conditions, .. } => {
                !value.is_null() && conditions.iter().any(|c| c.matches(value))
            }
        }
    }

    /// Renders the predicate as SQL with `?` placeholders, appending bound
    /// values to `params` in placeholder order.
    pub fn render_sql(&self, qualifier: Option<&str>, params: &mut Vec<Scalar>) -> String {
        match self {
            Predicate::Any { .. } => "TRUE".to_string(),
            Predicate::AnyOf { conditions, .. } if conditions.is_empty() => "FALSE".to_string(),
            Predicate::AnyOf { field, conditions } => {
                let column = quote_column(qualifier, field);
                let parts: Vec<String> = conditions
                    .iter()
                    .map(|c| match c {
                        Condition::Eq(v) => {
                            params.push(v.clone());
                            format!("{} = ?", column)
                        }
                        Condition::Between(lo, hi) => {
                            params.push(lo.clone());
                            params.push(hi.clone());
                            format!("{} BETWEEN ? AND ?", column)
                        }
                    })
                    .collect();
                format!("({})", parts.join(" OR "))
            }
        }
    }
}

/// Conjunction of per-field predicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.push(predicate);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// All predicates must match (AND semantics)
    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Renders the conjunction; an empty set renders as `TRUE`.
    pub fn render_sql(&self, qualifier: Option<&str>, params: &mut Vec<Scalar>) -> String {
        let parts: Vec<String> = self
            .predicates
            .iter()
            .filter(|p| !p.is_wildcard())
            .map(|p| p.render_sql(qualifier, params))
            .collect();
        if parts.is_empty() {
            "TRUE".to_string()
        } else {
            parts.join(" AND ")
        }
    }
}

/// Turns a [`FilterSpec`] into a [`Predicate`].
pub struct FilterCompiler;

impl FilterCompiler {
    /// Compiles `spec` over `field`.
    ///
    /// Fails on an unsafe field identifier, an empty alternative list, an
    /// inverted range, a range on a plain string field, or a scalar whose
    /// type does not fit `kind`. Any failure fails the whole filter.
    pub fn compile(field: &str, kind: FieldKind, spec: &FilterSpec) -> FilterResult<Predicate> {
        if !is_identifier(field) {
            return Err(FilterError::bad_identifier(field));
        }

        let alternatives = match spec {
            FilterSpec::Any => {
                return Ok(Predicate::Any {
                    field: field.to_string(),
                })
            }
            FilterSpec::Alternatives(alts) => alts,
        };

        if alternatives.is_empty() {
            return Err(FilterError::empty(field));
        }

        let mut conditions = Vec::with_capacity(alternatives.len());
        for alt in alternatives {
            let condition = match alt {
                Alternative::Value(v) => {
                    Self::check_type(field, kind, v)?;
                    Condition::Eq(v.clone())
                }
                Alternative::Range(lo, hi) => {
                    if !kind.allows_ranges() {
                        return Err(FilterError::range_not_allowed(field));
                    }
                    Self::check_type(field, kind, lo)?;
                    Self::check_type(field, kind, hi)?;
                    match lo.partial_cmp_same(hi) {
                        Some(Ordering::Less) => Condition::Between(lo.clone(), hi.clone()),
                        Some(Ordering::Equal) => Condition::Eq(lo.clone()),
                        Some(Ordering::Greater) => {
                            return Err(FilterError::inverted_range(field, lo, hi))
                        }
                        None => return Err(FilterError::type_mismatch(field, kind.describe())),
                    }
                }
            };
            conditions.push(condition);
        }

        Ok(Predicate::AnyOf {
            field: field.to_string(),
            conditions,
        })
    }

    fn check_type(field: &str, kind: FieldKind, value: &Scalar) -> FilterResult<()> {
        let ok = match (kind, value) {
            (FieldKind::Integer, Scalar::Int(_)) => true,
            (FieldKind::OrderedString | FieldKind::PlainString, Scalar::Str(_)) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(FilterError::type_mismatch(field, kind.describe()))
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Backtick-quotes a validated column, optionally table-qualified.
pub fn quote_column(qualifier: Option<&str>, field: &str) -> String {
    match qualifier {
        Some(q) => format!("{}.`{}`", q, field),
        None => format!("`{}`", field),
    }
}
