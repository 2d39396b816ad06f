//! Filter specifications as supplied by a request

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::stream::FieldValue;

/// How values of a field may be constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integers, dates (`YYYYMMDD`) and epiweeks (`YYYYWW`); scalars and ranges
    Integer,
    /// Strings with a meaningful lexical order; scalars and ranges
    OrderedString,
    /// Strings matched by equality only
    PlainString,
}

impl FieldKind {
    pub fn allows_ranges(&self) -> bool {
        !matches!(self, FieldKind::PlainString)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::OrderedString | FieldKind::PlainString => "string",
        }
    }
}

/// A single filter value. Also used as a bound query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Str(String),
}

impl Scalar {
    /// Orders two scalars of the same type; mixed types are incomparable.
    pub fn partial_cmp_same(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Str(a), Scalar::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Compares against a cell value; `None` when types do not line up.
    pub fn cmp_value(&self, value: &FieldValue) -> Option<Ordering> {
        match self {
            Scalar::Int(i) => value.as_i64().map(|v| v.cmp(i)),
            Scalar::Str(s) => value.as_str().map(|v| v.cmp(s.as_str())),
        }
    }

    pub fn to_field_value(&self) -> FieldValue {
        match self {
            Scalar::Int(i) => FieldValue::Int(*i),
            Scalar::Str(s) => FieldValue::Str(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(i64::from(v))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

/// One alternative of a filter: a scalar or a closed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alternative {
    Value(Scalar),
    Range(Scalar, Scalar),
}

impl Alternative {
    pub fn value(v: impl Into<Scalar>) -> Self {
        Alternative::Value(v.into())
    }

    pub fn range(lo: impl Into<Scalar>, hi: impl Into<Scalar>) -> Self {
        Alternative::Range(lo.into(), hi.into())
    }
}

/// Request-supplied constraint on one field.
///
/// `Any` (the `*` wildcard) places no constraint. An empty alternative list
/// is distinct from `Any`: it can match nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    Any,
    Alternatives(Vec<Alternative>),
}

impl FilterSpec {
    pub fn values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        FilterSpec::Alternatives(values.into_iter().map(Alternative::value).collect())
    }

    pub fn single(value: impl Into<Scalar>) -> Self {
        FilterSpec::Alternatives(vec![Alternative::value(value)])
    }

    pub fn range(lo: impl Into<Scalar>, hi: impl Into<Scalar>) -> Self {
        FilterSpec::Alternatives(vec![Alternative::range(lo, hi)])
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, FilterSpec::Any)
    }

    /// The single scalar this spec names, if it names exactly one.
    pub fn as_single(&self) -> Option<&Scalar> {
        match self {
            FilterSpec::Alternatives(alts) if alts.len() == 1 => match &alts[0] {
                Alternative::Value(v) => Some(v),
                Alternative::Range(lo, hi) if lo == hi => Some(lo),
                Alternative::Range(_, _) => None,
            },
            _ => None,
        }
    }

    /// Scalar values only (ranges skipped); used for named sub-resources.
    pub fn scalars(&self) -> Vec<&Scalar> {
        match self {
            FilterSpec::Any => Vec::new(),
            FilterSpec::Alternatives(alts) => alts
                .iter()
                .filter_map(|a| match a {
                    Alternative::Value(v) => Some(v),
                    Alternative::Range(_, _) => None,
                })
                .collect(),
        }
    }
}
