//! Table layout: identity columns and the canonical typed field list
//!
//! The storage collaborator is "a table with columns {dimension keys,
//! issue, value fields}". The layout names those columns and declares the
//! type of every field that may ever be emitted.

use serde::{Deserialize, Serialize};

use crate::calendar::TimeUnit;
use crate::filter::Scalar;

use super::errors::{StreamError, StreamResult};
use super::row::{FieldValue, Row};

/// Declared type of an emitted field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int,
    Float,
    Str,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Int => "integer",
            FieldType::Float => "float",
            FieldType::Str => "string",
        }
    }
}

/// A field in the canonical list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Columns of a correction chain (release-dated, parse-ordered records)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainColumns {
    pub release_field: String,
    pub parse_order_field: String,
    pub retracted_field: Option<String>,
}

/// Value identifying one dimension-key combination
pub type DimensionKey = Vec<Option<Scalar>>;

/// Describes a revisioned observation table
#[derive(Debug, Clone)]
pub struct TableLayout {
    name: String,
    dimension_keys: Vec<String>,
    time_field: String,
    time_unit: TimeUnit,
    geo_field: String,
    issue_field: Option<String>,
    lag_field: Option<String>,
    current_flag: Option<String>,
    chain: Option<ChainColumns>,
    /// Insertion-ordered row id; breaks ties between duplicate revisions
    row_id: String,
    fields: Vec<FieldDef>,
}

impl TableLayout {
    /// Creates a layout whose identity is `(time_field, geo_field)`.
    ///
    /// Both fields are added to the dimension keys and to the typed list.
    pub fn new(
        name: impl Into<String>,
        time_field: impl Into<String>,
        time_unit: TimeUnit,
        geo_field: impl Into<String>,
    ) -> Self {
        let time_field = time_field.into();
        let geo_field = geo_field.into();
        Self {
            name: name.into(),
            dimension_keys: vec![time_field.clone(), geo_field.clone()],
            time_field,
            time_unit,
            geo_field,
            issue_field: None,
            lag_field: None,
            current_flag: None,
            chain: None,
            row_id: "id".to_string(),
            fields: Vec::new(),
        }
    }

    /// Adds a further dimension key (e.g. source, signal).
    pub fn dimension(mut self, field: impl Into<String>) -> Self {
        self.dimension_keys.push(field.into());
        self
    }

    /// Declares the revision marker column.
    pub fn issue(mut self, field: impl Into<String>) -> Self {
        self.issue_field = Some(field.into());
        self
    }

    /// Declares a stored `issue - time_value` column.
    pub fn lag_column(mut self, field: impl Into<String>) -> Self {
        self.lag_field = Some(field.into());
        self
    }

    /// Same table read on another calendar, for tables whose rows carry
    /// their own time type.
    pub fn with_time_unit(&self, unit: TimeUnit) -> Self {
        Self {
            time_unit: unit,
            ..self.clone()
        }
    }

    /// Declares a maintained "is current" flag column.
    pub fn current_flag(mut self, field: impl Into<String>) -> Self {
        self.current_flag = Some(field.into());
        self
    }

    /// Declares correction-chain columns.
    pub fn chain(mut self, chain: ChainColumns) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Names the row id column (default `id`).
    pub fn row_id(mut self, field: impl Into<String>) -> Self {
        self.row_id = field.into();
        self
    }

    /// Appends a field to the canonical typed list.
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension_keys(&self) -> &[String] {
        &self.dimension_keys
    }

    pub fn time_field(&self) -> &str {
        &self.time_field
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    pub fn geo_field(&self) -> &str {
        &self.geo_field
    }

    pub fn issue_field(&self) -> Option<&str> {
        self.issue_field.as_deref()
    }

    pub fn lag_field(&self) -> Option<&str> {
        self.lag_field.as_deref()
    }

    pub fn current_flag_field(&self) -> Option<&str> {
        self.current_flag.as_deref()
    }

    pub fn chain_columns(&self) -> Option<&ChainColumns> {
        self.chain.as_ref()
    }

    pub fn row_id_field(&self) -> &str {
        &self.row_id
    }

    pub fn is_versioned(&self) -> bool {
        self.issue_field.is_some() || self.chain.is_some()
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.ty)
    }

    /// Intersects a requested field subset with the canonical list, in
    /// canonical order. Unknown names are dropped, never forwarded.
    pub fn project(&self, requested: Option<&[String]>) -> Vec<FieldDef> {
        match requested {
            None => self.fields.clone(),
            Some(names) => self
                .fields
                .iter()
                .filter(|f| names.iter().any(|n| *n == f.name))
                .cloned()
                .collect(),
        }
    }

    /// Identity of `row` without its issue.
    pub fn dimension_key(&self, row: &Row) -> DimensionKey {
        self.dimension_keys
            .iter()
            .map(|k| match row.get(k) {
                Some(FieldValue::Int(i)) => Some(Scalar::Int(*i)),
                Some(FieldValue::Str(s)) => Some(Scalar::Str(s.clone())),
                Some(FieldValue::Float(f)) => Some(Scalar::Str(f.to_string())),
                Some(FieldValue::Null) | None => None,
            })
            .collect()
    }

    /// Issue of `row`, if the table is versioned and the cell is an integer.
    pub fn issue_of(&self, row: &Row) -> Option<i64> {
        row.get(self.issue_field.as_deref()?)?.as_i64()
    }

    /// Builds the emitted row: projection order, declared types.
    ///
    /// A field in `raw` that the typed list does not declare is an error;
    /// projected fields absent from `raw` are emitted as null.
    pub fn coerce(&self, raw: &Row, projection: &[FieldDef]) -> StreamResult<Row> {
        if let Some(name) = raw.keys().find(|k| self.field_type(k).is_none()) {
            return Err(StreamError::undeclared_field(&self.name, name));
        }

        let mut row = Row::with_capacity(projection.len());
        for def in projection {
            let value = match raw.get(&def.name) {
                Some(v) => coerce_value(&def.name, v, def.ty)?,
                None => FieldValue::Null,
            };
            row.push(def.name.clone(), value);
        }
        Ok(row)
    }
}

fn coerce_value(field: &str, value: &FieldValue, ty: FieldType) -> StreamResult<FieldValue> {
    let fail = || StreamError::coercion(field, value, ty.as_str());
    Ok(match (ty, value) {
        (_, FieldValue::Null) => FieldValue::Null,
        (FieldType::Str, v) => v.clone(),
        (FieldType::Int, FieldValue::Int(i)) => FieldValue::Int(*i),
        (FieldType::Int, FieldValue::Float(f)) if f.is_finite() => FieldValue::Int(f.trunc() as i64),
        (FieldType::Int, FieldValue::Str(s)) => match s.trim().parse::<i64>() {
            Ok(i) => FieldValue::Int(i),
            Err(_) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => FieldValue::Int(f.trunc() as i64),
                _ => return Err(fail()),
            },
        },
        (FieldType::Int, FieldValue::Float(_)) => return Err(fail()),
        (FieldType::Float, FieldValue::Int(i)) => FieldValue::Float(*i as f64),
        (FieldType::Float, FieldValue::Float(f)) => FieldValue::Float(*f),
        (FieldType::Float, FieldValue::Str(s)) => match s.trim().parse::<f64>() {
            Ok(f) => FieldValue::Float(f),
            Err(_) => return Err(fail()),
        },
    })
}
