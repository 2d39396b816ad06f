//! Typed rows
//!
//! A row is an ordered mapping of field name to typed value. Field order is
//! the canonical order of the table layout, which is also the order every
//! printer emits.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl FieldValue {
    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Integer view (floats with no fractional part included).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON scalar; arrays and objects have no cell representation.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Int(i64::from(*b))),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(FieldValue::Int(i)),
                None => n.as_f64().map(FieldValue::Float),
            },
            Value::String(s) => Some(FieldValue::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Cell text for CSV output. Nulls become empty cells.
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Float(f) if !f.is_finite() => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Int(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            FieldValue::Float(_) => serializer.serialize_none(),
            FieldValue::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

/// An ordered field name → value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Appends a field, replacing an existing value of the same name in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder form of [`Row::push`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Removes and returns a field.
    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Builds a row from a flat JSON object.
    ///
    /// Returns `None` for non-objects or non-scalar members.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut row = Row::with_capacity(object.len());
        for (k, v) in object {
            row.push(k.clone(), FieldValue::from_json(v)?);
        }
        Some(row)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.push(k, v);
        }
        row
    }
}
