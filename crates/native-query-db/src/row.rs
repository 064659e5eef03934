//! Fetched records and the [`Row`] wrapper.
//!
//! A [`Record`] is what a [`Cursor`](crate::sink::Cursor) hands back for one
//! fetched row: column names and their values. A [`Row`] wraps an optional
//! record so that "no row" is a value too, which lets callers write
//! `result.single()?.get::<String>("name")` without matching on `Option`.

use std::collections::BTreeMap;

use crate::value::Value;
use native_query_core::{QueryError, QueryResult};

/// One fetched record: column names and their corresponding values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    /// Creates a record from column names and values.
    ///
    /// # Errors
    ///
    /// Returns a sink error if the number of columns does not match the number
    /// of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> QueryResult<Self> {
        if columns.len() != values.len() {
            return Err(QueryError::sink(format!(
                "record has {} columns but {} values",
                columns.len(),
                values.len()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Creates a record from `(column, value)` pairs.
    pub fn from_pairs<I, C, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Value>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .unzip();
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the value stored under `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }
}

/// A fetched row, or the empty "no record" row.
///
/// # Examples
///
/// ```
/// use native_query_db::row::{Record, Row};
///
/// let row = Row::from(Record::from_pairs([("id", 1), ("age", 30)]));
/// assert!(row.any());
/// assert_eq!(row.get::<i64>("age").unwrap(), 30);
/// assert!(row.get_value("missing").is_none());
///
/// let empty = Row::empty();
/// assert!(!empty.any());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    record: Option<Record>,
}

impl Row {
    /// Creates the empty row.
    pub const fn empty() -> Self {
        Self { record: None }
    }

    /// Returns `true` if the row holds a record.
    pub const fn any(&self) -> bool {
        self.record.is_some()
    }

    /// Returns the raw value stored under `column`, if any.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.record.as_ref().and_then(|r| r.get(column))
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ColumnNotFound`] if the column is absent (including
    /// on the empty row) and [`QueryError::TypeMismatch`] if the value cannot
    /// be converted.
    pub fn get<T: FromValue>(&self, column: &str) -> QueryResult<T> {
        let value = self
            .get_value(column)
            .ok_or_else(|| QueryError::ColumnNotFound(column.to_string()))?;
        T::from_value(value)
    }

    /// Returns the column names; empty for the empty row.
    pub fn columns(&self) -> &[String] {
        match &self.record {
            Some(record) => record.columns(),
            None => &[],
        }
    }

    /// Returns the underlying record.
    pub const fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Copies the row into a column-name → value map.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.record
            .iter()
            .flat_map(|r| r.columns.iter().cloned().zip(r.values.iter().cloned()))
            .collect()
    }
}

impl From<Record> for Row {
    fn from(record: Record) -> Self {
        Self {
            record: Some(record),
        }
    }
}

impl From<Option<Record>> for Row {
    fn from(record: Option<Record>) -> Self {
        Self { record }
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> QueryResult<Self>;
}

fn mismatch(expected: &str, value: &Value) -> QueryError {
    QueryError::TypeMismatch(format!("expected {expected}, got {value:?}"))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(mismatch("Int", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Int(i) => Self::try_from(*i)
                .map_err(|e| QueryError::TypeMismatch(format!("Int value out of i32 range: {e}"))),
            _ => Err(mismatch("Int", value)),
        }
    }
}

impl FromValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            _ => Err(mismatch("Float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(mismatch("Bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            _ => Err(mismatch("Bytes", value)),
        }
    }
}

impl FromValue for chrono::NaiveDate {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            _ => Err(mismatch("Date", value)),
        }
    }
}

impl FromValue for chrono::NaiveDateTime {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            _ => Err(mismatch("DateTime", value)),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Uuid(u) => Ok(*u),
            _ => Err(mismatch("Uuid", value)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            _ => Err(mismatch("Json", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> QueryResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}
