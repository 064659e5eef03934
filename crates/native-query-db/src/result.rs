//! The [`ResultSet`] wrapper over a sink cursor.
//!
//! A result set owns the [`Cursor`] returned by
//! [`StatementSink::execute`](crate::sink::StatementSink::execute) and offers
//! exactly one forward pass over it. Draining accessors (`each`, `map`, `all`,
//! `assoc`) release the cursor when they finish; any later use fails with
//! [`QueryError::AlreadyReleased`].

use std::collections::BTreeMap;

use crate::row::{Record, Row};
use crate::sink::Cursor;
use crate::value::Value;
use native_query_core::{QueryError, QueryResult};

/// Rows grouped by the values of one or more key columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Assoc {
    /// A leaf: the last row seen for this key path.
    Row(Row),
    /// The next grouping level, keyed by the rendered column value.
    Group(BTreeMap<String, Assoc>),
}

impl Assoc {
    /// Returns the child stored under `key` at a grouping level.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Group(map) => map.get(key),
            Self::Row(_) => None,
        }
    }

    /// Returns the leaf row.
    pub const fn as_row(&self) -> Option<&Row> {
        match self {
            Self::Row(row) => Some(row),
            Self::Group(_) => None,
        }
    }

    /// Returns the number of entries at a grouping level (1 for a leaf).
    pub fn len(&self) -> usize {
        match self {
            Self::Group(map) => map.len(),
            Self::Row(_) => 1,
        }
    }

    /// Returns `true` for an empty grouping level.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Group(map) if map.is_empty())
    }

    fn insert(&mut self, path: &[String], row: Row) {
        let Self::Group(map) = self else {
            return;
        };
        match path {
            [] => {}
            [last] => {
                map.insert(last.clone(), Self::Row(row));
            }
            [head, rest @ ..] => {
                let child = map
                    .entry(head.clone())
                    .or_insert_with(|| Self::Group(BTreeMap::new()));
                if matches!(child, Self::Row(_)) {
                    *child = Self::Group(BTreeMap::new());
                }
                child.insert(rest, row);
            }
        }
    }
}

/// A single-pass result over a sink cursor.
pub struct ResultSet {
    cursor: Option<Box<dyn Cursor>>,
}

impl std::fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("released", &self.is_released())
            .finish()
    }
}

impl ResultSet {
    /// Wraps a cursor returned by a sink.
    pub fn new(cursor: Box<dyn Cursor>) -> Self {
        Self {
            cursor: Some(cursor),
        }
    }

    /// Returns `true` once the cursor has been released.
    pub const fn is_released(&self) -> bool {
        self.cursor.is_none()
    }

    fn cursor(&mut self) -> QueryResult<&mut Box<dyn Cursor>> {
        self.cursor.as_mut().ok_or(QueryError::AlreadyReleased)
    }

    fn fetch(&mut self) -> QueryResult<Option<Record>> {
        self.cursor()?.fetch()
    }

    /// Returns the first column of the next record, or `None` if there is no
    /// record left.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::AlreadyReleased`] after release; sink errors are
    /// propagated.
    pub fn single(&mut self) -> QueryResult<Option<Value>> {
        Ok(self
            .fetch()?
            .and_then(|record| record.values().first().cloned()))
    }

    /// Returns the next record as a [`Row`]; the empty row once exhausted.
    pub fn one(&mut self) -> QueryResult<Row> {
        self.fetch().map(Row::from)
    }

    /// Calls `f` for every remaining row, then releases the cursor.
    pub fn each<F>(&mut self, mut f: F) -> QueryResult<()>
    where
        F: FnMut(Row),
    {
        while let Some(record) = self.fetch()? {
            f(Row::from(record));
        }
        self.free()
    }

    /// Maps every remaining row through `f`, then releases the cursor.
    pub fn map<T, F>(&mut self, mut f: F) -> QueryResult<Vec<T>>
    where
        F: FnMut(Row) -> T,
    {
        let mut out = Vec::new();
        self.each(|row| out.push(f(row)))?;
        Ok(out)
    }

    /// Collects every remaining row, then releases the cursor.
    pub fn all(&mut self) -> QueryResult<Vec<Row>> {
        self.map(|row| row)
    }

    /// Groups every remaining row by the values of `keys`, one nesting level
    /// per key, then releases the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidFieldSpec`] when `keys` is empty and
    /// [`QueryError::ColumnNotFound`] when a row lacks a key column.
    pub fn assoc(&mut self, keys: &[&str]) -> QueryResult<Assoc> {
        self.assoc_with(keys, |row| row)
    }

    /// Like [`assoc`](Self::assoc), passing every row through `f` first.
    pub fn assoc_with<F>(&mut self, keys: &[&str], mut f: F) -> QueryResult<Assoc>
    where
        F: FnMut(Row) -> Row,
    {
        if keys.is_empty() {
            return Err(QueryError::InvalidFieldSpec(
                "assoc needs at least one key column".to_string(),
            ));
        }

        let mut root = Assoc::Group(BTreeMap::new());
        while let Some(record) = self.fetch()? {
            let row = Row::from(record);
            let path = keys
                .iter()
                .map(|key| {
                    row.get_value(key)
                        .map(ToString::to_string)
                        .ok_or_else(|| QueryError::ColumnNotFound((*key).to_string()))
                })
                .collect::<QueryResult<Vec<_>>>()?;
            root.insert(&path, f(row));
        }
        self.free()?;
        Ok(root)
    }

    /// Returns the number of rows reported by the cursor.
    pub fn count(&self) -> QueryResult<usize> {
        self.cursor
            .as_ref()
            .ok_or(QueryError::AlreadyReleased)?
            .count()
    }

    /// Releases the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::AlreadyReleased`] if it was released before.
    pub fn free(&mut self) -> QueryResult<()> {
        let mut cursor = self.cursor.take().ok_or(QueryError::AlreadyReleased)?;
        cursor.free();
        tracing::trace!("result set released");
        Ok(())
    }
}

impl Drop for ResultSet {
    fn drop(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.free();
        }
    }
}
