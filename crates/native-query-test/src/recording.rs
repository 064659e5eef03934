//! A recording statement sink for tests.
//!
//! [`RecordingSink`] implements [`StatementSink`] by remembering every call it
//! receives and, on `execute`, returning a [`MemoryCursor`] over canned
//! records. Clones share their state, so a test can hand one clone to a
//! [`Model`](native_query_db::Model) factory or a query and inspect another.
//!
//! ## Example
//!
//! ```
//! use native_query_db::query::Query;
//! use native_query_db::row::Record;
//! use native_query_test::recording::{RecordingSink, SinkCall};
//!
//! let mut sink = RecordingSink::new().with_rows(vec![Record::from_pairs([("id", 1)])]);
//! let mut result = Query::new("users").execute(&mut sink).unwrap();
//!
//! assert_eq!(sink.calls(), vec![SinkCall::From("users".into()), SinkCall::Execute]);
//! assert_eq!(result.all().unwrap().len(), 1);
//! assert_eq!(sink.free_count(), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use native_query_core::{QueryError, QueryResult};
use native_query_db::query::{Condition, FieldSpec};
use native_query_db::row::Record;
use native_query_db::sink::{Cursor, StatementSink};

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    /// `select(fields)`.
    Select(Vec<FieldSpec>),
    /// `from_table(table)`.
    From(String),
    /// `join(table, on)`.
    Join {
        /// The joined table.
        table: String,
        /// The ON predicate.
        on: String,
    },
    /// `filter(condition)`.
    Where(Condition),
    /// `having(condition)`.
    Having(Condition),
    /// `group_by(column)`.
    GroupBy(String),
    /// `order_by(column)`.
    OrderBy(String),
    /// `asc()`.
    Asc,
    /// `desc()`.
    Desc,
    /// `limit(n)`.
    Limit(usize),
    /// `offset(n)`.
    Offset(usize),
    /// `build()`.
    Build,
    /// `execute()`.
    Execute,
}

impl SinkCall {
    /// Returns `true` for the clause calls, `false` for `build`/`execute`.
    pub const fn is_clause(&self) -> bool {
        !matches!(self, Self::Build | Self::Execute)
    }
}

impl fmt::Display for SinkCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(fields) => write!(f, "select {fields:?}"),
            Self::From(table) => write!(f, "from {table}"),
            Self::Join { table, on } => write!(f, "join {table} on {on}"),
            Self::Where(condition) => write!(f, "where {condition:?}"),
            Self::Having(condition) => write!(f, "having {condition:?}"),
            Self::GroupBy(column) => write!(f, "group by {column}"),
            Self::OrderBy(column) => write!(f, "order by {column}"),
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
            Self::Limit(n) => write!(f, "limit {n}"),
            Self::Offset(n) => write!(f, "offset {n}"),
            Self::Build => write!(f, "build"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A sink that records calls and serves canned rows.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
    call_count: Arc<AtomicUsize>,
    rows: Arc<Mutex<Vec<Record>>>,
    frees: Arc<AtomicUsize>,
    execute_error: Option<String>,
}

impl RecordingSink {
    /// Creates a sink with no canned rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the records returned by every `execute`.
    #[must_use]
    pub fn with_rows(self, rows: Vec<Record>) -> Self {
        *lock(&self.rows) = rows;
        self
    }

    /// Makes every `execute` fail with a sink error carrying `message`.
    #[must_use]
    pub fn failing_execute(mut self, message: impl Into<String>) -> Self {
        self.execute_error = Some(message.into());
        self
    }

    /// Returns the calls received since the last reset.
    pub fn calls(&self) -> Vec<SinkCall> {
        lock(&self.calls).clone()
    }

    /// Returns the clause calls received since the last reset, without the
    /// trailing `build`/`execute` marker.
    pub fn clause_calls(&self) -> Vec<SinkCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.is_clause())
            .cloned()
            .collect()
    }

    /// Returns the number of calls received since the counter was reset.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Resets the call counter to zero.
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// Returns how many cursors handed out by this sink have been freed.
    pub fn free_count(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    fn record(&self, call: SinkCall) -> QueryResult<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.calls).push(call);
        Ok(())
    }
}

impl StatementSink for RecordingSink {
    fn reset(&mut self) {
        lock(&self.calls).clear();
    }

    fn select(&mut self, fields: &[FieldSpec]) -> QueryResult<()> {
        self.record(SinkCall::Select(fields.to_vec()))
    }

    fn from_table(&mut self, table: &str) -> QueryResult<()> {
        self.record(SinkCall::From(table.to_string()))
    }

    fn join(&mut self, table: &str, on: &str) -> QueryResult<()> {
        self.record(SinkCall::Join {
            table: table.to_string(),
            on: on.to_string(),
        })
    }

    fn filter(&mut self, condition: &Condition) -> QueryResult<()> {
        self.record(SinkCall::Where(condition.clone()))
    }

    fn having(&mut self, condition: &Condition) -> QueryResult<()> {
        self.record(SinkCall::Having(condition.clone()))
    }

    fn group_by(&mut self, column: &str) -> QueryResult<()> {
        self.record(SinkCall::GroupBy(column.to_string()))
    }

    fn order_by(&mut self, column: &str) -> QueryResult<()> {
        self.record(SinkCall::OrderBy(column.to_string()))
    }

    fn asc(&mut self) -> QueryResult<()> {
        self.record(SinkCall::Asc)
    }

    fn desc(&mut self) -> QueryResult<()> {
        self.record(SinkCall::Desc)
    }

    fn limit(&mut self, limit: usize) -> QueryResult<()> {
        self.record(SinkCall::Limit(limit))
    }

    fn offset(&mut self, offset: usize) -> QueryResult<()> {
        self.record(SinkCall::Offset(offset))
    }

    /// Returns one line per received clause call.
    fn build(&mut self) -> QueryResult<String> {
        let text = self
            .clause_calls()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        self.record(SinkCall::Build)?;
        Ok(text)
    }

    fn execute(&mut self) -> QueryResult<Box<dyn Cursor>> {
        self.record(SinkCall::Execute)?;
        if let Some(message) = &self.execute_error {
            return Err(QueryError::sink(message.clone()));
        }
        let rows = lock(&self.rows).clone();
        Ok(Box::new(MemoryCursor::new(rows, Arc::clone(&self.frees))))
    }
}

/// A cursor over records held in memory.
#[derive(Debug)]
pub struct MemoryCursor {
    rows: VecDeque<Record>,
    total: usize,
    freed: bool,
    frees: Arc<AtomicUsize>,
}

impl MemoryCursor {
    /// Creates a cursor over `rows`; `frees` is incremented on release.
    pub fn new(rows: Vec<Record>, frees: Arc<AtomicUsize>) -> Self {
        Self {
            total: rows.len(),
            rows: rows.into(),
            freed: false,
            frees,
        }
    }
}

impl Cursor for MemoryCursor {
    fn fetch(&mut self) -> QueryResult<Option<Record>> {
        if self.freed {
            return Err(QueryError::AlreadyReleased);
        }
        Ok(self.rows.pop_front())
    }

    fn count(&self) -> QueryResult<usize> {
        Ok(self.total)
    }

    fn free(&mut self) {
        if !self.freed {
            self.freed = true;
            self.rows.clear();
            self.frees.fetch_add(1, Ordering::SeqCst);
        }
    }
}
