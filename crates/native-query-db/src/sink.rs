//! The statement sink and cursor traits.
//!
//! A [`StatementSink`] is the external statement builder a query is emitted
//! into. The query layer never talks to a connection itself: it assembles a
//! clause set, replays it as calls on a sink, and wraps whatever
//! [`Cursor`] the sink returns in a [`ResultSet`](crate::result::ResultSet).
//!
//! Sinks are implemented by backend crates. [`SqlSink`](crate::sql::SqlSink)
//! is a connection-less reference implementation that renders SQL text.

use crate::query::condition::Condition;
use crate::query::field::FieldSpec;
use crate::row::Record;
use native_query_core::QueryResult;

/// The external statement builder/executor.
///
/// Every clause method receives already qualified input. Literal column
/// tokens (group and order fields) arrive bracketed, e.g. `[users.name]`.
/// Failures should be reported through
/// [`QueryError::sink`](native_query_core::QueryError::sink).
pub trait StatementSink: Send {
    /// Clears any state left over from a previous replay.
    fn reset(&mut self) {}

    /// Adds columns to the select list.
    fn select(&mut self, fields: &[FieldSpec]) -> QueryResult<()>;

    /// Sets the root table.
    fn from_table(&mut self, table: &str) -> QueryResult<()>;

    /// Adds a join clause.
    fn join(&mut self, table: &str, on: &str) -> QueryResult<()>;

    /// Adds a WHERE condition.
    fn filter(&mut self, condition: &Condition) -> QueryResult<()>;

    /// Adds a HAVING condition.
    fn having(&mut self, condition: &Condition) -> QueryResult<()>;

    /// Adds a GROUP BY column token.
    fn group_by(&mut self, column: &str) -> QueryResult<()>;

    /// Adds an ORDER BY column token in the current direction.
    fn order_by(&mut self, column: &str) -> QueryResult<()>;

    /// Switches subsequent order columns to ascending.
    fn asc(&mut self) -> QueryResult<()>;

    /// Switches subsequent order columns to descending.
    fn desc(&mut self) -> QueryResult<()>;

    /// Sets the row limit.
    fn limit(&mut self, limit: usize) -> QueryResult<()>;

    /// Sets the row offset.
    fn offset(&mut self, offset: usize) -> QueryResult<()>;

    /// Serializes the received clauses without running them.
    fn build(&mut self) -> QueryResult<String>;

    /// Runs the received clauses and returns a handle over the result.
    fn execute(&mut self) -> QueryResult<Box<dyn Cursor>>;
}

/// A forward-only handle over the rows produced by [`StatementSink::execute`].
pub trait Cursor: Send {
    /// Returns the next record, or `None` once the result is exhausted.
    fn fetch(&mut self) -> QueryResult<Option<Record>>;

    /// Returns the number of rows in the result.
    fn count(&self) -> QueryResult<usize>;

    /// Releases the underlying resources.
    fn free(&mut self);
}
