//! Assembled clauses and their replay onto a sink.
//!
//! [`Query::clauses`](super::builder::Query::clauses) produces a [`ClauseSet`]:
//! the complete, ordered list of sink calls for one query. Because every
//! qualification and join compilation happens while the set is assembled,
//! replaying it can only fail inside the sink.

use super::condition::Condition;
use super::field::FieldSpec;
use crate::sink::StatementSink;
use native_query_core::QueryResult;

/// One sink call.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
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
}

impl Clause {
    /// Forwards this clause to `sink`.
    pub fn apply(&self, sink: &mut dyn StatementSink) -> QueryResult<()> {
        match self {
            Self::Select(fields) => sink.select(fields),
            Self::From(table) => sink.from_table(table),
            Self::Join { table, on } => sink.join(table, on),
            Self::Where(condition) => sink.filter(condition),
            Self::Having(condition) => sink.having(condition),
            Self::GroupBy(column) => sink.group_by(column),
            Self::OrderBy(column) => sink.order_by(column),
            Self::Asc => sink.asc(),
            Self::Desc => sink.desc(),
            Self::Limit(n) => sink.limit(*n),
            Self::Offset(n) => sink.offset(*n),
        }
    }
}

/// The ordered sink calls of one assembled query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClauseSet {
    clauses: Vec<Clause>,
}

impl ClauseSet {
    /// Creates an empty clause set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a clause.
    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// Returns the clauses in emission order.
    pub fn as_slice(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns an iterator over the clauses.
    pub fn iter(&self) -> std::slice::Iter<'_, Clause> {
        self.clauses.iter()
    }

    /// Returns the number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns `true` if no clause was assembled.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Resets `sink` and forwards every clause to it, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first sink error and returns it.
    pub fn replay(&self, sink: &mut dyn StatementSink) -> QueryResult<()> {
        sink.reset();
        for clause in &self.clauses {
            tracing::trace!(?clause, "replaying clause");
            clause.apply(sink)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ClauseSet {
    type Item = &'a Clause;
    type IntoIter = std::slice::Iter<'a, Clause>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.iter()
    }
}

impl FromIterator<Clause> for ClauseSet {
    fn from_iter<I: IntoIterator<Item = Clause>>(iter: I) -> Self {
        Self {
            clauses: iter.into_iter().collect(),
        }
    }
}
