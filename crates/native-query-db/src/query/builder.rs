//! The root query builder.
//!
//! A [`Query`] collects field selections, conditions, ordering, grouping,
//! pagination, and top-level [`Join`]s for one root table. Nothing touches a
//! sink until [`Query::build`] or [`Query::execute`] is called; both assemble
//! the same [`ClauseSet`] and replay it, so they always issue the same calls.
//!
//! # Examples
//!
//! ```
//! use native_query_db::query::{Clause, Condition, FieldSpec, Query};
//!
//! let mut query = Query::new("users");
//! query
//!     .fields(["name"])
//!     .filter(Condition::eq("active", true))
//!     .join("posts", |posts| {
//!         posts.fields(["title"]);
//!     });
//!
//! let clauses = query.clauses().unwrap();
//! assert_eq!(clauses.as_slice()[0], Clause::Select(vec![FieldSpec::name("users.name")]));
//! assert!(clauses.iter().any(|c| *c == Clause::From("users".to_string())));
//! ```

use super::clause::{Clause, ClauseSet};
use super::condition::{normalize, Condition};
use super::field::{qualify, qualify_name, FieldSpec, Qualified};
use super::join::{Join, JoinContribution};
use crate::result::ResultSet;
use crate::sink::StatementSink;
use native_query_core::logging::query_span;
use native_query_core::{Conventions, QueryResult};

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
    /// Switch subsequent columns to ascending.
    Asc,
    /// Switch subsequent columns to descending.
    Desc,
    /// A column of the root table.
    Field(String),
    /// A column of an explicit table.
    Column {
        /// The owning table.
        table: String,
        /// The column name.
        field: String,
    },
}

/// One GROUP BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSpec {
    /// A column of the root table.
    Field(String),
    /// A column of an explicit table.
    Column {
        /// The owning table.
        table: String,
        /// The column name.
        field: String,
    },
}

fn bracket(table: &str, field: &str) -> String {
    format!("[{table}.{field}]")
}

/// A query on one root table.
#[derive(Debug, Clone)]
pub struct Query {
    table: String,
    conventions: Conventions,
    fields: Vec<FieldSpec>,
    conditions: Vec<Condition>,
    having: Vec<Condition>,
    order: Vec<OrderSpec>,
    group: Vec<GroupSpec>,
    joins: Vec<Join>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl Query {
    /// Creates a query on `table` with default naming conventions.
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_conventions(table, Conventions::default())
    }

    /// Creates a query on `table`; its joins derive predicates from `conventions`.
    pub fn with_conventions(table: impl Into<String>, conventions: Conventions) -> Self {
        Self {
            table: table.into(),
            conventions,
            fields: Vec::new(),
            conditions: Vec::new(),
            having: Vec::new(),
            order: Vec::new(),
            group: Vec::new(),
            joins: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    // ── Builder methods ──────────────────────────────────────────────

    /// Adds fields of the root table to select.
    pub fn fields<I, F>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSpec>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Adds a WHERE condition.
    pub fn filter(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    /// Adds a HAVING condition.
    pub fn having(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.having.push(condition.into());
        self
    }

    /// Orders by a column of the root table.
    pub fn order(&mut self, field: impl Into<String>) -> &mut Self {
        self.order.push(OrderSpec::Field(field.into()));
        self
    }

    /// Orders by a column of an explicit table.
    pub fn order_column(&mut self, table: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.order.push(OrderSpec::Column {
            table: table.into(),
            field: field.into(),
        });
        self
    }

    /// Switches subsequent order columns to ascending.
    pub fn asc(&mut self) -> &mut Self {
        self.order.push(OrderSpec::Asc);
        self
    }

    /// Switches subsequent order columns to descending.
    pub fn desc(&mut self) -> &mut Self {
        self.order.push(OrderSpec::Desc);
        self
    }

    /// Groups by a column of the root table.
    pub fn group(&mut self, field: impl Into<String>) -> &mut Self {
        self.group.push(GroupSpec::Field(field.into()));
        self
    }

    /// Groups by a column of an explicit table.
    pub fn group_column(&mut self, table: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.group.push(GroupSpec::Column {
            table: table.into(),
            field: field.into(),
        });
        self
    }

    /// Limits the number of rows.
    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` rows.
    pub fn offset(&mut self, offset: usize) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Declares a join from the root table to `target`.
    pub fn join<F>(&mut self, target: impl Into<String>, configure: F) -> &mut Self
    where
        F: FnOnce(&mut Join),
    {
        let mut join = Join::with_conventions(self.table.clone(), target, self.conventions.clone());
        configure(&mut join);
        self.joins.push(join);
        self
    }

    /// Declares a join selecting `fields`, then configures it further.
    pub fn join_with<I, F, C>(&mut self, target: impl Into<String>, fields: I, configure: C) -> &mut Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSpec>,
        C: FnOnce(&mut Join),
    {
        self.join(target, |join| {
            join.fields(fields);
            configure(join);
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The root table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The conventions handed to joins.
    pub const fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// The top-level joins.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    // ── Assembly ─────────────────────────────────────────────────────

    /// Own where/having conditions. Without joins nothing can be ambiguous,
    /// so they pass through exactly as given, symbol keys included.
    fn own_conditions(&self, conditions: &[Condition]) -> QueryResult<Vec<Condition>> {
        if self.joins.is_empty() {
            Ok(conditions.to_vec())
        } else {
            normalize(conditions, |key| qualify_name(key, &self.table, false))
        }
    }

    /// Assembles the full ordered clause set without touching a sink.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidFieldSpec`](native_query_core::QueryError::InvalidFieldSpec)
    /// or [`QueryError::InvalidJoinSpec`](native_query_core::QueryError::InvalidJoinSpec)
    /// for malformed input anywhere in the query or its join tree.
    pub fn clauses(&self) -> QueryResult<ClauseSet> {
        let span = query_span(&self.table);
        let _guard = span.enter();

        let joined = JoinContribution::collect(&self.joins)?;
        let mut out = ClauseSet::new();

        // Own fields: untouched without joins, otherwise qualified and split.
        if self.joins.is_empty() {
            if !self.fields.is_empty() {
                out.push(Clause::Select(self.fields.clone()));
            }
        } else {
            let mut scalars = Vec::new();
            let mut maps = Vec::new();
            for spec in &self.fields {
                match qualify(spec, &self.table, false)? {
                    Qualified::Name(name) => scalars.push(FieldSpec::Scalar(name)),
                    Qualified::Map(map) => maps.push(FieldSpec::AliasMap(map)),
                }
            }
            if !scalars.is_empty() {
                out.push(Clause::Select(scalars));
            }
            if !joined.fields.is_empty() {
                out.push(Clause::Select(vec![FieldSpec::AliasMap(joined.fields.clone())]));
            }
            for map in maps {
                out.push(Clause::Select(vec![map]));
            }
        }

        out.push(Clause::From(self.table.clone()));

        for (table, on) in &joined.clauses {
            out.push(Clause::Join {
                table: table.clone(),
                on: on.clone(),
            });
        }

        let own_where = self.own_conditions(&self.conditions)?;
        for condition in joined.conditions.into_iter().chain(own_where) {
            out.push(Clause::Where(condition));
        }

        for condition in self.own_conditions(&self.having)? {
            out.push(Clause::Having(condition));
        }

        for group in &self.group {
            let column = match group {
                GroupSpec::Field(field) => qualify_name(field, &self.table, true)?,
                GroupSpec::Column { table, field } => bracket(table, field),
            };
            out.push(Clause::GroupBy(column));
        }

        for order in &self.order {
            out.push(match order {
                OrderSpec::Asc => Clause::Asc,
                OrderSpec::Desc => Clause::Desc,
                OrderSpec::Field(field) => Clause::OrderBy(qualify_name(field, &self.table, true)?),
                OrderSpec::Column { table, field } => Clause::OrderBy(bracket(table, field)),
            });
        }

        if let Some(limit) = self.limit {
            out.push(Clause::Limit(limit));
        }
        if let Some(offset) = self.offset {
            out.push(Clause::Offset(offset));
        }

        tracing::debug!(
            table = %self.table,
            joins = joined.clauses.len(),
            clauses = out.len(),
            "query assembled"
        );
        Ok(out)
    }

    /// Replays the assembled clauses on `sink` and returns its serialized form.
    ///
    /// # Errors
    ///
    /// Assembly errors are returned before the sink is called at all; sink
    /// errors are propagated unchanged.
    pub fn build(&self, sink: &mut dyn StatementSink) -> QueryResult<String> {
        let clauses = self.clauses()?;
        clauses.replay(sink)?;
        sink.build()
    }

    /// Replays the assembled clauses on `sink`, runs them, and wraps the
    /// returned cursor.
    ///
    /// # Errors
    ///
    /// Assembly errors are returned before the sink is called at all; sink
    /// errors are propagated unchanged.
    pub fn execute(&self, sink: &mut dyn StatementSink) -> QueryResult<ResultSet> {
        let clauses = self.clauses()?;
        clauses.replay(sink)?;
        let cursor = sink.execute()?;
        tracing::debug!(table = %self.table, "query executed");
        Ok(ResultSet::new(cursor))
    }
}
