//! # native-query-db
//!
//! The query layer of native-query. Provides [`Query`](query::Query) for
//! building queries on a root table, [`Join`](query::Join) for declaring joins
//! and their nested joins, [`ResultSet`](result::ResultSet) and
//! [`Row`](row::Row) for reading results, and the
//! [`StatementSink`](sink::StatementSink) trait the assembled clauses are
//! emitted into.
//!
//! ## Architecture
//!
//! Builder calls only record what was asked for. When
//! [`Query::build`](query::Query::build) or [`Query::execute`](query::Query::execute)
//! is called, the join tree is flattened breadth-first, every field and
//! condition is qualified, every join is compiled into `(table, predicate)`
//! clauses, and the result is a [`ClauseSet`](query::ClauseSet). Only then is
//! the clause set replayed onto the sink, so a malformed specification never
//! produces a partial statement.
//!
//! ## Module Overview
//!
//! - [`query`] - Field qualification, condition normalization, joins, and the builder
//! - [`sink`] - The [`StatementSink`](sink::StatementSink) and [`Cursor`](sink::Cursor) traits
//! - [`result`] - The single-pass [`ResultSet`](result::ResultSet)
//! - [`row`] - [`Record`](row::Record), [`Row`](row::Row), and typed access via [`FromValue`](row::FromValue)
//! - [`model`] - The connection-scoped [`Model`](model::Model) entry point
//! - [`sql`] - The [`SqlSink`](sql::SqlSink) reference renderer
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum

// These clippy lints are intentionally allowed for the query crate:
// - format_push_string: format! with push_str is clearer than write! for SQL rendering
// - doc_markdown: backtick requirements for documentation items are too strict
// - return_self_not_must_use: builder methods return &mut Self for chaining
// - missing_const_for_fn: several accessors may gain non-const bodies
#![allow(clippy::format_push_string)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::match_same_arms)]

pub mod model;
pub mod query;
pub mod result;
pub mod row;
pub mod sink;
pub mod sql;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use model::{Model, SinkFactory};
pub use indexmap::IndexMap;
pub use query::{
    AliasMap, Argument, Clause, ClauseSet, Condition, ConditionMap, DirectOverride, FieldSpec,
    GroupSpec, IndirectOverride, Join, JoinKind, Key, OrderSpec, Qualified, Query,
};
pub use result::{Assoc, ResultSet};
pub use row::{FromValue, Record, Row};
pub use sink::{Cursor, StatementSink};
pub use sql::SqlSink;
pub use value::Value;
