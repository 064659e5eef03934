//! # native-query
//!
//! A fluent query-construction engine.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `native-query` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ```
//! use native_query::prelude::*;
//!
//! let mut query = Query::new("users");
//! query
//!     .fields(["name"])
//!     .join("posts", |posts| {
//!         posts.fields(["title"]);
//!     })
//!     .filter(Condition::eq("id", 5));
//!
//! let mut sink = SqlSink::new();
//! let sql = query.build(&mut sink).unwrap();
//! assert!(sql.contains(r#"INNER JOIN "posts" ON users.id = posts.users_id"#));
//! ```

/// Error types, settings, and logging.
pub use native_query_core as core;

/// Query building, join compilation, sinks, and result sets.
pub use native_query_db as db;

/// Recording sink and call assertions.
#[cfg(feature = "testing")]
pub use native_query_test as test;

pub use serde_json;
pub use tracing;

/// The types most programs need.
pub mod prelude {
    pub use native_query_core::{Conventions, QueryError, QueryResult, Settings};
    pub use native_query_db::{
        Condition, Cursor, DirectOverride, FieldSpec, IndirectOverride, Join, Model, Query,
        Record, ResultSet, Row, SqlSink, StatementSink, Value,
    };
}
