//! The connection-scoped entry point.
//!
//! A [`Model`] owns a factory for the statement sink and opens one [`Query`]
//! per table. The sink is created lazily, the first time a query is built or
//! executed, and reused afterwards.
//!
//! # Examples
//!
//! ```
//! use native_query_core::Settings;
//! use native_query_db::model::Model;
//! use native_query_db::sink::StatementSink;
//! use native_query_db::sql::SqlSink;
//!
//! let mut model = Model::new(&Settings::default(), || {
//!     Ok(Box::new(SqlSink::new()) as Box<dyn StatementSink>)
//! });
//! let query = model.select("users", ["id", "name"]);
//! let sql = model.build(&query).unwrap();
//! assert_eq!(sql, r#"SELECT "id", "name" FROM "users""#);
//! ```

use crate::query::builder::Query;
use crate::query::field::FieldSpec;
use crate::result::ResultSet;
use crate::sink::StatementSink;
use native_query_core::{Conventions, QueryError, QueryResult, Settings};

/// Creates the sink a [`Model`] talks to.
pub type SinkFactory = Box<dyn Fn() -> QueryResult<Box<dyn StatementSink>> + Send + Sync>;

/// Opens queries and runs them against a lazily created sink.
pub struct Model {
    conventions: Conventions,
    factory: SinkFactory,
    sink: Option<Box<dyn StatementSink>>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("conventions", &self.conventions)
            .field("connected", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Creates a model whose queries use the conventions from `settings`.
    pub fn new<F>(settings: &Settings, factory: F) -> Self
    where
        F: Fn() -> QueryResult<Box<dyn StatementSink>> + Send + Sync + 'static,
    {
        Self {
            conventions: settings.conventions.clone(),
            factory: Box::new(factory),
            sink: None,
        }
    }

    /// Returns `true` once the sink has been created.
    pub const fn is_connected(&self) -> bool {
        self.sink.is_some()
    }

    /// Returns the sink, creating it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the factory's error; the next call tries again.
    pub fn sink(&mut self) -> QueryResult<&mut (dyn StatementSink + 'static)> {
        if self.sink.is_none() {
            tracing::debug!("creating statement sink");
            self.sink = Some((self.factory)()?);
        }
        self.sink
            .as_deref_mut()
            .ok_or_else(|| QueryError::sink("statement sink unavailable"))
    }

    /// Opens a query on `table`.
    pub fn table(&self, table: impl Into<String>) -> Query {
        Query::with_conventions(table, self.conventions.clone())
    }

    /// Opens a query on `table` selecting `fields`.
    pub fn select<I, F>(&self, table: impl Into<String>, fields: I) -> Query
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSpec>,
    {
        let mut query = self.table(table);
        query.fields(fields);
        query
    }

    /// Opens a query on `table` and hands it to `configure`.
    pub fn query<F>(&self, table: impl Into<String>, configure: F) -> Query
    where
        F: FnOnce(&mut Query),
    {
        let mut query = self.table(table);
        configure(&mut query);
        query
    }

    /// Builds `query` on this model's sink.
    pub fn build(&mut self, query: &Query) -> QueryResult<String> {
        query.build(self.sink()?)
    }

    /// Executes `query` on this model's sink.
    pub fn execute(&mut self, query: &Query) -> QueryResult<ResultSet> {
        query.execute(self.sink()?)
    }
}
