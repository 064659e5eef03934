//! A connection-less reference sink that renders SQL text.
//!
//! [`SqlSink`] turns the clause calls it receives into a parameterized
//! `SELECT` statement, which makes it useful for previews, logging, and tests.
//! It has no connection, so [`execute`](StatementSink::execute) always fails.
//!
//! Rendering rules:
//!
//! - Plain identifier paths (`users.name`, `[users.name]`) are quoted per
//!   segment (`"users"."name"`); anything else (`COUNT(*)`) is kept verbatim.
//! - Alias maps render as `column AS "alias"`.
//! - Condition maps render as a conjunction of `column = ?`, `column IS NULL`,
//!   or `column IN (?, ...)`.
//! - Template conditions keep their predicate text and bind the values after it.
//! - Raw predicates are kept verbatim.
//!
//! # Examples
//!
//! ```
//! use native_query_db::query::{Condition, Query};
//! use native_query_db::sql::SqlSink;
//!
//! let mut query = Query::new("users");
//! query.fields(["id"]).filter(Condition::eq("id", 5)).limit(1);
//!
//! let mut sink = SqlSink::new();
//! let sql = query.build(&mut sink).unwrap();
//! assert_eq!(sql, r#"SELECT "id" FROM "users" WHERE "id" = ? LIMIT 1"#);
//! assert_eq!(sink.params().len(), 1);
//! ```

use crate::query::condition::{Argument, Condition, ConditionMap};
use crate::query::field::FieldSpec;
use crate::sink::{Cursor, StatementSink};
use crate::value::Value;
use native_query_core::{QueryError, QueryResult};

/// Renders received clauses as a parameterized SQL `SELECT`.
#[derive(Debug, Clone, Default)]
pub struct SqlSink {
    calls: usize,
    select: Vec<String>,
    from: Option<String>,
    joins: Vec<String>,
    wheres: Vec<String>,
    where_params: Vec<Value>,
    havings: Vec<String>,
    having_params: Vec<Value>,
    group: Vec<String>,
    order: Vec<String>,
    descending: bool,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl SqlSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no clause was received since the last reset.
    pub const fn is_empty(&self) -> bool {
        self.calls == 0
    }

    /// Returns the bound parameters in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        self.where_params
            .iter()
            .chain(&self.having_params)
            .cloned()
            .collect()
    }
}

/// Quotes a plain identifier path; other tokens are returned unchanged.
fn identifier(token: &str) -> String {
    let token = token
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(token);

    let plain = !token.is_empty()
        && token.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if plain {
        token
            .split('.')
            .map(|part| format!("\"{part}\""))
            .collect::<Vec<_>>()
            .join(".")
    } else {
        token.to_string()
    }
}

fn render_map(map: &ConditionMap, params: &mut Vec<Value>) -> QueryResult<String> {
    if map.is_empty() {
        return Err(QueryError::sink("empty condition map"));
    }
    let sql = map
        .iter()
        .map(|(key, value)| {
            let column = identifier(key.as_str());
            match value {
                Value::Null => format!("{column} IS NULL"),
                // Nothing can be a member of an empty list.
                Value::List(items) if items.is_empty() => "1 = 0".to_string(),
                Value::List(items) => {
                    params.extend(items.iter().cloned());
                    let marks = vec!["?"; items.len()].join(", ");
                    format!("{column} IN ({marks})")
                }
                other => {
                    params.push(other.clone());
                    format!("{column} = ?")
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ");
    Ok(sql)
}

fn render_condition(condition: &Condition, params: &mut Vec<Value>) -> QueryResult<String> {
    let args = match condition {
        Condition::Raw(predicate) => return Ok(format!("({predicate})")),
        Condition::Args(args) => args,
    };

    let mut parts = Vec::new();
    let mut rest = args.iter();

    if let Some(Argument::Value(Value::String(template))) = args.first() {
        rest.next();
        parts.push(template.clone());
        for arg in rest.by_ref() {
            match arg {
                Argument::Value(v) => params.push(v.clone()),
                Argument::Map(map) => parts.push(render_map(map, params)?),
                Argument::List(_) => {
                    return Err(QueryError::sink("nested argument lists cannot be rendered"));
                }
            }
        }
    } else {
        for arg in rest {
            match arg {
                Argument::Map(map) => parts.push(render_map(map, params)?),
                other => {
                    return Err(QueryError::sink(format!(
                        "condition argument cannot be rendered: {other:?}"
                    )));
                }
            }
        }
    }

    if parts.is_empty() {
        return Err(QueryError::sink("empty condition"));
    }
    Ok(parts.join(" AND "))
}

impl StatementSink for SqlSink {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn select(&mut self, fields: &[FieldSpec]) -> QueryResult<()> {
        self.calls += 1;
        for field in fields {
            match field {
                FieldSpec::Scalar(name) => self.select.push(identifier(name)),
                FieldSpec::AliasMap(map) => {
                    for (column, alias) in map {
                        self.select.push(format!("{} AS \"{alias}\"", identifier(column)));
                    }
                }
            }
        }
        Ok(())
    }

    fn from_table(&mut self, table: &str) -> QueryResult<()> {
        self.calls += 1;
        self.from = Some(identifier(table));
        Ok(())
    }

    fn join(&mut self, table: &str, on: &str) -> QueryResult<()> {
        self.calls += 1;
        self.joins.push(format!("INNER JOIN {} ON {on}", identifier(table)));
        Ok(())
    }

    fn filter(&mut self, condition: &Condition) -> QueryResult<()> {
        self.calls += 1;
        let sql = render_condition(condition, &mut self.where_params)?;
        self.wheres.push(sql);
        Ok(())
    }

    fn having(&mut self, condition: &Condition) -> QueryResult<()> {
        self.calls += 1;
        let sql = render_condition(condition, &mut self.having_params)?;
        self.havings.push(sql);
        Ok(())
    }

    fn group_by(&mut self, column: &str) -> QueryResult<()> {
        self.calls += 1;
        self.group.push(identifier(column));
        Ok(())
    }

    fn order_by(&mut self, column: &str) -> QueryResult<()> {
        self.calls += 1;
        let dir = if self.descending { "DESC" } else { "ASC" };
        self.order.push(format!("{} {dir}", identifier(column)));
        Ok(())
    }

    fn asc(&mut self) -> QueryResult<()> {
        self.calls += 1;
        self.descending = false;
        Ok(())
    }

    fn desc(&mut self) -> QueryResult<()> {
        self.calls += 1;
        self.descending = true;
        Ok(())
    }

    fn limit(&mut self, limit: usize) -> QueryResult<()> {
        self.calls += 1;
        self.limit = Some(limit);
        Ok(())
    }

    fn offset(&mut self, offset: usize) -> QueryResult<()> {
        self.calls += 1;
        self.offset = Some(offset);
        Ok(())
    }

    fn build(&mut self) -> QueryResult<String> {
        let from = self
            .from
            .as_ref()
            .ok_or_else(|| QueryError::sink("no table selected"))?;

        let mut sql = String::from("SELECT ");
        if self.select.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select.join(", "));
        }
        sql.push_str(&format!(" FROM {from}"));

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.wheres.is_empty() {
            sql.push_str(&format!(" WHERE {}", self.wheres.join(" AND ")));
        }
        if !self.group.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", self.group.join(", ")));
        }
        if !self.havings.is_empty() {
            sql.push_str(&format!(" HAVING {}", self.havings.join(" AND ")));
        }
        if !self.order.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order.join(", ")));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        tracing::debug!(sql = %sql, params = self.where_params.len() + self.having_params.len(), "statement rendered");
        Ok(sql)
    }

    fn execute(&mut self) -> QueryResult<Box<dyn Cursor>> {
        Err(QueryError::sink("SqlSink renders statements only and cannot execute them"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::join::IndirectOverride;
    use crate::query::Query;

    fn render(query: &Query) -> (String, Vec<Value>) {
        let mut sink = SqlSink::new();
        let sql = query.build(&mut sink).unwrap();
        (sql, sink.params())
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(identifier("users"), "\"users\"");
        assert_eq!(identifier("users.name"), "\"users\".\"name\"");
        assert_eq!(identifier("[users.name]"), "\"users\".\"name\"");
        assert_eq!(identifier("COUNT(*)"), "COUNT(*)");
        assert_eq!(identifier("a..b"), "a..b");
    }

    #[test]
    fn test_select_star() {
        let (sql, params) = render(&Query::new("users"));
        assert_eq!(sql, "SELECT * FROM \"users\"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_join_query() {
        let mut q = Query::new("users");
        q.fields(["name"])
            .join("posts", |p| {
                p.fields(["title"]);
            })
            .filter(Condition::eq("id", 5));
        let (sql, params) = render(&q);
        assert_eq!(
            sql,
            "SELECT \"users\".\"name\", \"posts\".\"title\" AS \"posts_title\" FROM \"users\" \
             INNER JOIN \"posts\" ON users.id = posts.users_id WHERE \"users\".\"id\" = ?"
        );
        assert_eq!(params, vec![Value::Int(5)]);
    }

    #[test]
    fn test_indirect_manual_query() {
        let mut q = Query::new("users");
        q.join("roles", |r| {
            r.indirect_with(IndirectOverride::manual(
                "grants",
                "users.id = grants.user",
                "grants.role = roles.id",
            ));
        });
        let (sql, _) = render(&q);
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" INNER JOIN \"grants\" ON users.id = grants.user \
             INNER JOIN \"roles\" ON grants.role = roles.id"
        );
    }

    #[test]
    fn test_condition_shapes() {
        let mut q = Query::new("users");
        q.filter(Condition::raw("age > 18 OR admin = 1"))
            .filter(Condition::template("created_at > ?", ["2024-01-01"]))
            .filter(Condition::symbols([
                ("deleted_at", Value::Null),
                ("role", Value::List(vec![Value::from("a"), Value::from("b")])),
            ]));
        let (sql, params) = render(&q);
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" WHERE (age > 18 OR admin = 1) AND created_at > ? \
             AND \"deleted_at\" IS NULL AND \"role\" IN (?, ?)"
        );
        assert_eq!(
            params,
            vec![Value::from("2024-01-01"), Value::from("a"), Value::from("b")]
        );
    }

    #[test]
    fn test_group_having_order_paging() {
        let mut q = Query::new("users");
        q.fields(["team"])
            .group("team")
            .having(Condition::template("COUNT(*) > ?", [3]))
            .desc()
            .order("team")
            .limit(5)
            .offset(10);
        let (sql, params) = render(&q);
        assert_eq!(
            sql,
            "SELECT \"team\" FROM \"users\" GROUP BY \"users\".\"team\" HAVING COUNT(*) > ? \
             ORDER BY \"users\".\"team\" DESC LIMIT 5 OFFSET 10"
        );
        assert_eq!(params, vec![Value::Int(3)]);
    }

    #[test]
    fn test_unrenderable_condition() {
        let mut q = Query::new("users");
        q.filter(Condition::args([5]));
        let mut sink = SqlSink::new();
        assert!(matches!(q.build(&mut sink), Err(QueryError::Sink(_))));
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let mut q = Query::new("users");
        q.filter(Condition::eq("id", Value::List(vec![])))
            .filter(Condition::eq("active", true));
        let (sql, params) = render(&q);
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" WHERE 1 = 0 AND \"active\" = ?"
        );
        assert_eq!(params, vec![Value::Bool(true)]);
    }

    #[test]
    fn test_empty_condition_map_rejected() {
        let mut q = Query::new("users");
        q.filter(Condition::symbols(Vec::<(&str, i32)>::new()));
        let mut sink = SqlSink::new();
        let err = q.build(&mut sink).unwrap_err();
        assert!(matches!(err, QueryError::Sink(_)));
        assert_eq!(err.to_string(), "empty condition map");

        let mut q = Query::new("users");
        q.having(Condition::template("COUNT(*) > ?", [1]))
            .having(Condition::literals(Vec::<(&str, i32)>::new()));
        assert!(matches!(q.build(&mut sink), Err(QueryError::Sink(_))));
    }

    #[test]
    fn test_build_without_from() {
        let mut sink = SqlSink::new();
        assert!(matches!(sink.build(), Err(QueryError::Sink(_))));
    }

    #[test]
    fn test_execute_is_unsupported() {
        let mut sink = SqlSink::new();
        assert!(matches!(
            Query::new("users").execute(&mut sink),
            Err(QueryError::Sink(_))
        ));
    }

    #[test]
    fn test_reset_between_builds() {
        let mut q = Query::new("users");
        q.filter(Condition::eq("id", 1));
        let mut sink = SqlSink::new();
        q.build(&mut sink).unwrap();
        q.build(&mut sink).unwrap();
        assert_eq!(sink.params(), vec![Value::Int(1)]);
        assert!(!sink.is_empty());
        sink.reset();
        assert!(sink.is_empty());
    }
}
