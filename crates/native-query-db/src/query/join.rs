//! Join declarations and join-clause compilation.
//!
//! A [`Join`] describes one step from a source table to a target table: the
//! target's fields to select, conditions scoped to the target, nested joins
//! that start from the target, and how the ON predicate is derived.
//!
//! Without an override, predicates follow the naming [`Conventions`]:
//!
//! | Kind | Clauses |
//! |---|---|
//! | direct | `target ON source.id = target.source_id` |
//! | direct, backwards | `target ON source.target_id = target.id` |
//! | indirect | `source_target ON source.id = source_target.source_id`, then `target ON source_target.target_id = target.id` |
//!
//! # Examples
//!
//! ```
//! use native_query_db::query::join::Join;
//!
//! let mut join = Join::new("users", "posts");
//! join.fields(["title"]);
//! let clauses = join.compile().unwrap();
//! assert_eq!(clauses, vec![("posts".to_string(), "users.id = posts.users_id".to_string())]);
//! ```

use super::condition::{normalize, Condition};
use super::field::{qualify, qualify_name, AliasMap, FieldSpec, Qualified};
use indexmap::IndexMap;
use native_query_core::{Conventions, QueryError, QueryResult};

/// A compiled `(table, ON predicate)` pair.
pub type JoinClause = (String, String);

/// A manual predicate for a direct (1:N) join.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectOverride {
    /// `{source_column: target_column}`; exactly one entry is expected.
    Columns(AliasMap),
    /// A complete ON predicate used verbatim.
    Predicate(String),
}

impl DirectOverride {
    /// Creates a single `source_column = target_column` override.
    pub fn columns(source: impl Into<String>, target: impl Into<String>) -> Self {
        let mut map = AliasMap::new();
        map.insert(source.into(), target.into());
        Self::Columns(map)
    }
}

impl From<&str> for DirectOverride {
    fn from(predicate: &str) -> Self {
        Self::Predicate(predicate.to_string())
    }
}

impl From<String> for DirectOverride {
    fn from(predicate: String) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<(&str, &str)> for DirectOverride {
    fn from((source, target): (&str, &str)) -> Self {
        Self::columns(source, target)
    }
}

impl TryFrom<serde_json::Value> for DirectOverride {
    type Error = QueryError;

    /// Accepts a predicate string or an object of string column names.
    fn try_from(value: serde_json::Value) -> QueryResult<Self> {
        match value {
            serde_json::Value::String(s) => Ok(Self::Predicate(s)),
            serde_json::Value::Object(obj) => Ok(Self::Columns(string_map(obj)?)),
            other => Err(QueryError::InvalidJoinSpec(format!(
                "direct join override must be a column map or a predicate, got {other}"
            ))),
        }
    }
}

/// A manual specification for an indirect (M:N) join.
#[derive(Debug, Clone, PartialEq)]
pub enum IndirectOverride {
    /// Explicit junction table; `{source_column: target_column}` replaces the
    /// primary key on each outer side while the junction keeps its
    /// conventional foreign keys.
    SemiAutomatic {
        /// The junction table.
        junction: String,
        /// Exactly one `source_column -> target_column` entry.
        columns: AliasMap,
    },
    /// Explicit junction table and both ON predicates.
    Manual {
        /// The junction table.
        junction: String,
        /// Predicate joining the source table to the junction.
        on_source: String,
        /// Predicate joining the junction to the target table.
        on_target: String,
    },
}

impl IndirectOverride {
    /// Creates a semi-automatic override.
    pub fn semi(
        junction: impl Into<String>,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        let mut columns = AliasMap::new();
        columns.insert(source_column.into(), target_column.into());
        Self::SemiAutomatic {
            junction: junction.into(),
            columns,
        }
    }

    /// Creates a fully manual override.
    pub fn manual(
        junction: impl Into<String>,
        on_source: impl Into<String>,
        on_target: impl Into<String>,
    ) -> Self {
        Self::Manual {
            junction: junction.into(),
            on_source: on_source.into(),
            on_target: on_target.into(),
        }
    }
}

impl TryFrom<serde_json::Value> for IndirectOverride {
    type Error = QueryError;

    /// Accepts `[junction, {source: target}]` or `[junction, on_source, on_target]`.
    fn try_from(value: serde_json::Value) -> QueryResult<Self> {
        let items = match value {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(QueryError::InvalidJoinSpec(format!(
                    "indirect join override must be an array, got {other}"
                )));
            }
        };
        let mut items = items.into_iter();
        match (items.next(), items.next(), items.next(), items.next()) {
            (
                Some(serde_json::Value::String(junction)),
                Some(serde_json::Value::Object(obj)),
                None,
                None,
            ) => Ok(Self::SemiAutomatic {
                junction,
                columns: string_map(obj)?,
            }),
            (
                Some(serde_json::Value::String(junction)),
                Some(serde_json::Value::String(on_source)),
                Some(serde_json::Value::String(on_target)),
                None,
            ) => Ok(Self::Manual {
                junction,
                on_source,
                on_target,
            }),
            _ => Err(QueryError::InvalidJoinSpec(
                "indirect join override must be [junction, {source: target}] \
                 or [junction, on_source, on_target]"
                    .to_string(),
            )),
        }
    }
}

fn string_map(obj: serde_json::Map<String, serde_json::Value>) -> QueryResult<AliasMap> {
    let mut map = AliasMap::new();
    for (k, v) in obj {
        match v {
            serde_json::Value::String(s) => {
                map.insert(k, s);
            }
            other => {
                return Err(QueryError::InvalidJoinSpec(format!(
                    "column for '{k}' must be a string, got {other}"
                )));
            }
        }
    }
    Ok(map)
}

/// How a join is resolved into ON predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinKind {
    /// 1:N through a foreign key.
    Direct(Option<DirectOverride>),
    /// M:N through a junction table.
    Indirect(Option<IndirectOverride>),
}

impl Default for JoinKind {
    fn default() -> Self {
        Self::Direct(None)
    }
}

/// One join step and the joins nested under it.
#[derive(Debug, Clone)]
pub struct Join {
    source: String,
    target: String,
    conventions: Conventions,
    fields: Vec<FieldSpec>,
    conditions: Vec<Condition>,
    joins: Vec<Join>,
    kind: JoinKind,
    indirect_source: Option<String>,
}

impl Join {
    /// Creates a direct join from `source` to `target` with default conventions.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_conventions(source, target, Conventions::default())
    }

    /// Creates a direct join using the given naming conventions.
    pub fn with_conventions(
        source: impl Into<String>,
        target: impl Into<String>,
        conventions: Conventions,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            conventions,
            fields: Vec::new(),
            conditions: Vec::new(),
            joins: Vec::new(),
            kind: JoinKind::default(),
            indirect_source: None,
        }
    }

    // ── Builder methods ──────────────────────────────────────────────

    /// Adds fields of the target table to select.
    pub fn fields<I, F>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSpec>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Adds a condition scoped to the target table.
    pub fn filter(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    /// Makes this a direct (1:N) join with conventional columns.
    pub fn direct(&mut self) -> &mut Self {
        self.kind = JoinKind::Direct(None);
        self
    }

    /// Makes this a direct join with a manual override.
    pub fn direct_with(&mut self, spec: impl Into<DirectOverride>) -> &mut Self {
        self.kind = JoinKind::Direct(Some(spec.into()));
        self
    }

    /// Joins in the opposite direction: the foreign key lives on the source.
    ///
    /// Equivalent to `direct_with((target_id, id))`.
    pub fn backwards(&mut self) -> &mut Self {
        let spec = DirectOverride::columns(
            self.conventions.foreign_key(&self.target),
            self.conventions.primary_key.clone(),
        );
        self.direct_with(spec)
    }

    /// Makes this an indirect (M:N) join with a conventional junction table.
    pub fn indirect(&mut self) -> &mut Self {
        self.kind = JoinKind::Indirect(None);
        self
    }

    /// Makes this an indirect join with a manual override.
    pub fn indirect_with(&mut self, spec: IndirectOverride) -> &mut Self {
        self.kind = JoinKind::Indirect(Some(spec));
        self
    }

    /// Makes this an indirect join whose junction convention starts from
    /// `source` instead of the table this join originates from.
    pub fn indirect_from(&mut self, source: impl Into<String>) -> &mut Self {
        self.indirect_source = Some(source.into());
        self.indirect()
    }

    /// Declares a join from this join's target table to `target`.
    pub fn join<F>(&mut self, target: impl Into<String>, configure: F) -> &mut Self
    where
        F: FnOnce(&mut Join),
    {
        let mut join = Self::with_conventions(self.target.clone(), target, self.conventions.clone());
        configure(&mut join);
        self.joins.push(join);
        self
    }

    /// Declares a nested join selecting `fields`, then configures it further.
    pub fn join_with<I, F, C>(&mut self, target: impl Into<String>, fields: I, configure: C) -> &mut Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSpec>,
        C: FnOnce(&mut Join),
    {
        self.join(target, |j| {
            j.fields(fields);
            configure(j);
        })
    }

    /// Declares a nested join that only selects `fields`.
    pub fn join_fields<I, F>(&mut self, target: impl Into<String>, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSpec>,
    {
        self.join_with(target, fields, |_| {})
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The table this join starts from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The joined table.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The join kind and its override, if any.
    pub const fn kind(&self) -> &JoinKind {
        &self.kind
    }

    /// Joins declared directly under this one.
    pub fn sub_joins(&self) -> &[Join] {
        &self.joins
    }

    /// Looks up a nested join by target table name.
    pub fn sub_join(&self, target: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.target == target)
    }

    // ── Contributions ────────────────────────────────────────────────

    /// Returns the select contribution of this join: qualified column →
    /// `<target>_<alias>`.
    ///
    /// A bare field uses its own name as alias; alias-map entries use the
    /// mapped alias.
    pub fn selected_fields(&self) -> QueryResult<AliasMap> {
        let mut out = AliasMap::new();
        for spec in &self.fields {
            let entries = match (spec, qualify(spec, &self.target, false)?) {
                (FieldSpec::Scalar(name), Qualified::Name(qualified)) => vec![(qualified, name.clone())],
                (_, Qualified::Map(map)) => map.into_iter().collect(),
                (FieldSpec::AliasMap(_), Qualified::Name(_)) => Vec::new(),
            };
            for (qualified, alias) in entries {
                out.insert(qualified, self.conventions.join_alias(&self.target, &alias));
            }
        }
        Ok(out)
    }

    /// Returns this join's conditions normalized against its target table.
    pub fn conditions(&self) -> QueryResult<Vec<Condition>> {
        normalize(&self.conditions, |key| qualify_name(key, &self.target, false))
    }

    /// Compiles this join into `(table, predicate)` clauses.
    ///
    /// Direct joins yield one clause for the target. Indirect joins yield the
    /// junction clause followed by the target clause.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidJoinSpec`] when an override has the wrong
    /// arity or empty parts.
    pub fn compile(&self) -> QueryResult<Vec<JoinClause>> {
        let conv = &self.conventions;
        let source = &self.source;
        let target = &self.target;

        match &self.kind {
            JoinKind::Direct(None) => Ok(vec![(
                target.clone(),
                format!(
                    "{source}.{} = {target}.{}",
                    conv.primary_key,
                    conv.foreign_key(source)
                ),
            )]),
            JoinKind::Direct(Some(DirectOverride::Columns(columns))) => {
                let (source_col, target_col) = single_pair(columns, target)?;
                Ok(vec![(
                    target.clone(),
                    format!("{source}.{source_col} = {target}.{target_col}"),
                )])
            }
            JoinKind::Direct(Some(DirectOverride::Predicate(on))) => {
                Ok(vec![(target.clone(), non_empty(on, "ON predicate", target)?)])
            }
            JoinKind::Indirect(spec) => {
                let from = self.indirect_source.as_deref().unwrap_or(source);
                match spec {
                    None => {
                        let junction = conv.junction(from, target);
                        Ok(vec![
                            (
                                junction.clone(),
                                format!(
                                    "{from}.{} = {junction}.{}",
                                    conv.primary_key,
                                    conv.foreign_key(from)
                                ),
                            ),
                            (
                                target.clone(),
                                format!(
                                    "{junction}.{} = {target}.{}",
                                    conv.foreign_key(target),
                                    conv.primary_key
                                ),
                            ),
                        ])
                    }
                    Some(IndirectOverride::SemiAutomatic { junction, columns }) => {
                        let junction = non_empty(junction, "junction table", target)?;
                        let (source_col, target_col) = single_pair(columns, target)?;
                        Ok(vec![
                            (
                                junction.clone(),
                                format!(
                                    "{from}.{source_col} = {junction}.{}",
                                    conv.foreign_key(from)
                                ),
                            ),
                            (
                                target.clone(),
                                format!(
                                    "{junction}.{} = {target}.{target_col}",
                                    conv.foreign_key(target)
                                ),
                            ),
                        ])
                    }
                    Some(IndirectOverride::Manual {
                        junction,
                        on_source,
                        on_target,
                    }) => Ok(vec![
                        (
                            non_empty(junction, "junction table", target)?,
                            non_empty(on_source, "source ON predicate", target)?,
                        ),
                        (
                            target.clone(),
                            non_empty(on_target, "target ON predicate", target)?,
                        ),
                    ]),
                }
            }
        }
    }
}

fn single_pair<'a>(columns: &'a AliasMap, target: &str) -> QueryResult<(&'a str, &'a str)> {
    if columns.len() != 1 {
        return Err(QueryError::InvalidJoinSpec(format!(
            "join to '{target}' expects exactly one column pair, got {}",
            columns.len()
        )));
    }
    match columns.first() {
        Some((source, dest)) if !source.trim().is_empty() && !dest.trim().is_empty() => {
            Ok((source.as_str(), dest.as_str()))
        }
        _ => Err(QueryError::InvalidJoinSpec(format!(
            "join to '{target}' has an empty column name"
        ))),
    }
}

fn non_empty(text: &str, what: &str, target: &str) -> QueryResult<String> {
    if text.trim().is_empty() {
        Err(QueryError::InvalidJoinSpec(format!(
            "join to '{target}' has an empty {what}"
        )))
    } else {
        Ok(text.to_string())
    }
}

/// Flattens a join tree breadth-first.
///
/// Every join of one level is visited before any join of the next; within a
/// level, declaration order is kept.
pub fn flatten(joins: &[Join]) -> Vec<&Join> {
    let mut visited: Vec<&Join> = Vec::new();
    let mut level: Vec<&Join> = joins.iter().collect();

    while !level.is_empty() {
        let next: Vec<&Join> = level.iter().flat_map(|j| j.joins.iter()).collect();
        visited.extend(level);
        level = next;
    }

    visited
}

/// Everything a flattened join tree contributes to the parent query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinContribution {
    /// Qualified column → select alias.
    pub fields: AliasMap,
    /// Join conditions, in traversal order.
    pub conditions: Vec<Condition>,
    /// Table → ON predicate, in first-declaration order.
    pub clauses: IndexMap<String, String>,
}

impl JoinContribution {
    /// Collects fields, conditions, and compiled clauses of every join in the
    /// tree rooted at `joins`.
    ///
    /// Later joins overwrite earlier entries that share a qualified field
    /// name or a table name.
    ///
    /// # Errors
    ///
    /// Propagates the first qualification or compilation error; nothing is
    /// returned partially.
    pub fn collect(joins: &[Join]) -> QueryResult<Self> {
        let mut out = Self::default();

        for join in flatten(joins) {
            let overwritten = join
                .selected_fields()?
                .into_iter()
                .filter_map(|(column, alias)| out.fields.insert(column, alias))
                .count();
            if overwritten > 0 {
                tracing::warn!(
                    target_table = join.target(),
                    overwritten,
                    "join fields replaced earlier selections"
                );
            }

            out.conditions.extend(join.conditions()?);

            for (table, on) in join.compile()? {
                if let Some(previous) = out.clauses.insert(table.clone(), on) {
                    tracing::warn!(table = %table, previous = %previous, "join clause replaced");
                }
            }
        }

        Ok(out)
    }
}
