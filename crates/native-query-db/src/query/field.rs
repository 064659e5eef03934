//! Field specifications and qualification.
//!
//! A [`FieldSpec`] names a column to select: either a bare name, or an alias
//! map of `source -> alias` pairs. [`qualify`] rewrites the source names into
//! table-prefixed references (`users.name`), optionally wrapped in brackets
//! (`[users.name]`) for clauses that take a literal column token.
//!
//! # Examples
//!
//! ```
//! use native_query_db::query::field::{qualify, qualify_name, FieldSpec, Qualified};
//!
//! assert_eq!(qualify_name("title", "posts", false).unwrap(), "posts.title");
//! assert_eq!(qualify_name("title", "posts", true).unwrap(), "[posts.title]");
//!
//! let spec = FieldSpec::alias("title", "headline");
//! match qualify(&spec, "posts", false).unwrap() {
//!     Qualified::Map(map) => {
//!         assert_eq!(map.get(&"posts.title".to_string()), Some(&"headline".to_string()));
//!     }
//!     Qualified::Name(_) => unreachable!(),
//! }
//! ```

use indexmap::IndexMap;
use native_query_core::{QueryError, QueryResult};

/// An ordered `source -> alias` map of column names.
pub type AliasMap = IndexMap<String, String>;

/// A column selection: a bare name or a map of aliased names.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// A bare column name.
    Scalar(String),
    /// Source column names mapped to their select aliases.
    AliasMap(AliasMap),
}

impl FieldSpec {
    /// Creates a bare column spec.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Scalar(name.into())
    }

    /// Creates a single-entry alias map.
    pub fn alias(source: impl Into<String>, alias: impl Into<String>) -> Self {
        let mut map = AliasMap::new();
        map.insert(source.into(), alias.into());
        Self::AliasMap(map)
    }

    /// Creates an alias map from `(source, alias)` pairs.
    pub fn aliases<I, S, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, A)>,
        S: Into<String>,
        A: Into<String>,
    {
        Self::AliasMap(
            pairs
                .into_iter()
                .map(|(s, a)| (s.into(), a.into()))
                .collect(),
        )
    }

    /// Returns `true` for [`FieldSpec::AliasMap`].
    pub const fn is_alias_map(&self) -> bool {
        matches!(self, Self::AliasMap(_))
    }
}

impl From<&str> for FieldSpec {
    fn from(name: &str) -> Self {
        Self::Scalar(name.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(name: String) -> Self {
        Self::Scalar(name)
    }
}

impl From<AliasMap> for FieldSpec {
    fn from(map: AliasMap) -> Self {
        Self::AliasMap(map)
    }
}

impl TryFrom<serde_json::Value> for FieldSpec {
    type Error = QueryError;

    /// Accepts a JSON string (bare name) or an object whose values are all
    /// strings (alias map). Anything else is an [`QueryError::InvalidFieldSpec`].
    fn try_from(value: serde_json::Value) -> QueryResult<Self> {
        match value {
            serde_json::Value::String(name) => Ok(Self::Scalar(name)),
            serde_json::Value::Object(obj) => {
                let mut map = AliasMap::new();
                for (source, alias) in obj {
                    match alias {
                        serde_json::Value::String(alias) => {
                            map.insert(source, alias);
                        }
                        other => {
                            return Err(QueryError::InvalidFieldSpec(format!(
                                "alias for '{source}' must be a string, got {other}"
                            )));
                        }
                    }
                }
                Ok(Self::AliasMap(map))
            }
            other => Err(QueryError::InvalidFieldSpec(format!(
                "expected a field name or an alias map, got {other}"
            ))),
        }
    }
}

/// The result of qualifying a [`FieldSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum Qualified {
    /// A qualified column reference.
    Name(String),
    /// An alias map whose keys have been qualified; values are untouched.
    Map(AliasMap),
}

impl From<Qualified> for FieldSpec {
    fn from(q: Qualified) -> Self {
        match q {
            Qualified::Name(name) => Self::Scalar(name),
            Qualified::Map(map) => Self::AliasMap(map),
        }
    }
}

/// Qualifies a single column name against `table`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidFieldSpec`] if the name or the table is empty.
pub fn qualify_name(name: &str, table: &str, bracketed: bool) -> QueryResult<String> {
    if name.trim().is_empty() {
        return Err(QueryError::InvalidFieldSpec(format!(
            "empty field name for table '{table}'"
        )));
    }
    if table.trim().is_empty() {
        return Err(QueryError::InvalidFieldSpec(format!(
            "field '{name}' has no owning table"
        )));
    }

    let qualified = format!("{table}.{name}");
    Ok(if bracketed {
        format!("[{qualified}]")
    } else {
        qualified
    })
}

/// Qualifies a field spec against `table`.
///
/// Scalars become `"table.field"` (or `"[table.field]"` when `bracketed`).
/// For alias maps every key is qualified the same way and every alias value is
/// kept as is; the map keeps its length and order unless two keys collapse to
/// the same qualified name.
///
/// # Errors
///
/// Returns [`QueryError::InvalidFieldSpec`] for empty names, an empty table, or
/// an empty alias map.
pub fn qualify(spec: &FieldSpec, table: &str, bracketed: bool) -> QueryResult<Qualified> {
    match spec {
        FieldSpec::Scalar(name) => qualify_name(name, table, bracketed).map(Qualified::Name),
        FieldSpec::AliasMap(map) => {
            if map.is_empty() {
                return Err(QueryError::InvalidFieldSpec(format!(
                    "empty alias map for table '{table}'"
                )));
            }
            let mut qualified = AliasMap::new();
            for (source, alias) in map {
                qualified.insert(qualify_name(source, table, bracketed)?, alias.clone());
            }
            Ok(Qualified::Map(qualified))
        }
    }
}
