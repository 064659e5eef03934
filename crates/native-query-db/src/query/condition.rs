//! Condition specifications and normalization.
//!
//! A [`Condition`] is either a raw predicate string or a positional argument
//! list. Argument lists may carry condition maps whose keys are either
//! symbolic (column names that get qualified once joins are involved) or
//! literal (passed to the sink exactly as written).
//!
//! [`normalize`] rewrites symbolic keys of maps found directly inside an
//! argument list. Maps nested deeper (inside an [`Argument::List`]) are left
//! alone, as are raw strings and plain values.
//!
//! # Examples
//!
//! ```
//! use native_query_db::query::condition::{normalize, Condition};
//!
//! let conditions = vec![
//!     Condition::eq("id", 5),
//!     Condition::raw("deleted_at IS NULL"),
//! ];
//! let normalized = normalize(&conditions, |key| Ok(format!("users.{key}"))).unwrap();
//! assert_eq!(normalized[0], Condition::literals([("users.id", 5)]));
//! assert_eq!(normalized[1], Condition::raw("deleted_at IS NULL"));
//! ```

use crate::value::Value;
use indexmap::IndexMap;
use native_query_core::{QueryError, QueryResult};

/// A key inside a condition map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A column name that is qualified during normalization.
    Symbol(String),
    /// A verbatim key (e.g. an already qualified column or an expression).
    Literal(String),
}

impl Key {
    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Symbol(s) | Self::Literal(s) => s,
        }
    }

    /// Returns `true` for [`Key::Symbol`].
    pub const fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

/// An insertion-ordered `key -> value` map used as a condition argument.
pub type ConditionMap = IndexMap<Key, Value>;

/// One positional argument of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A plain value (template string or bound parameter).
    Value(Value),
    /// A column/value map.
    Map(ConditionMap),
    /// A nested argument list; never normalized.
    List(Vec<Argument>),
}

impl From<Value> for Argument {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

macro_rules! argument_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Argument {
                fn from(v: $ty) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

argument_from_value!(bool, i32, i64, u32, f64, String, &str);

impl From<ConditionMap> for Argument {
    fn from(map: ConditionMap) -> Self {
        Self::Map(map)
    }
}

/// A WHERE or HAVING condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A raw predicate string, emitted verbatim.
    Raw(String),
    /// A positional argument list.
    Args(Vec<Argument>),
}

impl Condition {
    /// Creates a raw predicate.
    pub fn raw(predicate: impl Into<String>) -> Self {
        Self::Raw(predicate.into())
    }

    /// Creates a positional argument list.
    pub fn args<I, A>(args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Argument>,
    {
        Self::Args(args.into_iter().map(Into::into).collect())
    }

    /// Creates a template condition: a predicate with `?` placeholders
    /// followed by the values bound to them.
    pub fn template<I, V>(predicate: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut args = vec![Argument::Value(Value::String(predicate.into()))];
        args.extend(params.into_iter().map(|v| Argument::Value(v.into())));
        Self::Args(args)
    }

    /// Creates `{column: value}` with a symbolic key.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::symbols([(column, value)])
    }

    /// Creates a single map argument whose keys are all symbolic.
    pub fn symbols<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Args(vec![Argument::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (Key::Symbol(k.into()), v.into()))
                .collect(),
        )])
    }

    /// Creates a single map argument whose keys are all literal.
    pub fn literals<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Args(vec![Argument::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (Key::Literal(k.into()), v.into()))
                .collect(),
        )])
    }
}

impl From<&str> for Condition {
    fn from(predicate: &str) -> Self {
        Self::Raw(predicate.to_string())
    }
}

impl From<String> for Condition {
    fn from(predicate: String) -> Self {
        Self::Raw(predicate)
    }
}

impl TryFrom<serde_json::Value> for Condition {
    type Error = QueryError;

    /// Strings become raw predicates, objects become a single symbolic map,
    /// and arrays become argument lists (objects inside them are symbolic maps,
    /// arrays are nested lists, everything else is a plain value).
    fn try_from(value: serde_json::Value) -> QueryResult<Self> {
        match value {
            serde_json::Value::String(s) => Ok(Self::Raw(s)),
            serde_json::Value::Object(obj) => Ok(Self::Args(vec![Argument::Map(json_map(obj))])),
            serde_json::Value::Array(items) => Ok(Self::Args(json_args(items))),
            other => Err(QueryError::InvalidFieldSpec(format!(
                "a condition must be a string, an object, or an array, got {other}"
            ))),
        }
    }
}

fn json_map(obj: serde_json::Map<String, serde_json::Value>) -> ConditionMap {
    obj.into_iter()
        .map(|(k, v)| (Key::Symbol(k), Value::from_json_value(v)))
        .collect()
}

fn json_args(items: Vec<serde_json::Value>) -> Vec<Argument> {
    items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::Object(obj) => Argument::Map(json_map(obj)),
            serde_json::Value::Array(inner) => Argument::List(json_args(inner)),
            other => Argument::Value(Value::from_json_value(other)),
        })
        .collect()
}

/// Rewrites the symbolic keys of every condition map through `qualify`.
///
/// Only maps that are direct elements of an argument list are touched; their
/// literal keys and values are preserved, and every other shape passes
/// through unchanged. The rewritten key becomes a [`Key::Literal`], so
/// normalizing twice never qualifies a key twice.
///
/// # Errors
///
/// Propagates the first error returned by `qualify`.
pub fn normalize<F>(conditions: &[Condition], qualify: F) -> QueryResult<Vec<Condition>>
where
    F: Fn(&str) -> QueryResult<String>,
{
    conditions
        .iter()
        .map(|condition| match condition {
            Condition::Raw(_) => Ok(condition.clone()),
            Condition::Args(args) => args
                .iter()
                .map(|arg| match arg {
                    Argument::Map(map) => normalize_map(map, &qualify).map(Argument::Map),
                    other => Ok(other.clone()),
                })
                .collect::<QueryResult<Vec<_>>>()
                .map(Condition::Args),
        })
        .collect()
}

fn normalize_map<F>(map: &ConditionMap, qualify: &F) -> QueryResult<ConditionMap>
where
    F: Fn(&str) -> QueryResult<String>,
{
    let mut out = ConditionMap::new();
    for (key, value) in map {
        let key = match key {
            Key::Symbol(name) => Key::Literal(qualify(name)?),
            Key::Literal(_) => key.clone(),
        };
        out.insert(key, value.clone());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(key: &str) -> QueryResult<String> {
        Ok(format!("users.{key}"))
    }

    fn first_map(condition: &Condition) -> &ConditionMap {
        match condition {
            Condition::Args(args) => match &args[0] {
                Argument::Map(map) => map,
                other => panic!("expected a map, got {other:?}"),
            },
            Condition::Raw(raw) => panic!("expected args, got raw {raw}"),
        }
    }

    #[test]
    fn test_normalize_rewrites_symbol_keys() {
        let out = normalize(&[Condition::eq("id", 5)], users).unwrap();
        let map = first_map(&out[0]);
        assert_eq!(
            map.get(&Key::Literal("users.id".into())),
            Some(&Value::Int(5))
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_normalize_keeps_raw_strings() {
        let input = vec![Condition::raw("a = 1 OR b = 2")];
        assert_eq!(normalize(&input, users).unwrap(), input);
    }

    #[test]
    fn test_normalize_keeps_literal_keys() {
        let input = vec![Condition::literals([("posts.id", 1)])];
        assert_eq!(normalize(&input, users).unwrap(), input);
    }

    #[test]
    fn test_normalize_mixed_map() {
        let mut map = ConditionMap::new();
        map.insert(Key::Symbol("name".into()), Value::from("ann"));
        map.insert(Key::Literal("COUNT(*)".into()), Value::Int(2));
        let out = normalize(&[Condition::Args(vec![Argument::Map(map)])], users).unwrap();
        let keys: Vec<_> = first_map(&out[0]).keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                Key::Literal("users.name".into()),
                Key::Literal("COUNT(*)".into())
            ]
        );
    }

    #[test]
    fn test_normalize_template_values_untouched() {
        let input = vec![Condition::template("age > ?", [18])];
        assert_eq!(normalize(&input, users).unwrap(), input);
    }

    #[test]
    fn test_normalize_only_one_level_deep() {
        let nested = Argument::List(vec![Argument::Map(
            [(Key::Symbol("id".into()), Value::Int(1))].into_iter().collect(),
        )]);
        let input = vec![Condition::Args(vec![nested])];
        assert_eq!(normalize(&input, users).unwrap(), input);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(&[Condition::eq("id", 1)], users).unwrap();
        let twice = normalize(&once, users).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_propagates_errors() {
        let err = normalize(&[Condition::eq("", 1)], |k| {
            crate::query::field::qualify_name(k, "users", false)
        })
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidFieldSpec(_)));
    }

    #[test]
    fn test_try_from_json() {
        assert_eq!(
            Condition::try_from(serde_json::json!("x > 1")).unwrap(),
            Condition::raw("x > 1")
        );
        assert_eq!(
            Condition::try_from(serde_json::json!({"id": 5})).unwrap(),
            Condition::eq("id", 5)
        );
        assert_eq!(
            Condition::try_from(serde_json::json!(["age > ?", 21])).unwrap(),
            Condition::template("age > ?", [21])
        );
        assert!(Condition::try_from(serde_json::json!(7)).is_err());
    }

    #[test]
    fn test_key_accessors() {
        assert_eq!(Key::Symbol("a".into()).as_str(), "a");
        assert!(Key::Symbol("a".into()).is_symbol());
        assert!(!Key::Literal("a".into()).is_symbol());
    }
}
