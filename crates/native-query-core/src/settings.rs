//! Settings for native-query.
//!
//! This module provides the [`Settings`] struct, which holds logging
//! configuration and the [`Conventions`] used to derive join predicates when a
//! join carries no manual override. The defaults reproduce the classic
//! `id` / `<table>_id` / `<source>_<target>` naming scheme.

use serde::{Deserialize, Serialize};

/// Naming conventions used to derive join columns and aliases.
///
/// # Examples
///
/// ```
/// use native_query_core::settings::Conventions;
///
/// let c = Conventions::default();
/// assert_eq!(c.foreign_key("users"), "users_id");
/// assert_eq!(c.junction("users", "roles"), "users_roles");
/// assert_eq!(c.join_alias("posts", "title"), "posts_title");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conventions {
    /// The primary key column present on every table.
    pub primary_key: String,
    /// Suffix appended to a table name to form its foreign key column.
    pub foreign_key_suffix: String,
    /// Separator between the two table names of a junction table.
    pub junction_separator: String,
    /// Separator between the joined table name and a field alias.
    pub alias_separator: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            foreign_key_suffix: "_id".to_string(),
            junction_separator: "_".to_string(),
            alias_separator: "_".to_string(),
        }
    }
}

impl Conventions {
    /// Returns the foreign key column referencing `table`.
    pub fn foreign_key(&self, table: &str) -> String {
        format!("{table}{}", self.foreign_key_suffix)
    }

    /// Returns the default junction table name between `source` and `target`.
    pub fn junction(&self, source: &str, target: &str) -> String {
        format!("{source}{}{target}", self.junction_separator)
    }

    /// Returns the select alias for a field loaded through a join on `table`.
    pub fn join_alias(&self, table: &str, alias: &str) -> String {
        format!("{table}{}{alias}", self.alias_separator)
    }
}

/// The complete set of native-query settings.
///
/// # Examples
///
/// ```
/// use native_query_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.debug);
/// assert_eq!(settings.log_level, "info");
/// assert_eq!(settings.conventions.primary_key, "id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    // ── Logging ──────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty, human-readable logs).
    pub debug: bool,
    /// The log level filter (e.g. "info", "debug", "native_query_db=trace").
    pub log_level: String,

    // ── Query building ───────────────────────────────────────────────

    /// Naming conventions for automatic join predicates.
    pub conventions: Conventions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            conventions: Conventions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(!s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.conventions, Conventions::default());
    }

    #[test]
    fn test_default_conventions() {
        let c = Conventions::default();
        assert_eq!(c.primary_key, "id");
        assert_eq!(c.foreign_key("posts"), "posts_id");
        assert_eq!(c.junction("a", "b"), "a_b");
        assert_eq!(c.join_alias("posts", "title"), "posts_title");
    }

    #[test]
    fn test_custom_conventions() {
        let c = Conventions {
            primary_key: "pk".to_string(),
            foreign_key_suffix: "Id".to_string(),
            junction_separator: "__".to_string(),
            alias_separator: ".".to_string(),
        };
        assert_eq!(c.foreign_key("user"), "userId");
        assert_eq!(c.junction("user", "role"), "user__role");
        assert_eq!(c.join_alias("post", "title"), "post.title");
    }

    #[test]
    fn test_settings_serde_roundtrip_keeps_conventions() {
        let mut s = Settings::default();
        s.conventions.primary_key = "uid".to_string();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["conventions"]["primary_key"], "uid");
        let back: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }
}
