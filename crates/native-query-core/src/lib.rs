//! # native-query-core
//!
//! Foundation types shared by every native-query crate. This crate knows
//! nothing about queries themselves.
//!
//! ## Modules
//!
//! - [`error`] - The [`QueryError`] enum and the [`QueryResult`] alias
//! - [`settings`] - Logging settings and join naming [`Conventions`]
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{BoxedSinkError, QueryError, QueryResult};
pub use settings::{Conventions, Settings};
