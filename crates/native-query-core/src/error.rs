//! Core error types for native-query.
//!
//! This module provides the single error enum [`QueryError`] used by every
//! crate in the workspace, along with the [`QueryResult`] alias. Builder
//! misuse (malformed field or join specifications), resource misuse on result
//! sets, typed row access, configuration loading, and opaque failures raised by
//! the external statement sink all surface through it.

use thiserror::Error;

/// The boxed error type carried by [`QueryError::Sink`].
pub type BoxedSinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The primary error type for native-query.
///
/// All errors are synchronous and raised at the point of detection; nothing is
/// deferred or batched.
#[derive(Error, Debug)]
pub enum QueryError {
    // ── Builder errors ───────────────────────────────────────────────

    /// A field specification is neither a scalar identifier nor an alias map.
    #[error("Invalid field specification: {0}")]
    InvalidFieldSpec(String),

    /// A direct or indirect join override does not match a recognized shape.
    #[error("Invalid join specification: {0}")]
    InvalidJoinSpec(String),

    // ── Sink errors ──────────────────────────────────────────────────

    /// A failure raised by the external statement sink, propagated unchanged.
    #[error(transparent)]
    Sink(BoxedSinkError),

    // ── Result errors ────────────────────────────────────────────────

    /// A result set was used after its sink handle was released.
    #[error("Result set has already been released")]
    AlreadyReleased,

    /// A typed row accessor named a column the row does not carry.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A stored value could not be converted to the requested type.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl QueryError {
    /// Wraps any error raised by a sink implementation.
    pub fn sink(err: impl Into<BoxedSinkError>) -> Self {
        Self::Sink(err.into())
    }

    /// Returns `true` for errors caused by malformed builder input.
    pub const fn is_spec_error(&self) -> bool {
        matches!(self, Self::InvalidFieldSpec(_) | Self::InvalidJoinSpec(_))
    }
}

/// A convenience type alias for `Result<T, QueryError>`.
pub type QueryResult<T> = Result<T, QueryError>;
