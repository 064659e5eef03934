//! # native-query-test
//!
//! Testing utilities for native-query. Provides a recording statement sink
//! that captures every clause call, an in-memory cursor serving canned rows,
//! and assertion helpers for the calls a query makes.
//!
//! ## Modules
//!
//! - [`recording`] - [`RecordingSink`], [`SinkCall`], and [`MemoryCursor`]
//! - [`assert_calls`] - [`assert_calls`](assert_calls::assert_calls),
//!   [`assert_num_calls`], and [`assert_no_calls`]

pub mod assert_calls;
pub mod recording;

pub use assert_calls::{assert_calls, assert_no_calls, assert_num_calls};
pub use recording::{MemoryCursor, RecordingSink, SinkCall};
