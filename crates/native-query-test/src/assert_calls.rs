//! Sink call assertions.
//!
//! Provides [`assert_num_calls`], which counts the calls a [`RecordingSink`]
//! receives while a closure runs, and [`assert_calls`], which compares the
//! recorded clause sequence against an expected one.
//!
//! The closure usually needs the sink mutably, so pass a clone as the observer:
//! clones share their recorded state.
//!
//! ## Example
//!
//! ```
//! use native_query_db::query::Query;
//! use native_query_test::assert_calls::assert_num_calls;
//! use native_query_test::recording::RecordingSink;
//!
//! let observer = RecordingSink::new();
//! let mut sink = observer.clone();
//! assert_num_calls(&observer, 2, || {
//!     Query::new("users").build(&mut sink).unwrap();
//! });
//! ```

use crate::recording::{RecordingSink, SinkCall};

/// Asserts that exactly `expected_count` sink calls are made while `f` runs.
///
/// Resets the call counter on `sink` before running the closure.
///
/// # Panics
///
/// Panics if the number of calls does not match `expected_count`.
pub fn assert_num_calls<F>(sink: &RecordingSink, expected_count: usize, f: F)
where
    F: FnOnce(),
{
    sink.reset_call_count();
    f();
    let actual = sink.call_count();
    assert_eq!(
        actual, expected_count,
        "Expected {expected_count} sink calls, but {actual} were made"
    );
}

/// Asserts that `f` makes no sink call at all.
///
/// # Panics
///
/// Panics if any call reaches the sink.
pub fn assert_no_calls<F>(sink: &RecordingSink, f: F)
where
    F: FnOnce(),
{
    assert_num_calls(sink, 0, f);
}

/// Asserts that the clause calls recorded since the last reset equal `expected`.
///
/// # Panics
///
/// Panics with both sequences if they differ.
pub fn assert_calls(sink: &RecordingSink, expected: &[SinkCall]) {
    let actual = sink.clause_calls();
    assert_eq!(
        actual, expected,
        "Sink clause calls differ\nexpected: {expected:#?}\nactual: {actual:#?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use native_query_db::query::Query;

    #[test]
    fn test_assert_num_calls_passes() {
        let observer = RecordingSink::new();
        let mut sink = observer.clone();
        let mut query = Query::new("users");
        query.limit(1);
        assert_num_calls(&observer, 3, || {
            query.build(&mut sink).unwrap();
        });
    }

    #[test]
    fn test_assert_no_calls_passes() {
        let observer = RecordingSink::new();
        assert_no_calls(&observer, || {});
    }

    #[test]
    #[should_panic(expected = "Expected 0 sink calls, but 2 were made")]
    fn test_assert_no_calls_fails() {
        let observer = RecordingSink::new();
        let mut sink = observer.clone();
        assert_no_calls(&observer, || {
            Query::new("users").build(&mut sink).unwrap();
        });
    }

    #[test]
    fn test_counter_resets_between_assertions() {
        let observer = RecordingSink::new();
        let mut sink = observer.clone();
        assert_num_calls(&observer, 2, || {
            Query::new("users").build(&mut sink).unwrap();
        });
        assert_num_calls(&observer, 2, || {
            Query::new("posts").build(&mut sink).unwrap();
        });
    }

    #[test]
    fn test_assert_calls_matches_clauses() {
        let observer = RecordingSink::new();
        let mut sink = observer.clone();
        Query::new("users").build(&mut sink).unwrap();
        assert_calls(&observer, &[SinkCall::From("users".into())]);
    }

    #[test]
    #[should_panic(expected = "Sink clause calls differ")]
    fn test_assert_calls_fails() {
        let observer = RecordingSink::new();
        assert_calls(&observer, &[SinkCall::Asc]);
    }
}
