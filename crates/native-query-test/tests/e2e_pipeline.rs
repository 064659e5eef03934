//! End-to-end pipeline tests for native-query.
//!
//! These tests exercise the COMPLETE path:
//!   builder calls -> join flattening -> qualification -> clause replay -> sink -> result set
//!
//! They drive queries into a `RecordingSink` and check the exact calls it
//! received, then read canned rows back through `ResultSet` and `Row`.

use native_query_core::{QueryError, Settings};
use native_query_db::query::{
    Condition, DirectOverride, FieldSpec, IndirectOverride, Query,
};
use native_query_db::row::Record;
use native_query_db::sink::StatementSink;
use native_query_db::value::Value;
use native_query_db::{Assoc, Model, SqlSink};
use native_query_test::{assert_calls, assert_no_calls, assert_num_calls, RecordingSink, SinkCall};

fn join(table: &str, on: &str) -> SinkCall {
    SinkCall::Join {
        table: table.to_string(),
        on: on.to_string(),
    }
}

fn users() -> Vec<Record> {
    vec![
        Record::from_pairs([
            ("id", Value::Int(1)),
            ("name", Value::from("ann")),
            ("posts_title", Value::from("hello")),
        ]),
        Record::from_pairs([
            ("id", Value::Int(2)),
            ("name", Value::from("bob")),
            ("posts_title", Value::from("world")),
        ]),
    ]
}

// ============================================================================
// Clause emission
// ============================================================================

/// 1. A symbolic condition on a join-less query reaches the sink untouched.
#[test]
fn test_filter_without_joins_is_unchanged() {
    let observer = RecordingSink::new();
    let mut sink = observer.clone();

    let mut query = Query::new("users");
    query.filter(Condition::try_from(serde_json::json!({"id": 5})).unwrap());
    query.build(&mut sink).unwrap();

    assert_calls(
        &observer,
        &[
            SinkCall::From("users".into()),
            SinkCall::Where(Condition::eq("id", 5)),
        ],
    );
}

/// 2. A direct join contributes aliased fields and a conventional predicate.
#[test]
fn test_direct_join_select_from_and_join() {
    let observer = RecordingSink::new();
    let mut sink = observer.clone();

    let mut query = Query::new("users");
    query.join("posts", |posts| {
        posts.fields(["title"]);
    });
    query.build(&mut sink).unwrap();

    assert_calls(
        &observer,
        &[
            SinkCall::Select(vec![FieldSpec::alias("posts.title", "posts_title")]),
            SinkCall::From("users".into()),
            join("posts", "users.id = posts.users_id"),
        ],
    );
}

/// 3. An indirect join emits the junction clause before the target clause.
#[test]
fn test_indirect_join_through_junction() {
    let observer = RecordingSink::new();
    let mut sink = observer.clone();

    let mut query = Query::new("users");
    query.fields(["name"]).join("roles", |roles| {
        roles.indirect();
    });
    query.build(&mut sink).unwrap();

    assert_calls(
        &observer,
        &[
            SinkCall::Select(vec![FieldSpec::name("users.name")]),
            SinkCall::From("users".into()),
            join("users_roles", "users.id = users_roles.users_id"),
            join("roles", "users_roles.roles_id = roles.id"),
        ],
    );
}

/// 4. Backwards and manual overrides compile into the expected predicates.
#[test]
fn test_overrides() {
    let observer = RecordingSink::new();
    let mut sink = observer.clone();

    let mut query = Query::new("posts");
    query
        .join("authors", |a| {
            a.backwards();
        })
        .join("tags", |t| {
            t.indirect_with(IndirectOverride::semi("taggings", "uid", "code"));
        })
        .join("comments", |c| {
            c.direct_with(("uid", "post_uid"));
        });
    query.build(&mut sink).unwrap();

    assert_calls(
        &observer,
        &[
            SinkCall::From("posts".into()),
            join("authors", "posts.authors_id = authors.id"),
            join("taggings", "posts.uid = taggings.posts_id"),
            join("tags", "taggings.tags_id = tags.code"),
            join("comments", "posts.uid = comments.post_uid"),
        ],
    );
}

/// 5. Two-level nesting flattens breadth-first and keeps every contribution.
#[test]
fn test_nested_joins_flatten_breadth_first() {
    let observer = RecordingSink::new();
    let mut sink = observer.clone();

    let mut query = Query::new("users");
    query
        .join("posts", |posts| {
            posts
                .fields(["title"])
                .filter(Condition::eq("draft", false))
                .join("comments", |comments| {
                    comments.fields(["body"]).filter(Condition::raw("comments.score > 0"));
                });
        })
        .join_with("profiles", ["bio"], |_| {})
        .filter(Condition::eq("active", true));
    query.build(&mut sink).unwrap();

    let mut joined = FieldSpec::alias("posts.title", "posts_title");
    if let FieldSpec::AliasMap(map) = &mut joined {
        map.insert("profiles.bio".into(), "profiles_bio".into());
        map.insert("comments.body".into(), "comments_body".into());
    }

    assert_calls(
        &observer,
        &[
            SinkCall::Select(vec![joined]),
            SinkCall::From("users".into()),
            join("posts", "users.id = posts.users_id"),
            join("profiles", "users.id = profiles.users_id"),
            join("comments", "posts.id = comments.posts_id"),
            SinkCall::Where(Condition::literals([("posts.draft", false)])),
            SinkCall::Where(Condition::raw("comments.score > 0")),
            SinkCall::Where(Condition::literals([("users.active", true)])),
        ],
    );
}

/// 6. Ordering, grouping, having, and paging follow the join clauses.
#[test]
fn test_tail_clauses() {
    let observer = RecordingSink::new();
    let mut sink = observer.clone();

    let mut query = Query::new("users");
    query
        .group("team")
        .having(Condition::template("COUNT(*) > ?", [1]))
        .desc()
        .order("name")
        .order_column("teams", "rank")
        .limit(10)
        .offset(5);
    query.build(&mut sink).unwrap();

    assert_calls(
        &observer,
        &[
            SinkCall::From("users".into()),
            SinkCall::Having(Condition::template("COUNT(*) > ?", [1])),
            SinkCall::GroupBy("[users.team]".into()),
            SinkCall::Desc,
            SinkCall::OrderBy("[users.name]".into()),
            SinkCall::OrderBy("[teams.rank]".into()),
            SinkCall::Limit(10),
            SinkCall::Offset(5),
        ],
    );
}

// ============================================================================
// Failure before emission
// ============================================================================

/// 7. A malformed direct override fails without a single sink call.
#[test]
fn test_malformed_override_makes_no_calls() {
    let observer = RecordingSink::new();
    let mut sink = observer.clone();

    let spec = DirectOverride::try_from(serde_json::json!({"a": "b", "c": "d"})).unwrap();
    let mut query = Query::new("users");
    query.fields(["name"]).join("posts", |p| {
        p.direct_with(spec);
    });

    assert_no_calls(&observer, || {
        assert!(matches!(query.build(&mut sink), Err(QueryError::InvalidJoinSpec(_))));
        assert!(matches!(query.execute(&mut sink), Err(QueryError::InvalidJoinSpec(_))));
    });
}

/// 8. A JSON override with the wrong shape is rejected at conversion time.
#[test]
fn test_malformed_json_override() {
    assert!(matches!(
        DirectOverride::try_from(serde_json::json!(42)),
        Err(QueryError::InvalidJoinSpec(_))
    ));
    assert!(matches!(
        IndirectOverride::try_from(serde_json::json!(["junction"])),
        Err(QueryError::InvalidJoinSpec(_))
    ));
}

/// 9. An empty field name in a joined query is an invalid field spec.
#[test]
fn test_invalid_field_makes_no_calls() {
    let observer = RecordingSink::new();
    let mut sink = observer.clone();

    let mut query = Query::new("users");
    query.join("posts", |p| {
        p.fields([""]);
    });

    assert_no_calls(&observer, || {
        assert!(matches!(query.build(&mut sink), Err(QueryError::InvalidFieldSpec(_))));
    });
}

// ============================================================================
// build / execute consistency
// ============================================================================

/// 10. build() and execute() replay the same clause sequence.
#[test]
fn test_build_and_execute_replay_identically() {
    let observer = RecordingSink::new().with_rows(users());
    let mut sink = observer.clone();

    let mut query = Query::new("users");
    query
        .fields(["id", "name"])
        .join("posts", |p| {
            p.fields(["title"]);
        })
        .filter(Condition::eq("id", 1))
        .asc()
        .order("name");

    query.build(&mut sink).unwrap();
    let built = observer.clause_calls();
    assert_eq!(observer.calls().last(), Some(&SinkCall::Build));

    let _result = query.execute(&mut sink).unwrap();
    let executed = observer.clause_calls();
    assert_eq!(observer.calls().last(), Some(&SinkCall::Execute));

    assert_eq!(built, executed);
    assert_eq!(query.build(&mut sink).unwrap(), query.build(&mut sink).unwrap());
}

/// 11. Each replay makes exactly one call per clause plus the terminal call.
#[test]
fn test_call_count_per_replay() {
    let observer = RecordingSink::new();
    let mut sink = observer.clone();

    let mut query = Query::new("users");
    query.fields(["id"]).join("roles", |r| {
        r.indirect();
    });

    // select, from, two joins, build
    assert_num_calls(&observer, 5, || {
        query.build(&mut sink).unwrap();
    });
}

// ============================================================================
// Results
// ============================================================================

/// 12. Rows come back through the result set and release the cursor once.
#[test]
fn test_execute_reads_rows() {
    let observer = RecordingSink::new().with_rows(users());
    let mut sink = observer.clone();

    let mut query = Query::new("users");
    query.fields(["id", "name"]).join("posts", |p| {
        p.fields(["title"]);
    });

    let mut result = query.execute(&mut sink).unwrap();
    assert_eq!(result.count().unwrap(), 2);

    let first = result.one().unwrap();
    assert!(first.any());
    assert_eq!(first.get::<String>("posts_title").unwrap(), "hello");
    assert!(first.get_value("missing").is_none());

    let rest = result.map(|row| row.get::<i64>("id").unwrap()).unwrap();
    assert_eq!(rest, vec![2]);
    assert_eq!(observer.free_count(), 1);

    assert!(matches!(result.one(), Err(QueryError::AlreadyReleased)));
    assert!(matches!(result.free(), Err(QueryError::AlreadyReleased)));
}

/// 13. single(), assoc(), and the empty row.
#[test]
fn test_single_assoc_and_empty_row() {
    let mut sink = RecordingSink::new().with_rows(users());
    let query = Query::new("users");

    let mut result = query.execute(&mut sink).unwrap();
    assert_eq!(result.single().unwrap(), Some(Value::Int(1)));

    let mut result = query.execute(&mut sink).unwrap();
    let by_name = result.assoc(&["name"]).unwrap();
    assert_eq!(by_name.len(), 2);
    let bob = by_name.get("bob").and_then(Assoc::as_row).unwrap();
    assert_eq!(bob.get::<i64>("id").unwrap(), 2);

    let mut empty = RecordingSink::new();
    let mut result = query.execute(&mut empty).unwrap();
    let row = result.one().unwrap();
    assert!(!row.any());
    assert!(row.to_map().is_empty());
    assert_eq!(result.single().unwrap(), None);
}

/// 14. Dropping an unread result set frees the cursor.
#[test]
fn test_drop_releases_cursor() {
    let observer = RecordingSink::new().with_rows(users());
    let mut sink = observer.clone();
    {
        let _result = Query::new("users").execute(&mut sink).unwrap();
    }
    assert_eq!(observer.free_count(), 1);
}

/// 15. Sink errors propagate unchanged.
#[test]
fn test_sink_error_propagates() {
    let mut sink = RecordingSink::new().failing_execute("connection lost");
    let err = Query::new("users").execute(&mut sink).err().unwrap();
    assert!(matches!(err, QueryError::Sink(_)));
    assert_eq!(err.to_string(), "connection lost");
}

// ============================================================================
// Model
// ============================================================================

/// 16. A model opens queries with its conventions and runs them on a lazy sink.
#[test]
fn test_model_round_trip() {
    let observer = RecordingSink::new().with_rows(users());
    let factory_sink = observer.clone();
    let mut model = Model::new(&Settings::default(), move || {
        Ok(Box::new(factory_sink.clone()) as Box<dyn StatementSink>)
    });

    let query = model.query("users", |q| {
        q.fields(["id"]).join("posts", |p| {
            p.fields(["title"]);
        });
    });
    let mut result = model.execute(&query).unwrap();
    assert_eq!(result.all().unwrap().len(), 2);

    assert_calls(
        &observer,
        &[
            SinkCall::Select(vec![FieldSpec::name("users.id")]),
            SinkCall::Select(vec![FieldSpec::alias("posts.title", "posts_title")]),
            SinkCall::From("users".into()),
            join("posts", "users.id = posts.users_id"),
        ],
    );
}

/// 17. The SQL reference sink renders the same query as text.
#[test]
fn test_sql_preview() {
    let mut sink = SqlSink::new();
    let mut query = Query::new("users");
    query
        .fields(["name"])
        .join("roles", |r| {
            r.indirect().fields([FieldSpec::alias("name", "role")]);
        })
        .filter(Condition::eq("id", 5));

    assert_eq!(
        query.build(&mut sink).unwrap(),
        "SELECT \"users\".\"name\", \"roles\".\"name\" AS \"roles_role\" FROM \"users\" \
         INNER JOIN \"users_roles\" ON users.id = users_roles.users_id \
         INNER JOIN \"roles\" ON users_roles.roles_id = roles.id \
         WHERE \"users\".\"id\" = ?"
    );
    assert_eq!(sink.params(), vec![Value::Int(5)]);
}
