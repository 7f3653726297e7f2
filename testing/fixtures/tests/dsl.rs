use keyspace::{
    core::{
        Error,
        executor::{ResultSet, Row},
        query::function::FunctionArg,
        range::RangeError,
        statement::Consistency,
        testing::RecordingExecutor,
        value::Value,
    },
    prelude::Entity,
};
use keyspace_fixtures::*;
use std::collections::BTreeSet;

const USER_COLUMNS: &str = "id, clust1, clust2, name, email, tags, home, status, owner";

fn select_users(filter: &str) -> String {
    format!("SELECT {USER_COLUMNS} FROM app.users{filter}")
}

fn ada() -> User {
    User {
        id: 7,
        clust1: 1,
        clust2: 2,
        name: "ada".to_string(),
        email: None,
        tags: BTreeSet::from(["admin".to_string()]),
        home: Some(Address {
            city: "London".to_string(),
            zip: 1815,
        }),
        status: Status::Active,
        owner: None,
    }
}

fn ada_row() -> Row {
    user_row("ACTIVE")
}

fn user_row(status: &str) -> Row {
    Row::default()
        .with("id", Value::BigInt(7))
        .with("clust1", Value::Int(1))
        .with("clust2", Value::Int(2))
        .with("name", Value::Text("ada".to_string()))
        .with("email", Value::Null)
        .with("tags", Value::Set(vec![Value::Text("admin".to_string())]))
        .with(
            "home",
            Value::Udt(vec![
                ("city".to_string(), Value::Text("London".to_string())),
                ("zip".to_string(), Value::Int(1815)),
            ]),
        )
        .with("status", Value::Text(status.to_string()))
}

//
// select
//

#[test]
fn full_key_select_binds_in_key_order() {
    let session = RecordingExecutor::new();
    let statement = UserManager::new(&session)
        .select()
        .id(7)
        .clust1_eq(1)
        .clust2_eq(2)
        .with_consistency(Consistency::LocalQuorum)
        .statement()
        .unwrap();

    assert_eq!(
        statement.cql,
        select_users(" WHERE id = ? AND clust1 = ? AND clust2 = ?")
    );
    assert_eq!(
        statement.encoded_values,
        vec![Value::BigInt(7), Value::Int(1), Value::Int(2)]
    );
    assert_eq!(statement.options.consistency, Some(Consistency::LocalQuorum));
}

#[test]
fn partition_only_select_can_reverse_and_limit() {
    let session = RecordingExecutor::new();
    let statement = UserManager::new(&session)
        .select()
        .id_in(vec![7, 8])
        .with_reversed_order()
        .limit(10)
        .statement()
        .unwrap();

    assert_eq!(
        statement.cql,
        select_users(" WHERE id IN ? ORDER BY clust1 DESC, clust2 DESC LIMIT 10")
    );
    assert_eq!(
        statement.encoded_values,
        vec![Value::List(vec![Value::BigInt(7), Value::BigInt(8)])]
    );
}

#[test]
fn two_sided_slices_need_increasing_bounds() {
    let session = RecordingExecutor::new();
    let users = UserManager::new(&session);

    let statement = users
        .select()
        .id(7)
        .clust1_eq(1)
        .clust2_gt_and_lte(3, 9)
        .statement()
        .unwrap();
    assert_eq!(
        statement.cql,
        select_users(" WHERE id = ? AND clust1 = ? AND clust2 > ? AND clust2 <= ?")
    );

    let err = users
        .select()
        .id(7)
        .clust1_eq(1)
        .clust2_gte_and_lt(9, 3)
        .get_list()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Range(RangeError::NonMonotonicBound { position: 2 })
    ));
    assert!(session.executed().is_empty());
}

#[test]
fn descending_clustering_renders_its_natural_order() {
    let session = RecordingExecutor::new();
    let readings = ReadingManager::new(&session);

    let statement = readings
        .select()
        .id(1)
        .clust1_eq("a".to_string())
        .clust2_gt_and_lt(3, 9)
        .with_natural_order()
        .statement()
        .unwrap();
    assert_eq!(
        statement.cql,
        "SELECT id, clust1, clust2, value FROM app.readings \
         WHERE id = ? AND clust1 = ? AND clust2 > ? AND clust2 < ? \
         ORDER BY clust1 ASC, clust2 DESC"
    );
    assert_eq!(
        statement.encoded_values,
        vec![
            Value::BigInt(1),
            Value::Text("a".to_string()),
            Value::Int(3),
            Value::Int(9)
        ]
    );

    let reversed = readings
        .select()
        .id(1)
        .with_reversed_order()
        .statement()
        .unwrap();
    assert!(reversed.cql.ends_with("ORDER BY clust1 DESC, clust2 ASC"));

    // bounds compare by value, whatever the clustering direction
    let err = readings
        .select()
        .id(1)
        .clust1_eq("a".to_string())
        .clust2_gt_and_lt(9, 3)
        .statement()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Range(RangeError::NonMonotonicBound { position: 2 })
    ));
}

#[test]
fn rows_decode_into_entities() {
    let session = RecordingExecutor::new().with_response(ResultSet::new(vec![ada_row()]));
    let users = UserManager::new(&session)
        .select()
        .id(7)
        .get_list()
        .unwrap();

    assert_eq!(users, vec![ada()]);
    assert_eq!(session.prepared(), vec![select_users(" WHERE id = ?")]);
}

#[test]
fn undecodable_columns_name_the_column() {
    let session =
        RecordingExecutor::new().with_response(ResultSet::new(vec![user_row("RETIRED")]));

    let err = UserManager::new(&session)
        .select()
        .id(7)
        .get_one()
        .unwrap_err();

    assert!(matches!(err, Error::ColumnCodec { column: "status", .. }));
}

#[tokio::test]
async fn async_reads_use_the_same_statement() {
    let session = RecordingExecutor::new().with_response(ResultSet::new(vec![ada_row()]));
    let users = UserManager::new(&session)
        .select()
        .id(7)
        .clust1_eq(1)
        .get_list_async()
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(
        session.last_cql(),
        Some(select_users(" WHERE id = ? AND clust1 = ?"))
    );
}

#[test]
fn json_select_reads_the_json_column() {
    let row = Row::default().with("[json]", Value::Text(r#"{"id": 7}"#.to_string()));
    let session = RecordingExecutor::new().with_response(ResultSet::new(vec![row]));

    let json = UserManager::new(&session)
        .select_json()
        .id(7)
        .get_json_one()
        .unwrap();

    assert_eq!(json.as_deref(), Some(r#"{"id": 7}"#));
    assert_eq!(
        session.last_cql(),
        Some(format!("SELECT JSON {USER_COLUMNS} FROM app.users WHERE id = ?"))
    );
}

#[test]
fn function_projections_bind_literals() {
    let session = RecordingExecutor::new();
    let call = FunctionRegistry::score(FunctionArg::column("clust1"));
    let statement = UserManager::new(&session)
        .select()
        .with_function(&call, "score")
        .id(7)
        .statement()
        .unwrap();

    assert_eq!(
        statement.cql,
        format!("SELECT {USER_COLUMNS}, app.score(clust1) AS score FROM app.users WHERE id = ?")
    );
    assert_eq!(FunctionRegistry::SIGNATURES[0].name, "score");
    assert!(FunctionRegistry::SIGNATURES[0].deterministic);
}

//
// slices
//

#[test]
fn slices_bound_the_varying_column() {
    let session = RecordingExecutor::new();
    let statement = UserManager::new(&session)
        .slice(7)
        .from_clusterings(vec![Value::Int(1)])
        .to_clusterings(vec![Value::Int(5)])
        .statement()
        .unwrap();

    assert_eq!(
        statement.cql,
        select_users(" WHERE id = ? AND clust1 >= ? AND clust1 <= ? ORDER BY clust1 ASC, clust2 ASC")
    );
}

#[test]
fn slice_pager_follows_paging_state() {
    let session = RecordingExecutor::new()
        .with_response(ResultSet::new(vec![ada_row()]).with_paging_state(vec![1]))
        .with_response(ResultSet::new(vec![ada_row()]));

    let users = UserManager::new(&session)
        .slice(7)
        .from_clusterings(vec![Value::Int(1)])
        .to_clusterings(vec![Value::Int(5)])
        .pager()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(users.len(), 2);
    let executed = session.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[1].options.paging_state, Some(vec![1]));
    assert_eq!(session.prepared().len(), 1);
}

//
// writes
//

#[test]
fn insert_writes_every_column() {
    let session = RecordingExecutor::new();
    let statement = UserManager::new(&session)
        .insert(&ada())
        .if_not_exists()
        .using_ttl(60)
        .statement()
        .unwrap();

    assert_eq!(
        statement.cql,
        format!(
            "INSERT INTO app.users ({USER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) IF NOT EXISTS USING TTL 60"
        )
    );
    assert_eq!(statement.encoded_values[4], Value::Null);
    assert_eq!(statement.encoded_values[7], Value::Text("ACTIVE".to_string()));
}

#[test]
fn update_assigns_then_keys_then_conditions() {
    let session = RecordingExecutor::new();
    let statement = UserManager::new(&session)
        .update()
        .name_set("grace".to_string())
        .tags_add_to(BTreeSet::from(["ops".to_string()]))
        .id(7)
        .clust1(1)
        .clust2(2)
        .if_name_eq("ada".to_string())
        .statement()
        .unwrap();

    assert_eq!(
        statement.cql,
        "UPDATE app.users SET name = ?, tags = tags + ? WHERE id = ? AND clust1 = ? AND clust2 = ? IF name = ?"
    );
    assert_eq!(statement.placeholder_count(), statement.encoded_values.len());
}

#[test]
fn if_exists_update_binds_only_its_placeholders() {
    let session = RecordingExecutor::new();
    let statement = UserManager::new(&session)
        .update()
        .name_set("grace".to_string())
        .id(7)
        .clust1(1)
        .clust2(2)
        .if_exists()
        .with_consistency(Consistency::Quorum)
        .statement()
        .unwrap();

    assert!(statement.cql.ends_with(" IF EXISTS"));
    assert_eq!(statement.placeholder_count(), 4);
    assert_eq!(statement.encoded_values.len(), 4);
}

#[test]
fn lost_conditional_writes_fail() {
    let applied = Row::default()
        .with("[applied]", Value::Boolean(false))
        .with("name", Value::Text("someone".to_string()));
    let session = RecordingExecutor::new().with_response(ResultSet::new(vec![applied]));

    let err = UserManager::new(&session)
        .update()
        .name_set("grace".to_string())
        .id(7)
        .clust1(1)
        .clust2(2)
        .if_exists()
        .execute()
        .unwrap_err();

    assert!(err.is_lwt_not_applied());
}

#[test]
fn static_writes_address_the_partition() {
    let session = RecordingExecutor::new();
    let users = UserManager::new(&session);

    let update = users
        .update_static()
        .owner_set("ops".to_string())
        .id(7)
        .statement()
        .unwrap();
    assert_eq!(update.cql, "UPDATE app.users SET owner = ? WHERE id = ?");

    let delete = users.delete_static().id(7).statement().unwrap();
    assert_eq!(delete.cql, "DELETE owner FROM app.users WHERE id = ?");
}

#[test]
fn deletes_may_stop_at_a_clustering_prefix() {
    let session = RecordingExecutor::new();
    let users = UserManager::new(&session);

    users.delete().id(7).execute().unwrap();
    users.delete().id(7).clust1_eq(1).using_timestamp(42).execute().unwrap();

    let executed = session
        .executed()
        .into_iter()
        .map(|statement| statement.cql)
        .collect::<Vec<_>>();
    assert_eq!(
        executed,
        vec![
            "DELETE FROM app.users WHERE id = ?".to_string(),
            "DELETE FROM app.users USING TIMESTAMP 42 WHERE id = ? AND clust1 = ?".to_string(),
        ]
    );
}

#[test]
fn counters_increment() {
    let session = RecordingExecutor::new();
    let statement = PageHitsManager::new(&session)
        .update()
        .hits_incr(3)
        .page("home".to_string())
        .statement()
        .unwrap();

    assert_eq!(statement.cql, "UPDATE app.page_hits SET hits = hits + ? WHERE page = ?");
    assert_eq!(statement.encoded_values[0], Value::BigInt(3));
}

//
// indexes and views
//

#[test]
fn index_relations_combine() {
    let session = RecordingExecutor::new();
    let users = UserManager::new(&session);

    let statement = users
        .index_select()
        .email_contains_text("ada")
        .tags_contains("admin".to_string())
        .statement()
        .unwrap();
    assert_eq!(
        statement.cql,
        select_users(" WHERE email LIKE ? AND tags CONTAINS ?")
    );
    assert_eq!(
        statement.encoded_values,
        vec![
            Value::Text("%ada%".to_string()),
            Value::Text("admin".to_string())
        ]
    );

    let filtered = users
        .index_select()
        .email_starts_with("ad")
        .allow_filtering()
        .statement()
        .unwrap();
    assert!(filtered.cql.ends_with("WHERE email LIKE ? ALLOW FILTERING"));
}

#[test]
fn views_read_through_their_own_key() {
    let session = RecordingExecutor::new();
    let statement = UserByNameManager::new(&session)
        .select()
        .name("ada".to_string())
        .id_eq(7)
        .statement()
        .unwrap();

    assert_eq!(
        statement.cql,
        "SELECT name, id, clust1, clust2, tags, home FROM app.user_by_name WHERE name = ? AND id = ?"
    );
    assert_eq!(UserByName::TABLE, "user_by_name");
}

#[test]
fn schema_statements_create_types_first() {
    assert!(SCHEMA_STATEMENTS[0].starts_with("CREATE TYPE IF NOT EXISTS app.address"));
    assert!(
        SCHEMA_STATEMENTS
            .iter()
            .any(|cql| cql.starts_with("CREATE MATERIALIZED VIEW"))
    );
    assert!(UserManager::schema_statements()[0].starts_with("CREATE TABLE IF NOT EXISTS app.users"));
}
