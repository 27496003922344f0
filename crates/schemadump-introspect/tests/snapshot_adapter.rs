use std::path::Path;

use schemadump_core::{Error, TableKind, validate_schema};
use schemadump_introspect::{
    Adapter, IntrospectOptions, JsonSnapshotAdapter, load_snapshot, snapshot_json_schema,
};

fn fixture_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/shop.schema.json")
}

#[tokio::test]
async fn reads_snapshot_file() {
    let adapter = JsonSnapshotAdapter::new(fixture_path());
    assert_eq!(adapter.engine(), "snapshot");

    let schema = adapter
        .introspect(&IntrospectOptions::default())
        .await
        .expect("introspect snapshot");

    validate_schema(&schema).expect("snapshot is consistent");
    assert_eq!(schema.database.as_deref(), Some("shop"));
    assert_eq!(schema.schemas.len(), 2);
    let view = schema
        .find_table("public", "active_users")
        .expect("view kept by default");
    assert_eq!(view.kind, TableKind::View);
}

#[test]
fn options_filter_schemas_kinds_and_comments() {
    let content = std::fs::read_to_string(fixture_path()).expect("read fixture");
    let opts = IntrospectOptions {
        include_views: false,
        include_comments: false,
        schemas: Some(vec!["public".to_string()]),
        ..IntrospectOptions::default()
    };

    let schema = load_snapshot(&content, &opts).expect("load snapshot");

    assert_eq!(schema.schemas.len(), 1);
    assert!(schema.find_table("public", "active_users").is_none());
    let users = schema.find_table("public", "users").expect("users");
    assert!(users.comment.is_none());
    let addresses = schema.find_table("public", "addresses").expect("addresses");
    assert!(addresses.columns.iter().all(|column| column.comment.is_none()));
}

#[test]
fn rejects_documents_that_violate_the_schema() {
    let content = r#"{
  "schema_version": "0.1",
  "engine": "postgres",
  "database": null,
  "schemas": [
    { "name": "public", "tables": [ { "name": "users", "kind": "table", "columns": "id" } ] }
  ]
}"#;

    let err = load_snapshot(content, &IntrospectOptions::default()).expect_err("invalid");
    match err {
        Error::InvalidSchema(message) => {
            assert!(message.contains("snapshot does not match schema"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_malformed_json() {
    let err = load_snapshot("{ not json", &IntrospectOptions::default()).expect_err("invalid");
    assert!(err.to_string().contains("not valid json"));
}

#[tokio::test]
async fn missing_file_is_io_error() {
    let adapter = JsonSnapshotAdapter::new("does/not/exist.json");
    let err = adapter
        .introspect(&IntrospectOptions::default())
        .await
        .expect_err("missing file");
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn json_schema_describes_the_snapshot() {
    let schema = snapshot_json_schema().expect("json schema");
    assert_eq!(schema["title"], "DatabaseSchema");
    assert!(schema["properties"]["schemas"].is_object());
}
