use schemadump_core::{DatabaseSchema, DumpConfig, DumpFormat, EmissionOrder, Schema};

#[test]
fn serializes_schema_deterministically() {
    let schema = DatabaseSchema {
        schema_version: "0.1".to_string(),
        engine: "postgres".to_string(),
        database: Some("db".to_string()),
        schemas: vec![Schema {
            name: "public".to_string(),
            tables: Vec::new(),
        }],
        fingerprint: None,
    };

    let json = serde_json::to_string_pretty(&schema).expect("serialize schema");
    let expected = r#"{
  "schema_version": "0.1",
  "engine": "postgres",
  "database": "db",
  "schemas": [
    {
      "name": "public",
      "tables": []
    }
  ],
  "fingerprint": null
}"#;
    assert_eq!(json, expected);
}

#[test]
fn foreign_key_defaults_apply_when_omitted() {
    let json = r#"{
  "schema_version": "0.1",
  "engine": "postgres",
  "database": null,
  "schemas": [
    {
      "name": "public",
      "tables": [
        {
          "name": "orders",
          "kind": "table",
          "columns": [
            { "name": "user_id", "data_type": "bigint", "is_nullable": false }
          ],
          "constraints": [
            {
              "kind": "foreign_key",
              "name": "orders_user_fk",
              "columns": ["user_id"],
              "referenced_schema": "public",
              "referenced_table": "users",
              "referenced_columns": ["id"],
              "on_delete": "cascade"
            }
          ]
        }
      ]
    }
  ]
}"#;

    let schema: DatabaseSchema = serde_json::from_str(json).expect("parse schema");
    let table = schema.find_table("public", "orders").expect("orders");
    let fk = table.foreign_keys().next().expect("foreign key");
    assert_eq!(fk.on_delete, schemadump_core::FkAction::Cascade);
    assert_eq!(fk.on_update, schemadump_core::FkAction::NoAction);
    assert_eq!(fk.deferrable, schemadump_core::Deferrable::NotDeferrable);
}

#[test]
fn config_parses_from_toml() {
    let config = DumpConfig::from_toml(
        r#"
order = "alphabetical"
format = "json"
ignore_tables = ["schema_migrations", "audit.*", "tmp_*"]
infer_references = true

[naming]
table_prefix = "app_"
"#,
    )
    .expect("parse config");

    assert_eq!(config.order, EmissionOrder::Alphabetical);
    assert_eq!(config.format, DumpFormat::Json);
    assert!(config.infer_references);
    assert_eq!(config.naming.table_prefix, "app_");
    assert_eq!(config.naming.table_suffix, "");
    assert!(config.is_ignored("public", "schema_migrations"));
    assert!(config.is_ignored("audit", "events"));
    assert!(config.is_ignored("public", "tmp_import"));
    assert!(!config.is_ignored("public", "users"));
}

#[test]
fn config_rejects_catch_all_pattern() {
    let err = DumpConfig::from_toml(r#"ignore_tables = ["*"]"#).expect_err("catch-all");
    assert!(err.to_string().contains("every table"));

    let err = DumpConfig::from_toml(r#"ignore_tables = ["a*b"]"#).expect_err("inner star");
    assert!(err.to_string().contains("only end with"));
}

#[test]
fn empty_config_uses_defaults() {
    let config = DumpConfig::from_toml("").expect("parse config");
    assert_eq!(config, DumpConfig::default());
    assert_eq!(config.order, EmissionOrder::Topological);
    assert_eq!(config.format, DumpFormat::Sql);
}

#[test]
fn sql_output_requires_topological_order() {
    let err = DumpConfig::from_toml(
        r#"
order = "alphabetical"
format = "sql"
"#,
    )
    .expect_err("sql with alphabetical order");
    assert!(err.to_string().contains("requires topological order"));

    let config = DumpConfig::from_toml(r#"order = "alphabetical""#);
    assert!(config.is_err(), "sql is the default format");
}
