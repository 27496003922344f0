use schemadump_core::{
    Column, Constraint, DatabaseSchema, Deferrable, DumpConfig, FkAction, ForeignKey, Schema,
    Table, TableKind, collect_edges, plan_dump,
};

fn column(name: &str) -> Column {
    Column {
        name: name.to_string(),
        data_type: "bigint".to_string(),
        is_nullable: false,
        default: None,
        comment: None,
    }
}

fn fk(name: &str, column: &str, table: &str) -> Constraint {
    Constraint::ForeignKey(ForeignKey {
        name: Some(name.to_string()),
        columns: vec![column.to_string()],
        referenced_schema: "public".to_string(),
        referenced_table: table.to_string(),
        referenced_columns: vec!["id".to_string()],
        on_update: FkAction::NoAction,
        on_delete: FkAction::NoAction,
        deferrable: Deferrable::InitiallyDeferred,
    })
}

fn table(name: &str, columns: &[&str], constraints: Vec<Constraint>) -> Table {
    Table {
        name: name.to_string(),
        kind: TableKind::Table,
        comment: None,
        columns: columns.iter().map(|name| column(name)).collect(),
        constraints,
    }
}

fn cyclic_schema(tables: Vec<Table>) -> DatabaseSchema {
    DatabaseSchema {
        schema_version: "0.1".to_string(),
        engine: "postgres".to_string(),
        database: Some("shop".to_string()),
        schemas: vec![Schema {
            name: "public".to_string(),
            tables,
        }],
        fingerprint: None,
    }
}

fn shop_tables() -> Vec<Table> {
    vec![
        table(
            "users",
            &["id", "default_address_id"],
            vec![fk("users_default_address_fk", "default_address_id", "addresses")],
        ),
        table(
            "addresses",
            &["id", "user_id"],
            vec![fk("addresses_user_fk", "user_id", "users")],
        ),
        table(
            "categories",
            &["id", "parent_id"],
            vec![fk("categories_parent_fk", "parent_id", "categories")],
        ),
        table(
            "products",
            &["id", "category_id"],
            vec![fk("products_category_fk", "category_id", "categories")],
        ),
    ]
}

#[test]
fn plans_schema_with_cycle_and_self_reference() {
    let schema = cyclic_schema(shop_tables());
    let plan = plan_dump(&schema, &DumpConfig::default()).expect("plan");

    assert_eq!(plan.deferred_count(), 1);
    let deferred = plan.deferred_for("public.users");
    assert_eq!(deferred.len(), 1);
    assert_eq!(deferred[0].from_table, "public.addresses");
    assert_eq!(deferred[0].name.as_deref(), Some("addresses_user_fk"));

    assert_eq!(plan.inline_for("public.categories").len(), 1);
    assert!(plan.inline_for("public.categories")[0].is_self_reference());
    assert_eq!(
        plan.tables,
        vec![
            "public.addresses",
            "public.categories",
            "public.products",
            "public.users",
        ]
    );
    assert_eq!(plan.inline_count() + plan.deferred_count(), collect_edges(&schema).len());
}

#[test]
fn plan_ignores_table_order_in_catalog() {
    let forward = cyclic_schema(shop_tables());
    let reversed = cyclic_schema(shop_tables().into_iter().rev().collect());

    let config = DumpConfig::default();
    assert_eq!(
        plan_dump(&forward, &config).expect("plan"),
        plan_dump(&reversed, &config).expect("plan")
    );
}

#[test]
fn colliding_qualified_keys_are_rejected() {
    let mut schema = cyclic_schema(Vec::new());
    schema.schemas = vec![
        Schema {
            name: "a.b".to_string(),
            tables: vec![table("c", &["id"], Vec::new())],
        },
        Schema {
            name: "a".to_string(),
            tables: vec![table("b.c", &["id"], Vec::new())],
        },
    ];

    let err = plan_dump(&schema, &DumpConfig::default()).expect_err("ambiguous key");
    assert!(matches!(
        err,
        schemadump_core::Error::InvalidSchema(message) if message.contains("a.b.c")
    ));
}
