use anyhow::{Context, Result, anyhow};
use schemadump_core::{Constraint, Deferrable, DumpConfig, FkAction, TableKind, plan_dump};
use schemadump_introspect::{IntrospectOptions, introspect_postgres_with_options};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, fs, path::Path};

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

async fn run_fixture(pool: &PgPool) -> Result<()> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/sql/cycle.sql");
    let script = fs::read_to_string(&path)
        .with_context(|| format!("reading fixture {}", path.display()))?;

    for statement in script.split(';') {
        let sql = statement.trim();
        if sql.is_empty() {
            continue;
        }

        sqlx::query(sql)
            .execute(pool)
            .await
            .with_context(|| format!("executing fixture statement: {sql}"))?;
    }

    Ok(())
}

#[tokio::test]
async fn introspects_cyclic_schema() -> Result<()> {
    let Some(db_url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL for integration tests");
        return Ok(());
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(&db_url)
        .await
        .context("connecting to Postgres")?;

    run_fixture(&pool).await?;

    let opts = IntrospectOptions {
        schemas: Some(vec!["dumpfx".to_string()]),
        ..IntrospectOptions::default()
    };
    let snapshot = introspect_postgres_with_options(&pool, opts).await?;

    let table_names: Vec<&str> = snapshot.schemas[0]
        .tables
        .iter()
        .map(|table| table.name.as_str())
        .collect();
    assert_eq!(
        table_names,
        vec!["active_users", "addresses", "categories", "users"]
    );

    let view = snapshot
        .find_table("dumpfx", "active_users")
        .ok_or_else(|| anyhow!("expected view"))?;
    assert_eq!(view.kind, TableKind::View);

    let addresses = snapshot
        .find_table("dumpfx", "addresses")
        .ok_or_else(|| anyhow!("expected addresses table"))?;
    let fk = addresses
        .foreign_keys()
        .next()
        .ok_or_else(|| anyhow!("addresses foreign key missing"))?;
    assert_eq!(fk.referenced_table, "users");
    assert_eq!(fk.on_delete, FkAction::Cascade);
    assert_eq!(fk.deferrable, Deferrable::InitiallyDeferred);

    let users = snapshot
        .find_table("dumpfx", "users")
        .ok_or_else(|| anyhow!("expected users table"))?;
    assert!(matches!(users.constraints[0], Constraint::PrimaryKey(_)));
    assert!(
        users
            .constraints
            .iter()
            .any(|constraint| matches!(constraint, Constraint::Unique(_)))
    );

    let plan = plan_dump(&snapshot, &DumpConfig::default())?;
    assert_eq!(plan.deferred_count(), 1);
    assert_eq!(plan.deferred_for("dumpfx.users")[0].from_table, "dumpfx.addresses");

    Ok(())
}
