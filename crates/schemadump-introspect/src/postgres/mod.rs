use sqlx::PgPool;

use schemadump_core::{DatabaseSchema, Result, SCHEMA_VERSION, Schema};

use crate::adapter::Adapter;
use crate::options::IntrospectOptions;

mod mapper;
mod queries;

/// Adapter for PostgreSQL databases.
#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pool: PgPool,
}

impl PostgresAdapter {
    /// Create a new adapter using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Adapter for PostgresAdapter {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn introspect(&self, opts: &IntrospectOptions) -> Result<DatabaseSchema> {
        introspect(&self.pool, opts).await
    }
}

/// Introspect Postgres with default options.
pub async fn introspect_postgres(pool: &PgPool) -> Result<DatabaseSchema> {
    introspect_postgres_with_options(pool, IntrospectOptions::default()).await
}

/// Introspect Postgres with caller-provided options.
pub async fn introspect_postgres_with_options(
    pool: &PgPool,
    opts: IntrospectOptions,
) -> Result<DatabaseSchema> {
    introspect(pool, &opts).await
}

/// Introspect a Postgres database according to the provided options.
pub async fn introspect(pool: &PgPool, opts: &IntrospectOptions) -> Result<DatabaseSchema> {
    let database = queries::fetch_database_name(pool).await?;
    let schemas = mapper::filter_schemas(queries::list_schemas(pool).await?, opts);

    let mut schema_items = Vec::new();

    for schema_name in schemas {
        let raw_tables = queries::list_tables_in_schema(pool, &schema_name).await?;
        let mut tables = mapper::map_tables(raw_tables, opts);

        for table in &mut tables {
            let raw_columns = queries::list_columns(pool, &schema_name, &table.name).await?;
            table.columns = mapper::map_columns(raw_columns, opts);

            let raw_keys = queries::list_key_constraints(pool, &schema_name, &table.name).await?;
            let raw_fks = queries::list_foreign_keys(pool, &schema_name, &table.name).await?;

            let mut constraints = mapper::map_key_constraints(raw_keys);
            constraints.extend(mapper::map_foreign_keys(raw_fks));
            mapper::sort_constraints(&mut constraints);
            table.constraints = constraints;
        }

        tracing::debug!(
            event = "schema_introspected",
            schema = %schema_name,
            tables = tables.len()
        );

        tables.sort_by(|left, right| left.name.cmp(&right.name));
        schema_items.push(Schema {
            name: schema_name,
            tables,
        });
    }

    schema_items.sort_by(|left, right| left.name.cmp(&right.name));

    Ok(DatabaseSchema {
        schema_version: SCHEMA_VERSION.to_string(),
        engine: "postgres".to_string(),
        database: Some(database),
        schemas: schema_items,
        fingerprint: None,
    })
}
