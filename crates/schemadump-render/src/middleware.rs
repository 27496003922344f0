use std::collections::BTreeSet;

use schemadump_core::{Constraint, SCHEMA_VERSION, infer_foreign_keys, table_key};

use crate::errors::Result;
use crate::pipeline::{DumpEnv, DumpMiddleware};

/// Drops tables matching `ignore_tables` and the foreign keys pointing at them.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreTables;

impl DumpMiddleware for IgnoreTables {
    fn name(&self) -> &str {
        "ignore_tables"
    }

    fn before_plan(&self, env: &mut DumpEnv) -> Result<()> {
        if env.config.ignore_tables.is_empty() {
            return Ok(());
        }

        let mut ignored = BTreeSet::new();
        for db_schema in &mut env.schema.schemas {
            let schema_name = db_schema.name.clone();
            db_schema.tables.retain(|table| {
                let skip = env.config.is_ignored(&schema_name, &table.name);
                if skip {
                    ignored.insert(table_key(&schema_name, &table.name));
                }
                !skip
            });
        }

        if ignored.is_empty() {
            return Ok(());
        }

        let mut dropped = 0usize;
        for db_schema in &mut env.schema.schemas {
            for table in &mut db_schema.tables {
                table.constraints.retain(|constraint| match constraint {
                    Constraint::ForeignKey(fk) => {
                        let keep = !ignored
                            .contains(&table_key(&fk.referenced_schema, &fk.referenced_table));
                        if !keep {
                            dropped += 1;
                        }
                        keep
                    }
                    _ => true,
                });
            }
        }

        tracing::info!(
            event = "tables_ignored",
            tables = ignored.len(),
            foreign_keys_dropped = dropped
        );
        Ok(())
    }
}

/// Adds the foreign keys implied by `*_id` column names when `infer_references` is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferReferences;

impl DumpMiddleware for InferReferences {
    fn name(&self) -> &str {
        "infer_references"
    }

    fn before_plan(&self, env: &mut DumpEnv) -> Result<()> {
        if !env.config.infer_references {
            return Ok(());
        }

        let inferred = infer_foreign_keys(&env.schema, &env.config.naming);
        let count = inferred.len();

        for (owner, fk) in inferred {
            let table = env.schema.schemas.iter_mut().find_map(|db_schema| {
                let schema_name = db_schema.name.clone();
                db_schema
                    .tables
                    .iter_mut()
                    .find(|table| table_key(&schema_name, &table.name) == owner)
            });
            if let Some(table) = table {
                table.constraints.push(Constraint::ForeignKey(fk));
            }
        }

        tracing::info!(event = "references_inferred", foreign_keys = count);
        Ok(())
    }
}

/// Prepends a summary header to the rendered document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpHeader;

impl DumpMiddleware for DumpHeader {
    fn name(&self) -> &str {
        "dump_header"
    }

    fn after_render(&self, env: &mut DumpEnv) -> Result<()> {
        let (Some(plan), Some(document)) = (&env.plan, &mut env.document) else {
            return Ok(());
        };

        let mut lines = vec![
            format!("schemadump snapshot version {SCHEMA_VERSION}"),
            format!(
                "engine: {}, database: {}",
                env.schema.engine,
                env.schema.database.as_deref().unwrap_or("-")
            ),
            format!(
                "tables: {}, inline foreign keys: {}, deferred foreign keys: {}",
                plan.tables.len(),
                plan.inline_count(),
                plan.deferred_count()
            ),
        ];
        lines.append(&mut document.header);
        document.header = lines;
        Ok(())
    }
}
