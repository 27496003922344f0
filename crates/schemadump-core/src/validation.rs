use std::collections::{BTreeMap, BTreeSet};

use crate::constraints::Constraint;
use crate::error::{Error, Result};
use crate::schema::{DatabaseSchema, table_key};

/// Validate internal consistency of a database schema.
///
/// This checks:
/// - duplicate schemas/tables/columns
/// - schema and table names that join into the same qualified key
/// - primary key and unique columns exist
/// - foreign key columns and referenced targets exist
pub fn validate_schema(schema: &DatabaseSchema) -> Result<()> {
    let mut catalog: BTreeMap<&str, BTreeMap<&str, BTreeSet<&str>>> = BTreeMap::new();
    let mut keys = BTreeSet::new();

    for db_schema in &schema.schemas {
        if catalog.contains_key(db_schema.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate schema name: {}",
                db_schema.name
            )));
        }

        let mut tables = BTreeMap::new();
        for table in &db_schema.tables {
            if tables.contains_key(table.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate table name: {}.{}",
                    db_schema.name, table.name
                )));
            }

            // Dotted identifiers can collide once joined into a qualified key.
            let key = table_key(&db_schema.name, &table.name);
            if !keys.insert(key.clone()) {
                return Err(Error::InvalidSchema(format!("ambiguous table key: {key}")));
            }

            let mut columns = BTreeSet::new();
            for column in &table.columns {
                if !columns.insert(column.name.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate column name: {}.{}.{}",
                        db_schema.name, table.name, column.name
                    )));
                }
            }

            tables.insert(table.name.as_str(), columns);
        }

        catalog.insert(db_schema.name.as_str(), tables);
    }

    for (key, table) in schema.tables() {
        let columns: BTreeSet<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let require = |kind: &str, column: &str| -> Result<()> {
            if columns.contains(column) {
                Ok(())
            } else {
                Err(Error::InvalidSchema(format!(
                    "{kind} column not found: {key}.{column}"
                )))
            }
        };

        for constraint in &table.constraints {
            match constraint {
                Constraint::PrimaryKey(pk) => {
                    for column in &pk.columns {
                        require("primary key", column)?;
                    }
                }
                Constraint::Unique(unique) => {
                    for column in &unique.columns {
                        require("unique", column)?;
                    }
                }
                Constraint::ForeignKey(fk) => {
                    for column in &fk.columns {
                        require("foreign key", column)?;
                    }

                    if fk.columns.len() != fk.referenced_columns.len() {
                        return Err(Error::InvalidSchema(format!(
                            "foreign key {} on {key} maps {} columns to {}",
                            fk.name.as_deref().unwrap_or("<unnamed>"),
                            fk.columns.len(),
                            fk.referenced_columns.len()
                        )));
                    }

                    let ref_columns = catalog
                        .get(fk.referenced_schema.as_str())
                        .and_then(|tables| tables.get(fk.referenced_table.as_str()))
                        .ok_or_else(|| {
                            Error::DanglingReference(table_key(
                                &fk.referenced_schema,
                                &fk.referenced_table,
                            ))
                        })?;

                    for column in &fk.referenced_columns {
                        if !ref_columns.contains(column.as_str()) {
                            return Err(Error::InvalidSchema(format!(
                                "referenced column not found: {}.{}.{}",
                                fk.referenced_schema, fk.referenced_table, column
                            )));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Deferrable, FkAction, ForeignKey, PrimaryKey};
    use crate::schema::{Column, Schema, Table, TableKind};

    fn column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            data_type: "integer".to_string(),
            is_nullable: false,
            default: None,
            comment: None,
        }
    }

    fn schema_with(tables: Vec<Table>) -> DatabaseSchema {
        DatabaseSchema {
            schema_version: "0.1".to_string(),
            engine: "postgres".to_string(),
            database: Some("db".to_string()),
            schemas: vec![Schema {
                name: "public".to_string(),
                tables,
            }],
            fingerprint: None,
        }
    }

    fn orders_fk(table: &str) -> Constraint {
        Constraint::ForeignKey(ForeignKey {
            name: Some("orders_user_fk".to_string()),
            columns: vec!["user_id".to_string()],
            referenced_schema: "public".to_string(),
            referenced_table: table.to_string(),
            referenced_columns: vec!["id".to_string()],
            on_update: FkAction::NoAction,
            on_delete: FkAction::Cascade,
            deferrable: Deferrable::NotDeferrable,
        })
    }

    #[test]
    fn accepts_consistent_schema() {
        let schema = schema_with(vec![
            Table {
                name: "orders".to_string(),
                kind: TableKind::Table,
                comment: None,
                columns: vec![column("id"), column("user_id")],
                constraints: vec![
                    Constraint::PrimaryKey(PrimaryKey {
                        name: None,
                        columns: vec!["id".to_string()],
                    }),
                    orders_fk("users"),
                ],
            },
            Table {
                name: "users".to_string(),
                kind: TableKind::Table,
                comment: None,
                columns: vec![column("id")],
                constraints: Vec::new(),
            },
        ]);

        validate_schema(&schema).expect("valid schema");
    }

    #[test]
    fn reports_missing_referenced_table() {
        let schema = schema_with(vec![Table {
            name: "orders".to_string(),
            kind: TableKind::Table,
            comment: None,
            columns: vec![column("id"), column("user_id")],
            constraints: vec![orders_fk("users")],
        }]);

        let err = validate_schema(&schema).expect_err("dangling");
        assert!(matches!(err, Error::DanglingReference(table) if table == "public.users"));
    }

    #[test]
    fn rejects_dotted_names_that_collide() {
        let table = |name: &str| Table {
            name: name.to_string(),
            kind: TableKind::Table,
            comment: None,
            columns: vec![column("id")],
            constraints: Vec::new(),
        };
        let mut schema = schema_with(Vec::new());
        schema.schemas = vec![
            Schema {
                name: "a.b".to_string(),
                tables: vec![table("c")],
            },
            Schema {
                name: "a".to_string(),
                tables: vec![table("b.c")],
            },
        ];

        let err = validate_schema(&schema).expect_err("ambiguous key");
        assert!(err.to_string().contains("ambiguous table key: a.b.c"));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let schema = schema_with(vec![Table {
            name: "users".to_string(),
            kind: TableKind::Table,
            comment: None,
            columns: vec![column("id"), column("id")],
            constraints: Vec::new(),
        }]);

        let err = validate_schema(&schema).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate column name"));
    }
}
