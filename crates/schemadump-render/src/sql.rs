use std::collections::BTreeMap;

use schemadump_core::{
    Constraint, DatabaseSchema, Deferrable, DumpFormat, DumpPlan, Error, FkAction, ForeignKeyEdge,
    Table,
};

use crate::Renderer;
use crate::document::{DumpDocument, Section};
use crate::errors::Result;

/// Renders a plan as PostgreSQL-flavoured DDL.
///
/// Tables are created in plan order with their inline foreign keys; deferred
/// foreign keys follow as `ALTER TABLE` statements grouped by referenced table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRenderer;

impl Renderer for SqlRenderer {
    fn format(&self) -> DumpFormat {
        DumpFormat::Sql
    }

    fn render(&self, schema: &DatabaseSchema, plan: &DumpPlan) -> Result<DumpDocument> {
        let catalog = Catalog::new(schema);
        let mut sections = Vec::with_capacity(plan.tables.len());

        for key in &plan.tables {
            let (schema_name, table) = catalog.lookup(key)?;
            let body = if table.kind.is_table() {
                create_table(&catalog, schema_name, table, plan.inline_for(key))?
            } else {
                format!(
                    "-- {} {} is not dumped",
                    kind_label(table),
                    qualified(schema_name, &table.name)
                )
            };
            sections.push(Section {
                key: key.clone(),
                body,
            });
        }

        let mut trailer = Vec::with_capacity(plan.deferred.len());
        for (target, edges) in &plan.deferred {
            let mut lines = vec![format!("-- deferred references to {target}")];
            for edge in edges {
                let (schema_name, table) = catalog.lookup(&edge.from_table)?;
                lines.push(format!(
                    "ALTER TABLE {} ADD {};",
                    qualified(schema_name, &table.name),
                    foreign_key_clause(&catalog, edge)?
                ));
            }
            trailer.push(Section {
                key: target.clone(),
                body: lines.join("\n"),
            });
        }

        Ok(DumpDocument {
            comment_prefix: Some("--".to_string()),
            header: Vec::new(),
            sections,
            trailer,
        })
    }
}

/// Table key -> (schema name, table) lookup.
struct Catalog<'a> {
    tables: BTreeMap<String, (&'a str, &'a Table)>,
}

impl<'a> Catalog<'a> {
    fn new(schema: &'a DatabaseSchema) -> Self {
        let tables = schema
            .schemas
            .iter()
            .flat_map(|item| {
                item.tables.iter().map(move |table| {
                    (
                        schemadump_core::table_key(&item.name, &table.name),
                        (item.name.as_str(), table),
                    )
                })
            })
            .collect();
        Self { tables }
    }

    fn lookup(&self, key: &str) -> Result<(&'a str, &'a Table)> {
        self.tables
            .get(key)
            .copied()
            .ok_or_else(|| Error::DanglingReference(key.to_string()).into())
    }
}

fn create_table(
    catalog: &Catalog<'_>,
    schema_name: &str,
    table: &Table,
    inline: &[ForeignKeyEdge],
) -> Result<String> {
    let mut entries: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let mut entry = format!("{} {}", quote_ident(&column.name), column.data_type);
            if !column.is_nullable {
                entry.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                entry.push_str(" DEFAULT ");
                entry.push_str(default);
            }
            entry
        })
        .collect();

    for constraint in &table.constraints {
        match constraint {
            Constraint::PrimaryKey(pk) => entries.push(format!(
                "{}PRIMARY KEY ({})",
                constraint_prefix(pk.name.as_deref()),
                ident_list(&pk.columns)
            )),
            Constraint::Unique(unique) => entries.push(format!(
                "{}UNIQUE ({})",
                constraint_prefix(unique.name.as_deref()),
                ident_list(&unique.columns)
            )),
            // Foreign keys come from the plan, which may have deferred some of them.
            Constraint::ForeignKey(_) => {}
        }
    }

    for edge in inline {
        entries.push(foreign_key_clause(catalog, edge)?);
    }

    let name = qualified(schema_name, &table.name);
    let mut statement = format!("CREATE TABLE {name} (\n  {}\n);", entries.join(",\n  "));

    if let Some(comment) = &table.comment {
        statement.push_str(&format!(
            "\nCOMMENT ON TABLE {name} IS {};",
            quote_literal(comment)
        ));
    }
    for column in &table.columns {
        if let Some(comment) = &column.comment {
            statement.push_str(&format!(
                "\nCOMMENT ON COLUMN {name}.{} IS {};",
                quote_ident(&column.name),
                quote_literal(comment)
            ));
        }
    }

    Ok(statement)
}

fn foreign_key_clause(catalog: &Catalog<'_>, edge: &ForeignKeyEdge) -> Result<String> {
    let (target_schema, target) = catalog.lookup(&edge.to_table)?;
    let mut clause = format!(
        "{}FOREIGN KEY ({}) REFERENCES {} ({})",
        constraint_prefix(edge.name.as_deref()),
        ident_list(&edge.columns),
        qualified(target_schema, &target.name),
        ident_list(&edge.referenced_columns)
    );

    if edge.on_update != FkAction::NoAction {
        clause.push_str(" ON UPDATE ");
        clause.push_str(edge.on_update.as_sql());
    }
    if edge.on_delete != FkAction::NoAction {
        clause.push_str(" ON DELETE ");
        clause.push_str(edge.on_delete.as_sql());
    }
    match edge.deferrable {
        Deferrable::NotDeferrable => {}
        Deferrable::InitiallyImmediate => clause.push_str(" DEFERRABLE INITIALLY IMMEDIATE"),
        Deferrable::InitiallyDeferred => clause.push_str(" DEFERRABLE INITIALLY DEFERRED"),
    }

    Ok(clause)
}

fn constraint_prefix(name: Option<&str>) -> String {
    name.map(|name| format!("CONSTRAINT {} ", quote_ident(name)))
        .unwrap_or_default()
}

fn kind_label(table: &Table) -> &'static str {
    match table.kind {
        schemadump_core::TableKind::View => "view",
        schemadump_core::TableKind::MaterializedView => "materialized view",
        schemadump_core::TableKind::ForeignTable => "foreign table",
        _ => "relation",
    }
}

fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

fn ident_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers_and_literals() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(qualified("public", "users"), "\"public\".\"users\"");
    }

    #[test]
    fn unnamed_constraints_have_no_prefix() {
        assert_eq!(constraint_prefix(None), "");
        assert_eq!(constraint_prefix(Some("pk")), "CONSTRAINT \"pk\" ");
    }
}
