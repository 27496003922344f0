use crate::config::NamingConfig;
use crate::constraints::{Deferrable, FkAction, ForeignKey};
use crate::schema::{DatabaseSchema, Table, table_key};

/// Table and column a column name is conventionally expected to reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredReference {
    pub table: String,
    pub column: String,
}

/// Infer the referenced table and column from a `*_id` column name.
///
/// `parent_id` references the owning table itself; `<name>_id` references the
/// pluralized `<name>` wrapped in the configured prefix and suffix.
pub fn infer_reference(
    table: &str,
    column: &str,
    naming: &NamingConfig,
) -> Option<InferredReference> {
    if column == "parent_id" {
        return Some(InferredReference {
            table: table.to_string(),
            column: "id".to_string(),
        });
    }

    let stem = column.strip_suffix("_id")?;
    if stem.is_empty() {
        return None;
    }

    Some(InferredReference {
        table: format!(
            "{}{}{}",
            naming.table_prefix,
            pluralize(stem),
            naming.table_suffix
        ),
        column: "id".to_string(),
    })
}

/// Foreign keys implied by column naming that the schema does not declare yet.
///
/// A reference is only produced when the inferred table exists in the same
/// schema and carries the inferred column.
pub fn infer_foreign_keys(
    schema: &DatabaseSchema,
    naming: &NamingConfig,
) -> Vec<(String, ForeignKey)> {
    let mut inferred = Vec::new();

    for db_schema in &schema.schemas {
        for table in db_schema.tables.iter().filter(|table| table.kind.is_table()) {
            for column in &table.columns {
                if is_covered(table, &column.name) {
                    continue;
                }

                let Some(reference) = infer_reference(&table.name, &column.name, naming) else {
                    continue;
                };

                let exists = db_schema
                    .tables
                    .iter()
                    .find(|candidate| candidate.name == reference.table)
                    .is_some_and(|target| target.column(&reference.column).is_some());
                if !exists {
                    tracing::trace!(
                        event = "reference_skipped",
                        table = %table.name,
                        column = %column.name,
                        target = %reference.table
                    );
                    continue;
                }

                inferred.push((
                    table_key(&db_schema.name, &table.name),
                    ForeignKey {
                        name: Some(format!("fk_{}_{}", table.name, column.name)),
                        columns: vec![column.name.clone()],
                        referenced_schema: db_schema.name.clone(),
                        referenced_table: reference.table,
                        referenced_columns: vec![reference.column],
                        on_update: FkAction::NoAction,
                        on_delete: FkAction::NoAction,
                        deferrable: Deferrable::NotDeferrable,
                    },
                ));
            }
        }
    }

    inferred
}

fn is_covered(table: &Table, column: &str) -> bool {
    table
        .foreign_keys()
        .any(|fk| fk.columns.iter().any(|item| item == column))
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|ch| !"aeiou".contains(ch)) {
            return format!("{stem}ies");
        }
    }

    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| word.ends_with(suffix))
    {
        return format!("{word}es");
    }

    format!("{word}s")
}
