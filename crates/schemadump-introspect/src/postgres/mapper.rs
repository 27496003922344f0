use schemadump_core::{
    Column, Constraint, Deferrable, FkAction, ForeignKey, PrimaryKey, Table, TableKind,
    UniqueConstraint,
};

use crate::options::IntrospectOptions;

use super::queries::{RawColumn, RawForeignKey, RawKeyConstraint, RawTable};

pub fn filter_schemas(raw: Vec<String>, opts: &IntrospectOptions) -> Vec<String> {
    raw.into_iter()
        .filter(|schema| opts.includes_schema(schema))
        .collect()
}

pub fn map_tables(raw: Vec<RawTable>, opts: &IntrospectOptions) -> Vec<Table> {
    raw.into_iter()
        .filter_map(|table| {
            let kind = relkind_to_table_kind(table.relkind);
            if !opts.includes_kind(&kind) {
                return None;
            }

            Some(Table {
                name: table.name,
                kind,
                comment: table.comment.filter(|_| opts.include_comments),
                columns: Vec::new(),
                constraints: Vec::new(),
            })
        })
        .collect()
}

pub fn map_columns(raw: Vec<RawColumn>, opts: &IntrospectOptions) -> Vec<Column> {
    raw.into_iter()
        .map(|col| Column {
            name: col.name,
            data_type: col.data_type,
            is_nullable: col.is_nullable,
            default: col.default,
            comment: col.comment.filter(|_| opts.include_comments),
        })
        .collect()
}

pub fn map_key_constraints(raw: Vec<RawKeyConstraint>) -> Vec<Constraint> {
    raw.into_iter()
        .filter_map(|key| match key.contype as u8 as char {
            'p' => Some(Constraint::PrimaryKey(PrimaryKey {
                name: Some(key.name),
                columns: key.columns,
            })),
            'u' => Some(Constraint::Unique(UniqueConstraint {
                name: Some(key.name),
                columns: key.columns,
            })),
            _ => None,
        })
        .collect()
}

pub fn map_foreign_keys(raw: Vec<RawForeignKey>) -> Vec<Constraint> {
    raw.into_iter()
        .map(|fk| {
            Constraint::ForeignKey(ForeignKey {
                on_update: fk_action_from_code(&fk.name, fk.on_update_code),
                on_delete: fk_action_from_code(&fk.name, fk.on_delete_code),
                name: Some(fk.name),
                columns: fk.columns,
                referenced_schema: fk.referenced_schema,
                referenced_table: fk.referenced_table,
                referenced_columns: fk.referenced_columns,
                deferrable: Deferrable::from_flags(fk.is_deferrable, fk.initially_deferred),
            })
        })
        .collect()
}

/// Primary key first, then unique constraints, then foreign keys; by name within a kind.
pub fn sort_constraints(constraints: &mut [Constraint]) {
    constraints.sort_by_key(constraint_key);
}

fn constraint_key(constraint: &Constraint) -> (u8, String, String) {
    match constraint {
        Constraint::PrimaryKey(pk) => {
            (0, pk.name.clone().unwrap_or_default(), pk.columns.join("|"))
        }
        Constraint::Unique(unique) => (
            1,
            unique.name.clone().unwrap_or_default(),
            unique.columns.join("|"),
        ),
        Constraint::ForeignKey(fk) => {
            (2, fk.name.clone().unwrap_or_default(), fk.columns.join("|"))
        }
    }
}

/// Convert Postgres `relkind` code to a typed table kind.
pub fn relkind_to_table_kind(code: i8) -> TableKind {
    match code as u8 as char {
        'r' => TableKind::Table,
        'p' => TableKind::PartitionedTable,
        'v' => TableKind::View,
        'm' => TableKind::MaterializedView,
        'f' => TableKind::ForeignTable,
        other => TableKind::Other(other.to_string()),
    }
}

/// Convert `confupdtype`/`confdeltype` codes. Unknown codes fall back to `NO ACTION`.
pub fn fk_action_from_code(constraint: &str, code: i8) -> FkAction {
    match code as u8 as char {
        'a' => FkAction::NoAction,
        'r' => FkAction::Restrict,
        'c' => FkAction::Cascade,
        'n' => FkAction::SetNull,
        'd' => FkAction::SetDefault,
        other => {
            tracing::warn!(
                event = "unknown_fk_action",
                constraint = %constraint,
                code = %other
            );
            FkAction::NoAction
        }
    }
}
