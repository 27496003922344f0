use schemadump_core::TableKind;

/// Options that control which catalog objects are captured.
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    pub include_system_schemas: bool,
    pub include_views: bool,
    pub include_materialized_views: bool,
    pub include_foreign_tables: bool,
    pub include_comments: bool,
    pub schemas: Option<Vec<String>>,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            include_system_schemas: false,
            include_views: true,
            include_materialized_views: true,
            include_foreign_tables: true,
            include_comments: true,
            schemas: None,
        }
    }
}

impl IntrospectOptions {
    /// An explicit schema list wins over the system-schema switch.
    pub fn includes_schema(&self, schema: &str) -> bool {
        let is_system = schema.starts_with("pg_") || schema == "information_schema";
        match &self.schemas {
            Some(list) => list.iter().any(|item| item == schema),
            None => self.include_system_schemas || !is_system,
        }
    }

    pub fn includes_kind(&self, kind: &TableKind) -> bool {
        match kind {
            TableKind::View => self.include_views,
            TableKind::MaterializedView => self.include_materialized_views,
            TableKind::ForeignTable => self.include_foreign_tables,
            _ => true,
        }
    }
}
