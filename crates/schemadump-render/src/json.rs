use serde::Serialize;

use schemadump_core::{DatabaseSchema, DumpFormat, DumpPlan, SCHEMA_VERSION};

use crate::Renderer;
use crate::document::{DumpDocument, Section};
use crate::errors::Result;

/// Renders the plan itself as a JSON document for downstream tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonDump<'a> {
    schema_version: &'static str,
    engine: &'a str,
    database: Option<&'a str>,
    plan: &'a DumpPlan,
}

impl Renderer for JsonRenderer {
    fn format(&self) -> DumpFormat {
        DumpFormat::Json
    }

    fn render(&self, schema: &DatabaseSchema, plan: &DumpPlan) -> Result<DumpDocument> {
        let dump = JsonDump {
            schema_version: SCHEMA_VERSION,
            engine: &schema.engine,
            database: schema.database.as_deref(),
            plan,
        };

        Ok(DumpDocument {
            comment_prefix: None,
            header: Vec::new(),
            sections: vec![Section {
                key: "plan".to_string(),
                body: serde_json::to_string_pretty(&dump)?,
            }],
            trailer: Vec::new(),
        })
    }
}
