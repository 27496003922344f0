use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jsonschema::JSONSchema;
use schemars::schema_for;
use serde_json::Value;

use schemadump_core::{DatabaseSchema, Error, Result};

use crate::adapter::Adapter;
use crate::options::IntrospectOptions;

/// Adapter reading a previously captured `schema.json` snapshot.
#[derive(Debug, Clone)]
pub struct JsonSnapshotAdapter {
    path: PathBuf,
}

impl JsonSnapshotAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Adapter for JsonSnapshotAdapter {
    fn engine(&self) -> &'static str {
        "snapshot"
    }

    async fn introspect(&self, opts: &IntrospectOptions) -> Result<DatabaseSchema> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        tracing::debug!(event = "snapshot_read", path = %self.path.display());
        load_snapshot(&content, opts)
    }
}

/// JSON Schema describing the snapshot format.
pub fn snapshot_json_schema() -> Result<Value> {
    serde_json::to_value(schema_for!(DatabaseSchema))
        .map_err(|err| Error::InvalidSchema(format!("snapshot json schema: {err}")))
}

/// Validate and parse a snapshot document, then apply the capture options.
pub fn load_snapshot(content: &str, opts: &IntrospectOptions) -> Result<DatabaseSchema> {
    let document: Value = serde_json::from_str(content)
        .map_err(|err| Error::InvalidSchema(format!("snapshot is not valid json: {err}")))?;

    validate_snapshot(&document)?;

    let mut schema: DatabaseSchema = serde_json::from_value(document)
        .map_err(|err| Error::InvalidSchema(err.to_string()))?;

    schema.schemas.retain(|item| opts.includes_schema(&item.name));
    for item in &mut schema.schemas {
        item.tables.retain(|table| opts.includes_kind(&table.kind));
        if !opts.include_comments {
            for table in &mut item.tables {
                table.comment = None;
                for column in &mut table.columns {
                    column.comment = None;
                }
            }
        }
    }

    Ok(schema)
}

fn validate_snapshot(document: &Value) -> Result<()> {
    let schema = snapshot_json_schema()?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| Error::InvalidSchema(err.to_string()))?;

    if let Err(errors) = compiled.validate(document) {
        let messages: Vec<String> = errors
            .map(|error| {
                let path = error.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                format!("{path}: {error}")
            })
            .collect();
        return Err(Error::InvalidSchema(format!(
            "snapshot does not match schema: {}",
            messages.join("; ")
        )));
    }

    Ok(())
}
