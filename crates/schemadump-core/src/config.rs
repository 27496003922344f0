use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Order in which table definitions are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionOrder {
    /// Sorted by qualified table name. Inline references may point forward.
    Alphabetical,
    /// Referenced tables before the tables that reference them.
    #[default]
    Topological,
}

/// Output format produced by a dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpFormat {
    #[default]
    Sql,
    Json,
}

impl DumpFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DumpFormat::Sql => "sql",
            DumpFormat::Json => "json",
        }
    }

    /// Whether every referenced table must be emitted before the tables referencing it.
    pub fn requires_dependency_order(self) -> bool {
        matches!(self, DumpFormat::Sql)
    }
}

/// Table naming conventions used when inferring references from column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub table_prefix: String,
    pub table_suffix: String,
}

/// Explicit configuration for a single dump run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    pub order: EmissionOrder,
    pub format: DumpFormat,
    /// Exact names, `schema.table` keys, or prefixes ending in `*`.
    pub ignore_tables: Vec<String>,
    pub infer_references: bool,
    pub naming: NamingConfig,
}

impl DumpConfig {
    /// Parse a configuration document in TOML form.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: DumpConfig =
            toml::from_str(content).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject patterns that can never match and orders the format cannot replay.
    pub fn validate(&self) -> Result<()> {
        check_order(self.format, self.order)?;

        for pattern in &self.ignore_tables {
            let trimmed = pattern.trim();
            if trimmed.is_empty() || trimmed == "*" {
                return Err(Error::Config(format!(
                    "ignore_tables pattern '{pattern}' would ignore every table"
                )));
            }
            if trimmed.strip_suffix('*').unwrap_or(trimmed).contains('*') {
                return Err(Error::Config(format!(
                    "ignore_tables pattern '{pattern}' may only end with '*'"
                )));
            }
        }
        Ok(())
    }

    /// Whether the table identified by `schema` and `table` is excluded from dumps.
    pub fn is_ignored(&self, schema: &str, table: &str) -> bool {
        self.ignore_tables
            .iter()
            .any(|pattern| pattern_matches(pattern.trim(), schema, table))
    }
}

/// SQL cannot reference a table before its `CREATE TABLE`, so it needs topological order.
pub fn check_order(format: DumpFormat, order: EmissionOrder) -> Result<()> {
    if format.requires_dependency_order() && order == EmissionOrder::Alphabetical {
        return Err(Error::Config(format!(
            "{} output requires topological order; alphabetical order would emit forward references",
            format.as_str()
        )));
    }
    Ok(())
}

fn pattern_matches(pattern: &str, schema: &str, table: &str) -> bool {
    let qualified = crate::schema::table_key(schema, table);
    match pattern.strip_suffix('*') {
        Some(prefix) => table.starts_with(prefix) || qualified.starts_with(prefix),
        None => pattern == table || pattern == qualified,
    }
}
