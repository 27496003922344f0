//! Renderers and the dump middleware pipeline.
//!
//! A dump runs as: `before_plan` middlewares, dependency planning,
//! `after_plan` middlewares, rendering, then `after_render` middlewares.

pub mod document;
pub mod errors;
pub mod json;
pub mod middleware;
pub mod pipeline;
pub mod sql;

pub use document::{DumpDocument, Section};
pub use errors::{RenderError, Result};
pub use json::JsonRenderer;
pub use middleware::{DumpHeader, IgnoreTables, InferReferences};
pub use pipeline::{DumpEnv, DumpMiddleware, Pipeline};
pub use sql::SqlRenderer;

use schemadump_core::{DatabaseSchema, DumpFormat, DumpPlan};

/// Serializes a dump plan into a target format.
pub trait Renderer: Send + Sync {
    fn format(&self) -> DumpFormat;

    fn render(&self, schema: &DatabaseSchema, plan: &DumpPlan) -> Result<DumpDocument>;
}

/// Renderer registered for an output format.
pub fn renderer_for(format: DumpFormat) -> Box<dyn Renderer> {
    match format {
        DumpFormat::Sql => Box::new(SqlRenderer),
        DumpFormat::Json => Box::new(JsonRenderer),
    }
}
