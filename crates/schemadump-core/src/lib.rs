//! Core contracts for schemadump.
//!
//! This crate defines the schema model, explicit dump configuration, column
//! naming conventions, and the dependency planner that decides which foreign
//! keys are declared inline and which are deferred past all table definitions.

pub mod config;
pub mod constraints;
pub mod error;
pub mod graph;
pub mod references;
pub mod schema;
pub mod validation;

pub use config::{DumpConfig, DumpFormat, EmissionOrder, NamingConfig, check_order};
pub use constraints::{Constraint, Deferrable, FkAction, ForeignKey, PrimaryKey, UniqueConstraint};
pub use error::{Error, Result};
pub use graph::{
    DumpPlan, ForeignKeyEdge, collect_edges, find_cycles, plan_dump, plan_edges, table_keys,
};
pub use references::{InferredReference, infer_foreign_keys, infer_reference};
pub use schema::{Column, DatabaseSchema, Schema, Table, TableKind, table_key};
pub use validation::validate_schema;

/// Current schema contract version for `schema.json` snapshots.
pub const SCHEMA_VERSION: &str = "0.1";
