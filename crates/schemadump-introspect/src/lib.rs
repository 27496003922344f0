//! Catalog providers that produce schema snapshots for dumping.

pub mod adapter;
pub mod options;
pub mod postgres;
pub mod snapshot;

pub use adapter::Adapter;
pub use options::IntrospectOptions;
pub use postgres::{PostgresAdapter, introspect_postgres, introspect_postgres_with_options};
pub use snapshot::{JsonSnapshotAdapter, load_snapshot, snapshot_json_schema};

pub use schemadump_core::DatabaseSchema;
