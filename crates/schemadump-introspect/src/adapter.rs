use async_trait::async_trait;

use schemadump_core::{DatabaseSchema, Result};

use crate::options::IntrospectOptions;

/// Trait implemented by catalog providers that can produce schema snapshots.
#[async_trait]
pub trait Adapter {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Read the catalog and return a schema snapshot.
    async fn introspect(&self, opts: &IntrospectOptions) -> Result<DatabaseSchema>;
}
