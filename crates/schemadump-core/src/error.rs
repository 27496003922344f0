use thiserror::Error;

/// Core error type shared across schemadump crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error or adapter failure.
    #[error("database error: {0}")]
    Db(String),
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A foreign key points at a table that is not part of the dump.
    #[error("dangling reference to table '{0}'")]
    DanglingReference(String),
    /// Cycle breaking failed to converge. Indicates a planner bug.
    #[error("unresolvable foreign key cycle among: {}", .0.join(", "))]
    UnresolvableCycle(Vec<String>),
    /// Configuration could not be parsed or is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Reading a snapshot or configuration file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A requested feature is not yet supported.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Convenience alias for results returned by schemadump crates.
pub type Result<T> = std::result::Result<T, Error>;
