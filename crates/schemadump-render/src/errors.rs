use thiserror::Error;

/// Errors raised while planning, rendering, or running middlewares.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Core(#[from] schemadump_core::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("middleware '{name}' failed: {message}")]
    Middleware { name: String, message: String },
    #[error("render error: {0}")]
    Render(String),
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
