/// Druid Handler Error Module
///
/// This module defines the error types shared by the connection manager,
/// the wire driver, the SQL renderer and the configuration layer.
use thiserror::Error;

/// Error type for every fallible operation in druidql.
///
/// The query entry points of the handler never return these directly; they
/// fold them into a `HandlerResponse::Error` or a failed `StatusResponse`.
#[derive(Error, Debug)]
pub enum DruidError {
    /// Transport or authentication failure while opening or using a session
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query text rejected by Druid, or a failure during execute/fetch/commit
    #[error("Execution error: {0}")]
    Execution(String),

    /// Missing or invalid connection parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// SQL text that could not be parsed into a statement
    #[error("Parse error: {0}")]
    Parse(String),

    /// Statement that could not be rendered in the target dialect
    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DruidError {
    /// The underlying message without the category prefix, as reported to
    /// callers of the handler's query operations.
    pub fn message(&self) -> String {
        match self {
            DruidError::Connection(msg)
            | DruidError::Execution(msg)
            | DruidError::Config(msg)
            | DruidError::Parse(msg)
            | DruidError::Render(msg) => msg.clone(),
            DruidError::Io(e) => e.to_string(),
            DruidError::Json(e) => e.to_string(),
            DruidError::Toml(e) => e.to_string(),
        }
    }
}

/// Type alias for Result to use DruidError as the error type.
pub type Result<T> = std::result::Result<T, DruidError>;
