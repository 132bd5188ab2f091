/// Core Module for druidql
///
/// This module contains the pieces every handler operation is built from:
/// the error type, the wire driver seam, connection lifecycle management,
/// query execution, SQL rendering and schema introspection.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DruidError, Result};
