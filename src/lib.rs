// Core infrastructure modules
pub mod config;
pub mod core;

// Handler facade and terminal front end
pub mod handler;
pub mod repl;

/// Scripted driver used by the integration tests.
#[doc(hidden)]
pub mod test_utils;

pub use crate::core::{DruidError, Result};
pub use config::ConnectionConfig;
pub use handler::{DatabaseHandler, DruidHandler};
