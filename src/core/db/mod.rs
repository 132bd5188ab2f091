/// Database Module
///
/// This module provides the database layer of druidql, organized into
/// focused submodules.
///
/// ## Architecture
///
/// - **Wire Driver** (`driver.rs`, `http.rs`): the traits a database session
///   implements, and the Druid HTTP implementation
/// - **Connection Management** (`connection.rs`): a single lazily-opened
///   connection and its lifecycle
/// - **Query Execution** (`query.rs`): runs statements and builds the
///   response envelope
/// - **Rendering** (`render.rs`): SQL parsing and dialect rendering
/// - **Schema Introspection** (`schema.rs`): INFORMATION_SCHEMA queries
///
/// ## Error Handling
///
/// All fallible operations return `DruidError`; the handler folds them into
/// `HandlerResponse::Error` at its query entry points.
pub mod connection;
pub mod driver;
pub mod http;
pub mod query;
pub mod render;
pub mod schema;

pub use connection::ConnectionManager;
pub use driver::{ColumnDescription, ConnectParams, Connection, Cursor, Driver, Row, SqlParameter};
pub use http::{HttpConnection, HttpCursor, HttpDriver};
pub use query::{HandlerResponse, QueryExecutor, QueryResult, StatusResponse};
pub use render::{parse_sql, parse_sql_with, SqlDialect, SqlRender};
