//! The Druid handler: connection lifecycle, raw and AST query execution,
//! and schema introspection behind one host-facing interface.

use crate::config::{Config, ConnectionConfig};
use crate::core::db::driver::{Driver, SqlParameter};
use crate::core::db::http::HttpDriver;
use crate::core::db::query::{HandlerResponse, QueryExecutor, StatusResponse};
use crate::core::db::render::{SqlDialect, SqlRender};
use crate::core::db::schema;
use crate::core::db::ConnectionManager;
use crate::core::Result;
use sqlparser::ast::Statement;
use tracing::{debug, error, warn};

/// Handler type name reported to host frameworks.
pub const HANDLER_NAME: &str = "druid";

/// Interface a host framework uses to drive a database handler.
///
/// Query operations never fail with `Err`; failures come back as
/// `HandlerResponse::Error`.
pub trait DatabaseHandler {
    /// Name of this handler instance
    fn name(&self) -> &str;

    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;

    fn check_connection(&mut self) -> StatusResponse;

    /// Runs SQL text as-is.
    fn execute_raw(&mut self, query: &str) -> HandlerResponse;

    /// Renders a parsed statement for the target engine and runs it.
    fn execute_ast(&mut self, query: &Statement) -> HandlerResponse;

    /// Lists tables as `table_name`, `table_type`.
    fn list_tables(&mut self) -> HandlerResponse;

    /// Lists the columns of a table as `column_name`, `data_type`.
    fn list_columns(&mut self, table_name: &str) -> HandlerResponse;
}

/// Handles connection and execution of Apache Druid SQL statements.
pub struct DruidHandler<D: Driver = HttpDriver> {
    name: String,
    config: ConnectionConfig,
    connection: ConnectionManager<D>,
    renderer: SqlRender,
}

impl DruidHandler<HttpDriver> {
    /// Creates a handler that talks to Druid over HTTP.
    pub fn new(name: impl Into<String>, config: ConnectionConfig) -> Self {
        DruidHandler::with_driver(name, config, HttpDriver::new())
    }

    /// Creates a handler from key/value connection data.
    pub fn from_connection_data(
        name: impl Into<String>,
        connection_data: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        Ok(DruidHandler::new(name, ConnectionConfig::from_map(connection_data)?))
    }

    /// Creates a handler from a loaded configuration file.
    pub fn from_config(name: impl Into<String>, config: Config) -> Self {
        let driver = HttpDriver::with_timeout(config.timeout());
        DruidHandler::with_driver(name, config.connection, driver)
    }
}

impl<D: Driver> DruidHandler<D> {
    /// Creates a handler over any driver.
    pub fn with_driver(name: impl Into<String>, config: ConnectionConfig, driver: D) -> Self {
        let connection = ConnectionManager::new(driver, &config);
        DruidHandler {
            name: name.into(),
            config,
            connection,
            renderer: SqlRender::new(SqlDialect::Druid),
        }
    }

    /// Effective connection config, defaults applied
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Runs SQL text with `parameters` bound to its `?` placeholders.
    ///
    /// A connection opened by this call is closed again before it returns,
    /// whatever the outcome. Errors, including a failed implicit connect,
    /// come back as `HandlerResponse::Error`.
    pub fn execute_bound(&mut self, query: &str, parameters: &[SqlParameter]) -> HandlerResponse {
        let need_to_close = !self.connection.is_connected();
        debug!(handler = %self.name, "Running query: {}", query);

        let outcome = self
            .connection
            .acquire()
            .and_then(|conn| QueryExecutor::new(conn).execute(query, parameters));

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                error!(handler = %self.name, "Error running query: {} on Druid: {}", query, e);
                HandlerResponse::error(e.message())
            }
        };

        if need_to_close {
            if let Err(e) = self.connection.disconnect() {
                warn!(handler = %self.name, "Failed to close connection after query: {}", e);
            }
        }

        response
    }
}

impl<D: Driver> DatabaseHandler for DruidHandler<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> Result<()> {
        self.connection.connect()
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connection.disconnect()
    }

    fn check_connection(&mut self) -> StatusResponse {
        self.connection.check_connection()
    }

    fn execute_raw(&mut self, query: &str) -> HandlerResponse {
        self.execute_bound(query, &[])
    }

    fn execute_ast(&mut self, query: &Statement) -> HandlerResponse {
        match self.renderer.get_string(query, true) {
            Ok(sql) => self.execute_raw(&sql),
            Err(e) => HandlerResponse::error(e.message()),
        }
    }

    fn list_tables(&mut self) -> HandlerResponse {
        self.execute_raw(schema::TABLES_QUERY)
            .project(&schema::TABLE_COLUMNS)
    }

    fn list_columns(&mut self, table_name: &str) -> HandlerResponse {
        let parameters = schema::columns_query_parameters(table_name);
        self.execute_bound(schema::COLUMNS_QUERY, &parameters)
            .project(&schema::COLUMN_COLUMNS)
    }
}
