/// Wire Driver Module
///
/// Traits describing the session objects the handler drives: a `Driver`
/// opens a `Connection`, a connection hands out `Cursor`s, and a cursor runs
/// one statement and yields its rows. `HttpDriver` implements them against
/// Druid's SQL HTTP API; `test_utils::MockDriver` implements them in memory.

use crate::config::ConnectionConfig;
use crate::core::Result;
use serde::{Deserialize, Serialize};

/// One result row, cells in column order.
pub type Row = Vec<serde_json::Value>;

/// Everything a driver needs to open a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub scheme: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl From<&ConnectionConfig> for ConnectParams {
    fn from(config: &ConnectionConfig) -> Self {
        ConnectParams {
            host: config.host.clone(),
            port: config.port,
            path: config.path.clone(),
            scheme: config.scheme.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        }
    }
}

/// Result column metadata reported by a cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    pub name: String,
    /// SQL type name, when the driver reports one
    pub type_name: Option<String>,
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnDescription {
            name: name.into(),
            type_name: None,
        }
    }
}

/// A dynamic parameter bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    #[serde(rename = "type")]
    pub sql_type: String,
    pub value: serde_json::Value,
}

impl SqlParameter {
    pub fn varchar(value: impl Into<String>) -> Self {
        SqlParameter {
            sql_type: "VARCHAR".to_string(),
            value: serde_json::Value::String(value.into()),
        }
    }
}

/// Runs one statement and exposes its results.
pub trait Cursor {
    /// Executes `sql` with `parameters` bound to its placeholders.
    fn execute(&mut self, sql: &str, parameters: &[SqlParameter]) -> Result<()>;

    /// Returns all remaining rows of the last executed statement.
    fn fetch_all(&mut self) -> Result<Vec<Row>>;

    /// Column metadata of the last executed statement.
    fn description(&self) -> Option<&[ColumnDescription]>;

    /// Releases the cursor.
    fn close(&mut self) {}
}

/// An open session.
pub trait Connection {
    type Cursor: Cursor;

    fn cursor(&mut self) -> Result<Self::Cursor>;

    fn commit(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// Opens sessions against a database.
pub trait Driver {
    type Connection: Connection;

    /// Opens a session, failing with `DruidError::Connection` when the
    /// transport cannot establish one.
    fn open(&self, params: &ConnectParams) -> Result<Self::Connection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_params_from_config() {
        let mut config = ConnectionConfig::new("localhost", 8888);
        config.user = Some("admin".to_string());
        let params = ConnectParams::from(&config);
        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, 8888);
        assert_eq!(params.path, "/druid/v2/sql/");
        assert_eq!(params.scheme, "http");
        assert_eq!(params.user.as_deref(), Some("admin"));
        assert_eq!(params.password, None);
    }

    #[test]
    fn test_parameter_wire_shape() {
        let param = SqlParameter::varchar("wikipedia");
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json, serde_json::json!({"type": "VARCHAR", "value": "wikipedia"}));
    }
}
