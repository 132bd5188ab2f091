/// Connection Management Module
///
/// This module owns the single connection handle of a handler and its
/// lifecycle: lazy opening, reuse, health checks and guaranteed release.

use super::driver::{ConnectParams, Connection, Driver};
use super::query::StatusResponse;
use crate::config::ConnectionConfig;
use crate::core::{DruidError, Result};
use tracing::{error, info, warn};

/// Connection state. The handle only exists while connected.
#[derive(Debug)]
enum ConnectionState<C> {
    Disconnected,
    Connected(C),
}

/// Owns one lazily-established connection.
///
/// The handle is never handed out; callers go through the lifecycle
/// operations or through the query paths of the handler.
pub struct ConnectionManager<D: Driver> {
    driver: D,
    params: ConnectParams,
    state: ConnectionState<D::Connection>,
}

impl<D: Driver> ConnectionManager<D> {
    /// Creates a disconnected manager for the given config.
    pub fn new(driver: D, config: &ConnectionConfig) -> Self {
        ConnectionManager {
            driver,
            params: ConnectParams::from(config),
            state: ConnectionState::Disconnected,
        }
    }

    /// Checks if there's an open connection
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Opens the connection unless it is already open.
    ///
    /// # Errors
    ///
    /// Returns `DruidError::Connection` when the driver cannot open a
    /// session; the manager stays disconnected.
    pub fn connect(&mut self) -> Result<()> {
        self.acquire().map(|_| ())
    }

    /// Returns the open connection, opening it first when needed.
    pub(crate) fn acquire(&mut self) -> Result<&mut D::Connection> {
        if !self.is_connected() {
            let connection = self.driver.open(&self.params)?;
            info!(host = %self.params.host, port = self.params.port, "Connected to Druid");
            self.state = ConnectionState::Connected(connection);
        }

        match &mut self.state {
            ConnectionState::Connected(connection) => Ok(connection),
            ConnectionState::Disconnected => Err(DruidError::Connection(
                "connection is not open".to_string(),
            )),
        }
    }

    /// Closes the connection if it is open.
    ///
    /// The manager is disconnected afterwards even when closing the handle
    /// reports an error.
    pub fn disconnect(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, ConnectionState::Disconnected) {
            ConnectionState::Disconnected => Ok(()),
            ConnectionState::Connected(mut connection) => {
                connection.close()?;
                info!(host = %self.params.host, port = self.params.port, "Disconnected from Druid");
                Ok(())
            }
        }
    }

    /// Probes connectivity without leaving a connection behind.
    ///
    /// An already-open connection stays open. A connection opened only for the
    /// probe is closed again.
    pub fn check_connection(&mut self) -> StatusResponse {
        let need_to_close = !self.is_connected();

        match self.connect() {
            Ok(()) => {
                if need_to_close {
                    if let Err(e) = self.disconnect() {
                        warn!("Failed to close probe connection: {}", e);
                    }
                }
                StatusResponse::success()
            }
            Err(e) => {
                error!("Error connecting to Druid, {}!", e);
                self.state = ConnectionState::Disconnected;
                StatusResponse::failure(e.to_string())
            }
        }
    }
}

impl<D: Driver> Drop for ConnectionManager<D> {
    fn drop(&mut self) {
        if self.is_connected() {
            if let Err(e) = self.disconnect() {
                warn!("Failed to close connection on teardown: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockDriver;

    fn manager(driver: &MockDriver) -> ConnectionManager<MockDriver> {
        ConnectionManager::new(driver.clone(), &ConnectionConfig::new("localhost", 8888))
    }

    #[test]
    fn test_connect_is_idempotent() {
        let driver = MockDriver::new();
        let mut conn_mgr = manager(&driver);
        assert!(!conn_mgr.is_connected());

        conn_mgr.connect().unwrap();
        conn_mgr.connect().unwrap();
        assert!(conn_mgr.is_connected());
        assert_eq!(driver.opens(), 1);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let driver = MockDriver::new();
        let mut conn_mgr = manager(&driver);

        conn_mgr.disconnect().unwrap();
        assert_eq!(driver.closes(), 0);

        conn_mgr.connect().unwrap();
        conn_mgr.disconnect().unwrap();
        conn_mgr.disconnect().unwrap();
        assert!(!conn_mgr.is_connected());
        assert_eq!(driver.closes(), 1);
    }

    #[test]
    fn test_connect_failure_leaves_disconnected() {
        let driver = MockDriver::new().failing_open("connection refused");
        let mut conn_mgr = manager(&driver);

        match conn_mgr.connect() {
            Err(DruidError::Connection(msg)) => assert!(msg.contains("connection refused")),
            other => panic!("Expected Connection error, got {:?}", other),
        }
        assert!(!conn_mgr.is_connected());
    }

    #[test]
    fn test_open_receives_config_parameters() {
        let driver = MockDriver::new();
        let mut config = ConnectionConfig::new("druid.internal", 8082);
        config.user = Some("admin".to_string());
        let mut conn_mgr = ConnectionManager::new(driver.clone(), &config);

        conn_mgr.connect().unwrap();
        let params = driver.last_params().unwrap();
        assert_eq!(params.host, "druid.internal");
        assert_eq!(params.port, 8082);
        assert_eq!(params.path, "/druid/v2/sql/");
        assert_eq!(params.user.as_deref(), Some("admin"));
    }

    #[test]
    fn test_check_connection_from_disconnected() {
        let driver = MockDriver::new();
        let mut conn_mgr = manager(&driver);

        let status = conn_mgr.check_connection();
        assert!(status.success);
        assert_eq!(status.error_message, None);
        assert!(!conn_mgr.is_connected());
        assert_eq!(driver.opens(), 1);
        assert_eq!(driver.closes(), 1);
    }

    #[test]
    fn test_check_connection_keeps_open_connection() {
        let driver = MockDriver::new();
        let mut conn_mgr = manager(&driver);
        conn_mgr.connect().unwrap();

        let status = conn_mgr.check_connection();
        assert!(status.success);
        assert!(conn_mgr.is_connected());
        assert_eq!(driver.opens(), 1);
        assert_eq!(driver.closes(), 0);
    }

    #[test]
    fn test_check_connection_failure() {
        let driver = MockDriver::new().failing_open("no route to host");
        let mut conn_mgr = manager(&driver);

        let status = conn_mgr.check_connection();
        assert!(!status.success);
        assert!(status.error_message.unwrap().contains("no route to host"));
        assert!(!conn_mgr.is_connected());
    }

    #[test]
    fn test_failed_close_still_disconnects() {
        let driver = MockDriver::new().failing_close("socket already gone");
        let mut conn_mgr = manager(&driver);
        conn_mgr.connect().unwrap();

        assert!(conn_mgr.disconnect().is_err());
        assert!(!conn_mgr.is_connected());
    }

    #[test]
    fn test_drop_closes_open_connection() {
        let driver = MockDriver::new();
        {
            let mut conn_mgr = manager(&driver);
            conn_mgr.connect().unwrap();
        }
        assert_eq!(driver.closes(), 1);

        {
            let _conn_mgr = manager(&driver);
        }
        assert_eq!(driver.closes(), 1);
    }
}
