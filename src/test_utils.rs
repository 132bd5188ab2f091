/// # Test Utilities Module
///
/// An in-memory `Driver` for exercising handlers without a Druid cluster.
///
/// `MockDriver` is cheaply cloneable; clones share one call log, so a test
/// can hand a clone to a handler and inspect the counters afterwards.
/// Statement outcomes are scripted in order with `with_result`; once the
/// script runs out every statement succeeds without rows.

use crate::core::db::driver::{ColumnDescription, ConnectParams, Connection, Cursor, Driver, Row, SqlParameter};
use crate::core::{DruidError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Scripted outcome of one executed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResult {
    Rows { columns: Vec<String>, rows: Vec<Row> },
    Empty,
    Fail(String),
}

impl MockResult {
    pub fn rows(columns: &[&str], rows: Vec<Row>) -> Self {
        MockResult::Rows {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    opens: usize,
    closes: usize,
    commits: usize,
    cursor_closes: usize,
    last_params: Option<ConnectParams>,
    executed: Vec<String>,
    parameters: Vec<Vec<SqlParameter>>,
    results: VecDeque<MockResult>,
    open_error: Option<String>,
    close_error: Option<String>,
}

/// Thread-safe recording driver for tests
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver::default()
    }

    /// Queues the outcome of the next unscripted statement.
    pub fn with_result(self, result: MockResult) -> Self {
        self.push_result(result);
        self
    }

    /// Makes every `open` fail with a connection error.
    pub fn failing_open(self, message: &str) -> Self {
        self.lock().open_error = Some(message.to_string());
        self
    }

    /// Makes every connection `close` fail.
    pub fn failing_close(self, message: &str) -> Self {
        self.lock().close_error = Some(message.to_string());
        self
    }

    pub fn push_result(&self, result: MockResult) {
        self.lock().results.push_back(result);
    }

    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn cursor_closes(&self) -> usize {
        self.lock().cursor_closes
    }

    pub fn last_params(&self) -> Option<ConnectParams> {
        self.lock().last_params.clone()
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    /// Bound parameters of each executed statement, in order.
    pub fn parameters(&self) -> Vec<Vec<SqlParameter>> {
        self.lock().parameters.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;

    fn open(&self, params: &ConnectParams) -> Result<MockConnection> {
        let mut state = self.lock();
        state.last_params = Some(params.clone());
        if let Some(message) = &state.open_error {
            return Err(DruidError::Connection(message.clone()));
        }
        state.opens += 1;
        Ok(MockConnection {
            driver: self.clone(),
            closed: false,
        })
    }
}

#[derive(Debug)]
pub struct MockConnection {
    driver: MockDriver,
    closed: bool,
}

impl MockConnection {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(DruidError::Connection("connection is closed".to_string()));
        }
        Ok(())
    }
}

impl Connection for MockConnection {
    type Cursor = MockCursor;

    fn cursor(&mut self) -> Result<MockCursor> {
        self.ensure_open()?;
        Ok(MockCursor {
            driver: self.driver.clone(),
            description: None,
            rows: None,
        })
    }

    fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.driver.lock().commits += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        let mut state = self.driver.lock();
        state.closes += 1;
        match &state.close_error {
            Some(message) => Err(DruidError::Connection(message.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct MockCursor {
    driver: MockDriver,
    description: Option<Vec<ColumnDescription>>,
    rows: Option<Vec<Row>>,
}

impl Cursor for MockCursor {
    fn execute(&mut self, sql: &str, parameters: &[SqlParameter]) -> Result<()> {
        let result = {
            let mut state = self.driver.lock();
            state.executed.push(sql.to_string());
            state.parameters.push(parameters.to_vec());
            state.results.pop_front().unwrap_or(MockResult::Empty)
        };

        match result {
            MockResult::Rows { columns, rows } => {
                self.description = Some(columns.into_iter().map(ColumnDescription::new).collect());
                self.rows = Some(rows);
                Ok(())
            }
            MockResult::Empty => {
                self.description = None;
                self.rows = Some(Vec::new());
                Ok(())
            }
            MockResult::Fail(message) => Err(DruidError::Execution(message)),
        }
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.rows
            .take()
            .ok_or_else(|| DruidError::Execution("no statement has been executed".to_string()))
    }

    fn description(&self) -> Option<&[ColumnDescription]> {
        self.description.as_deref()
    }

    fn close(&mut self) {
        self.driver.lock().cursor_closes += 1;
    }
}
