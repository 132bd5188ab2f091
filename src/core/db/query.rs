/// Query Execution Module
///
/// This module runs statements over an open connection and normalizes the
/// outcome into the response envelope returned to callers.

use super::driver::{Connection, Cursor, Row, SqlParameter};
use crate::core::{DruidError, Result};
use serde::Serialize;

/// Represents the tabular result of a SQL query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names, in result order
    pub columns: Vec<String>,
    /// Rows of data, one value per column
    pub rows: Vec<Row>,
    /// Number of rows returned
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a new QueryResult from column names and row data
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        QueryResult {
            columns,
            rows,
            row_count,
        }
    }

    /// Creates a result with the given columns and no rows
    pub fn empty(columns: Vec<String>) -> Self {
        QueryResult::new(columns, Vec::new())
    }

    /// Position of the named column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Keeps only the `(source, target)` columns, in the given order, and
    /// renames each source column to its target name.
    ///
    /// # Errors
    ///
    /// Returns `DruidError::Execution` naming the first source column the
    /// result does not have.
    pub fn project(&self, mapping: &[(&str, &str)]) -> Result<QueryResult> {
        let indices = mapping
            .iter()
            .map(|(source, _)| {
                self.column_index(source).ok_or_else(|| {
                    DruidError::Execution(format!("result has no column '{}'", source))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        let columns = mapping.iter().map(|(_, target)| target.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(serde_json::Value::Null))
                    .collect()
            })
            .collect();

        Ok(QueryResult::new(columns, rows))
    }
}

/// Response envelope returned by every query operation.
///
/// Exactly one outcome per call: a table, a bare acknowledgment, or an
/// error message. Errors travel in the envelope, never as `Err`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HandlerResponse {
    Table(QueryResult),
    Ok,
    Error { error_message: String },
}

impl HandlerResponse {
    pub fn error(message: impl Into<String>) -> Self {
        HandlerResponse::Error {
            error_message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, HandlerResponse::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            HandlerResponse::Error { error_message } => Some(error_message),
            HandlerResponse::Table(_) | HandlerResponse::Ok => None,
        }
    }

    pub fn table(&self) -> Option<&QueryResult> {
        match self {
            HandlerResponse::Table(result) => Some(result),
            HandlerResponse::Ok | HandlerResponse::Error { .. } => None,
        }
    }

    /// Applies [`QueryResult::project`] to a table response.
    ///
    /// An `Ok` response (no rows) becomes an empty table with the target
    /// column names. Errors pass through unchanged.
    pub fn project(self, mapping: &[(&str, &str)]) -> HandlerResponse {
        match self {
            HandlerResponse::Table(result) => match result.project(mapping) {
                Ok(projected) => HandlerResponse::Table(projected),
                Err(e) => HandlerResponse::error(e.message()),
            },
            HandlerResponse::Ok => HandlerResponse::Table(QueryResult::empty(
                mapping.iter().map(|(_, target)| target.to_string()).collect(),
            )),
            error @ HandlerResponse::Error { .. } => error,
        }
    }
}

/// Outcome of a connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub error_message: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        StatusResponse {
            success: true,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        StatusResponse {
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// Query execution service that operates on an open connection
pub struct QueryExecutor<'a, C: Connection> {
    connection: &'a mut C,
}

impl<'a, C: Connection> QueryExecutor<'a, C> {
    /// Creates a new QueryExecutor for the given connection
    pub fn new(connection: &'a mut C) -> Self {
        QueryExecutor { connection }
    }

    /// Executes a statement exactly once and shapes its outcome.
    ///
    /// A statement that yields rows becomes a `Table` whose columns come from
    /// the cursor description. A statement without rows is committed and
    /// becomes `Ok`. The cursor is closed on every path.
    ///
    /// # Errors
    ///
    /// Returns whatever the cursor or the commit reports.
    pub fn execute(&mut self, sql: &str, parameters: &[SqlParameter]) -> Result<HandlerResponse> {
        let mut cursor = self.connection.cursor()?;
        let fetched = fetch(&mut cursor, sql, parameters);
        cursor.close();

        let (columns, rows) = fetched?;
        if rows.is_empty() {
            self.connection.commit()?;
            return Ok(HandlerResponse::Ok);
        }
        Ok(HandlerResponse::Table(QueryResult::new(columns, rows)))
    }
}

fn fetch<K: Cursor>(cursor: &mut K, sql: &str, parameters: &[SqlParameter]) -> Result<(Vec<String>, Vec<Row>)> {
    cursor.execute(sql, parameters)?;
    let rows = cursor.fetch_all()?;
    let columns = cursor
        .description()
        .map(|description| description.iter().map(|c| c.name.clone()).collect())
        .unwrap_or_default();
    Ok((columns, rows))
}
