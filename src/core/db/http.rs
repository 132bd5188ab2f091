//! Druid SQL over HTTP.
//!
//! Statements are POSTed to the broker's SQL endpoint with
//! `resultFormat: "array"` and both header rows enabled, so the first row of
//! every response carries the column names and the second their SQL types.

use super::driver::{ColumnDescription, ConnectParams, Connection, Cursor, Driver, Row, SqlParameter};
use crate::core::{DruidError, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const HEALTH_PATH: &str = "/status/health";

/// Opens HTTP sessions against a Druid broker or router.
#[derive(Debug, Clone, Default)]
pub struct HttpDriver {
    timeout: Option<Duration>,
}

impl HttpDriver {
    pub fn new() -> Self {
        HttpDriver { timeout: None }
    }

    /// Sets a whole-request timeout on every request of the opened sessions.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        HttpDriver { timeout }
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    user: String,
    password: Option<String>,
}

#[derive(Debug, Clone)]
struct Endpoint {
    client: Client,
    base_url: String,
    sql_url: String,
    credentials: Option<Credentials>,
}

impl Endpoint {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(creds) => request.basic_auth(&creds.user, creds.password.as_deref()),
            None => request,
        }
    }

    fn probe(&self) -> Result<()> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .map_err(|e| DruidError::Connection(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DruidError::Connection(format!(
                "{} responded with status {}",
                url, status
            )))
        }
    }
}

impl Driver for HttpDriver {
    type Connection = HttpConnection;

    fn open(&self, params: &ConnectParams) -> Result<HttpConnection> {
        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DruidError::Connection(format!("failed to build HTTP client: {}", e)))?;

        let base_url = format!("{}://{}:{}", params.scheme, params.host, params.port);
        let path = if params.path.starts_with('/') {
            params.path.clone()
        } else {
            format!("/{}", params.path)
        };

        let endpoint = Endpoint {
            client,
            sql_url: format!("{}{}", base_url, path),
            base_url,
            credentials: params.user.as_ref().map(|user| Credentials {
                user: user.clone(),
                password: params.password.clone(),
            }),
        };
        endpoint.probe()?;

        Ok(HttpConnection {
            endpoint: Some(endpoint),
        })
    }
}

/// An HTTP session. Druid SQL is stateless, so the session is the client
/// plus the endpoint it talks to.
#[derive(Debug)]
pub struct HttpConnection {
    endpoint: Option<Endpoint>,
}

impl HttpConnection {
    fn endpoint(&self) -> Result<&Endpoint> {
        self.endpoint
            .as_ref()
            .ok_or_else(|| DruidError::Connection("connection is closed".to_string()))
    }
}

impl Connection for HttpConnection {
    type Cursor = HttpCursor;

    fn cursor(&mut self) -> Result<HttpCursor> {
        Ok(HttpCursor {
            endpoint: self.endpoint()?.clone(),
            description: None,
            rows: None,
        })
    }

    // Druid SQL has no transactions.
    fn commit(&mut self) -> Result<()> {
        self.endpoint().map(|_| ())
    }

    fn close(&mut self) -> Result<()> {
        self.endpoint = None;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SqlRequest<'a> {
    query: &'a str,
    result_format: &'static str,
    header: bool,
    sql_types_header: bool,
    #[serde(skip_serializing_if = "no_parameters")]
    parameters: &'a [SqlParameter],
    context: SqlContext,
}

fn no_parameters(parameters: &&[SqlParameter]) -> bool {
    parameters.is_empty()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SqlContext {
    sql_query_id: String,
}

/// Error body returned by Druid for failed queries.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: Option<String>,
    error_message: Option<String>,
}

/// Extracts the most specific message from a Druid error body.
pub(crate) fn error_message_from_body(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error_message: Some(message),
            ..
        }) => message,
        Ok(ErrorBody {
            error: Some(error), ..
        }) => error,
        _ if body.trim().is_empty() => "empty error response".to_string(),
        _ => body.trim().to_string(),
    }
}

/// SQL type names Druid reports in the `sqlTypesHeader` row.
const SQL_TYPE_NAMES: &[&str] = &[
    "ARRAY", "BIGINT", "BOOLEAN", "CHAR", "DATE", "DECIMAL", "DOUBLE", "FLOAT", "INTEGER", "OTHER",
    "REAL", "SMALLINT", "TIMESTAMP", "TINYINT", "VARCHAR",
];

fn is_sql_type_name(value: &serde_json::Value) -> bool {
    value.as_str().map_or(false, |name| {
        let base = name.split(|c: char| !c.is_ascii_alphabetic()).next().unwrap_or_default();
        SQL_TYPE_NAMES.contains(&base)
    })
}

/// The second row is only taken as the types header when it has one SQL type
/// name per column. Brokers that predate `sqlTypesHeader` ignore the flag
/// and send data straight after the names.
fn is_types_row(row: &[serde_json::Value], width: usize) -> bool {
    row.len() == width && row.iter().all(is_sql_type_name)
}

/// Splits an array-format response into column metadata and data rows.
pub(crate) fn split_header_rows(mut rows: Vec<Row>) -> Result<(Vec<ColumnDescription>, Vec<Row>)> {
    if rows.is_empty() {
        return Err(DruidError::Execution(
            "response is missing the header row".to_string(),
        ));
    }
    let mut data = rows.split_off(1);
    let names = rows.pop().unwrap_or_default();

    let types = match data.first() {
        Some(row) if is_types_row(row, names.len()) => data.remove(0),
        _ => Vec::new(),
    };

    let description = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| ColumnDescription {
            name: match name {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            },
            type_name: types.get(i).and_then(|t| t.as_str()).map(str::to_string),
        })
        .collect();

    Ok((description, data))
}

/// Runs statements over an `HttpConnection`'s endpoint.
#[derive(Debug)]
pub struct HttpCursor {
    endpoint: Endpoint,
    description: Option<Vec<ColumnDescription>>,
    rows: Option<Vec<Row>>,
}

impl Cursor for HttpCursor {
    fn execute(&mut self, sql: &str, parameters: &[SqlParameter]) -> Result<()> {
        self.description = None;
        self.rows = None;

        let query_id = uuid::Uuid::new_v4().to_string();
        let request = SqlRequest {
            query: sql,
            result_format: "array",
            header: true,
            sql_types_header: true,
            parameters,
            context: SqlContext {
                sql_query_id: query_id.clone(),
            },
        };

        let started = Instant::now();
        debug!(query_id = %query_id, url = %self.endpoint.sql_url, "Sending SQL query");
        let response = self
            .endpoint
            .authorize(self.endpoint.client.post(&self.endpoint.sql_url))
            .json(&request)
            .send()
            .map_err(|e| DruidError::Execution(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = error_message_from_body(&body);
            warn!(query_id = %query_id, status = %status, "Druid rejected query: {}", message);
            return Err(DruidError::Execution(message));
        }

        let rows: Vec<Row> = response
            .json()
            .map_err(|e| DruidError::Execution(format!("malformed response: {}", e)))?;
        let (description, data) = split_header_rows(rows)?;
        debug!(
            query_id = %query_id,
            rows = data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "SQL query finished"
        );

        self.description = Some(description);
        self.rows = Some(data);
        Ok(())
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
        self.description = None;
        self.rows = None;
    }
}
