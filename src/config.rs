use crate::core::{DruidError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Query path used when the connection data does not name one.
pub const DEFAULT_PATH: &str = "/druid/v2/sql/";

/// URI scheme used when the connection data does not name one.
pub const DEFAULT_SCHEME: &str = "http";

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

/// Parameters for connecting to a Druid broker or router.
///
/// Optional keys are filled in at deserialization time, so an effective
/// config always carries a `path` and a `scheme`, and `user`/`password`
/// are present as `None` rather than missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Creates a config for `host:port` with every optional key defaulted.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ConnectionConfig {
            host: host.into(),
            port,
            path: default_path(),
            scheme: default_scheme(),
            user: None,
            password: None,
        }
    }

    /// Builds a config from the key/value connection data handed over by a
    /// host framework.
    ///
    /// # Errors
    ///
    /// Returns `DruidError::Config` when a required key is missing, a value has
    /// the wrong type, or validation fails.
    pub fn from_map(connection_data: serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let config: ConnectionConfig = serde_json::from_value(serde_json::Value::Object(connection_data))
            .map_err(|e| DruidError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(DruidError::Config("host is required".to_string()));
        }
        if self.scheme != "http" && self.scheme != "https" {
            return Err(DruidError::Config(format!(
                "unsupported scheme '{}', expected 'http' or 'https'",
                self.scheme
            )));
        }
        if self.password.is_some() && self.user.is_none() {
            warn!("password given without a user, requests will not be authenticated");
        }
        Ok(())
    }

    /// Base URL of the Druid service, without the query path.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Primitive type tag for a connection argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    Str,
    Int,
}

/// Describes one connection argument for host framework UIs and docs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionArg {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    pub description: &'static str,
}

/// Returns the connection argument schema, in declaration order.
pub fn connection_args() -> Vec<ConnectionArg> {
    vec![
        ConnectionArg {
            name: "host",
            arg_type: ArgType::Str,
            description: "The host name or IP address of Apache Druid.",
        },
        ConnectionArg {
            name: "port",
            arg_type: ArgType::Int,
            description: "The port that Apache Druid is running on.",
        },
        ConnectionArg {
            name: "path",
            arg_type: ArgType::Str,
            description: "The query path.",
        },
        ConnectionArg {
            name: "scheme",
            arg_type: ArgType::Str,
            description: "The URI schema. This parameter is optional and the default will be http.",
        },
        ConnectionArg {
            name: "user",
            arg_type: ArgType::Str,
            description: "The user name used to authenticate with Apache Druid. This parameter is optional.",
        },
        ConnectionArg {
            name: "password",
            arg_type: ArgType::Str,
            description: "The password used to authenticate with Apache Druid. This parameter is optional.",
        },
    ]
}

/// Example connection values for documentation.
pub fn connection_args_example() -> ConnectionConfig {
    ConnectionConfig::new("localhost", 8888)
}

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub http: Option<HttpConfig>,
}

/// HTTP transport configuration.
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Transport timeout, if one is configured.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.http
            .as_ref()
            .and_then(|http| http.timeout_secs)
            .map(std::time::Duration::from_secs)
    }
}

/// Parses and validates configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.connection.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = druidql::config::load_config("druidql.toml").expect("Failed to load config");
/// println!("{}", config.connection.base_url());
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// `<config dir>/druidql/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("druidql").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_CONFIG: &str = r#"
[connection]
host = "druid.internal"
port = 8082
scheme = "https"
user = "analyst"
password = "secret"

[http]
timeout_secs = 15
"#;

    fn map(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_defaults_applied_from_map() {
        let config = ConnectionConfig::from_map(map(json!({"host": "localhost", "port": 8888}))).unwrap();
        assert_eq!(config.path, "/druid/v2/sql/");
        assert_eq!(config.scheme, "http");
        assert_eq!(config.user, None);
        assert_eq!(config.password, None);
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let config = ConnectionConfig::from_map(map(json!({
            "host": "localhost",
            "port": 8082,
            "path": "/custom/sql/",
            "scheme": "https",
            "user": "u",
            "password": "p"
        })))
        .unwrap();
        assert_eq!(config.path, "/custom/sql/");
        assert_eq!(config.scheme, "https");
        assert_eq!(config.user.as_deref(), Some("u"));
        assert_eq!(config.base_url(), "https://localhost:8082");
    }

    #[test]
    fn test_missing_required_key() {
        let result = ConnectionConfig::from_map(map(json!({"host": "localhost"})));
        match result {
            Err(DruidError::Config(msg)) => assert!(msg.contains("port")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ConnectionConfig::new("", 8888);
        assert!(config.validate().is_err());

        config.host = "localhost".to_string();
        config.scheme = "ftp".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("ftp"));

        config.scheme = "http".to_string();
        config.password = Some("p".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_password_without_user() {
        let config =
            ConnectionConfig::from_map(map(json!({"host": "localhost", "port": 8888, "password": "p"}))).unwrap();
        assert_eq!(config.user, None);
        assert_eq!(config.password.as_deref(), Some("p"));
    }

    #[test]
    fn test_port_must_be_an_integer() {
        let result = ConnectionConfig::from_map(map(json!({"host": "localhost", "port": "8888"})));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_str() {
        let config = parse_config(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.connection.host, "druid.internal");
        assert_eq!(config.connection.path, DEFAULT_PATH);
        assert_eq!(config.connection.scheme, "https");
        assert_eq!(config.timeout(), Some(std::time::Duration::from_secs(15)));
    }

    #[test]
    fn test_load_config_without_http_section() {
        let config = parse_config("[connection]\nhost = \"localhost\"\nport = 8888\n").unwrap();
        assert_eq!(config.connection, ConnectionConfig::new("localhost", 8888));
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_connection_args_metadata() {
        let args = connection_args();
        let names: Vec<&str> = args.iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["host", "port", "path", "scheme", "user", "password"]);
        assert_eq!(args[1].arg_type, ArgType::Int);
        assert!(args.iter().filter(|a| a.name != "port").all(|a| a.arg_type == ArgType::Str));

        let rendered = serde_json::to_value(&args[0]).unwrap();
        assert_eq!(rendered["type"], "str");
    }

    #[test]
    fn test_connection_args_example() {
        let example = connection_args_example();
        assert_eq!(example.host, "localhost");
        assert_eq!(example.port, 8888);
        assert_eq!(example.path, "/druid/v2/sql/");
        assert_eq!(example.scheme, "http");
    }
}
