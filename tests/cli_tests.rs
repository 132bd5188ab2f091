#[cfg(test)]
mod cli_tests {
    use assert_cmd::Command;
    use std::io::Write;
    use std::net::TcpListener;
    use tempfile::NamedTempFile;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn unreachable_config() -> NamedTempFile {
        config_file(&format!(
            "[connection]\nhost = \"127.0.0.1\"\nport = {}\n\n[http]\ntimeout_secs = 5\n",
            closed_port()
        ))
    }

    #[test]
    fn test_missing_config_file() {
        let output = Command::cargo_bin("druidql")
            .unwrap()
            .arg("/nonexistent/druidql.toml")
            .arg(":help")
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load config"));
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let config = config_file("[connection]\nhost = \"localhost\"\nport = 8888\nscheme = \"ftp\"\n");
        let output = Command::cargo_bin("druidql")
            .unwrap()
            .arg(config.path())
            .arg(":help")
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported scheme"));
    }

    #[test]
    fn test_help_needs_no_connection() {
        let config = unreachable_config();
        let output = Command::cargo_bin("druidql")
            .unwrap()
            .arg(config.path())
            .arg(":help")
            .output()
            .unwrap();
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains(":columns <table>"));
    }

    #[test]
    fn test_check_against_closed_port() {
        let config = unreachable_config();
        let output = Command::cargo_bin("druidql")
            .unwrap()
            .args([config.path().to_str().unwrap(), ":check"])
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("Connection failed"));
    }

    #[test]
    fn test_unparsable_sql() {
        let config = unreachable_config();
        let output = Command::cargo_bin("druidql")
            .unwrap()
            .args([config.path().to_str().unwrap(), "SELEKT", "1"])
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("Parse error"));
    }

    #[test]
    fn test_repl_reads_stdin() {
        let config = unreachable_config();
        let output = Command::cargo_bin("druidql")
            .unwrap()
            .arg(config.path())
            .write_stdin(":help\n:quit\n")
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Welcome to the druidql REPL"));
        assert!(stdout.contains("Available commands"));
    }
}
