use crate::core::db::driver::Driver;
use crate::core::db::query::{HandlerResponse, StatusResponse};
use crate::core::db::render::parse_sql;
use crate::handler::{DatabaseHandler, DruidHandler};
use std::io::{self, BufRead, Write};

/// Represents a parsed REPL command.
#[derive(Debug, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Check,
    Connect,
    Disconnect,
    Tables,
    Columns(String),
    Native(String),
    Sql(String),
    Unknown(String),
}

/// Parses a user input string into a corresponding `Command`.
///
/// If the input starts with a colon (`:`), it is interpreted as a command.
/// Otherwise, it is treated as a SQL query.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    if !input.starts_with(':') {
        return Command::Sql(input.to_string());
    }
    let trimmed = &input[1..];
    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };
    match name {
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "check" => Command::Check,
        "connect" => Command::Connect,
        "disconnect" => Command::Disconnect,
        "tables" => Command::Tables,
        "columns" if !rest.is_empty() => Command::Columns(rest.to_string()),
        "native" if !rest.is_empty() => Command::Native(rest.to_string()),
        _ => Command::Unknown(input.to_string()),
    }
}

/// Formats a response envelope as plain text.
pub fn format_response(response: &HandlerResponse) -> String {
    match response {
        HandlerResponse::Table(result) => {
            let header = result.columns.join(" | ");
            let mut out = format!("{}\n{}\n", header, "-".repeat(header.len()));
            for row in &result.rows {
                let cells: Vec<String> = row
                    .iter()
                    .map(|value| match value {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => "NULL".to_string(),
                        other => other.to_string(),
                    })
                    .collect();
                out.push_str(&cells.join(" | "));
                out.push('\n');
            }
            out.push_str(&format!("\n({} rows)", result.row_count));
            out
        }
        HandlerResponse::Ok => "OK".to_string(),
        HandlerResponse::Error { error_message } => format!("Error: {}", error_message),
    }
}

fn format_status(status: &StatusResponse) -> String {
    match &status.error_message {
        None if status.success => "Connection OK".to_string(),
        Some(message) => format!("Connection failed: {}", message),
        None => "Connection failed".to_string(),
    }
}

/// Runs one command against the handler, writing its output to `out`.
///
/// Returns `Ok(false)` when the command failed.
pub fn run_command<D: Driver, W: Write>(
    handler: &mut DruidHandler<D>,
    command: Command,
    out: &mut W,
) -> io::Result<bool> {
    let (text, ok) = match command {
        Command::Help => (help_text().to_string(), true),
        Command::Quit => (String::new(), true),
        Command::Check => {
            let status = handler.check_connection();
            (format_status(&status), status.success)
        }
        Command::Connect => match handler.connect() {
            Ok(()) => (format!("Connected to {}", handler.config().base_url()), true),
            Err(e) => (format!("Error: {}", e), false),
        },
        Command::Disconnect => match handler.disconnect() {
            Ok(()) => ("Disconnected".to_string(), true),
            Err(e) => (format!("Error: {}", e), false),
        },
        Command::Tables => respond(handler.list_tables()),
        Command::Columns(table) => respond(handler.list_columns(&table)),
        Command::Native(sql) => respond(handler.execute_raw(&sql)),
        Command::Sql(sql) => match parse_sql(&sql) {
            Ok(statement) => respond(handler.execute_ast(&statement)),
            Err(e) => (format!("Error: {}", e), false),
        },
        Command::Unknown(input) => (format!("Unknown command: {} (try :help)", input), false),
    };

    if !text.is_empty() {
        writeln!(out, "{}", text)?;
    }
    Ok(ok)
}

fn respond(response: HandlerResponse) -> (String, bool) {
    let ok = !response.is_error();
    (format_response(&response), ok)
}

fn help_text() -> &'static str {
    "Available commands:
  :help - List all available commands
  :check - Check connectivity to Druid
  :connect - Open a connection and keep it open
  :disconnect - Close the open connection
  :tables - List tables
  :columns <table> - List the columns of a table
  :native <sql> - Run SQL exactly as written
  :quit - Exit

Or enter SQL queries directly without any prefix."
}

/// Runs a REPL shell that reads commands from `input` until `:quit` or end
/// of input.
pub fn run_repl<D: Driver, R: BufRead, W: Write>(
    handler: &mut DruidHandler<D>,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "Welcome to the druidql REPL! Type :quit to exit.")?;
    write!(out, "> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let command = parse_command(trimmed);
            if command == Command::Quit {
                break;
            }
            run_command(handler, command, out)?;
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}
