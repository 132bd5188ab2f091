use druidql::config;
use druidql::handler::{DruidHandler, HANDLER_NAME};
use druidql::repl;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    // Logs go to stderr so query output stays clean on stdout
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    info!("Starting druidql...");

    let mut args = std::env::args().skip(1);
    let config_path = match args.next().map(PathBuf::from).or_else(config::default_config_path) {
        Some(path) => path,
        None => {
            eprintln!("No config file given and no default config directory available.");
            return ExitCode::FAILURE;
        }
    };

    let config = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut handler = DruidHandler::from_config(HANDLER_NAME, config);
    let command: Vec<String> = args.collect();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = if command.is_empty() {
        repl::run_repl(&mut handler, io::stdin().lock(), &mut out).map(|_| true)
    } else {
        repl::run_command(&mut handler, repl::parse_command(&command.join(" ")), &mut out)
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("I/O error: {}", e);
            ExitCode::FAILURE
        }
    }
}
