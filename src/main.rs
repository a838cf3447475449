//! Actionflow CLI entry point.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use actionflow::cli::{Cli, CommandDispatcher, Console};
use actionflow::config::Settings;
use actionflow::ui::FlowTheme;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag or `AF_DEBUG` sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Records go to stderr and, when the home directory is writable, are
/// appended to `logfile` without colors.
fn init_tracing(debug: bool, logfile: &Path) {
    let filter = if debug {
        EnvFilter::new("actionflow=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("actionflow=info"))
    };

    let file_layer = logfile
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(logfile))
        .ok()
        .map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    init_tracing(cli.debug || settings.debug, &settings.logfile());

    tracing::debug!("Actionflow starting with args: {:?}", cli);

    let theme = FlowTheme::for_terminal(cli.no_color);
    let mut stdout = std::io::stdout();
    let mut console = Console::new(&mut stdout, theme.clone());

    let result = CommandDispatcher::new(settings).and_then(|d| d.dispatch(&cli, &mut console));
    match result {
        Ok(result) => ExitCode::from(result.exit_status()),
        Err(e) => {
            eprintln!("{}", theme.format_error(&format!("Error: {}", e)));
            ExitCode::from(1)
        }
    }
}
