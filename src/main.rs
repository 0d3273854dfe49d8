//! Pipegraph CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use pipegraph::cli::{Cli, CommandDispatcher};
use pipegraph::ui::{should_use_colors, Output, OutputMode, PipegraphTheme};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("pipegraph=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pipegraph=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("pipegraph starting with args: {:?}", cli);

    let output = Output::new(if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    });
    let theme = if cli.no_color || !should_use_colors() {
        PipegraphTheme::plain()
    } else {
        PipegraphTheme::new()
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let working_dir = std::env::current_dir().unwrap_or_default();
    let dispatcher = CommandDispatcher::new(working_dir, cancel);

    match dispatcher.dispatch(&cli, &output, &theme).await {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            output.eprintln(&theme.format_error(&format!("Error: {}", e)));
            ExitCode::from(1)
        }
    }
}
