//! `openlb` binary entry point.

mod commands;
mod output;
mod prompt;

use clap::Parser;
use openlb_sdk::Error;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    let code = tokio::select! {
        result = commands::run(cli) => match result {
            Ok(()) => 0,
            Err(err) => report(&err),
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("... terminating openlb client");
            130
        }
    };
    std::process::exit(code);
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "openlb_cli=debug,openlb_sdk=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Print the failure and pick the exit code: 2 for usage mistakes the
/// caller can fix, 1 for anything the service or network reported.
fn report(err: &Error) -> i32 {
    eprintln!("ERROR: {err}");
    if let Error::Api(api) = err {
        if let Some(details) = &api.details {
            eprintln!("{details}");
        }
    }
    match err {
        Error::Command(_) | Error::MissingOptions { .. } | Error::InvalidScope(_) => 2,
        _ => 1,
    }
}
