//! votecard - administer voter and pollworker smart cards.
//!
//! Inspects the inserted card and either reads a status report from it
//! or writes a fresh voter-session record to it. Card I/O goes through
//! the Card Access Service port; the PC/SC backend is the default and a
//! file-backed simulator is available for rehearsal and testing.
//!
//! Operations, one per invocation:
//!   votecard test                     # exercise the reader path
//!   votecard check                    # report the inserted card's type
//!   votecard setup <pin>              # read the election signature (base64)
//!   votecard status <pin>             # full tagged status report
//!   votecard <pin> <voterSessionId> <provisionalMode> \
//!            <verificationCode> <avsMode> [<provisionalCode>]

mod application;
mod cli;
mod domain;
mod infrastructure;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::Outcome;
use cli::{Backend, Cli};
use domain::{CardService, OperationRequest};
use infrastructure::{MemoryCardService, PcscCardService};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity; diagnostics go to stderr, the
    // single-line result contract stays on stdout.
    setup_logging(cli.verbose);

    // Exit status is not part of the contract; wrappers parse the line.
    // Panics unwind through the reader-session guard (so the reader is
    // still released) and are funneled into one terminal error line.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(cli)));
    match result {
        Ok(Ok(Outcome::Success)) => println!("Success"),
        Ok(Ok(Outcome::Report(report))) => println!("{report}"),
        Ok(Err(e)) => println!("Error: {e}"),
        Err(_) => {
            tracing::error!("Panicked while executing operation");
            println!(
                "Error: {}",
                domain::AppError::unexpected("Unexpected failure while executing operation")
            );
        }
    }
}

/// Main application logic: parse the operation, build the backend, run.
fn run(cli: Cli) -> domain::Result<Outcome> {
    let request = OperationRequest::parse(&cli.args)?;
    tracing::debug!("Executing {:?}", request);

    let mut service = build_service(&cli)?;
    application::execute(service.as_mut(), &request)
}

/// Builds the configured Card Access Service backend.
fn build_service(cli: &Cli) -> domain::Result<Box<dyn CardService>> {
    match cli.backend {
        Backend::Pcsc => Ok(Box::new(PcscCardService::new()?)),
        Backend::Memory => match &cli.state {
            Some(path) => Ok(Box::new(MemoryCardService::with_state_file(path)?)),
            None => Ok(Box::new(MemoryCardService::with_empty_card())),
        },
    }
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
