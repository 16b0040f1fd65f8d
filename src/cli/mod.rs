//! CLI interface using clap.
//!
//! clap handles the flags (verbosity, backend selection) and collects
//! the operation arguments as raw trailing strings; the positional
//! operation grammar itself is applied by `OperationRequest::parse`,
//! which wrappers depend on matching exactly.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Operator CLI for administering voter and pollworker smart cards.
///
/// Operations: `test` | `check` | `setup <pin>` | `status <pin>` |
/// `<pin> <voterSessionId> <provisionalMode> <verificationCode> <avsMode> [<provisionalCode>]`
#[derive(Parser, Debug)]
#[command(name = "votecard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Card Access Service backend.
    #[arg(long, env = "VOTECARD_BACKEND", default_value = "pcsc")]
    pub backend: Backend,

    /// State file for the memory backend (card persists between runs).
    #[arg(long, env = "VOTECARD_STATE")]
    pub state: Option<PathBuf>,

    /// Operation and its positional arguments.
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,
}

/// Which Card Access Service adapter to run against.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Physical readers through the PC/SC stack.
    Pcsc,
    /// In-memory simulated reader and card.
    Memory,
}
