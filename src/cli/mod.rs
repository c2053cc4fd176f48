//! The `flatmoney_cli` command line: one command per invocation.

pub mod args;
pub mod commands;
pub mod context;
pub mod io;
pub mod output;

use std::env;

use crate::errors::AppError;

pub use args::{parse, Command, Invocation, RecordArgs};
pub use context::CliContext;

/// Entry point used by the binary.
pub fn run_cli() -> Result<(), AppError> {
    run(env::args().skip(1))
}

pub fn run<I, S>(args: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let invocation = args::parse(args)?;
    if invocation.command == Command::Help {
        println!("{}", args::USAGE);
        return Ok(());
    }
    let context = CliContext::load(invocation.assume_yes)?;
    tracing::debug!(command = ?invocation.command, "dispatching command");
    commands::dispatch(&context, invocation.command)
}
