//! Non-interactive command runner over a persisted ledger tree.

pub mod commands;
pub mod core;
pub mod output;
mod shell;

pub use self::core::{CliError, CommandError, ShellContext};
pub use shell::run_cli;
