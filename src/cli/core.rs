use std::io;

use strsim::levenshtein;
use thiserror::Error;

use crate::cli::commands::{all_definitions, CommandDefinition, CommandRegistry};
use crate::cli::output;
use crate::core::LedgerManager;
use crate::errors::LedgerError;

pub type CommandResult = Result<(), CommandError>;

/// Failure of a single command; the shell reports it and moves on.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error("exit requested")]
    ExitRequested,
}

/// Failure that stops the CLI altogether.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("{failed} command(s) failed")]
    CommandsFailed { failed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// State shared by every command: the ledger plus display preferences.
pub struct ShellContext {
    pub manager: LedgerManager,
    pub currency_symbol: String,
    pub registry: CommandRegistry,
    pub running: bool,
}

impl ShellContext {
    pub fn new(manager: LedgerManager, currency_symbol: impl Into<String>) -> Self {
        Self {
            manager,
            currency_symbol: currency_symbol.into(),
            registry: CommandRegistry::new(all_definitions()),
            running: true,
        }
    }

    pub fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub fn money(&self, amount: f64) -> String {
        crate::currency::format_amount(amount, &self.currency_symbol)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|definition| definition.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            Err(CommandError::InvalidArguments(self.unknown_command(raw)))
        }
    }

    /// Message for an unknown command, with the closest known name when one is near.
    pub(crate) fn unknown_command(&self, input: &str) -> String {
        let mut message = format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        );
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &input.to_lowercase()), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                message.push_str(&format!(" Did you mean `{}`?", name));
            }
        }
        message
    }

    pub(crate) fn report_error(&self, err: &CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help <command>` for usage details.");
            }
            other => output::error(other),
        }
    }
}
