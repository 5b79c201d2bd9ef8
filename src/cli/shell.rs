use std::{
    fmt,
    io::{self, BufRead},
    path::PathBuf,
};

use shell_words::split;

use crate::cli::core::{CliError, CommandError, LoopControl, ShellContext};
use crate::cli::output;
use crate::config::ConfigManager;
use crate::core::LedgerManager;
use crate::storage::{JsonStorage, LoadOutcome};

/// Runs the CLI for the given process arguments (program name excluded).
///
/// `--file <path>` selects the ledger document. With a command left over, that
/// one command runs; otherwise commands are read line by line from stdin.
pub fn run_cli<I>(args: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = String>,
{
    let (file_override, command) = split_global_options(args)?;

    let config_manager = ConfigManager::new()?;
    let config = config_manager.load()?;
    let data_file = file_override.unwrap_or_else(|| config_manager.data_file(&config));
    let storage = JsonStorage::new(data_file, Some(config.backup_retention))?;
    let manager = LedgerManager::open(Box::new(storage))?;
    report_load(&manager);

    let mut context = ShellContext::new(manager, config.currency_symbol);
    if command.is_empty() {
        run_script(&mut context)
    } else {
        let raw = command[0].clone();
        let args: Vec<&str> = command.iter().skip(1).map(String::as_str).collect();
        match context.dispatch(&raw.to_lowercase(), &raw, &args) {
            Ok(_) => Ok(()),
            Err(err) => {
                context.report_error(&err);
                Err(CliError::CommandsFailed { failed: 1 })
            }
        }
    }
}

fn split_global_options<I>(args: I) -> Result<(Option<PathBuf>, Vec<String>), CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut file = None;
    let mut rest = Vec::new();
    while let Some(arg) = args.next() {
        if rest.is_empty() && arg == "--file" {
            let path = args
                .next()
                .ok_or_else(|| CliError::Input("--file requires a path".into()))?;
            file = Some(PathBuf::from(path));
        } else {
            rest.push(arg);
        }
    }
    Ok((file, rest))
}

fn report_load(manager: &LedgerManager) {
    let metadata = manager.metadata();
    match &metadata.outcome {
        LoadOutcome::Loaded => {}
        LoadOutcome::Created => output::info(format!(
            "Created new ledger at {}",
            metadata.path.display()
        )),
        LoadOutcome::Recovered { reason } => output::warning(format!(
            "Corrupted ledger file: {}. Starting with empty data.",
            reason
        )),
    }
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    let mut failed = 0;
    for line in stdin.lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => {
                failed += 1;
                context.report_error(&err);
            }
        }
    }
    if failed > 0 {
        Err(CliError::CommandsFailed { failed })
    } else {
        Ok(())
    }
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = parse_command_line(line)
        .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
    if tokens.is_empty() || tokens[0].starts_with('#') {
        return Ok(LoopControl::Continue);
    }

    let raw = &tokens[0];
    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        other => other,
    }
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
