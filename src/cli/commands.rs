use std::collections::HashMap;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::errors::LedgerError;
use crate::ledger::{
    denominations::{is_bill_label, is_coin_label},
    parse_count, CategoryKind, DenominationGroup,
};
use crate::utils::build_info;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("tree", "Show every category with its balance", "tree", cmd_tree),
        CommandDefinition::new(
            "balance",
            "Recompute and show the balance of a category",
            "balance [path]",
            cmd_balance,
        ),
        CommandDefinition::new(
            "add",
            "Create a category under a parent (`/` is the root)",
            "add <parent> <name> [Virtual|Cash|Summary]",
            cmd_add,
        ),
        CommandDefinition::new("rename", "Rename a category", "rename <path> <new-name>", cmd_rename),
        CommandDefinition::new(
            "delete",
            "Delete a category and all of its subcategories",
            "delete <path>",
            cmd_delete,
        ),
        CommandDefinition::new(
            "post",
            "Record a transaction on a Virtual category",
            "post <path> <amount> [description]",
            cmd_post,
        ),
        CommandDefinition::new(
            "cash",
            "Show or update the denomination counts of a Cash category",
            "cash <path> [label=count ...]",
            cmd_cash,
        ),
        CommandDefinition::new(
            "history",
            "List the transactions of a category, newest first",
            "history <path>",
            cmd_history,
        ),
        CommandDefinition::new(
            "summary",
            "Show the direct subcategories of a category with their balances",
            "summary [path]",
            cmd_summary,
        ),
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new("help", "Show available commands", "help [command]", cmd_help),
        CommandDefinition::new("exit", "Stop reading commands", "exit", cmd_exit),
    ]
}

/// Maps a path argument to a tree path; `/` stands for the root.
pub(crate) fn tree_path(arg: &str) -> &str {
    match arg.trim() {
        "/" => "",
        other => other,
    }
}

fn required<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str, CommandError> {
    args.get(index)
        .copied()
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {}", usage)))
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

fn cmd_tree(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let tree = context.manager.tree();
    output::section(format!("Total balance: {}", context.money(tree.total_balance())));
    let rows = tree.outline();
    if rows.is_empty() {
        output::info("No categories yet. Use `add / <name> <type>` to create one.");
        return Ok(());
    }
    for row in rows {
        output::info(format!(
            "{}{} ({})  {}",
            "  ".repeat(row.depth),
            row.name,
            row.kind,
            context.money(row.balance)
        ));
    }
    Ok(())
}

fn cmd_balance(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = tree_path(args.first().copied().unwrap_or(""));
    let balance = context.manager.compute_balance(path)?;
    context.manager.save()?;
    output::info(format!("{}: {}", display_path(path), context.money(balance)));
    Ok(())
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "add <parent> <name> [Virtual|Cash|Summary]";
    let parent = tree_path(required(args, 0, usage)?);
    let name = required(args, 1, usage)?;
    let kind = match args.get(2) {
        Some(raw) => raw
            .parse::<CategoryKind>()
            .map_err(CommandError::InvalidArguments)?,
        None => CategoryKind::Virtual,
    };
    context.manager.add_category(parent, name, kind)?;
    let path = crate::ledger::join_path(parent, name.trim());
    output::success(format!("Added category `{}` ({})", path, kind));
    Ok(())
}

fn cmd_rename(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "rename <path> <new-name>";
    let path = tree_path(required(args, 0, usage)?);
    let new_name = required(args, 1, usage)?;
    let renamed = context.manager.rename_category(path, new_name)?;
    output::success(format!("Renamed `{}` to `{}`", path, renamed));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = tree_path(required(args, 0, "delete <path>")?);
    context.manager.delete_category(path)?;
    output::success(format!("Deleted `{}` and its subcategories", path));
    Ok(())
}

fn cmd_post(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "post <path> <amount> [description]";
    let path = tree_path(required(args, 0, usage)?);
    let raw_amount = required(args, 1, usage)?;
    let amount = raw_amount.trim().parse::<f64>().map_err(|_| {
        LedgerError::InvalidAmount(format!(
            "`{}` is not a number. Enter a value like 10.50",
            raw_amount
        ))
    })?;
    let description = args.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
    let transaction = context.manager.post_transaction(path, amount, &description)?;
    output::success(format!(
        "Recorded {} on `{}` at {}",
        context.money(transaction.amount),
        path,
        transaction.timestamp_label()
    ));
    Ok(())
}

fn cmd_cash(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = tree_path(required(args, 0, "cash <path> [label=count ...]")?);
    let assignments = &args[1..];
    if !assignments.is_empty() {
        let node = context.manager.tree().resolve(path)?;
        let (mut bills, mut coins) = match node.denominations() {
            Some(denominations) => denominations.editable_counts(),
            None => {
                return Err(LedgerError::WrongKind {
                    path: display_path(path).to_string(),
                    expected: CategoryKind::Cash,
                    actual: node.kind(),
                }
                .into())
            }
        };
        for assignment in assignments {
            let (label, raw) = assignment.split_once('=').ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "expected label=count, got `{}`",
                    assignment
                ))
            })?;
            let label = label.trim();
            let count = parse_count(label, raw)?;
            if is_bill_label(label) {
                bills.insert(label.to_string(), count);
            } else if is_coin_label(label) {
                coins.insert(label.to_string(), count);
            } else {
                return Err(LedgerError::InvalidCount {
                    label: label.to_string(),
                    reason: "unknown denomination".into(),
                }
                .into());
            }
        }
        context.manager.set_denominations(path, &bills, &coins)?;
        output::success(format!("Saved denominations for `{}`", display_path(path)));
    }

    let lines = context.manager.tree().cash_breakdown(path)?;
    output::section(format!("Cash in {}", display_path(path)));
    for line in &lines {
        let noun = match line.group {
            DenominationGroup::Bill => "bill",
            DenominationGroup::Coin => "coin",
        };
        output::info(format!(
            "{:>5} {} x {:<4} = {}",
            line.label,
            noun,
            line.count,
            context.money(line.subtotal)
        ));
    }
    let total: f64 = lines.iter().map(|line| line.subtotal).sum();
    output::info(format!("Total: {}", context.money(total)));
    Ok(())
}

fn cmd_history(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = tree_path(required(args, 0, "history <path>")?);
    let history = context.manager.tree().history(path)?;
    output::section(format!("Transactions for {}", display_path(path)));
    if history.is_empty() {
        output::info("No transactions recorded.");
        return Ok(());
    }
    for transaction in history {
        output::info(format!(
            "{}  {:>12}  {}",
            transaction.timestamp_label(),
            context.money(transaction.amount),
            transaction.description
        ));
    }
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = tree_path(args.first().copied().unwrap_or(""));
    let tree = context.manager.tree();
    let children = tree.summary_breakdown(path)?;
    let total = tree.balance(path)?;
    output::section(format!("{}: {}", display_path(path), context.money(total)));
    if children.is_empty() {
        output::info("No subcategories.");
    }
    for child in children {
        output::info(format!(
            "  {} ({})  {}",
            child.name,
            child.kind,
            context.money(child.balance)
        ));
    }
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("ledger_tree {}", meta.version));
    output::info(format!("  Build hash : {} ({})", meta.git_hash, meta.git_status));
    output::info(format!("  Built at   : {}", meta.timestamp));
    output::info(format!("  Target     : {}", meta.target));
    output::info(format!("  Profile    : {}", meta.profile));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let definition = context
            .command(&name.to_lowercase())
            .ok_or_else(|| CommandError::InvalidArguments(context.unknown_command(name)))?;
        output::info(format!("{}: {}", definition.name, definition.description));
        output::info(format!("usage: {}", definition.usage));
        return Ok(());
    }
    output::section("Commands");
    for definition in context.registry.iter() {
        output::info(format!("  {:<32} {}", definition.usage, definition.description));
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
