use super::core::{CommandError, CommandResult, ShellContext};
use super::output;
use super::registry::{CommandEntry, CommandRegistry};

mod allocation;
mod bills;
mod views;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    registry.register(CommandEntry::new(
        "bill",
        "Manage the recurring bill catalog",
        "bill [list|add|edit|remove|on|off] ...",
        bills::bill_command,
    ));
    registry.register(CommandEntry::new(
        "periods",
        "List pay periods, or regenerate the sequence",
        "periods [regen]",
        views::periods_command,
    ));
    registry.register(CommandEntry::new(
        "board",
        "Show each period with its bills and spending money",
        "board",
        views::board_command,
    ));
    registry.register(CommandEntry::new(
        "pool",
        "List unassigned bills, soonest due first",
        "pool",
        views::pool_command,
    ));
    registry.register(CommandEntry::new(
        "assign",
        "Assign a bill to a pay period",
        "assign <bill> <period>",
        allocation::assign_command,
    ));
    registry.register(CommandEntry::new(
        "unassign",
        "Return an assigned bill to the pool, merging split fragments",
        "unassign <period> <bill>",
        allocation::unassign_command,
    ));
    registry.register(CommandEntry::new(
        "split",
        "Split a partial amount off an assigned bill",
        "split <period> <bill> <amount>",
        allocation::split_command,
    ));
    registry.register(CommandEntry::new(
        "paid",
        "Toggle the paid flag on an assigned bill",
        "paid <period> <bill>",
        allocation::paid_command,
    ));
    registry.register(CommandEntry::new(
        "income",
        "Show or set the alternating paycheck amounts",
        "income [<amount-x> <amount-y>]",
        views::income_command,
    ));
    registry.register(CommandEntry::new(
        "months",
        "Show monthly assignment status",
        "months [year]",
        views::months_command,
    ));
    registry.register(CommandEntry::new(
        "targets",
        "Preview which periods a bill may be dropped into",
        "targets <bill>",
        views::targets_command,
    ));
    registry.register(CommandEntry::new(
        "refresh",
        "Regenerate periods and re-expand recurring bills",
        "refresh",
        views::refresh_command,
    ));
    registry.register(CommandEntry::new(
        "save",
        "Write the snapshot to disk now",
        "save",
        views::save_command,
    ));
    registry.register(CommandEntry::new(
        "help",
        "Show available commands",
        "help [command]",
        help_command,
    ));
    registry.register(CommandEntry::new(
        "exit",
        "Leave the planner",
        "exit",
        exit_command,
    ));
    registry.register(CommandEntry::new(
        "quit",
        "Leave the planner",
        "quit",
        exit_command,
    ));
}

fn help_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let entry = context
            .registry
            .get(&name.to_lowercase())
            .ok_or_else(|| CommandError::InvalidArguments(format!("unknown command `{name}`")))?;
        output::info(format!("{} - {}", entry.name, entry.description));
        output::info(format!("Usage: {}", entry.usage));
        return Ok(());
    }

    output::section("Commands");
    for entry in context.registry.list() {
        output::info(format!("  {:<10} {}", entry.name, entry.description));
    }
    Ok(())
}

fn exit_command(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
