use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

pub(crate) fn assign_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (bill_arg, period_arg) = match args {
        [bill, period] => (*bill, *period),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: assign <bill> <period>".into(),
            ))
        }
    };

    let (source, id) = context.resolve_bill(bill_arg)?;
    let target = context.resolve_period(period_arg)?;
    context.plan_mut()?.assign(id, source, target)?;
    context.note_change();

    let plan = context.plan()?;
    let name = plan
        .allocations
        .assigned_bill(target, id)
        .map(|assigned| assigned.bill.name.clone())
        .unwrap_or_default();
    output::success(format!("Assigned `{name}` to period {target}."));
    Ok(())
}

pub(crate) fn unassign_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (period_arg, bill_arg) = match args {
        [period, bill] => (*period, *bill),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: unassign <period> <bill>".into(),
            ))
        }
    };

    let period_id = context.resolve_period(period_arg)?;
    let id = context.resolve_bill_in_period(period_id, bill_arg)?;
    let name = context
        .plan()?
        .allocations
        .assigned_bill(period_id, id)
        .map(|assigned| assigned.bill.template_name.clone())
        .unwrap_or_default();

    context.plan_mut()?.remove_assigned(period_id, id)?;
    context.note_change();
    output::success(format!("Returned `{name}` to the pool."));
    Ok(())
}

pub(crate) fn split_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (period_arg, bill_arg, amount_arg) = match args {
        [period, bill, amount] => (*period, *bill, *amount),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: split <period> <bill> <amount>".into(),
            ))
        }
    };

    let period_id = context.resolve_period(period_arg)?;
    let id = context.resolve_bill_in_period(period_id, bill_arg)?;
    let partial: f64 = amount_arg.parse().map_err(|_| {
        CommandError::InvalidArguments(format!("`{amount_arg}` is not a split amount"))
    })?;

    context.plan_mut()?.split(period_id, id, partial)?;
    context.note_change();

    let plan = context.plan()?;
    let remainder = plan
        .allocations
        .assigned_bill(period_id, id)
        .map(|assigned| assigned.bill.amount)
        .unwrap_or_default();
    output::success(format!(
        "Split {} into the pool; {} remains in period {period_id}.",
        output::format_amount(partial),
        output::format_amount(remainder),
    ));
    Ok(())
}

pub(crate) fn paid_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (period_arg, bill_arg) = match args {
        [period, bill] => (*period, *bill),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: paid <period> <bill>".into(),
            ))
        }
    };

    let period_id = context.resolve_period(period_arg)?;
    let id = context.resolve_bill_in_period(period_id, bill_arg)?;
    context.plan_mut()?.toggle_paid(period_id, id)?;
    context.note_change();

    let plan = context.plan()?;
    let assigned = plan
        .allocations
        .assigned_bill(period_id, id)
        .ok_or(CommandError::Core(
            crate::errors::PlannerError::UnknownInstance(id),
        ))?;
    if assigned.paid {
        output::success(format!("`{}` marked paid.", assigned.bill.name));
    } else {
        output::success(format!("`{}` marked unpaid.", assigned.bill.name));
    }
    Ok(())
}
