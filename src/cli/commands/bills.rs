use dialoguer::{Confirm, Input};

use crate::cli::core::{short_id, CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::output;

pub(crate) fn bill_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        None | Some("list") => list(context),
        Some("add") => add(context, &args[1..]),
        Some("edit") => edit(context, &args[1..]),
        Some("remove") => remove(context, &args[1..]),
        Some("on") => set_active(context, &args[1..], true),
        Some("off") => set_active(context, &args[1..], false),
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown bill action `{other}`; expected list, add, edit, remove, on, or off"
        ))),
    }
}

fn list(context: &mut ShellContext) -> CommandResult {
    let plan = context.plan()?;
    if plan.templates.is_empty() {
        output::info("No bills configured. Use `bill add <name> <amount> <due-day>`.");
        return Ok(());
    }
    output::section("Bill Catalog");
    let mut templates: Vec<_> = plan.templates.iter().collect();
    templates.sort_by_key(|template| template.due_day);
    for template in templates {
        let marker = if template.active { "on " } else { "off" };
        output::info(format!(
            "[{}] {:<24} {:>10}  due day {:<2}  ({})",
            marker,
            template.name,
            output::format_amount(template.amount),
            template.due_day,
            short_id(template.id),
        ));
    }
    Ok(())
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (name, amount, due_day) = match args {
        [] if context.mode() == CliMode::Interactive => prompt_new_bill(context)?,
        [name, amount, due_day] => (
            (*name).to_string(),
            parse_amount(amount)?,
            parse_due_day(due_day)?,
        ),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: bill add <name> <amount> <due-day>".into(),
            ))
        }
    };

    let floor = context.config.schedule.floor_date;
    let display = name.clone();
    let plan = context.plan_mut()?;
    plan.add_template(name, amount, due_day)?;
    plan.refresh_instances(floor);
    context.note_change();
    output::success(format!("Added bill `{display}` and expanded its instances."));
    Ok(())
}

fn edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (target, name, amount, due_day) = match args {
        [target, name, amount, due_day] => (
            *target,
            (*name).to_string(),
            parse_amount(amount)?,
            parse_due_day(due_day)?,
        ),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: bill edit <bill> <name> <amount> <due-day>".into(),
            ))
        }
    };

    let id = context.resolve_template(target)?;
    let floor = context.config.schedule.floor_date;
    let display = name.clone();
    let plan = context.plan_mut()?;
    plan.update_template(id, name, amount, due_day)?;
    plan.refresh_instances(floor);
    context.note_change();
    output::success(format!("Updated bill `{display}`."));
    Ok(())
}

fn remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let target = args.first().copied().ok_or_else(|| {
        CommandError::InvalidArguments("usage: bill remove <bill>".into())
    })?;
    let id = context.resolve_template(target)?;
    let name = context
        .plan()?
        .template(id)
        .map(|template| template.name.clone())
        .unwrap_or_default();

    if context.mode() == CliMode::Interactive {
        let confirmed = Confirm::with_theme(context.theme())
            .with_prompt(format!(
                "Delete `{name}` and its unassigned instances? Assigned ones stay."
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output::info("Nothing deleted.");
            return Ok(());
        }
    }

    context.plan_mut()?.remove_template(id)?;
    context.note_change();
    output::success(format!("Deleted bill `{name}`."));
    Ok(())
}

fn set_active(context: &mut ShellContext, args: &[&str], active: bool) -> CommandResult {
    let target = args.first().copied().ok_or_else(|| {
        CommandError::InvalidArguments(format!(
            "usage: bill {} <bill>",
            if active { "on" } else { "off" }
        ))
    })?;
    let id = context.resolve_template(target)?;
    let floor = context.config.schedule.floor_date;
    let plan = context.plan_mut()?;
    plan.set_template_active(id, active)?;
    // Re-activation re-expands the months the template missed.
    plan.refresh_instances(floor);
    let name = plan
        .template(id)
        .map(|template| template.name.clone())
        .unwrap_or_default();
    context.note_change();
    if active {
        output::success(format!("Bill `{name}` is active again."));
    } else {
        output::success(format!(
            "Bill `{name}` deactivated; its unassigned instances were removed."
        ));
    }
    Ok(())
}

fn prompt_new_bill(context: &ShellContext) -> Result<(String, f64, u32), CommandError> {
    let name: String = Input::with_theme(context.theme())
        .with_prompt("Bill name")
        .interact_text()?;
    let amount: String = Input::with_theme(context.theme())
        .with_prompt("Amount")
        .interact_text()?;
    let due_day: String = Input::with_theme(context.theme())
        .with_prompt("Due day (1-31)")
        .interact_text()?;
    Ok((name, parse_amount(&amount)?, parse_due_day(&due_day)?))
}

fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    let amount: f64 = raw.parse().map_err(|_| {
        CommandError::InvalidArguments(format!("`{raw}` is not an amount"))
    })?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CommandError::InvalidArguments(
            "amount must be above zero".into(),
        ));
    }
    Ok(amount)
}

fn parse_due_day(raw: &str) -> Result<u32, CommandError> {
    let due_day: u32 = raw.parse().map_err(|_| {
        CommandError::InvalidArguments(format!("`{raw}` is not a day of month"))
    })?;
    if !(1..=31).contains(&due_day) {
        return Err(CommandError::InvalidArguments(
            "due day must be between 1 and 31".into(),
        ));
    }
    Ok(due_day)
}
