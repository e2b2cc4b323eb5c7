use std::collections::HashMap;

use chrono::Datelike;
use dialoguer::Confirm;

use crate::cli::core::{short_id, CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::plan::{IncomeSettings, MonthStatus};

pub(crate) fn periods_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        None | Some("list") => list_periods(context),
        Some("regen") => regenerate(context, true),
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown periods action `{other}`; expected list or regen"
        ))),
    }
}

fn list_periods(context: &mut ShellContext) -> CommandResult {
    let plan = context.plan()?;
    output::section("Pay Periods");
    for period in &plan.periods {
        output::info(format!(
            "{:>2}  {}  income {:>10}",
            period.id,
            period.anchor_date,
            output::format_amount(period.income),
        ));
    }
    Ok(())
}

fn regenerate(context: &mut ShellContext, confirm: bool) -> CommandResult {
    if confirm && context.mode() == CliMode::Interactive {
        output::warning(
            "Regenerating replaces every period; allocations keep their period numbers, \
             so a shifted schedule silently moves assigned bills to new dates.",
        );
        let confirmed = Confirm::with_theme(context.theme())
            .with_prompt("Regenerate the pay period sequence?")
            .default(false)
            .interact()?;
        if !confirmed {
            output::info("Periods left untouched.");
            return Ok(());
        }
    }

    let today = context.today();
    let schedule = context.config.schedule.clone();
    let plan = context.plan_mut()?;
    plan.regenerate_periods(today, &schedule);
    plan.refresh_instances(schedule.floor_date);
    context.note_change();
    output::success("Regenerated pay periods and re-expanded recurring bills.");
    Ok(())
}

pub(crate) fn refresh_command(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    regenerate(context, false)
}

pub(crate) fn board_command(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let plan = context.plan()?;
    output::section("Board");

    let mut status_by_year: HashMap<i32, Vec<MonthStatus>> = HashMap::new();
    for period in &plan.periods {
        let year = period.anchor_date.year();
        let statuses = status_by_year
            .entry(year)
            .or_insert_with(|| plan.monthly_status(year));
        let complete = statuses[period.anchor_date.month0() as usize].complete;
        let marker = if complete { " *" } else { "" };

        output::info(format!(
            "Period {:>2}  {}{}  income {:>10}",
            period.id,
            period.anchor_date,
            marker,
            output::format_amount(period.income),
        ));
        if let Some(bills) = plan.allocations.by_period.get(&period.id) {
            for assigned in bills {
                let paid = if assigned.paid { "x" } else { " " };
                output::info(format!(
                    "  [{}] {:<24} due {}  {:>10}  ({})",
                    paid,
                    assigned.bill.name,
                    assigned.bill.due_date,
                    output::format_amount(assigned.bill.amount),
                    short_id(assigned.bill.id),
                ));
            }
        }
        let spending = plan.spending_money(period);
        let line = format!("  spending money: {}", output::format_amount(spending));
        if spending < 0.0 {
            output::warning(line);
            output::info("  consider splitting a bill");
        } else {
            output::info(line);
        }
    }
    Ok(())
}

pub(crate) fn pool_command(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let plan = context.plan()?;
    if plan.allocations.unassigned.is_empty() {
        output::info("All bills assigned!");
        return Ok(());
    }
    output::section("Bills to Assign");
    let mut bills: Vec<_> = plan.allocations.unassigned.iter().collect();
    bills.sort_by_key(|bill| bill.due_date);
    for bill in bills {
        output::info(format!(
            "{:<24} due {}  {:>10}  ({})",
            bill.name,
            bill.due_date,
            output::format_amount(bill.amount),
            short_id(bill.id),
        ));
    }
    Ok(())
}

pub(crate) fn months_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let year = match args.first() {
        Some(raw) => raw.parse().map_err(|_| {
            CommandError::InvalidArguments(format!("`{raw}` is not a year"))
        })?,
        None => context.today().year(),
    };
    let plan = context.plan()?;
    output::section(format!("Monthly Bill Status {year}"));
    for status in plan.monthly_status(year) {
        let marker = if status.complete { " *" } else { "" };
        output::info(format!(
            "{:<4} {}/{}{}",
            status.name, status.assigned, status.total, marker
        ));
    }
    Ok(())
}

pub(crate) fn targets_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let bill_arg = args.first().copied().ok_or_else(|| {
        CommandError::InvalidArguments("usage: targets <bill>".into())
    })?;
    let (_, id) = context.resolve_bill(bill_arg)?;
    let plan = context.plan()?;
    let targets = plan.valid_targets(id)?;
    let name = plan
        .find_instance(id)
        .map(|bill| bill.name.clone())
        .unwrap_or_default();
    if targets.is_empty() {
        output::info(format!("No period can take `{name}` before its due date."));
        return Ok(());
    }
    output::section(format!("Valid periods for `{name}`"));
    for period_id in targets {
        if let Some(period) = plan.period(period_id) {
            output::info(format!("{:>2}  {}", period.id, period.anchor_date));
        }
    }
    Ok(())
}

pub(crate) fn income_command(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let plan = context.plan()?;
            output::info(format!(
                "Amount X (odd periods): {}   Amount Y (even periods): {}",
                output::format_amount(plan.income.amount_x),
                output::format_amount(plan.income.amount_y),
            ));
            Ok(())
        }
        [x, y] => {
            let amount_x = parse_income(x)?;
            let amount_y = parse_income(y)?;
            let plan = context.plan_mut()?;
            plan.income = IncomeSettings { amount_x, amount_y };
            plan.apply_income_pattern();
            context.note_change();
            output::success("Income pattern applied to all periods.");
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: income [<amount-x> <amount-y>]".into(),
        )),
    }
}

fn parse_income(raw: &str) -> Result<f64, CommandError> {
    let amount: f64 = raw.parse().map_err(|_| {
        CommandError::InvalidArguments(format!("`{raw}` is not an income amount"))
    })?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(CommandError::InvalidArguments(
            "income must be zero or above".into(),
        ));
    }
    Ok(amount)
}

pub(crate) fn save_command(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let path = context.manager.save().map_err(CommandError::Core)?;
    output::success(format!("Saved to {}.", path.display()));
    Ok(())
}
