//! Shell state, command dispatch, and argument resolution.

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use dialoguer::theme::ColorfulTheme;
use strsim::levenshtein;
use uuid::Uuid;

use crate::clock::{self, Clock};
use crate::config::{Config, ConfigManager};
use crate::core::plan_manager::{LoadOutcome, PlanManager};
use crate::errors::PlannerError;
use crate::plan::{BillInstance, BillLocation, BudgetPlan, PeriodId};
use crate::storage::JsonStorage;

use super::commands;
use super::output;
use super::registry::CommandRegistry;

pub const DEFAULT_PLAN_KEY: &str = "default";

/// Minimum prefix length before an argument is matched against instance ids.
const ID_PREFIX_MIN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Command(String),
    #[error(transparent)]
    Core(#[from] PlannerError),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Core(#[from] PlannerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

pub struct ShellContext {
    pub(crate) registry: CommandRegistry,
    pub(crate) manager: PlanManager,
    pub(crate) config: Config,
    config_manager: ConfigManager,
    clock: Box<dyn Clock>,
    theme: ColorfulTheme,
    mode: CliMode,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_parts(mode, None, clock::from_env())
    }

    /// Test constructor: pins the data directory and the clock.
    pub fn with_parts(
        mode: CliMode,
        base_dir: Option<PathBuf>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let storage = JsonStorage::new(base_dir.clone())?;
        let config_manager = match base_dir {
            Some(base) => ConfigManager::with_base_dir(base)?,
            None => ConfigManager::new()?,
        };
        let config = config_manager.load().unwrap_or_else(|err| {
            tracing::warn!(%err, "failed to load configuration, using defaults");
            Config::default()
        });
        let mut manager = PlanManager::new(Box::new(storage));
        let key = config
            .last_opened_plan
            .clone()
            .unwrap_or_else(|| DEFAULT_PLAN_KEY.to_string());
        let outcome = manager.open(&key);

        let mut context = Self {
            registry,
            manager,
            config,
            config_manager,
            clock,
            theme: ColorfulTheme::default(),
            mode,
            running: true,
        };
        context.bootstrap_plan(outcome);
        context.persist_config();
        Ok(context)
    }

    fn bootstrap_plan(&mut self, outcome: LoadOutcome) {
        let today = self.clock.today();
        let schedule = self.config.schedule.clone();
        if let Some(plan) = self.manager.current.as_mut() {
            if plan.periods.is_empty() {
                plan.regenerate_periods(today, &schedule);
            }
            plan.refresh_instances(schedule.floor_date);
        }
        match outcome {
            LoadOutcome::Loaded => {
                let key = self.manager.current_key().unwrap_or_default().to_string();
                output::info(format!("Loaded plan `{key}`."));
            }
            LoadOutcome::Created => output::info("Started a fresh plan."),
            LoadOutcome::Fallback => {
                output::warning("Stored plan could not be read; starting from defaults.")
            }
        }
    }

    pub(crate) fn persist_config(&mut self) {
        self.config.last_opened_plan = self.manager.current_key().map(String::from);
        if let Err(err) = self.config_manager.save(&self.config) {
            tracing::warn!(%err, "failed to persist configuration");
        }
    }

    pub(crate) fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn theme(&self) -> &ColorfulTheme {
        &self.theme
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn plan(&self) -> Result<&BudgetPlan, CommandError> {
        self.manager
            .current
            .as_ref()
            .ok_or_else(|| CommandError::Message("no plan loaded".into()))
    }

    pub(crate) fn plan_mut(&mut self) -> Result<&mut BudgetPlan, CommandError> {
        self.manager
            .current
            .as_mut()
            .ok_or_else(|| CommandError::Message("no plan loaded".into()))
    }

    /// Marks the snapshot dirty; the save lands after the quiescence window.
    pub(crate) fn note_change(&mut self) {
        self.manager.note_change(Instant::now());
    }

    /// Runs between commands: flushes a due debounced save.
    pub(crate) fn maintain(&mut self) {
        if let Some(path) = self.manager.flush_if_due(Instant::now()) {
            tracing::debug!(path = %path.display(), "snapshot saved");
        }
    }

    pub(crate) fn shutdown(&mut self) {
        self.manager.flush_now();
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, input), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        let confirmed = dialoguer::Confirm::with_theme(&self.theme)
            .with_prompt("Exit the planner?")
            .default(true)
            .interact()
            .map_err(|err| CliError::Command(err.to_string()))?;
        Ok(confirmed)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(&message);
                output::info("Use `help <command>` for usage details.");
                Ok(())
            }
            other => {
                output::error(other.to_string());
                Ok(())
            }
        }
    }

    // ---- argument resolution ----

    pub(crate) fn resolve_period(&self, arg: &str) -> Result<PeriodId, CommandError> {
        let id: PeriodId = arg.parse().map_err(|_| {
            CommandError::InvalidArguments(format!("`{arg}` is not a period number"))
        })?;
        if self.plan()?.period(id).is_none() {
            return Err(CommandError::Core(PlannerError::UnknownPeriod(id)));
        }
        Ok(id)
    }

    /// Finds an instance anywhere in the table by name or id prefix,
    /// searching the unassigned pool before the periods.
    pub(crate) fn resolve_bill(&self, arg: &str) -> Result<(BillLocation, Uuid), CommandError> {
        let plan = self.plan()?;
        if let Some(bill) = plan
            .allocations
            .unassigned
            .iter()
            .find(|bill| bill_matches(bill, arg))
        {
            return Ok((BillLocation::Unassigned, bill.id));
        }
        if let Some((period_id, assigned)) = plan
            .allocations
            .assigned_iter()
            .find(|(_, assigned)| bill_matches(&assigned.bill, arg))
        {
            return Ok((BillLocation::Period(period_id), assigned.bill.id));
        }
        Err(CommandError::InvalidArguments(format!(
            "no bill matching `{arg}`; try `pool` or `board` for names and ids"
        )))
    }

    pub(crate) fn resolve_bill_in_period(
        &self,
        period_id: PeriodId,
        arg: &str,
    ) -> Result<Uuid, CommandError> {
        let plan = self.plan()?;
        plan.allocations
            .by_period
            .get(&period_id)
            .and_then(|bills| {
                bills
                    .iter()
                    .find(|assigned| bill_matches(&assigned.bill, arg))
            })
            .map(|assigned| assigned.bill.id)
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "no bill matching `{arg}` in period {period_id}"
                ))
            })
    }

    pub(crate) fn resolve_template(&self, arg: &str) -> Result<Uuid, CommandError> {
        let plan = self.plan()?;
        plan.templates
            .iter()
            .find(|template| {
                template.name.eq_ignore_ascii_case(arg)
                    || id_prefix_matches(template.id, arg)
            })
            .map(|template| template.id)
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!("no bill template matching `{arg}`"))
            })
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match super::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err.to_string());
                return Ok(LoopControl::Continue);
            }
        };
        if tokens.is_empty() {
            return Ok(LoopControl::Continue);
        }
        let command = tokens[0].to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, &tokens[0], &args)
    }
}

pub(crate) fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}

fn id_prefix_matches(id: Uuid, needle: &str) -> bool {
    needle.len() >= ID_PREFIX_MIN
        && id
            .simple()
            .to_string()
            .starts_with(&needle.to_ascii_lowercase())
}

fn bill_matches(bill: &BillInstance, needle: &str) -> bool {
    bill.name.eq_ignore_ascii_case(needle) || id_prefix_matches(bill.id, needle)
}

#[cfg(test)]
pub(crate) fn process_script(
    base_dir: PathBuf,
    today: NaiveDate,
    lines: &[&str],
) -> Result<ShellContext, CliError> {
    let mut context = ShellContext::with_parts(
        CliMode::Script,
        Some(base_dir),
        Box::new(crate::clock::FixedClock(today)),
    )?;
    for line in lines {
        match context.process_line(line)? {
            LoopControl::Continue => {}
            LoopControl::Exit => break,
        }
    }
    context.shutdown();
    Ok(context)
}
