//! Core CLI loop, dispatch, and shell context helpers.

use std::{io, path::PathBuf};

use dialoguer::theme::ColorfulTheme;
use rustyline::error::ReadlineError;
use strsim::levenshtein;

use crate::{
    config::ConfigManager,
    core::{
        ledger_sheet::{LedgerSheet, SaveStatus},
        services::ServiceError,
        time::{Clock, SystemClock},
        utils::PathResolver,
    },
    currency::format_currency_value,
    errors::LedgerError,
    ledger::{CategoryType, Month, PropertySelection},
    storage::JsonSnapshotStore,
    utils::persistence::{load_portfolio_from_file, save_portfolio_to_file},
};

pub use crate::errors::CliError;

use super::commands;
use super::io as cli_io;
use super::registry::{CommandEntry, CommandRegistry};
pub use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::new()?;
        let config = config_manager.load()?;
        let data_dir = config.data_dir_or(config_manager.base_dir());
        let snapshots =
            JsonSnapshotStore::new(Some(data_dir.clone()), Some(config.backup_retention))?;
        let portfolio = load_portfolio_from_file(&PathResolver::portfolio_file_in(&data_dir))?;

        let clock = SystemClock;
        let (current_year, _) = clock.current_period();
        let year = config.last_year.unwrap_or(current_year);
        let selection = PropertySelection::new(
            config
                .last_properties
                .iter()
                .filter(|name| portfolio.property(name).is_some())
                .cloned(),
        );
        let sheet = LedgerSheet::open(
            portfolio,
            Box::new(snapshots),
            Box::new(clock),
            year,
            selection,
        );
        tracing::debug!(year, data_dir = %data_dir.display(), "shell started");

        Ok(ShellContext {
            mode,
            registry,
            sheet,
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            data_dir,
            last_command: None,
            running: true,
        })
    }

    pub(crate) fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn prompt(&self) -> String {
        let selection = self.sheet.selection();
        let label = match selection.len() {
            0 => "no property".to_string(),
            1 => selection.as_slice().join(""),
            n => format!("{} properties", n),
        };
        match self.sheet.active_cell() {
            Some(cell) => format!("rental_ledger [{} | {} | {}]> ", self.sheet.year(), label, cell),
            None => format!("rental_ledger [{} | {}]> ", self.sheet.year(), label),
        }
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
        cli_io::print_warning(format!(
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
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Exit shell?", true).map_err(CliError::from)
    }

    /// Asks before destructive actions; script mode always proceeds.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                self.print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Core(err) if err.is_rejection() => {
                self.print_warning(&err.to_string());
                Ok(())
            }
            other => {
                self.print_error(&other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        cli_io::print_error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        cli_io::print_warning(message);
    }

    pub(crate) fn print_hint(&self, message: &str) {
        cli_io::print_info(message);
    }

    pub(crate) fn format_amount(&self, amount: f64) -> String {
        format_currency_value(amount, &self.config.currency, &self.config.locale)
    }

    pub(crate) fn report_save(&self, status: &SaveStatus, subject: &str) {
        match status {
            SaveStatus::Saved => cli_io::print_success(format!("Saved {}.", subject)),
            SaveStatus::Unchanged => cli_io::print_info(format!("{} unchanged.", subject)),
            SaveStatus::Failed(message) => cli_io::print_warning(format!(
                "{} updated in memory but could not be saved: {}",
                subject, message
            )),
        }
    }

    pub(crate) fn portfolio_path(&self) -> PathBuf {
        PathResolver::portfolio_file_in(&self.data_dir)
    }

    pub(crate) fn export_dir(&self) -> PathBuf {
        PathResolver::export_dir_in(&self.data_dir)
    }

    pub(crate) fn persist_portfolio(&self) -> CommandResult {
        save_portfolio_to_file(self.sheet.portfolio(), &self.portfolio_path())
            .map_err(CommandError::from)
    }

    /// Remembers the year and selection for the next session.
    pub(crate) fn persist_view(&mut self) -> CommandResult {
        self.config.last_year = Some(self.sheet.year());
        self.config.last_properties = self.sheet.selection().as_slice().to_vec();
        self.config_manager
            .save(&self.config)
            .map_err(CommandError::from)
    }

    /// Case-insensitive match against the categories shown for `kind`.
    pub(crate) fn resolve_category(&self, kind: CategoryType, raw: &str) -> Result<String, CommandError> {
        let wanted = raw.trim().to_lowercase();
        let names = self.sheet.visible_categories(kind);
        if let Some(name) = names.iter().find(|name| name.to_lowercase() == wanted) {
            return Ok(name.clone());
        }
        let closest = names
            .iter()
            .map(|name| (levenshtein(&name.to_lowercase(), &wanted), name))
            .min_by_key(|(distance, _)| *distance)
            .filter(|(distance, _)| *distance <= 3)
            .map(|(_, name)| format!(" Did you mean `{}`?", name))
            .unwrap_or_default();
        Err(CommandError::InvalidArguments(format!(
            "unknown {} category `{}`.{}",
            kind, raw, closest
        )))
    }
}

pub(crate) fn parse_kind(raw: &str) -> Result<CategoryType, CommandError> {
    raw.parse::<CategoryType>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{}` is not income or expense", raw)))
}

pub(crate) fn parse_month(raw: &str) -> Result<Month, CommandError> {
    raw.parse::<Month>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{}` is not a month", raw)))
}

pub(crate) fn parse_year(raw: &str) -> Result<i32, CommandError> {
    raw.parse::<i32>()
        .ok()
        .filter(|year| (1900..=9999).contains(year))
        .ok_or_else(|| CommandError::InvalidArguments(format!("`{}` is not a valid year", raw)))
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<ServiceError> for CommandError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Ledger(err) => CommandError::Core(err),
            ServiceError::Invalid(message) => CommandError::InvalidArguments(message),
        }
    }
}

impl From<CliError> for CommandError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Core(inner) => CommandError::Core(inner),
            CliError::Input(message) | CliError::Command(message) => {
                CommandError::InvalidArguments(message)
            }
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}
