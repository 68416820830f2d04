use std::{
    borrow::Cow,
    collections::HashMap,
    io::{self, BufRead},
};

use colored::Colorize;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output::{disable_colors, info as output_info};
use crate::ledger::{CategoryType, Month};

pub const SCRIPT_ENV_VAR: &str = "RENTAL_LEDGER_CLI_SCRIPT";

const KINDS: [&str; 2] = ["income", "expense"];
const CATEGORY_ACTIONS: [&str; 5] = ["add", "rename", "properties", "delete", "list"];

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV_VAR).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    if mode == CliMode::Script {
        disable_colors();
    }

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<LedgerHelper, DefaultHistory>::new()?;
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    while context.running {
        // Categories and properties change as commands run.
        editor.set_helper(Some(LedgerHelper::from_context(context)));
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();

                match handle_line(context, trimmed) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err)?,
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C acts as Escape while a cell is focused.
                if let Some(buffer) = context.sheet.cancel_edit() {
                    output_info(format!("Discarded draft for {}.", buffer.cell));
                } else if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output_info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for (index, line) in stdin.lock().lines().enumerate() {
        if !context.running {
            break;
        }
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => {
                tracing::warn!(line = index + 1, command = %line.trim(), "script command failed");
                context.report_error(err)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    let tokens = match split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            context.print_warning(&format!("Could not read `{}`: {}", line.trim(), err));
            return Ok(LoopControl::Continue);
        }
    };

    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    if raw.starts_with('#') {
        return Ok(LoopControl::Continue);
    }

    let command = raw.to_lowercase();
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.trim().to_string());

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        other => other,
    }
}

/// Line-editor helper that knows the ledger's commands, properties,
/// categories and months.
struct LedgerHelper {
    commands: Vec<&'static str>,
    usages: HashMap<&'static str, &'static str>,
    properties: Vec<String>,
    income: Vec<String>,
    expense: Vec<String>,
}

impl LedgerHelper {
    fn from_context(context: &ShellContext) -> Self {
        let mut commands = context.command_names();
        commands.sort_unstable();
        let usages = commands
            .iter()
            .filter_map(|name| context.command(name).map(|entry| (*name, entry.usage)))
            .collect();
        Self {
            commands,
            usages,
            properties: context.sheet.portfolio().property_names(),
            income: context.sheet.visible_categories(CategoryType::Income),
            expense: context.sheet.visible_categories(CategoryType::Expense),
        }
    }

    fn categories(&self, kind: &str) -> &[String] {
        match kind.parse::<CategoryType>() {
            Ok(CategoryType::Income) => &self.income,
            Ok(CategoryType::Expense) => &self.expense,
            Err(_) => &[],
        }
    }

    /// Words that fit the argument slot after `words`.
    fn options(&self, words: &[String]) -> Vec<String> {
        let Some((command, args)) = words.split_first() else {
            return self.commands.iter().map(|name| name.to_string()).collect();
        };
        match (command.to_lowercase().as_str(), args) {
            ("set" | "focus", []) | ("show", []) => owned(&KINDS),
            ("set" | "focus", [kind]) => self.categories(kind).to_vec(),
            ("set" | "focus", [_, _]) => Month::ALL.iter().map(|month| month.name().to_string()).collect(),
            ("select", _) => {
                let mut options: Vec<String> = owned(&["all", "none"]);
                options.extend(self.properties.iter().cloned());
                options
            }
            ("properties", []) => owned(&["add"]),
            ("category", []) => owned(&CATEGORY_ACTIONS),
            ("category", [_]) => owned(&KINDS),
            ("category", [action, kind]) if ["rename", "properties", "delete"].contains(&action.as_str()) => {
                self.categories(kind).to_vec()
            }
            ("category", [action, _, _, ..]) if action == "add" || action == "properties" => {
                self.properties.clone()
            }
            _ => Vec::new(),
        }
    }

    /// Start of the word under the cursor and the matching replacements.
    fn candidates(&self, prefix: &str) -> (usize, Vec<String>) {
        let start = word_start(prefix);
        let Ok(words) = split(&prefix[..start]) else {
            return (start, Vec::new());
        };
        let needle = prefix[start..].trim_start_matches(['"', '\'']).to_lowercase();
        let matches = self
            .options(&words)
            .into_iter()
            .filter(|option| option.to_lowercase().starts_with(&needle))
            .map(|option| {
                if option.contains(char::is_whitespace) {
                    format!("\"{}\"", option)
                } else {
                    option
                }
            })
            .collect();
        (start, matches)
    }

    /// Remaining usage once a known command and a space have been typed.
    fn usage_hint(&self, line: &str) -> Option<String> {
        let command = line.strip_suffix(' ')?;
        if command.contains(char::is_whitespace) {
            return None;
        }
        let usage = self.usages.get(command.to_lowercase().as_str())?;
        let (_, rest) = usage.split_once(' ')?;
        Some(rest.to_string())
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Byte offset where the word being typed begins. An open quote starts the word.
fn word_start(prefix: &str) -> usize {
    let mut quote = None;
    let mut start = 0;
    for (index, ch) in prefix.char_indices() {
        match (quote, ch) {
            (None, '"' | '\'') => {
                quote = Some(ch);
                start = index;
            }
            (Some(open), _) if ch == open => quote = None,
            (None, _) if ch.is_whitespace() => start = index + ch.len_utf8(),
            _ => {}
        }
    }
    start
}

impl Helper for LedgerHelper {}

impl Completer for LedgerHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.candidates(&line[..pos]);
        let pairs = matches
            .into_iter()
            .map(|replacement| Pair {
                display: replacement.trim_matches('"').to_string(),
                replacement,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for LedgerHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        self.usage_hint(line)
    }
}

impl Highlighter for LedgerHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for LedgerHelper {}
