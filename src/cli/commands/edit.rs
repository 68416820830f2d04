use crate::cli::core::{parse_kind, parse_month, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::ledger::{CellId, EditKey};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "focus",
            "Start editing a cell",
            "focus <income|expense> <category> <month>",
            cmd_focus,
        ),
        CommandEntry::new(
            "type",
            "Replace the draft of the focused cell",
            "type <value|=formula>",
            cmd_type,
        ),
        CommandEntry::new("commit", "Save the draft (Enter)", "commit", cmd_commit),
        CommandEntry::new("cancel", "Discard the draft (Escape)", "cancel", cmd_cancel),
        CommandEntry::new(
            "next",
            "Save and move to the next cell (Tab)",
            "next",
            cmd_next,
        ),
        CommandEntry::new(
            "prev",
            "Save and move to the previous cell (Shift+Tab)",
            "prev",
            cmd_prev,
        ),
    ]
}

fn print_focus(context: &ShellContext) {
    match context.sheet.edit_buffer() {
        Some(buffer) => io::print_info(format!("Editing {}: {}", buffer.cell, buffer.draft)),
        None => io::print_info("No cell is being edited."),
    }
}

fn cmd_focus(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [kind, category, month] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: focus <income|expense> <category> <month>".into(),
        ));
    };
    let kind = parse_kind(kind)?;
    let category = context.resolve_category(kind, category)?;
    let month = parse_month(month)?;
    let previous = context.sheet.active_cell().map(|cell| cell.to_string());
    let status = context.sheet.begin_edit(CellId::new(kind, category, month))?;
    if let Some(previous) = previous {
        context.report_save(&status, &previous);
    }
    print_focus(context);
    Ok(())
}

fn cmd_type(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.sheet.update_draft(args.join(" "))?;
    print_focus(context);
    Ok(())
}

fn handle_key(context: &mut ShellContext, key: EditKey) -> CommandResult {
    let subject = context
        .sheet
        .active_cell()
        .map(|cell| cell.to_string())
        .unwrap_or_else(|| "cell".into());
    let status = context.sheet.handle_key(key)?;
    context.report_save(&status, &subject);
    if matches!(key, EditKey::Tab | EditKey::ShiftTab) {
        print_focus(context);
    }
    Ok(())
}

fn cmd_commit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    handle_key(context, EditKey::Enter)
}

fn cmd_cancel(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.sheet.cancel_edit().is_some() {
        io::print_info("Edit discarded.");
    }
    Ok(())
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    handle_key(context, EditKey::Tab)
}

fn cmd_prev(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    handle_key(context, EditKey::ShiftTab)
}
