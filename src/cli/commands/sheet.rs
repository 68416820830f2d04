use std::path::{Path, PathBuf};

use crate::cli::core::{parse_kind, parse_month, parse_year, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::core::{ledger_sheet::LoadSource, services::ExportService};
use crate::ledger::{CategoryType, PropertySelection};
use crate::utils::persistence::load_transactions_from_file;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "import",
            "Import transactions from a JSON file",
            "import <file.json>",
            cmd_import,
        ),
        CommandEntry::new(
            "properties",
            "List or add properties",
            "properties [add <name>]",
            cmd_properties,
        ),
        CommandEntry::new("year", "Show or change the ledger year", "year [<year>]", cmd_year),
        CommandEntry::new(
            "select",
            "Choose which properties the grid shows",
            "select <all|none|name...>",
            cmd_select,
        ),
        CommandEntry::new("show", "Render the ledger grid", "show [income|expense]", cmd_show),
        CommandEntry::new(
            "set",
            "Write a value or =formula into a cell",
            "set <income|expense> <category> <month> <value|=formula>",
            cmd_set,
        ),
        CommandEntry::new("totals", "Show income, expense and net totals", "totals", cmd_totals),
        CommandEntry::new(
            "export",
            "Export the visible grid as CSV",
            "export [directory]",
            cmd_export,
        ),
        CommandEntry::new(
            "reset",
            "Discard saved edits for the year and rebuild from transactions",
            "reset",
            cmd_reset,
        ),
    ]
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = args
        .first()
        .ok_or_else(|| CommandError::InvalidArguments("usage: import <file.json>".into()))?;
    let transactions = load_transactions_from_file(Path::new(path))?;
    let count = context.sheet.import_transactions(transactions);
    context.persist_portfolio()?;
    io::print_success(format!("Imported {} transactions.", count));
    if let LoadSource::Seeded(report) = context.sheet.load_source() {
        if report.invalid_dates > 0 {
            io::print_warning(format!(
                "{} transactions were skipped because their date could not be read.",
                report.invalid_dates
            ));
        }
    }
    Ok(())
}

fn cmd_properties(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let names = context.sheet.portfolio().property_names();
            if names.is_empty() {
                io::print_info("No properties yet. Use `import` or `properties add <name>`.");
                return Ok(());
            }
            output_section("Properties");
            for name in names {
                let marker = if context.sheet.selection().contains(&name) { "*" } else { " " };
                io::print_info(format!(" {} {}", marker, name));
            }
            Ok(())
        }
        [action, name @ ..] if action.eq_ignore_ascii_case("add") && !name.is_empty() => {
            let name = name.join(" ");
            if !context.sheet.portfolio_mut().add_property(&name) {
                return Err(CommandError::InvalidArguments(format!(
                    "property `{}` already exists",
                    name.trim()
                )));
            }
            context.persist_portfolio()?;
            io::print_success(format!("Property `{}` added.", name.trim()));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: properties [add <name>]".into(),
        )),
    }
}

fn cmd_year(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(raw) = args.first() else {
        io::print_info(format!("Showing {}.", context.sheet.year()));
        return Ok(());
    };
    let year = parse_year(raw)?;
    context.sheet.set_year(year);
    context.persist_view()?;
    report_loaded(context);
    Ok(())
}

fn cmd_select(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let selection = match args {
        [] => {
            return Err(CommandError::InvalidArguments(
                "usage: select <all|none|name...>".into(),
            ))
        }
        [single] if single.eq_ignore_ascii_case("all") => {
            PropertySelection::new(context.sheet.portfolio().property_names())
        }
        [single] if single.eq_ignore_ascii_case("none") => PropertySelection::none(),
        names => {
            let mut resolved = Vec::new();
            for raw in names {
                let property = context
                    .sheet
                    .portfolio()
                    .properties
                    .iter()
                    .find(|property| property.name.eq_ignore_ascii_case(raw.trim()))
                    .ok_or_else(|| {
                        CommandError::InvalidArguments(format!("unknown property `{}`", raw))
                    })?;
                resolved.push(property.name.clone());
            }
            PropertySelection::new(resolved)
        }
    };
    context.sheet.set_selection(selection);
    context.persist_view()?;
    report_loaded(context);
    if !context.sheet.can_edit() {
        io::print_info("Read-only view: select exactly one property to edit cells.");
    }
    Ok(())
}

fn report_loaded(context: &ShellContext) {
    let sheet = &context.sheet;
    let source = match sheet.load_source() {
        LoadSource::Snapshot => "saved ledger".to_string(),
        LoadSource::Seeded(report) => format!("{} transactions", report.applied),
    };
    io::print_info(format!(
        "Showing {} for {} property(ies), built from {}.",
        sheet.year(),
        sheet.selection().len(),
        source
    ));
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kinds = match args.first() {
        Some(raw) => vec![parse_kind(raw)?],
        None => CategoryType::ALL.to_vec(),
    };
    for kind in kinds {
        let title = match kind {
            CategoryType::Income => "Income",
            CategoryType::Expense => "Expenses",
        };
        output_section(format!("{} {}", title, context.sheet.year()));
        for line in render::section_lines(context, kind) {
            println!("{}", line);
        }
    }
    println!("{}", render::net_line(context));
    if let Some(buffer) = context.sheet.edit_buffer() {
        io::print_info(format!("Editing {}: {}", buffer.cell, buffer.draft));
    }
    Ok(())
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.len() < 4 {
        return Err(CommandError::InvalidArguments(
            "usage: set <income|expense> <category> <month> <value|=formula>".into(),
        ));
    }
    let kind = parse_kind(args[0])?;
    let category = context.resolve_category(kind, args[1])?;
    let month = parse_month(args[2])?;
    let input = args[3..].join(" ");
    let status = context.sheet.commit_input(kind, &category, month, &input)?;
    let value = context.sheet.get_cell_value(kind, &category, month);
    context.report_save(
        &status,
        &format!("{} {} {} = {}", kind, category, month, context.format_amount(value)),
    );
    Ok(())
}

fn cmd_totals(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let grand = context.sheet.calculate_grand_totals();
    output_section(format!("Totals {}", context.sheet.year()));
    io::print_info(format!("  Income   : {}", context.format_amount(grand.income)));
    io::print_info(format!("  Expenses : {}", context.format_amount(grand.expenses)));
    io::print_info(format!(
        "  Net      : {} ({:?})",
        context.format_amount(grand.net),
        grand.net_class()
    ));
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let dir = args
        .first()
        .map(|dir| PathBuf::from(*dir))
        .unwrap_or_else(|| context.export_dir());
    let path = ExportService::export_to_dir(&context.sheet, &dir)?;
    io::print_success(format!("Exported to {}", path.display()));
    Ok(())
}

fn cmd_reset(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let prompt = format!(
        "Discard all saved edits for {} and rebuild from transactions?",
        context.sheet.year()
    );
    if !context.confirm(&prompt)? {
        io::print_info("Reset cancelled.");
        return Ok(());
    }
    let report = context.sheet.reset()?;
    io::print_success(format!(
        "Ledger {} rebuilt from {} transactions.",
        context.sheet.year(),
        report.applied
    ));
    Ok(())
}
