use crate::cli::core::{parse_kind, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::core::services::CategoryService;
use crate::ledger::CategoryType;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "category",
        "Manage custom categories",
        "category <add|rename|properties|delete|list> ...",
        cmd_category,
    )]
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(action) = args.first() else {
        return Err(CommandError::InvalidArguments(
            "usage: category <add|rename|properties|delete|list>".into(),
        ));
    };

    match action.to_lowercase().as_str() {
        "add" => category_add(context, &args[1..]),
        "rename" => category_rename(context, &args[1..]),
        "properties" => category_properties(context, &args[1..]),
        "delete" => category_delete(context, &args[1..]),
        "list" => category_list(context, &args[1..]),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown category subcommand `{}`",
            other
        ))),
    }
}

/// Explicit properties, or the current selection when none are given.
fn target_properties(context: &ShellContext, explicit: &[&str]) -> Vec<String> {
    if explicit.is_empty() {
        context.sheet.selection().as_slice().to_vec()
    } else {
        explicit.iter().map(|name| name.to_string()).collect()
    }
}

fn category_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [kind, name, properties @ ..] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: category add <income|expense> <name> [property...]".into(),
        ));
    };
    let kind = parse_kind(kind)?;
    let properties = target_properties(context, properties);
    CategoryService::add(&mut context.sheet, name, kind, &properties)?;
    context.persist_portfolio()?;
    io::print_success(format!(
        "Added {} category `{}` for {}.",
        kind,
        name.trim(),
        properties.join(", ")
    ));
    Ok(())
}

fn category_rename(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [kind, old, new] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: category rename <income|expense> <old> <new>".into(),
        ));
    };
    let kind = parse_kind(kind)?;
    let id = CategoryService::find_by_name(&context.sheet, kind, old)?;
    let moved = CategoryService::rename(&mut context.sheet, id, new)?;
    context.persist_portfolio()?;
    io::print_success(format!(
        "Renamed `{}` to `{}` ({} cells moved).",
        old,
        new.trim(),
        moved
    ));
    Ok(())
}

fn category_properties(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [kind, name, properties @ ..] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: category properties <income|expense> <name> <property...>".into(),
        ));
    };
    let kind = parse_kind(kind)?;
    let id = CategoryService::find_by_name(&context.sheet, kind, name)?;
    let properties = target_properties(context, properties);
    CategoryService::set_properties(&mut context.sheet, id, &properties)?;
    context.persist_portfolio()?;
    io::print_success(format!("`{}` now applies to {}.", name, properties.join(", ")));
    Ok(())
}

fn category_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let purge = args.iter().any(|arg| *arg == "--purge");
    let rest: Vec<&str> = args.iter().copied().filter(|arg| *arg != "--purge").collect();
    let [kind, name] = rest.as_slice() else {
        return Err(CommandError::InvalidArguments(
            "usage: category delete <income|expense> <name> [--purge]".into(),
        ));
    };
    let kind = parse_kind(kind)?;
    let id = CategoryService::find_by_name(&context.sheet, kind, name)?;

    if purge {
        let prompt = format!("Delete `{}` and all of its stored values in every year?", name);
        if !context.confirm(&prompt)? {
            io::print_info("Delete cancelled.");
            return Ok(());
        }
        let removed = CategoryService::purge(&mut context.sheet, id)?;
        context.persist_portfolio()?;
        io::print_success(format!("Deleted `{}` and {} stored cells.", name, removed));
    } else {
        CategoryService::delete(&mut context.sheet, id)?;
        context.persist_portfolio()?;
        io::print_success(format!(
            "Deleted `{}`. Its stored values are kept; use --purge to remove them.",
            name
        ));
    }
    Ok(())
}

fn category_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kinds = match args.first() {
        Some(raw) => vec![parse_kind(raw)?],
        None => CategoryType::ALL.to_vec(),
    };
    for kind in kinds {
        output_section(format!("{} categories", kind));
        for name in kind.builtin_categories() {
            io::print_info(format!("  {}", name));
        }
        for category in CategoryService::list(&context.sheet, kind) {
            io::print_info(format!(
                "  {} (custom: {})",
                category.name,
                category.properties.join(", ")
            ));
        }
    }
    Ok(())
}
