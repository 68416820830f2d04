//! Plain-text rendering of the ledger grid.

use crate::cli::output::styled_net;
use crate::cli::shell_context::ShellContext;
use crate::ledger::{CategoryType, Month, NetClass, Totals, MONTHS_PER_YEAR};

const LABEL_WIDTH: usize = 24;
const CELL_WIDTH: usize = 12;
const HIDDEN: &str = "-";

fn header() -> String {
    let mut line = format!("{:<LABEL_WIDTH$}", "Category");
    for month in Month::ALL {
        line.push_str(&format!("{:>CELL_WIDTH$}", month.short_name()));
    }
    line.push_str(&format!("{:>CELL_WIDTH$}", "Total"));
    line
}

fn truncate(label: &str) -> String {
    if label.chars().count() <= LABEL_WIDTH - 1 {
        label.to_string()
    } else {
        let mut short: String = label.chars().take(LABEL_WIDTH - 2).collect();
        short.push('~');
        short
    }
}

fn row(label: &str, cells: &[String], total: &str) -> String {
    let mut line = format!("{:<LABEL_WIDTH$}", truncate(label));
    for cell in cells {
        line.push_str(&format!("{:>CELL_WIDTH$}", cell));
    }
    line.push_str(&format!("{:>CELL_WIDTH$}", total));
    line
}

/// Grid for one category type, formulas marked with `*`.
pub(crate) fn section_lines(context: &ShellContext, kind: CategoryType) -> Vec<String> {
    let sheet = &context.sheet;
    let visibility = sheet.visibility();
    let active = sheet.active_cell();
    let mut lines = vec![header()];

    for category in sheet.visible_categories(kind) {
        let cells: Vec<String> = Month::ALL
            .iter()
            .map(|&month| {
                if !visibility.is_visible(month) {
                    return HIDDEN.to_string();
                }
                let mut text = context.format_amount(sheet.get_cell_value(kind, &category, month));
                if sheet.get_cell_formula(kind, &category, month).is_some() {
                    text.push('*');
                }
                let focused = active.map_or(false, |cell| {
                    cell.kind == kind && cell.category == category && cell.month == month
                });
                if focused {
                    text = format!("[{}]", text);
                }
                text
            })
            .collect();
        let total = context.format_amount(sheet.calculate_category_total(&category, kind));
        lines.push(row(&category, &cells, &total));
    }

    let monthly = sheet.calculate_monthly_totals();
    let label = match kind {
        CategoryType::Income => "Total Income",
        CategoryType::Expense => "Total Expenses",
    };
    let pick = |totals: &Totals| match kind {
        CategoryType::Income => totals.income,
        CategoryType::Expense => totals.expenses,
    };
    let cells = visible_cells(context, &monthly, &pick);
    let total = context.format_amount(monthly.iter().map(&pick).sum());
    lines.push(row(label, &cells, &total));
    lines
}

fn visible_cells(
    context: &ShellContext,
    monthly: &[Totals; MONTHS_PER_YEAR],
    pick: impl Fn(&Totals) -> f64,
) -> Vec<String> {
    let visibility = context.sheet.visibility();
    Month::ALL
        .iter()
        .map(|&month| {
            if visibility.is_visible(month) {
                context.format_amount(pick(&monthly[month.index()]))
            } else {
                HIDDEN.to_string()
            }
        })
        .collect()
}

/// Net income row, colored by sign.
pub(crate) fn net_line(context: &ShellContext) -> String {
    let monthly = context.sheet.calculate_monthly_totals();
    let grand = context.sheet.calculate_grand_totals();
    let mut line = format!("{:<LABEL_WIDTH$}", "Net Income");
    let visibility = context.sheet.visibility();
    for month in Month::ALL {
        let totals = &monthly[month.index()];
        let cell = if visibility.is_visible(month) {
            styled_net(
                &format!("{:>CELL_WIDTH$}", context.format_amount(totals.net)),
                totals.net_class(),
            )
        } else {
            format!("{:>CELL_WIDTH$}", HIDDEN)
        };
        line.push_str(&cell);
    }
    line.push_str(&styled_net(
        &format!("{:>CELL_WIDTH$}", context.format_amount(grand.net)),
        NetClass::classify(grand.net),
    ));
    line
}
