use csv::Writer;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    core::{ledger_sheet::LedgerSheet, utils::ensure_dir},
    currency::format_plain,
    errors::LedgerError,
    ledger::{CategoryType, Month, SelectionMode},
};

pub struct ExportService;

impl ExportService {
    /// `rental_ledger_{year}_{display}.csv` for the current year and selection.
    pub fn file_name(sheet: &LedgerSheet) -> String {
        format!(
            "rental_ledger_{}_{}.csv",
            sheet.year(),
            Self::selection_label(sheet)
        )
    }

    fn selection_label(sheet: &LedgerSheet) -> String {
        let selection = sheet.selection();
        match selection.mode() {
            SelectionMode::Empty => "no_properties".into(),
            SelectionMode::Single => selection
                .single_property()
                .unwrap_or_default()
                .replace(&['/', '\\'][..], "_"),
            SelectionMode::Multiple => {
                let names = sheet.portfolio().property_names();
                let covers_all = !names.is_empty()
                    && names.iter().all(|name| selection.contains(name));
                if covers_all {
                    "all_properties".into()
                } else {
                    format!("{}_properties", selection.len())
                }
            }
        }
    }

    /// Writes the visible grid: one row per category, a total row per
    /// section and a final net row. Hidden months are left blank.
    pub fn write_csv<W: Write>(sheet: &LedgerSheet, writer: W) -> Result<(), LedgerError> {
        let mut wtr = Writer::from_writer(writer);
        let visibility = sheet.visibility();
        let aggregator = sheet.aggregator();
        let monthly = aggregator.monthly_totals();

        let mut header = vec!["Type".to_string(), "Category".to_string()];
        header.extend(Month::ALL.iter().map(|month| month.short_name().to_string()));
        header.push("Total".into());
        wtr.write_record(&header)?;

        for kind in CategoryType::ALL {
            for category in sheet.visible_categories(kind) {
                let mut row = vec![kind.as_str().to_string(), category.clone()];
                for month in Month::ALL {
                    row.push(if visibility.is_visible(month) {
                        format_plain(sheet.get_cell_value(kind, &category, month))
                    } else {
                        String::new()
                    });
                }
                row.push(format_plain(aggregator.category_total(&category, kind)));
                wtr.write_record(&row)?;
            }

            let label = match kind {
                CategoryType::Income => "Total Income",
                CategoryType::Expense => "Total Expenses",
            };
            let mut row = vec![kind.as_str().to_string(), label.to_string()];
            let mut sum = 0.0;
            for month in Month::ALL {
                let totals = &monthly[month.index()];
                let amount = match kind {
                    CategoryType::Income => totals.income,
                    CategoryType::Expense => totals.expenses,
                };
                sum += amount;
                row.push(if visibility.is_visible(month) {
                    format_plain(amount)
                } else {
                    String::new()
                });
            }
            row.push(format_plain(sum));
            wtr.write_record(&row)?;
        }

        let grand = aggregator.grand_totals();
        let mut row = vec![String::new(), "Net Income".to_string()];
        for month in Month::ALL {
            row.push(if visibility.is_visible(month) {
                format_plain(monthly[month.index()].net)
            } else {
                String::new()
            });
        }
        row.push(format_plain(grand.net));
        wtr.write_record(&row)?;
        wtr.flush()?;
        Ok(())
    }

    /// Writes the export into `dir` and returns the file path.
    pub fn export_to_dir(sheet: &LedgerSheet, dir: &Path) -> Result<PathBuf, LedgerError> {
        ensure_dir(dir)?;
        let path = dir.join(Self::file_name(sheet));
        let file = File::create(&path)?;
        Self::write_csv(sheet, file)?;
        tracing::info!(path = %path.display(), "ledger exported");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::time::FixedClock,
        ledger::{Portfolio, PropertySelection, Transaction},
        storage::MemorySnapshotStore,
    };

    fn sheet(selection: PropertySelection) -> LedgerSheet {
        let mut portfolio = Portfolio::new();
        portfolio.import_transactions(vec![
            Transaction::new("2024-01-05", CategoryType::Income, "Booking Revenue", 1200.0, "Lakeview"),
            Transaction::new("2024-01-09", CategoryType::Expense, "Cleaning", 150.0, "Lakeview"),
            Transaction::new("2024-02-01", CategoryType::Income, "Booking Revenue", 900.0, "Harbor/East"),
        ]);
        LedgerSheet::open(
            portfolio,
            Box::new(MemorySnapshotStore::new()),
            Box::new(FixedClock::ymd(2024, 2, 10)),
            2024,
            selection,
        )
    }

    #[test]
    fn file_name_reflects_selection() {
        assert_eq!(
            ExportService::file_name(&sheet(PropertySelection::none())),
            "rental_ledger_2024_no_properties.csv"
        );
        assert_eq!(
            ExportService::file_name(&sheet(PropertySelection::single("Harbor/East"))),
            "rental_ledger_2024_Harbor_East.csv"
        );
        assert_eq!(
            ExportService::file_name(&sheet(PropertySelection::new(["Lakeview", "Harbor/East"]))),
            "rental_ledger_2024_all_properties.csv"
        );
    }

    #[test]
    fn partial_multi_selection_counts_properties() {
        let mut sheet = sheet(PropertySelection::none());
        sheet.portfolio_mut().add_property("Cabin");
        sheet.set_selection(PropertySelection::new(["Lakeview", "Cabin"]));
        assert_eq!(ExportService::file_name(&sheet), "rental_ledger_2024_2_properties.csv");
    }

    #[test]
    fn csv_blanks_future_months_and_ends_with_net() {
        let sheet = sheet(PropertySelection::single("Lakeview"));
        let mut buffer = Vec::new();
        ExportService::write_csv(&sheet, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("Type,Category,Jan,Feb,Mar"));
        assert!(lines
            .iter()
            .any(|line| *line == "income,Booking Revenue,1200.00,0.00,,,,,,,,,,,1200.00"));
        assert_eq!(
            *lines.last().unwrap(),
            ",Net Income,1050.00,0.00,,,,,,,,,,,1050.00"
        );
    }
}
