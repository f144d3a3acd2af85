use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{connect, year_or_current};
use crate::directory::ClientDirectory;
use crate::error::Result;
use crate::fmt::{money, payment_date};
use crate::reports::{get_summary, DashboardSummary};
use crate::settings::effective_settings;

pub fn totals_table(summary: &DashboardSummary, symbol: &str) -> Table {
    let mut table = Table::new();
    table.add_row(vec![Cell::new("Clients"), Cell::new(summary.total_clients)]);
    table.add_row(vec![Cell::new("Paid months"), Cell::new(summary.paid_months)]);
    table.add_row(vec![Cell::new("Expected"), Cell::new(money(summary.expected, symbol))]);
    table.add_row(vec![
        Cell::new("Collected"),
        Cell::new(money(summary.collected, symbol).green()),
    ]);
    let outstanding = money(summary.outstanding, symbol);
    table.add_row(vec![
        Cell::new("Outstanding".bold()),
        Cell::new(if summary.outstanding > 0.0 { outstanding.red().bold() } else { outstanding.bold() }),
    ]);
    table
}

pub fn recent_table(summary: &DashboardSummary, symbol: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Client", "Month", "Amount"]);
    for r in &summary.recent {
        table.add_row(vec![
            Cell::new(payment_date(&r.date)),
            Cell::new(&r.client_name),
            Cell::new(format!("{} {}", r.month, r.year)),
            Cell::new(money(r.amount, symbol)),
        ]);
    }
    table
}

pub fn run(year: Option<i32>) -> Result<()> {
    let settings = effective_settings();
    let symbol = &settings.currency_symbol;
    let year = year_or_current(year);
    let dir = ClientDirectory::load(&connect()?)?;
    let summary = get_summary(dir.clients(), year);

    println!("Summary {year}\n{}", totals_table(&summary, symbol));

    if !summary.clients.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Client", "Fixed", "Paid Months", "Collected", "Outstanding"]);
        for row in summary.clients.iter().filter(|r| r.outstanding > 0.0) {
            table.add_row(vec![
                Cell::new(&row.name),
                Cell::new(money(row.fixed_amount, symbol)),
                Cell::new(format!("{}/12", row.paid_months)),
                Cell::new(money(row.collected, symbol)),
                Cell::new(money(row.outstanding, symbol).red()),
            ]);
        }
        if table.row_iter().count() > 0 {
            println!("\nOutstanding by client\n{table}");
        }
    }

    if summary.recent.is_empty() {
        println!("\nNo payments recorded yet.");
    } else {
        println!("\nRecent payments\n{}", recent_table(&summary, symbol));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testutil::client_with_payments;

    #[test]
    fn test_summary_tables_render() {
        colored::control::set_override(false);
        let clients = vec![client_with_payments(
            "a",
            100.0,
            json!({"2025": {"April": {"enteredAmount": 100, "date": "2025-04-09T00:00:00.000Z"}}}),
        )];
        let summary = get_summary(&clients, 2025);
        let totals = totals_table(&summary, "$").to_string();
        assert!(totals.contains("$1,200.00"));
        assert!(totals.contains("$1,100.00"));
        let recent = recent_table(&summary, "$").to_string();
        assert!(recent.contains("9 / April / 2025"));
        assert!(recent.contains("April 2025"));
    }
}
