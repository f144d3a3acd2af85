use chrono::Utc;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::api::BillingApi;
use crate::cli::{confirm, connect, year_or_current};
use crate::directory::ClientDirectory;
use crate::error::{BillingError, Result};
use crate::fmt::{money, paid_mark, payment_date};
use crate::ledger::{derive_matrix, parse_amount, submit_reconciliation, MonthEdit};
use crate::models::{Client, NewPayment, PaymentRecord};
use crate::month::Month;
use crate::reports::client_year;
use crate::settings::effective_settings;

pub fn ledger_table(client: &Client, year: i32, symbol: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Amount", "Paid", "Balance", "Date", "Note"]);
    for e in derive_matrix(client, year) {
        let mark = paid_mark(e.is_paid);
        let balance = money(e.balance, symbol);
        table.add_row(vec![
            Cell::new(e.month),
            Cell::new(money(e.amount, symbol)),
            Cell::new(if e.is_paid { mark.green() } else { mark.red() }),
            Cell::new(if e.balance > 0.0 { balance.red() } else { balance.normal() }),
            Cell::new(e.date.as_deref().map(payment_date).unwrap_or_default()),
            Cell::new(e.message),
        ]);
    }
    table
}

fn print_ledger(client: &Client, year: i32, symbol: &str) {
    let totals = client_year(client, year);
    println!(
        "{} - {year} (fixed {})\n{}",
        client.name.bold(),
        money(client.fixed_amount, symbol),
        ledger_table(client, year, symbol)
    );
    println!(
        "Collected {} of {} | outstanding {}",
        money(totals.collected, symbol),
        money(totals.expected, symbol),
        money(totals.outstanding, symbol)
    );
}

pub fn show(client_id: &str, year: Option<i32>) -> Result<()> {
    let settings = effective_settings();
    let year = year_or_current(year);
    let dir = ClientDirectory::load(&connect()?)?;
    let client = dir
        .get(client_id)
        .ok_or_else(|| BillingError::UnknownClient(client_id.to_string()))?;
    print_ledger(client, year, &settings.currency_symbol);
    Ok(())
}

pub struct SetArgs {
    pub month: String,
    pub amount: String,
    pub message: String,
    pub date: Option<String>,
    pub year: Option<i32>,
    pub paid: bool,
    pub unpaid: bool,
}

impl SetArgs {
    fn to_edit(&self) -> MonthEdit {
        MonthEdit {
            month: self.month.clone(),
            amount: Some(self.amount.clone()),
            message: self.message.clone(),
            date: self.date.clone(),
            paid: match (self.paid, self.unpaid) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
        }
    }
}

pub fn set(client_id: &str, args: &SetArgs) -> Result<()> {
    let settings = effective_settings();
    let year = year_or_current(args.year);
    let api = connect()?;
    let mut dir = ClientDirectory::load(&api)?;
    let edit = args.to_edit();
    let saved = submit_reconciliation(&api, &mut dir, client_id, year, &edit, Utc::now())?;

    println!("{} Saved {} {year}", "\u{2714}".green(), edit.month);
    if let Some(e) = saved.reload_error {
        eprintln!("{}", format!("Saved, but reloading clients failed: {e}").yellow());
        return Ok(());
    }
    if let Some(client) = dir.get(client_id) {
        print_ledger(client, year, &settings.currency_symbol);
    }
    Ok(())
}

/// Records sorted by year then calendar month; unknown months sort last.
pub fn sort_records(records: &mut [PaymentRecord]) {
    records.sort_by_key(|r| {
        let month = r.month.parse::<Month>().map(|m| m.number()).unwrap_or(13);
        (r.year.unwrap_or(i32::MAX), month)
    });
}

pub fn records_table(records: &[PaymentRecord], symbol: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Year", "Month", "Amount", "Paid", "Date", "Note"]);
    for r in records {
        let date = r.date.as_deref().or(r.created_at.as_deref()).map(payment_date);
        table.add_row(vec![
            Cell::new(r.payment_id().unwrap_or("")),
            Cell::new(r.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(&r.month),
            Cell::new(money(r.entered_amount.unwrap_or(0.0), symbol)),
            Cell::new(paid_mark(r.is_paid.unwrap_or(false))),
            Cell::new(date.unwrap_or_default()),
            Cell::new(r.message.as_deref().unwrap_or("")),
        ]);
    }
    table
}

pub fn fetch_records<A: BillingApi + ?Sized>(api: &A, client_id: &str) -> Result<Vec<PaymentRecord>> {
    let mut records = api.client_payments(client_id)?;
    sort_records(&mut records);
    Ok(records)
}

pub fn list(client_id: &str) -> Result<()> {
    let settings = effective_settings();
    let records = fetch_records(&connect()?, client_id)?;
    if records.is_empty() {
        println!("No payment records for client {client_id}.");
        return Ok(());
    }
    println!("Payments\n{}", records_table(&records, &settings.currency_symbol));
    Ok(())
}

pub fn new_payment(month: &str, amount: &str, message: &str, year: Option<i32>) -> Result<NewPayment> {
    let message = message.trim();
    if message.is_empty() {
        return Err(BillingError::validation("Message is required"));
    }
    let entered_amount = parse_amount(amount)?;
    Ok(NewPayment {
        year: year_or_current(year),
        month: month.parse()?,
        entered_amount,
        message: message.to_string(),
        is_paid: entered_amount > 0.0,
    })
}

pub fn add(client_id: &str, month: &str, amount: &str, message: &str, year: Option<i32>) -> Result<()> {
    let payment = new_payment(month, amount, message, year)?;
    connect()?.create_payment(client_id, &payment)?;
    println!("Added payment: {} {} for {client_id}", payment.month, payment.year);
    Ok(())
}

pub fn delete(payment_id: &str, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("Delete payment {payment_id}?"))? {
        println!("Cancelled.");
        return Ok(());
    }
    connect()?.delete_payment(payment_id)?;
    println!("Deleted payment: {payment_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testutil::{client_with_payments, FakeApi};

    fn record(year: i32, month: &str) -> PaymentRecord {
        serde_json::from_value(json!({"_id": format!("{year}-{month}"), "year": year, "month": month}))
            .unwrap()
    }

    #[test]
    fn test_set_args_paid_override() {
        let mut args = SetArgs {
            month: "mar".into(),
            amount: "0".into(),
            message: String::new(),
            date: None,
            year: Some(2025),
            paid: false,
            unpaid: false,
        };
        assert_eq!(args.to_edit().paid, None);
        args.paid = true;
        assert_eq!(args.to_edit().paid, Some(true));
        args.paid = false;
        args.unpaid = true;
        assert_eq!(args.to_edit().paid, Some(false));
    }

    #[test]
    fn test_sort_records_calendar_order() {
        let mut records = vec![record(2025, "March"), record(2024, "December"), record(2025, "Jan"), record(2025, "Smarch")];
        sort_records(&mut records);
        let ids: Vec<&str> = records.iter().filter_map(|r| r.payment_id()).collect();
        assert_eq!(ids, vec!["2024-December", "2025-Jan", "2025-March", "2025-Smarch"]);
    }

    #[test]
    fn test_fetch_records_sorted_and_deletable() {
        let api = FakeApi::default().with_payments(vec![record(2025, "May"), record(2025, "February")]);
        let records = fetch_records(&api, "c1").unwrap();
        assert_eq!(records[0].month, "February");

        api.delete_payment("2025-May").unwrap();
        let records = fetch_records(&api, "c1").unwrap();
        assert_eq!(records.len(), 1);

        let payment = new_payment("jun", "50", "partial", Some(2025)).unwrap();
        api.create_payment("c1", &payment).unwrap();
        assert_eq!(api.payments().len(), 2);
        let records = fetch_records(&api, "c1").unwrap();
        assert_eq!(records.last().map(|r| r.month.as_str()), Some("June"));
    }

    #[test]
    fn test_new_payment_validation() {
        let p = new_payment("april", "120", " rent ", Some(2025)).unwrap();
        assert_eq!(p.month, Month::April);
        assert_eq!(p.message, "rent");
        assert!(p.is_paid);
        assert!(new_payment("april", "120", "  ", Some(2025)).is_err());
        assert!(new_payment("april", "-1", "x", Some(2025)).is_err());
        assert!(new_payment("13", "1", "x", Some(2025)).is_err());
    }

    #[test]
    fn test_ledger_table_has_twelve_rows() {
        colored::control::set_override(false);
        let client = client_with_payments(
            "a",
            100.0,
            json!({"2025": {"March": {"enteredAmount": 100, "date": "2025-03-02T00:00:00.000Z", "message": "cash"}}}),
        );
        let table = ledger_table(&client, 2025, "$");
        assert_eq!(table.row_iter().count(), 12);
        let rendered = table.to_string();
        assert!(rendered.contains("2 / March / 2025"));
        assert!(rendered.contains("cash"));
    }
}
