use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tracing::{info, warn};

use crate::api::BillingApi;
use crate::directory::ClientDirectory;
use crate::error::{BillingError, Result};
use crate::models::{Client, PaymentEntry};
use crate::month::Month;

// ---------------------------------------------------------------------------
// Matrix derivation
// ---------------------------------------------------------------------------

/// One cell of a client's year matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthEntry {
    pub month: Month,
    pub amount: f64,
    pub is_paid: bool,
    pub balance: f64,
    pub date: Option<String>,
    pub message: String,
}

impl MonthEntry {
    fn empty(month: Month) -> Self {
        Self {
            month,
            amount: 0.0,
            is_paid: false,
            balance: 0.0,
            date: None,
            message: String::new(),
        }
    }
}

/// The twelve months of `year` for `client`, January first.
pub fn derive_matrix(client: &Client, year: i32) -> [MonthEntry; 12] {
    Month::ALL.map(|month| match client.payment(year, month) {
        None => MonthEntry::empty(month),
        Some(stored) => {
            let amount = stored.paid_amount().unwrap_or(0.0);
            MonthEntry {
                month,
                amount,
                is_paid: stored.is_paid.unwrap_or(amount > 0.0),
                balance: stored.balance.unwrap_or(client.fixed_amount - amount),
                date: stored.date.clone(),
                message: stored.message.clone().unwrap_or_default(),
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// A month edit as the operator typed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthEdit {
    pub month: String,
    pub amount: Option<String>,
    pub message: String,
    pub date: Option<String>,
    /// Explicit paid/unpaid override for the edited month.
    pub paid: Option<bool>,
}

/// A month edit that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEdit {
    pub month: Month,
    pub amount: f64,
    pub message: String,
    pub date: Option<String>,
    pub paid: Option<bool>,
}

impl MonthEdit {
    pub fn validate(&self) -> Result<ValidEdit> {
        let month: Month = self.month.parse()?;

        let raw_amount = self
            .amount
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| BillingError::validation("Amount is required"))?;
        let amount = parse_amount(raw_amount)?;

        let date = match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => Some(normalize_date(raw)?),
            None => None,
        };

        Ok(ValidEdit {
            month,
            amount,
            message: self.message.trim().to_string(),
            date,
            paid: self.paid,
        })
    }
}

pub fn parse_amount(raw: &str) -> Result<f64> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| BillingError::validation(format!("Amount must be a number, got '{raw}'")))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(BillingError::validation(format!(
            "Amount must be zero or more, got '{raw}'"
        )));
    }
    Ok(amount)
}

/// Accepts RFC 3339 timestamps as-is and widens plain `YYYY-MM-DD` dates to
/// midnight UTC.
pub fn normalize_date(raw: &str) -> Result<String> {
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return Ok(raw.to_string());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| BillingError::validation(format!("Invalid date '{raw}' (expected YYYY-MM-DD)")))?;
    let midnight = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()).ok_or_else(|| {
        BillingError::validation(format!("Invalid date '{raw}'"))
    })?;
    Ok(iso_timestamp(midnight))
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build the full twelve-month payload for `year`, replacing only the edited
/// month and carrying the other eleven forward.
pub fn reconcile(client: &Client, year: i32, edit: &ValidEdit, now: DateTime<Utc>) -> Vec<PaymentEntry> {
    let now = iso_timestamp(now);
    Month::ALL
        .iter()
        .map(|&month| {
            let existing = client.payment(year, month);
            let (amount, date, message, paid_override) = if month == edit.month {
                (
                    edit.amount,
                    edit.date.clone().unwrap_or_else(|| now.clone()),
                    edit.message.clone(),
                    edit.paid,
                )
            } else {
                (
                    existing.and_then(|p| p.paid_amount()).unwrap_or(0.0),
                    existing
                        .and_then(|p| p.date.clone())
                        .filter(|d| !d.is_empty())
                        .unwrap_or_else(|| now.clone()),
                    existing.and_then(|p| p.message.clone()).unwrap_or_default(),
                    None,
                )
            };
            PaymentEntry {
                year,
                month,
                entered_amount: amount,
                is_paid: paid_override.unwrap_or(amount > 0.0),
                balance: client.fixed_amount - amount,
                date,
                message,
            }
        })
        .collect()
}

/// A year payload the server accepted.
#[derive(Debug)]
pub struct Reconciled {
    pub entries: Vec<PaymentEntry>,
    /// Set when the write went through but the roster reload afterwards did
    /// not; the directory then still holds the pre-write data.
    pub reload_error: Option<BillingError>,
}

/// Validate, send the year payload, then reload the roster from the server.
/// An `Err` means nothing was written and the caller's `edit` can be
/// resubmitted as is.
pub fn submit_reconciliation<A: BillingApi + ?Sized>(
    api: &A,
    directory: &mut ClientDirectory,
    client_id: &str,
    year: i32,
    edit: &MonthEdit,
    now: DateTime<Utc>,
) -> Result<Reconciled> {
    let valid = edit.validate()?;
    let client = directory
        .get(client_id)
        .ok_or_else(|| BillingError::UnknownClient(client_id.to_string()))?;
    let entries = reconcile(client, year, &valid, now);

    api.submit_year(client_id, &entries)?;
    info!("Saved {} {year} for client {client_id}", valid.month);
    let reload_error = directory.refresh(api).err();
    if let Some(e) = &reload_error {
        warn!("Saved {} {year} but reloading clients failed: {e}", valid.month);
    }
    Ok(Reconciled {
        entries,
        reload_error,
    })
}
