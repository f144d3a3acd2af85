use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;
use zeroize::Zeroize;

use crate::month::Month;

/// year key -> month key -> record, exactly as the API nests it.
pub type PaymentBook = BTreeMap<String, BTreeMap<String, StoredPayment>>;

// ---------------------------------------------------------------------------
// Lenient wire helpers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Numbers arrive as JSON numbers or numeric strings depending on the write path.
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw: Option<NumberOrText> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    Ok(lenient_amount(deserializer)?.map(|n| n as i32))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NoteField {
    Text(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagField {
    Flag(bool),
    Number(f64),
    Text(String),
}

/// `isPaid` is usually a bool but older records store "true"/"false" or 0/1.
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let raw: Option<FlagField> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(FlagField::Flag(b)) => Some(b),
        Some(FlagField::Number(n)) => Some(n != 0.0),
        Some(FlagField::Text(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        None => None,
    })
}

/// Reads the nested payments object one month at a time. Null months are
/// dropped; months that still fail to parse are dropped with a warning so one
/// bad record cannot hide the whole roster.
fn lenient_book<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PaymentBook>, D::Error> {
    let Some(Value::Object(years)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let mut book = PaymentBook::new();
    for (year, months) in years {
        let Value::Object(months) = months else {
            if !months.is_null() {
                warn!("Ignoring payments for year '{year}': expected an object");
            }
            continue;
        };
        let entry = book.entry(year.clone()).or_default();
        for (month, record) in months {
            if record.is_null() {
                continue;
            }
            match serde_json::from_value::<StoredPayment>(record) {
                Ok(payment) => {
                    entry.insert(month, payment);
                }
                Err(e) => warn!("Ignoring unreadable payment for {month} {year}: {e}"),
            }
        }
    }
    Ok(Some(book))
}

/// A note is a single string, but some records carry it as a one-element array.
fn lenient_note<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw: Option<NoteField> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(NoteField::Text(s)) => Some(s),
        Some(NoteField::Many(v)) => v.into_iter().find(|s| !s.is_empty()),
        None => None,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One month's stored billing fact, as embedded in a client's `payments`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPayment {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub entered_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub balance: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_note")]
    pub message: Option<String>,
}

impl StoredPayment {
    /// `enteredAmount`, falling back to the `amount` read alias.
    pub fn paid_amount(&self) -> Option<f64> {
        self.entered_amount.or(self.amount)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    object_id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    fixed_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_book")]
    payments: Option<PaymentBook>,
}

impl From<ClientWire> for Client {
    fn from(w: ClientWire) -> Self {
        Client {
            id: w.id.or(w.object_id).unwrap_or_default(),
            name: w.name,
            email: w.email.filter(|s| !s.is_empty()),
            phone: w.phone.filter(|s| !s.is_empty()),
            address: w.address.filter(|s| !s.is_empty()),
            fixed_amount: w.fixed_amount.unwrap_or(0.0),
            payments: w.payments.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "ClientWire")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub fixed_amount: f64,
    pub payments: PaymentBook,
}

impl Client {
    /// Look up one month's record. The canonical key wins; otherwise a key
    /// that parses to the same month ("march", "Mar") is accepted.
    pub fn payment(&self, year: i32, month: Month) -> Option<&StoredPayment> {
        let months = self.payments.get(&year.to_string())?;
        months.get(month.name()).or_else(|| {
            months
                .iter()
                .find(|(key, _)| key.parse::<Month>().ok() == Some(month))
                .map(|(_, p)| p)
        })
    }

    /// Month keys in `year` that do not name any month.
    pub fn unrecognized_month_keys(&self, year: i32) -> Vec<&str> {
        self.payments
            .get(&year.to_string())
            .map(|months| {
                months
                    .keys()
                    .filter(|k| k.parse::<Month>().is_err())
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Years with at least one recorded month, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.payments.keys().filter_map(|k| k.parse().ok()).collect();
        years.sort_unstable();
        years
    }
}

/// Body for `POST /clients` and `PUT /clients/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientForm {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub fixed_amount: f64,
}

impl ClientForm {
    pub fn from_client(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone().unwrap_or_default(),
            address: client.address.clone(),
            fixed_amount: client.fixed_amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// One element of the full-year reconciliation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    pub year: i32,
    pub month: Month,
    pub entered_amount: f64,
    pub is_paid: bool,
    pub balance: f64,
    pub date: String,
    pub message: String,
}

/// A payment as returned by `GET /payments/client/:id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub entered_amount: Option<f64>,
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "lenient_note")]
    pub message: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl PaymentRecord {
    pub fn payment_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.object_id.as_deref())
    }
}

/// Body for `POST /payments/:clientId`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub year: i32,
    pub month: Month,
    pub entered_amount: f64,
    pub message: String,
    pub is_paid: bool,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => write!(f, "{name} <{email}>"),
            (Some(name), None) => f.write_str(name),
            (None, Some(email)) => f.write_str(email),
            (None, None) => f.write_str("(unknown user)"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

#[derive(Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}
