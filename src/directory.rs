use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::api::BillingApi;
use crate::error::{BillingError, Result};
use crate::importer::CsvRecord;
use crate::ledger::{derive_matrix, parse_amount};
use crate::models::{Client, ClientForm};
use crate::month::Month;

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// The client roster as last confirmed by the server. Every write goes to the
/// API first and is followed by a full reload; the list is never patched.
#[derive(Debug, Default)]
pub struct ClientDirectory {
    clients: Vec<Client>,
}

impl ClientDirectory {
    pub fn load<A: BillingApi + ?Sized>(api: &A) -> Result<Self> {
        let mut dir = Self::default();
        dir.refresh(api)?;
        Ok(dir)
    }

    pub fn refresh<A: BillingApi + ?Sized>(&mut self, api: &A) -> Result<()> {
        let clients = api.list_clients()?;
        for client in &clients {
            for year in client.years() {
                for key in client.unrecognized_month_keys(year) {
                    warn!("Client {} ({}) has an unrecognized month '{key}' in {year}; ignoring it", client.name, client.id);
                }
            }
        }
        debug!("Loaded {} clients", clients.len());
        self.clients = clients;
        Ok(())
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn get(&self, client_id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == client_id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn create<A: BillingApi + ?Sized>(&mut self, api: &A, form: &ClientForm) -> Result<()> {
        validate_form(form)?;
        api.create_client(form)?;
        info!("Created client {}", form.name);
        self.refresh(api)
    }

    /// Merge `changes` into the current record and send the whole form.
    pub fn update<A: BillingApi + ?Sized>(
        &mut self,
        api: &A,
        client_id: &str,
        changes: &ClientChanges,
    ) -> Result<ClientForm> {
        let current = self
            .get(client_id)
            .ok_or_else(|| BillingError::UnknownClient(client_id.to_string()))?;
        let form = changes.apply(ClientForm::from_client(current))?;
        validate_form(&form)?;
        api.update_client(client_id, &form)?;
        info!("Updated client {client_id}");
        self.refresh(api)?;
        Ok(form)
    }

    pub fn delete<A: BillingApi + ?Sized>(&mut self, api: &A, client_id: &str) -> Result<()> {
        if self.get(client_id).is_none() {
            return Err(BillingError::UnknownClient(client_id.to_string()));
        }
        api.delete_client(client_id)?;
        info!("Deleted client {client_id}");
        self.refresh(api)
    }

    pub fn import<A: BillingApi + ?Sized>(&mut self, api: &A, records: &[CsvRecord]) -> Result<usize> {
        if records.is_empty() {
            return Err(BillingError::validation("The CSV file has no client rows"));
        }
        let unnamed = records
            .iter()
            .filter(|r| !r.get("name").is_some_and(|n| !n.trim().is_empty()))
            .count();
        if unnamed > 0 {
            warn!("{unnamed} CSV rows have no name; the server may reject them");
        }
        api.upload_clients(records)?;
        info!("Uploaded {} clients from CSV", records.len());
        self.refresh(api)?;
        Ok(records.len())
    }
}

// ---------------------------------------------------------------------------
// Client form validation
// ---------------------------------------------------------------------------

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

pub fn validate_form(form: &ClientForm) -> Result<()> {
    if form.name.trim().is_empty() {
        return Err(BillingError::validation("Client name is required"));
    }
    if form.phone.trim().is_empty() {
        return Err(BillingError::validation("Phone number is required"));
    }
    if let Some(email) = form.email.as_deref() {
        if !email_pattern().is_match(email.trim()) {
            return Err(BillingError::validation(format!("Invalid email address: {email}")));
        }
    }
    if !form.fixed_amount.is_finite() || form.fixed_amount < 0.0 {
        return Err(BillingError::validation("Fixed amount must be zero or more"));
    }
    Ok(())
}

/// Field changes for `clients update`; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct ClientChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub fixed_amount: Option<String>,
}

impl ClientChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.fixed_amount.is_none()
    }

    /// Empty strings clear the optional fields.
    pub fn apply(&self, mut form: ClientForm) -> Result<ClientForm> {
        if let Some(name) = &self.name {
            form.name = name.trim().to_string();
        }
        if let Some(phone) = &self.phone {
            form.phone = phone.trim().to_string();
        }
        if let Some(email) = &self.email {
            form.email = non_empty(email);
        }
        if let Some(address) = &self.address {
            form.address = non_empty(address);
        }
        if let Some(amount) = &self.fixed_amount {
            form.fixed_amount = parse_amount(amount)?;
        }
        Ok(form)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Paid,
    Unpaid,
}

impl StatusFilter {
    pub fn key(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::All => Self::Paid,
            Self::Paid => Self::Unpaid,
            Self::Unpaid => Self::All,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StatusFilter {
    type Err = BillingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "paid" => Ok(Self::Paid),
            "unpaid" => Ok(Self::Unpaid),
            other => Err(BillingError::validation(format!(
                "Unknown status filter '{other}' (expected all, paid or unpaid)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientFilter {
    pub search: String,
    pub status: StatusFilter,
    pub months: Vec<Month>,
    pub year: i32,
}

impl ClientFilter {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }

    fn text_matches(&self, client: &Client) -> bool {
        let term = &self.search;
        client.name.to_lowercase().contains(&term.to_lowercase())
            || client.phone.as_deref().unwrap_or("").contains(term.as_str())
            || client.fixed_amount.to_string().contains(term.as_str())
    }

    /// Passes when any checked month satisfies the status: the selected
    /// months, or all twelve when none are selected.
    fn status_matches(&self, client: &Client) -> bool {
        let wants_paid = match self.status {
            StatusFilter::All => return true,
            StatusFilter::Paid => true,
            StatusFilter::Unpaid => false,
        };
        derive_matrix(client, self.year)
            .iter()
            .filter(|e| self.months.is_empty() || self.months.contains(&e.month))
            .any(|e| if wants_paid { e.amount > 0.0 } else { e.amount <= 0.0 })
    }

    pub fn matches(&self, client: &Client) -> bool {
        self.text_matches(client) && self.status_matches(client)
    }

    pub fn describe(&self) -> String {
        let mut parts = vec![format!("year {}", self.year)];
        if !self.search.is_empty() {
            parts.push(format!("search '{}'", self.search));
        }
        if self.status != StatusFilter::All {
            parts.push(format!("status {}", self.status));
        }
        if !self.months.is_empty() {
            let names: Vec<&str> = self.months.iter().map(|m| m.short()).collect();
            parts.push(format!("months {}", names.join(",")));
        }
        parts.join(" | ")
    }
}

/// The visible subset of `clients`, in input order.
pub fn filter_clients<'a>(clients: &'a [Client], filter: &ClientFilter) -> Vec<&'a Client> {
    clients.iter().filter(|c| filter.matches(c)).collect()
}
