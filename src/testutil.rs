use std::cell::{Cell, RefCell};

use serde_json::{json, Value};

use crate::api::BillingApi;
use crate::error::{BillingError, Result};
use crate::importer::CsvRecord;
use crate::models::{
    AuthResponse, Client, ClientForm, Credentials, NewPayment, PaymentEntry, PaymentRecord,
    Registration, StoredPayment, User,
};

pub fn client_with_payments(id: &str, fixed_amount: f64, payments: Value) -> Client {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Client {id}"),
        "phone": format!("555-{id}"),
        "fixedAmount": fixed_amount,
        "payments": payments,
    }))
    .unwrap()
}

pub fn named_client(id: &str, name: &str, phone: &str, fixed_amount: f64) -> Client {
    Client {
        id: id.to_string(),
        name: name.to_string(),
        phone: Some(phone.to_string()),
        fixed_amount,
        ..Default::default()
    }
}

/// In-memory stand-in for the remote store.
#[derive(Default)]
pub struct FakeApi {
    clients: RefCell<Vec<Client>>,
    payments: RefCell<Vec<PaymentRecord>>,
    submitted: RefCell<Vec<(String, Vec<PaymentEntry>)>>,
    uploaded: RefCell<Vec<Vec<CsvRecord>>>,
    list_calls: Cell<usize>,
    next_id: Cell<usize>,
    fail_next: RefCell<Option<String>>,
    fail_next_list: RefCell<Option<String>>,
}

impl FakeApi {
    pub fn with_clients(clients: Vec<Client>) -> Self {
        let api = Self::default();
        *api.clients.borrow_mut() = clients;
        api
    }

    pub fn with_payments(self, payments: Vec<PaymentRecord>) -> Self {
        *self.payments.borrow_mut() = payments;
        self
    }

    /// Make the next call fail with a server error carrying `message`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.borrow_mut() = Some(message.to_string());
    }

    /// Make the next `list_clients` fail while other calls still succeed.
    pub fn fail_next_list(&self, message: &str) {
        *self.fail_next_list.borrow_mut() = Some(message.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.get()
    }

    pub fn submitted(&self) -> Vec<(String, Vec<PaymentEntry>)> {
        self.submitted.borrow().clone()
    }

    pub fn uploaded(&self) -> Vec<Vec<CsvRecord>> {
        self.uploaded.borrow().clone()
    }

    pub fn clients(&self) -> Vec<Client> {
        self.clients.borrow().clone()
    }

    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.payments.borrow().clone()
    }

    fn check(&self) -> Result<()> {
        match self.fail_next.borrow_mut().take() {
            Some(message) => Err(BillingError::Api { status: 500, message }),
            None => Ok(()),
        }
    }

    fn new_id(&self) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("new-{id}")
    }
}

impl BillingApi for FakeApi {
    fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.check()?;
        if credentials.password != "secret" {
            return Err(BillingError::Unauthorized("Invalid credentials".into()));
        }
        Ok(AuthResponse {
            token: Some("token-123".into()),
            user: Some(User {
                email: Some(credentials.email.clone()),
                ..Default::default()
            }),
            message: None,
        })
    }

    fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        self.check()?;
        Ok(AuthResponse {
            message: Some(format!("Registered {}", registration.email)),
            ..Default::default()
        })
    }

    fn current_user(&self) -> Result<User> {
        self.check()?;
        Ok(User {
            name: Some("Operator".into()),
            ..Default::default()
        })
    }

    fn list_clients(&self) -> Result<Vec<Client>> {
        self.check()?;
        if let Some(message) = self.fail_next_list.borrow_mut().take() {
            return Err(BillingError::Api { status: 503, message });
        }
        self.list_calls.set(self.list_calls.get() + 1);
        Ok(self.clients.borrow().clone())
    }

    fn create_client(&self, form: &ClientForm) -> Result<()> {
        self.check()?;
        let client = Client {
            id: self.new_id(),
            name: form.name.clone(),
            email: form.email.clone(),
            phone: Some(form.phone.clone()),
            address: form.address.clone(),
            fixed_amount: form.fixed_amount,
            payments: Default::default(),
        };
        self.clients.borrow_mut().push(client);
        Ok(())
    }

    fn update_client(&self, client_id: &str, form: &ClientForm) -> Result<()> {
        self.check()?;
        let mut clients = self.clients.borrow_mut();
        let client = clients
            .iter_mut()
            .find(|c| c.id == client_id)
            .ok_or_else(|| BillingError::Api { status: 404, message: "Client not found".into() })?;
        client.name = form.name.clone();
        client.email = form.email.clone();
        client.phone = Some(form.phone.clone());
        client.address = form.address.clone();
        client.fixed_amount = form.fixed_amount;
        Ok(())
    }

    fn delete_client(&self, client_id: &str) -> Result<()> {
        self.check()?;
        self.clients.borrow_mut().retain(|c| c.id != client_id);
        Ok(())
    }

    fn upload_clients(&self, records: &[CsvRecord]) -> Result<()> {
        self.check()?;
        for record in records {
            let client = Client {
                id: self.new_id(),
                name: record.get("name").unwrap_or_default().to_string(),
                phone: record.get("phone").map(str::to_string),
                fixed_amount: record.get("fixedAmount").and_then(|a| a.parse().ok()).unwrap_or(0.0),
                ..Default::default()
            };
            self.clients.borrow_mut().push(client);
        }
        self.uploaded.borrow_mut().push(records.to_vec());
        Ok(())
    }

    fn client_payments(&self, _client_id: &str) -> Result<Vec<PaymentRecord>> {
        self.check()?;
        Ok(self.payments.borrow().clone())
    }

    fn submit_year(&self, client_id: &str, entries: &[PaymentEntry]) -> Result<()> {
        self.check()?;
        let mut clients = self.clients.borrow_mut();
        if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
            for e in entries {
                client
                    .payments
                    .entry(e.year.to_string())
                    .or_default()
                    .insert(
                        e.month.name().to_string(),
                        StoredPayment {
                            entered_amount: Some(e.entered_amount),
                            amount: None,
                            is_paid: Some(e.is_paid),
                            balance: Some(e.balance),
                            date: Some(e.date.clone()),
                            message: Some(e.message.clone()),
                        },
                    );
            }
        }
        self.submitted.borrow_mut().push((client_id.to_string(), entries.to_vec()));
        Ok(())
    }

    fn create_payment(&self, _client_id: &str, payment: &NewPayment) -> Result<()> {
        self.check()?;
        let record = PaymentRecord {
            id: Some(self.new_id()),
            object_id: None,
            year: Some(payment.year),
            month: payment.month.name().to_string(),
            entered_amount: Some(payment.entered_amount),
            is_paid: Some(payment.is_paid),
            message: Some(payment.message.clone()),
            date: None,
            created_at: None,
        };
        self.payments.borrow_mut().push(record);
        Ok(())
    }

    fn delete_payment(&self, payment_id: &str) -> Result<()> {
        self.check()?;
        self.payments
            .borrow_mut()
            .retain(|p| p.payment_id() != Some(payment_id));
        Ok(())
    }
}
