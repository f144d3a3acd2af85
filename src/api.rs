use reqwest::blocking::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{BillingError, Result};
use crate::importer::CsvRecord;
use crate::models::{
    AuthResponse, Client, ClientForm, Credentials, NewPayment, PaymentEntry, PaymentRecord,
    Registration, User,
};
use crate::session::Session;

const FALLBACK_MESSAGE: &str = "Something went wrong";

/// Operations against the remote billing store. Writes return nothing useful:
/// callers re-fetch the roster instead of trusting write responses.
pub trait BillingApi {
    fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;
    fn register(&self, registration: &Registration) -> Result<AuthResponse>;
    fn current_user(&self) -> Result<User>;

    fn list_clients(&self) -> Result<Vec<Client>>;
    fn create_client(&self, form: &ClientForm) -> Result<()>;
    fn update_client(&self, client_id: &str, form: &ClientForm) -> Result<()>;
    fn delete_client(&self, client_id: &str) -> Result<()>;
    fn upload_clients(&self, records: &[CsvRecord]) -> Result<()>;

    fn client_payments(&self, client_id: &str) -> Result<Vec<PaymentRecord>>;
    fn submit_year(&self, client_id: &str, entries: &[PaymentEntry]) -> Result<()>;
    fn create_payment(&self, client_id: &str, payment: &NewPayment) -> Result<()>;
    fn delete_payment(&self, payment_id: &str) -> Result<()>;
}

pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Session) -> Result<Self> {
        let http = HttpClient::builder()
            .user_agent(concat!("clientbook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        requires_auth: bool,
    ) -> Result<Value> {
        let token = self.session.bearer();
        if requires_auth && token.is_none() {
            return Err(BillingError::NotLoggedIn);
        }

        debug!("{method} {path}");
        let mut req = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send()?;
        let status = response.status();
        let text = response.text()?;
        debug!("{path} -> {status}");
        parse_response(status, &text)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send::<Value>(Method::GET, path, None, true)?;
        Ok(serde_json::from_value(value)?)
    }

    fn write<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()> {
        self.send(method, path, body, true).map(|_| ())
    }
}

/// Turn a status + body into JSON, or the server's `message` on failure.
pub fn parse_response(status: StatusCode, body: &str) -> Result<Value> {
    let value: Option<Value> = if body.trim().is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_str(body).ok()
    };

    if status.is_success() {
        return value.ok_or_else(|| {
            BillingError::Other(format!("Expected JSON from the server, got: {}", snippet(body)))
        });
    }

    let message = value
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(FALLBACK_MESSAGE)
        .to_string();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(BillingError::Unauthorized(message));
    }
    Err(BillingError::Api {
        status: status.as_u16(),
        message,
    })
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(80) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// `GET /clients` may answer with a bare array or `{clients: [...]}`.
fn unwrap_list(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        Value::Null => Value::Array(Vec::new()),
        other => other,
    }
}

impl BillingApi for ApiClient {
    fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let value = self.send(Method::POST, "/auth/login", Some(credentials), false)?;
        Ok(serde_json::from_value(value)?)
    }

    fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        let value = self.send(Method::POST, "/auth/register", Some(registration), false)?;
        Ok(serde_json::from_value(value)?)
    }

    fn current_user(&self) -> Result<User> {
        let value = self.send::<Value>(Method::GET, "/auth/me", None, true)?;
        let user = value.get("user").cloned().unwrap_or(value);
        Ok(serde_json::from_value(user)?)
    }

    fn list_clients(&self) -> Result<Vec<Client>> {
        let value = self.send::<Value>(Method::GET, "/clients", None, true)?;
        Ok(serde_json::from_value(unwrap_list(value, "clients"))?)
    }

    fn create_client(&self, form: &ClientForm) -> Result<()> {
        self.write(Method::POST, "/clients", Some(form))
    }

    fn update_client(&self, client_id: &str, form: &ClientForm) -> Result<()> {
        self.write(Method::PUT, &format!("/clients/{client_id}"), Some(form))
    }

    fn delete_client(&self, client_id: &str) -> Result<()> {
        self.write::<Value>(Method::DELETE, &format!("/clients/{client_id}"), None)
    }

    fn upload_clients(&self, records: &[CsvRecord]) -> Result<()> {
        let body = json!({ "clients": records });
        self.write(Method::POST, "/clients/upload-csv", Some(&body))
    }

    fn client_payments(&self, client_id: &str) -> Result<Vec<PaymentRecord>> {
        let value: Value = self.get(&format!("/payments/client/{client_id}"))?;
        Ok(serde_json::from_value(unwrap_list(value, "payments"))?)
    }

    fn submit_year(&self, client_id: &str, entries: &[PaymentEntry]) -> Result<()> {
        let body = json!({ "payments": entries });
        self.write(Method::POST, &format!("/payments/{client_id}/payments"), Some(&body))
    }

    fn create_payment(&self, client_id: &str, payment: &NewPayment) -> Result<()> {
        self.write(Method::POST, &format!("/payments/{client_id}"), Some(payment))
    }

    fn delete_payment(&self, payment_id: &str) -> Result<()> {
        self.write::<Value>(Method::DELETE, &format!("/payments/{payment_id}"), None)
    }
}
