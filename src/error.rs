use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Unauthorized: {0}. Run `clientbook login` again.")]
    Unauthorized(String),

    #[error("Not logged in. Run `clientbook login` first.")]
    NotLoggedIn,

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl BillingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
