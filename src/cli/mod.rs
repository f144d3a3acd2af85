pub mod auth;
pub mod browse;
pub mod clients;
pub mod config;
pub mod export;
pub mod payments;
pub mod summary;

use std::io::{BufRead, Write};

use chrono::{Datelike, Local};
use clap::{Args, Parser, Subcommand};

use crate::api::ApiClient;
use crate::error::Result;
use crate::session::SessionStore;
use crate::settings::effective_settings;

/// API client for the configured server, carrying the saved session.
pub(crate) fn connect() -> Result<ApiClient> {
    let settings = effective_settings();
    ApiClient::new(&settings.api_base_url, SessionStore::default_location().load())
}

pub(crate) fn year_or_current(year: Option<i32>) -> i32 {
    year.unwrap_or_else(|| Local::now().year())
}

/// Ask a yes/no question on stdin; anything but `y`/`yes` is a no.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[derive(Parser)]
#[command(name = "clientbook", version, about = "Monthly billing ledger for your clients.")]
pub struct Cli {
    /// Log requests and internal steps to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and save a session token.
    Login {
        #[arg(long)]
        email: String,
    },
    /// Create an account on the server.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Forget the saved session token.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Manage clients.
    Clients {
        #[command(subcommand)]
        command: ClientsCommands,
    },
    /// View and record monthly payments.
    Payments {
        #[command(subcommand)]
        command: PaymentsCommands,
    },
    /// Yearly totals and the most recent payments.
    Summary {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Export the year's payment matrix to CSV.
    Export {
        #[arg(long)]
        year: Option<i32>,
        /// Output file path (default: clientbook-<year>.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Interactively browse clients and edit payments.
    Browse {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args)]
pub struct FilterArgs {
    /// Match name (case-insensitive), phone or fixed amount
    #[arg(long)]
    pub search: Option<String>,
    /// Payment status: all, paid, unpaid
    #[arg(long, default_value = "all")]
    pub status: String,
    /// Months checked by --status, e.g. jan,feb,mar
    #[arg(long)]
    pub months: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Args)]
pub struct ClientFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    /// Expected monthly payment
    #[arg(long = "fixed-amount")]
    pub fixed_amount: Option<String>,
}

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// List clients with their payment marks for the year.
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Add a client.
    Add {
        #[command(flatten)]
        fields: ClientFields,
    },
    /// Change fields of an existing client.
    Update {
        /// Client ID (shown in `clientbook clients list`)
        id: String,
        #[command(flatten)]
        fields: ClientFields,
    },
    /// Delete a client and its payment history.
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Upload clients from a CSV file with a header row.
    Import {
        file: String,
        /// Parse and print the records without uploading
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum PaymentsCommands {
    /// Show a client's twelve months for a year.
    Show {
        client_id: String,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Record one month and save the whole year.
    Set {
        client_id: String,
        /// Month name, abbreviation or number
        #[arg(long)]
        month: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        message: String,
        /// Payment date: YYYY-MM-DD (default: now)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        /// Mark the month paid regardless of amount
        #[arg(long, conflicts_with = "unpaid")]
        paid: bool,
        /// Mark the month unpaid regardless of amount
        #[arg(long)]
        unpaid: bool,
    },
    /// List the payment records stored for a client.
    List { client_id: String },
    /// Add a single payment record.
    Add {
        client_id: String,
        #[arg(long)]
        month: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Delete a payment record by ID.
    Delete {
        payment_id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings.
    Show,
    /// Change one setting: api_base_url, items_per_page, currency_symbol.
    Set { key: String, value: String },
}
