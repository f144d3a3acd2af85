mod api;
mod browser;
mod cli;
mod directory;
mod error;
mod export;
mod fmt;
mod importer;
mod ledger;
mod models;
mod month;
mod paginate;
mod reports;
mod session;
mod settings;
#[cfg(test)]
mod testutil;
mod tui;

use clap::Parser;
use tracing_subscriber::{fmt as log_fmt, EnvFilter};

use cli::{Cli, ClientsCommands, Commands, ConfigCommands, PaymentsCommands};

/// `-v` turns on our own debug output; dependencies stay at warn.
const VERBOSE_FILTER: &str = "warn,clientbook=debug";

fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

fn init_logging(verbose: bool) {
    log_fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Login { email } => cli::auth::login(&email),
        Commands::Register { name, email } => cli::auth::register(&name, &email),
        Commands::Logout => cli::auth::logout(),
        Commands::Whoami => cli::auth::whoami(),
        Commands::Clients { command } => match command {
            ClientsCommands::List { filter, page } => cli::clients::list(&filter, page),
            ClientsCommands::Add { fields } => cli::clients::add(&fields),
            ClientsCommands::Update { id, fields } => cli::clients::update(&id, &fields),
            ClientsCommands::Delete { id, yes } => cli::clients::delete(&id, yes),
            ClientsCommands::Import { file, dry_run } => cli::clients::import(&file, dry_run),
        },
        Commands::Payments { command } => match command {
            PaymentsCommands::Show { client_id, year } => cli::payments::show(&client_id, year),
            PaymentsCommands::Set {
                client_id,
                month,
                amount,
                message,
                date,
                year,
                paid,
                unpaid,
            } => cli::payments::set(
                &client_id,
                &cli::payments::SetArgs {
                    month,
                    amount,
                    message,
                    date,
                    year,
                    paid,
                    unpaid,
                },
            ),
            PaymentsCommands::List { client_id } => cli::payments::list(&client_id),
            PaymentsCommands::Add {
                client_id,
                month,
                amount,
                message,
                year,
            } => cli::payments::add(&client_id, &month, &amount, &message, year),
            PaymentsCommands::Delete { payment_id, yes } => cli::payments::delete(&payment_id, yes),
        },
        Commands::Summary { year } => cli::summary::run(year),
        Commands::Export { year, output } => cli::export::run(year, output),
        Commands::Browse { year } => cli::browse::run(year),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Set { key, value } => cli::config::set(&key, &value),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
