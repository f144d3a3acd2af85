use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::api::BillingApi;
use crate::cli::{confirm, connect, year_or_current, ClientFields, FilterArgs};
use crate::directory::{filter_clients, ClientChanges, ClientDirectory, ClientFilter};
use crate::error::{BillingError, Result};
use crate::fmt::{money, paid_mark};
use crate::importer::{parse_clients_file, CsvRecord};
use crate::ledger::{derive_matrix, parse_amount};
use crate::models::{Client, ClientForm};
use crate::month::{parse_month_list, Month};
use crate::paginate::Paginator;
use crate::reports::client_year;
use crate::settings::effective_settings;

impl FilterArgs {
    pub fn to_filter(&self) -> Result<ClientFilter> {
        Ok(ClientFilter {
            search: self.search.clone().unwrap_or_default(),
            status: self.status.parse()?,
            months: match &self.months {
                Some(raw) => parse_month_list(raw)?,
                None => Vec::new(),
            },
            year: year_or_current(self.year),
        })
    }
}

impl ClientFields {
    fn to_changes(&self) -> ClientChanges {
        ClientChanges {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            fixed_amount: self.fixed_amount.clone(),
        }
    }
}

pub fn roster_table(clients: &[&Client], year: i32, symbol: &str) -> Table {
    let mut header = vec!["ID".to_string(), "Name".to_string(), "Phone".to_string(), "Fixed".to_string()];
    header.extend(Month::ALL.iter().map(|m| m.short().to_string()));
    header.push("Collected".to_string());

    let mut table = Table::new();
    table.set_header(header);
    for client in clients {
        let mut row = vec![
            Cell::new(&client.id),
            Cell::new(&client.name),
            Cell::new(client.phone.as_deref().unwrap_or("")),
            Cell::new(money(client.fixed_amount, symbol)),
        ];
        row.extend(derive_matrix(client, year).iter().map(|e| {
            let mark = paid_mark(e.is_paid);
            Cell::new(if e.is_paid { mark.green() } else { mark.red() })
        }));
        row.push(Cell::new(money(client_year(client, year).collected, symbol)));
        table.add_row(row);
    }
    table
}

pub fn list(filter: &FilterArgs, page: usize) -> Result<()> {
    let settings = effective_settings();
    let filter = filter.to_filter()?;
    let dir = ClientDirectory::load(&connect()?)?;
    if dir.is_empty() {
        println!("No clients yet. Add one with `clientbook clients add`.");
        return Ok(());
    }

    let visible = filter_clients(dir.clients(), &filter);
    let mut paginator = Paginator::new(settings.items_per_page);
    paginator.go_to(page, visible.len());
    let shown = paginator.slice(&visible);

    if shown.is_empty() {
        println!("No clients match ({}).", filter.describe());
        return Ok(());
    }
    println!("Clients {}\n{}", filter.year, roster_table(shown, filter.year, &settings.currency_symbol));
    println!(
        "Page {} of {} | {} of {} clients | {}",
        paginator.current_page(),
        paginator.total_pages(visible.len()),
        visible.len(),
        dir.len(),
        filter.describe()
    );
    Ok(())
}

pub fn add(fields: &ClientFields) -> Result<()> {
    let form = ClientForm {
        name: fields.name.clone().unwrap_or_default().trim().to_string(),
        email: fields.email.as_deref().map(str::trim).filter(|e| !e.is_empty()).map(String::from),
        phone: fields.phone.clone().unwrap_or_default().trim().to_string(),
        address: fields.address.as_deref().map(str::trim).filter(|a| !a.is_empty()).map(String::from),
        fixed_amount: match fields.fixed_amount.as_deref() {
            Some(raw) => parse_amount(raw)?,
            None => 0.0,
        },
    };
    let api = connect()?;
    let mut dir = ClientDirectory::default();
    dir.create(&api, &form)?;
    println!("Added client: {} ({} clients total)", form.name, dir.len());
    Ok(())
}

pub fn update(id: &str, fields: &ClientFields) -> Result<()> {
    let changes = fields.to_changes();
    if changes.is_empty() {
        return Err(BillingError::validation(
            "Nothing to update. Pass --name, --email, --phone, --address or --fixed-amount.",
        ));
    }
    let api = connect()?;
    let mut dir = ClientDirectory::load(&api)?;
    let form = dir.update(&api, id, &changes)?;
    println!("Updated client: {}", form.name);
    Ok(())
}

pub fn delete(id: &str, yes: bool) -> Result<()> {
    let api = connect()?;
    let mut dir = ClientDirectory::load(&api)?;
    let name = dir
        .get(id)
        .map(|c| c.name.clone())
        .ok_or_else(|| BillingError::UnknownClient(id.to_string()))?;
    if !yes && !confirm(&format!("Delete {name} and all of their payments?"))? {
        println!("Cancelled.");
        return Ok(());
    }
    dir.delete(&api, id)?;
    println!("Deleted client: {name}");
    Ok(())
}

pub fn records_table(records: &[CsvRecord]) -> Table {
    let mut table = Table::new();
    if let Some(first) = records.first() {
        table.set_header(first.fields().iter().map(|(k, _)| k.as_str()));
    }
    for record in records {
        table.add_row(record.fields().iter().map(|(_, v)| v.as_str()));
    }
    table
}

pub fn import_with<A: BillingApi + ?Sized>(api: &A, records: &[CsvRecord]) -> Result<usize> {
    let mut dir = ClientDirectory::default();
    dir.import(api, records)
}

pub fn import(file: &str, dry_run: bool) -> Result<()> {
    let records = parse_clients_file(Path::new(file))?;
    if dry_run {
        println!("{}", records_table(&records));
        println!("{} records parsed (dry run, nothing uploaded)", records.len());
        return Ok(());
    }
    let count = import_with(&connect()?, &records)?;
    println!("{} Uploaded {count} clients", "\u{2714}".green());
    Ok(())
}
