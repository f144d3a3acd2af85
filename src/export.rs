use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::ledger::derive_matrix;
use crate::models::Client;
use crate::month::Month;
use crate::reports::client_year;

/// Write one row per client with the twelve month amounts for `year`.
pub fn write_year_matrix<W: Write>(writer: W, clients: &[Client], year: i32) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["Client".to_string(), "Phone".to_string(), "Fixed Amount".to_string()];
    header.extend(Month::ALL.iter().map(|m| m.name().to_string()));
    header.push("Total Paid".to_string());
    header.push("Outstanding".to_string());
    wtr.write_record(&header)?;

    for client in clients {
        let totals = client_year(client, year);
        let mut row = vec![
            client.name.clone(),
            client.phone.clone().unwrap_or_default(),
            format!("{:.2}", client.fixed_amount),
        ];
        row.extend(derive_matrix(client, year).iter().map(|e| format!("{:.2}", e.amount)));
        row.push(format!("{:.2}", totals.collected));
        row.push(format!("{:.2}", totals.outstanding));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(clients.len())
}

pub fn export_year_matrix(path: &Path, clients: &[Client], year: i32) -> Result<usize> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::File::create(path)?;
    write_year_matrix(std::io::BufWriter::new(file), clients, year)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testutil::client_with_payments;

    #[test]
    fn test_matrix_csv_layout() {
        let clients = vec![client_with_payments(
            "a",
            100.0,
            json!({"2025": {"March": {"enteredAmount": 100}}}),
        )];
        let mut out = Vec::new();
        write_year_matrix(&mut out, &clients, 2025).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Client,Phone,Fixed Amount,January,February,March"));
        assert!(lines[0].ends_with("December,Total Paid,Outstanding"));
        assert_eq!(
            lines[1],
            "Client a,555-a,100.00,0.00,0.00,100.00,0.00,0.00,0.00,0.00,0.00,0.00,0.00,0.00,0.00,100.00,1100.00"
        );
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let mut client = client_with_payments("a", 0.0, json!({}));
        client.name = "Smith, Jones".into();
        let mut out = Vec::new();
        write_year_matrix(&mut out, &[client], 2025).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("\"Smith, Jones\","));
    }

    #[test]
    fn test_export_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("2025.csv");
        let n = export_year_matrix(&path, &[], 2025).unwrap();
        assert_eq!(n, 0);
        assert!(path.exists());
    }
}
