use std::io::Read;
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{BillingError, Result};

/// One data row zipped against the header row. Values stay strings; the
/// remote store coerces numeric columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvRecord {
    fields: Vec<(String, String)>,
}

impl CsvRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

impl Serialize for CsvRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Parse client rows from CSV text.
///
/// The first non-blank record is the header. Quoted fields may contain commas
/// and line breaks. Short rows are padded with empty strings; extra trailing
/// fields are dropped. Whitespace-only lines are skipped, but a row of bare
/// delimiters such as `,,` is kept as a record of empty values.
pub fn parse_clients<R: Read>(reader: R) -> Result<Vec<CsvRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = rdr
        .records()
        .filter(|r| !matches!(r, Ok(record) if record.len() == 1 && record[0].is_empty()));

    let header: Vec<String> = match rows.next() {
        None => return Ok(Vec::new()),
        Some(first) => first?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect(),
    };

    let mut records = Vec::new();
    for result in rows {
        let record = result?;
        let fields = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        records.push(CsvRecord { fields });
    }

    Ok(records)
}

pub fn parse_clients_file(path: &Path) -> Result<Vec<CsvRecord>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(BillingError::validation(format!(
            "Please select a valid CSV file (got {})",
            path.display()
        )));
    }
    let file = std::fs::File::open(path)?;
    parse_clients(std::io::BufReader::new(file))
}
