use std::path::PathBuf;

use crate::cli::{connect, year_or_current};
use crate::directory::ClientDirectory;
use crate::error::Result;
use crate::export::export_year_matrix;

pub fn default_path(year: i32) -> PathBuf {
    PathBuf::from(format!("clientbook-{year}.csv"))
}

pub fn run(year: Option<i32>, output: Option<String>) -> Result<()> {
    let year = year_or_current(year);
    let path = output.map(PathBuf::from).unwrap_or_else(|| default_path(year));
    let dir = ClientDirectory::load(&connect()?)?;
    let count = export_year_matrix(&path, dir.clients(), year)?;
    println!("Wrote {count} clients to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        assert_eq!(default_path(2025), PathBuf::from("clientbook-2025.csv"));
    }
}
