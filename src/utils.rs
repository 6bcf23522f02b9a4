use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::tax::LedgerError;

pub fn write_csv<I, R, W>(records: I, writer: W) -> Result<(), LedgerError>
where
    I: IntoIterator<Item = R>,
    R: serde::Serialize,
    W: std::io::Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records.into_iter() {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Parse a decimal written either plainly (`0.25`) or in scientific notation (`2.5e-1`).
pub fn parse_decimal(s: &str) -> Result<Decimal, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty number".to_string());
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| format!("invalid number '{}'", s))
}

/// Format an AUD amount (or volume) to four decimal places.
pub fn format_4dp(amount: Decimal) -> String {
    format!("{:.4}", amount.round_dp(4))
}

/// List the `.csv` files directly inside `dir`, sorted by file name.
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, LedgerError> {
    let entries = fs::read_dir(dir).map_err(|source| LedgerError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LedgerError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_plain_and_scientific_decimals() {
        assert_eq!(parse_decimal("0.0037023").unwrap(), dec!(0.0037023));
        assert_eq!(parse_decimal(" 12 ").unwrap(), dec!(12));
        assert_eq!(parse_decimal("2.5e-1").unwrap(), dec!(0.25));
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("abc").is_err());
    }

    #[test]
    fn formats_to_four_places() {
        assert_eq!(format_4dp(dec!(235.38)), "235.3800");
        assert_eq!(format_4dp(dec!(0.871458312)), "0.8715");
        assert_eq!(format_4dp(Decimal::ZERO), "0.0000");
    }
}
