use audcgt_derive::CsvSchema;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::LedgerError;
use crate::utils::{csv_files, parse_decimal};

pub const TRADE_DATE_FORMAT: &str = "%d/%m/%Y";

/// One exchange of assets: something bought, something sold, and a fee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub buy_asset: String,
    pub buy_volume: Decimal,
    pub sell_asset: String,
    pub sell_volume: Decimal,
    pub fee_asset: String,
    pub fee_volume: Decimal,
    pub comment: String,
    /// File the record came from, for error reporting
    pub origin: String,
    pub line: u64,
}

/// Trade CSV row, as exported from the exchanges
#[derive(Debug, Clone, Serialize, Deserialize, CsvSchema)]
pub struct TradeCsvRecord {
    /// Trade date (DD/MM/YYYY)
    pub date: String,
    /// Asset received, e.g. BTC (case insensitive)
    pub buy_asset: String,
    /// Quantity of the asset received
    pub buy_volume: String,
    /// Asset given up, e.g. AUD
    pub sell_asset: String,
    /// Quantity of the asset given up
    pub sell_volume: String,
    /// Asset the fee was charged in, NONE if no fee
    pub fee_asset: String,
    /// Quantity of the fee
    pub fee_volume: String,
    /// Free text
    #[serde(default)]
    pub comment: Option<String>,
}

impl TradeCsvRecord {
    fn into_trade(self, origin: &str, line: u64) -> Result<TradeRecord, LedgerError> {
        let malformed = |reason: String| LedgerError::malformed(origin, line, reason);

        let date = NaiveDate::parse_from_str(self.date.trim(), TRADE_DATE_FORMAT)
            .map_err(|e| malformed(format!("invalid date '{}': {}", self.date, e)))?;
        let volume = |field: &str, value: &str| -> Result<Decimal, LedgerError> {
            let volume = parse_decimal(value).map_err(|e| malformed(format!("{}: {}", field, e)))?;
            if volume.is_sign_negative() && !volume.is_zero() {
                return Err(malformed(format!("{} is negative: {}", field, volume)));
            }
            Ok(volume)
        };
        let asset = |field: &str, value: &str| -> Result<String, LedgerError> {
            let symbol = value.trim().to_uppercase();
            if symbol.is_empty() {
                return Err(malformed(format!("{} is empty", field)));
            }
            Ok(symbol)
        };

        Ok(TradeRecord {
            date,
            buy_asset: asset("buy_asset", &self.buy_asset)?,
            buy_volume: volume("buy_volume", &self.buy_volume)?,
            sell_asset: asset("sell_asset", &self.sell_asset)?,
            sell_volume: volume("sell_volume", &self.sell_volume)?,
            fee_asset: asset("fee_asset", &self.fee_asset)?,
            fee_volume: volume("fee_volume", &self.fee_volume)?,
            comment: self.comment.unwrap_or_default(),
            origin: origin.to_string(),
            line,
        })
    }
}

/// Read trades from a CSV with a header row
pub fn read_csv<R: Read>(origin: &str, reader: R) -> Result<Vec<TradeRecord>, LedgerError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut trades = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let row: TradeCsvRecord = record
            .deserialize(Some(&headers))
            .map_err(|e| LedgerError::malformed(origin, line, e.to_string()))?;
        trades.push(row.into_trade(origin, line)?);
    }

    Ok(trades)
}

/// Read every trade CSV in `dir`, in file name order
pub fn read_directory(dir: &Path) -> Result<Vec<TradeRecord>, LedgerError> {
    let mut trades = Vec::new();
    for path in csv_files(dir)? {
        let origin = path.display().to_string();
        let file = File::open(&path).map_err(|source| LedgerError::Io {
            path: path.clone(),
            source,
        })?;
        let mut file_trades = read_csv(&origin, file)?;
        log::info!("loaded {} records from {}", file_trades.len(), origin);
        trades.append(&mut file_trades);
    }
    Ok(trades)
}
