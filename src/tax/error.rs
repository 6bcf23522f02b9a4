use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// The oracle could not resolve an AUD price.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("no {pair} price on {date} (needed for {asset})")]
    NotFound {
        asset: String,
        pair: String,
        date: NaiveDate,
    },
    #[error("{asset} value on {date} is out of range")]
    Overflow { asset: String, date: NaiveDate },
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("malformed record in {origin} line {line}: {reason}")]
    MalformedRecord {
        origin: String,
        line: u64,
        reason: String,
    },
    #[error("cannot price {volume} {asset} traded on {date}")]
    Unpriced {
        date: NaiveDate,
        asset: String,
        volume: Decimal,
        #[source]
        source: PriceError,
    },
    #[error(
        "arithmetic overflow on {volume} {asset} sold on {date} (sell lot {sell}, {})",
        buy_lot_label(.buy)
    )]
    Arithmetic {
        sell: usize,
        /// `None` for a write-off
        buy: Option<usize>,
        date: NaiveDate,
        asset: String,
        volume: Decimal,
    },
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl LedgerError {
    pub fn malformed(origin: impl Into<String>, line: u64, reason: impl Into<String>) -> Self {
        LedgerError::MalformedRecord {
            origin: origin.into(),
            line,
            reason: reason.into(),
        }
    }
}

fn buy_lot_label(buy: &Option<usize>) -> String {
    match buy {
        Some(buy) => format!("buy lot {}", buy),
        None => "write-off".to_string(),
    }
}
