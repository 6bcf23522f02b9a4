use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Recoverable diagnostics raised while matching. The run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Sell lot still had volume after both matching phases.
    UnresolvedSellVolume {
        sell_lot: usize,
        date: NaiveDate,
        asset: String,
        unclaimed: Decimal,
    },
    /// Leftover sell volume was disposed of with a zero cost base.
    WrittenOff {
        sell_lot: usize,
        date: NaiveDate,
        asset: String,
        volume: Decimal,
    },
}

impl Warning {
    pub fn date(&self) -> NaiveDate {
        match self {
            Warning::UnresolvedSellVolume { date, .. } | Warning::WrittenOff { date, .. } => *date,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Warning::UnresolvedSellVolume { .. } => "UnresolvedSellVolume",
            Warning::WrittenOff { .. } => "WrittenOff",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Warning::UnresolvedSellVolume {
                sell_lot,
                asset,
                unclaimed,
                ..
            } => format!(
                "sell lot {} still has {:.4} {} unclaimed - when was it bought?",
                sell_lot, unclaimed, asset
            ),
            Warning::WrittenOff {
                sell_lot,
                asset,
                volume,
                ..
            } => format!(
                "sell lot {}: {:.4} {} written off with zero cost base",
                sell_lot, volume, asset
            ),
        }
    }
}
