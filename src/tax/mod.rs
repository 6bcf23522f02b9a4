pub mod au;
pub mod error;
pub mod ledger;
pub mod lot;
pub mod matching;
pub mod oracle;
pub mod price;
pub mod trade;
pub mod warnings;

pub use au::{summarise_by_year, CgtSummary, FinancialYear};
pub use error::{LedgerError, PriceError};
pub use lot::{BuyLot, LotBook, LotState, SellLot};
pub use matching::{AssetMatch, MatchOptions, MatchingEngine, TaxEvent, TaxLedger, UnresolvedPolicy};
pub use oracle::PriceOracle;
pub use price::{PriceBar, PriceSeries, PriceSeriesStore};
pub use trade::TradeRecord;
pub use warnings::Warning;

/// Assets held for more than this many days qualify for the CGT discount
pub const CGT_DISCOUNT_DAYS: i64 = 365;

/// One column of an input CSV layout, generated by `#[derive(CsvSchema)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub position: usize,
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}
