use audcgt_derive::CsvSchema;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::LedgerError;
use crate::utils::{csv_files, parse_decimal};

/// Daily OHLC bar for an asset pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl PriceBar {
    /// Midpoint of the day's range, the rate used for valuation.
    /// `None` if the range is too large to represent.
    pub fn midpoint(&self) -> Option<Decimal> {
        self.high.checked_add(self.low)?.checked_div(dec!(2))
    }
}

/// Date indexed bars for one asset pair, e.g. `BTC_USDT`
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pair: String,
    bars: BTreeMap<NaiveDate, PriceBar>,
}

impl PriceSeries {
    pub fn new(pair: impl Into<String>) -> Self {
        PriceSeries {
            pair: pair.into(),
            bars: BTreeMap::new(),
        }
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    /// Adds a bar, handing it back if the date is already present.
    pub fn insert(&mut self, bar: PriceBar) -> Result<(), PriceBar> {
        if self.bars.contains_key(&bar.date) {
            return Err(bar);
        }
        self.bars.insert(bar.date, bar);
        Ok(())
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.bars.get(&date)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.keys().next_back().copied()
    }

    /// Read a headerless `date,open,high,low,close,volume` CSV
    pub fn read_csv<R: Read>(pair: &str, reader: R) -> Result<PriceSeries, LedgerError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut series = PriceSeries::new(pair);

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            let row: PriceBarCsvRecord = record
                .deserialize(None)
                .map_err(|e| LedgerError::malformed(pair, line, e.to_string()))?;
            let bar = row
                .into_bar()
                .map_err(|reason| LedgerError::malformed(pair, line, reason))?;
            series.insert(bar).map_err(|dup| {
                LedgerError::malformed(pair, line, format!("duplicate bar for {}", dup.date))
            })?;
        }

        Ok(series)
    }
}

/// Raw price bar row. Files carry no header; columns are positional.
#[derive(Debug, Clone, Deserialize, CsvSchema)]
pub struct PriceBarCsvRecord {
    /// Bar date (YYYY-MM-DD)
    pub date: String,
    /// Opening rate in the quote asset
    pub open: String,
    /// Highest rate of the day
    pub high: String,
    /// Lowest rate of the day
    pub low: String,
    /// Closing rate
    pub close: String,
    /// Traded volume
    pub volume: String,
}

impl PriceBarCsvRecord {
    fn into_bar(self) -> Result<PriceBar, String> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{}': {}", self.date, e))?;
        Ok(PriceBar {
            date,
            open: parse_decimal(&self.open)?,
            high: parse_decimal(&self.high)?,
            low: parse_decimal(&self.low)?,
            close: parse_decimal(&self.close)?,
            volume: parse_decimal(&self.volume)?,
        })
    }
}

/// All price series, keyed by pair identifier. Loaded once, then read-only.
#[derive(Debug, Clone, Default)]
pub struct PriceSeriesStore {
    series: HashMap<String, PriceSeries>,
}

impl PriceSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the series for its pair
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.pair.clone(), series);
    }

    pub fn series(&self, pair: &str) -> Option<&PriceSeries> {
        self.series.get(pair)
    }

    pub fn bar(&self, pair: &str, date: NaiveDate) -> Option<&PriceBar> {
        self.series.get(pair).and_then(|series| series.get(date))
    }

    pub fn pairs(&self) -> Vec<&str> {
        let mut pairs: Vec<_> = self.series.keys().map(String::as_str).collect();
        pairs.sort_unstable();
        pairs
    }

    /// Load every `<PAIR>.csv` in `dir`; the file stem names the pair.
    pub fn read_directory(dir: &Path) -> Result<PriceSeriesStore, LedgerError> {
        let mut store = PriceSeriesStore::new();
        for path in csv_files(dir)? {
            let Some(pair) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let file = File::open(&path).map_err(|source| LedgerError::Io {
                path: path.clone(),
                source,
            })?;
            let series = PriceSeries::read_csv(pair, file)?;
            if series.is_empty() {
                log::warn!("{} has no price bars", path.display());
            }
            log::info!("loaded {} bars for {}", series.len(), pair);
            store.insert(series);
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn reads_headerless_bars() {
        let data = "2015-09-17,230.1,235.0,229.5,233.2,1000\n\
                    2015-09-18,233.2,240.10,230.66,238.0,1500.5\n";
        let series = PriceSeries::read_csv("BTC_USDT", data.as_bytes()).unwrap();

        assert_eq!(series.pair(), "BTC_USDT");
        assert_eq!(series.len(), 2);
        let bar = series.get(date("2015-09-18")).unwrap();
        assert_eq!(bar.high, dec!(240.10));
        assert_eq!(bar.low, dec!(230.66));
        assert_eq!(bar.volume, dec!(1500.5));
        assert_eq!(bar.midpoint(), Some(dec!(235.38)));
        assert_eq!(series.first_date(), Some(date("2015-09-17")));
        assert_eq!(series.last_date(), Some(date("2015-09-18")));
    }

    #[test]
    fn accepts_scientific_notation() {
        let data = "2015-09-18,3.7e-3,3.71e-3,3.69e-3,3.7e-3,12\n";
        let series = PriceSeries::read_csv("ETH_BTC", data.as_bytes()).unwrap();
        let bar = series.get(date("2015-09-18")).unwrap();
        assert_eq!(bar.midpoint(), Some(dec!(0.0037)));
    }

    #[test]
    fn rejects_bad_dates() {
        let data = "18/09/2015,1,1,1,1,1\n";
        let err = PriceSeries::read_csv("USDT_AUD", data.as_bytes()).unwrap_err();
        match err {
            LedgerError::MalformedRecord { origin, line, .. } => {
                assert_eq!(origin, "USDT_AUD");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_columns() {
        let data = "2015-09-18,1,1,1\n";
        let err = PriceSeries::read_csv("USDT_AUD", data.as_bytes()).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRecord { .. }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let data = "2015-09-18,1,1,1,1,1\n2015-09-18,2,2,2,2,2\n";
        let err = PriceSeries::read_csv("USDT_AUD", data.as_bytes()).unwrap_err();
        match err {
            LedgerError::MalformedRecord { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("duplicate"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_file_gives_empty_series() {
        let series = PriceSeries::read_csv("BTC_USDT", "".as_bytes()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
    }

    #[test]
    fn store_lookup_by_pair_and_date() {
        let mut store = PriceSeriesStore::new();
        let data = "2015-09-18,1,1.01,0.99,1,100\n";
        store.insert(PriceSeries::read_csv("USDT_AUD", data.as_bytes()).unwrap());

        assert_eq!(store.pairs(), vec!["USDT_AUD"]);
        assert_eq!(
            store.bar("USDT_AUD", date("2015-09-18")).and_then(PriceBar::midpoint),
            Some(dec!(1))
        );
        assert!(store.bar("USDT_AUD", date("2015-09-17")).is_none());
        assert!(store.bar("BTC_USDT", date("2015-09-18")).is_none());
    }
}
