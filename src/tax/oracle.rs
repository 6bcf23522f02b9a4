use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use super::price::{PriceBar, PriceSeriesStore};
use super::PriceError;

/// Placeholder asset for trades without a fee or counter side
pub const NONE: &str = "NONE";
pub const AUD: &str = "AUD";
pub const BTC: &str = "BTC";
pub const USDT: &str = "USDT";

const BTC_PAIR: &str = "BTC_USDT";
const USDT_PAIR: &str = "USDT_AUD";
/// How many days back a missing USDT/AUD bar may be substituted from
const USDT_FALLBACK_DAYS: i64 = 2;

/// Resolves the AUD unit value of an asset on a given day.
///
/// Every rate is the midpoint of the day's high and low. Assets other than
/// AUD, BTC and USDT are triangulated through BTC with a single hop
/// (`{ASSET}_BTC`).
#[derive(Debug, Clone, Default)]
pub struct PriceOracle {
    store: PriceSeriesStore,
}

impl PriceOracle {
    pub fn new(store: PriceSeriesStore) -> Self {
        PriceOracle { store }
    }

    pub fn price(&self, asset: &str, date: NaiveDate) -> Result<Decimal, PriceError> {
        match asset {
            NONE => Ok(Decimal::ZERO),
            AUD => Ok(Decimal::ONE),
            BTC => midpoint(asset, self.exact(asset, BTC_PAIR, date)?),
            USDT => midpoint(asset, self.usdt(date)?),
            _ => {
                let pair = format!("{}_{}", asset, BTC);
                let btc_rate = midpoint(asset, self.exact(asset, &pair, date)?)?;
                let btc_price = self.price(BTC, date)?;
                btc_rate
                    .checked_mul(btc_price)
                    .ok_or_else(|| PriceError::Overflow {
                        asset: asset.to_string(),
                        date,
                    })
            }
        }
    }

    fn exact(&self, asset: &str, pair: &str, date: NaiveDate) -> Result<&PriceBar, PriceError> {
        self.store
            .bar(pair, date)
            .ok_or_else(|| PriceError::NotFound {
                asset: asset.to_string(),
                pair: pair.to_string(),
                date,
            })
    }

    /// USDT/AUD is not quoted every day, so fall back up to two days earlier.
    fn usdt(&self, date: NaiveDate) -> Result<&PriceBar, PriceError> {
        (0..=USDT_FALLBACK_DAYS)
            .filter_map(|back| date.checked_sub_signed(Duration::days(back)))
            .find_map(|day| self.store.bar(USDT_PAIR, day))
            .ok_or_else(|| PriceError::NotFound {
                asset: USDT.to_string(),
                pair: USDT_PAIR.to_string(),
                date,
            })
    }
}

fn midpoint(asset: &str, bar: &PriceBar) -> Result<Decimal, PriceError> {
    bar.midpoint().ok_or_else(|| PriceError::Overflow {
        asset: asset.to_string(),
        date: bar.date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::price::PriceSeries;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn oracle(series: &[(&str, &str)]) -> PriceOracle {
        let mut store = PriceSeriesStore::new();
        for (pair, csv) in series {
            store.insert(PriceSeries::read_csv(pair, csv.as_bytes()).unwrap());
        }
        PriceOracle::new(store)
    }

    #[test]
    fn aud_and_none_are_fixed() {
        let oracle = oracle(&[]);
        for day in ["2010-01-01", "2015-09-18", "2024-02-29"] {
            assert_eq!(oracle.price("AUD", date(day)).unwrap(), Decimal::ONE);
            assert_eq!(oracle.price("NONE", date(day)).unwrap(), Decimal::ZERO);
        }
    }

    #[test]
    fn btc_is_midpoint_of_btc_usdt() {
        let oracle = oracle(&[("BTC_USDT", "2015-09-18,233,240.10,230.66,238,10\n")]);
        let price = oracle.price("BTC", date("2015-09-18")).unwrap();
        assert_eq!(price, dec!(235.38));
    }

    #[test]
    fn btc_has_no_date_fallback() {
        let oracle = oracle(&[("BTC_USDT", "2015-09-17,233,240.10,230.66,238,10\n")]);
        let err = oracle.price("BTC", date("2015-09-18")).unwrap_err();
        assert_eq!(
            err,
            PriceError::NotFound {
                asset: "BTC".to_string(),
                pair: "BTC_USDT".to_string(),
                date: date("2015-09-18"),
            }
        );
    }

    #[test]
    fn usdt_uses_same_day_when_present() {
        let oracle = oracle(&[(
            "USDT_AUD",
            "2015-09-17,1,1.00,1.00,1,1\n2015-09-18,1,1.40,1.30,1,1\n",
        )]);
        assert_eq!(oracle.price("USDT", date("2015-09-18")).unwrap(), dec!(1.35));
    }

    #[test]
    fn usdt_falls_back_one_day() {
        let oracle = oracle(&[("USDT_AUD", "2015-09-17,1,1.00,1.00,1,1\n")]);
        assert_eq!(oracle.price("USDT", date("2015-09-18")).unwrap(), dec!(1.00));
    }

    #[test]
    fn usdt_falls_back_two_days() {
        let oracle = oracle(&[("USDT_AUD", "2015-09-16,1,1.32,1.30,1,1\n")]);
        assert_eq!(oracle.price("USDT", date("2015-09-18")).unwrap(), dec!(1.31));
    }

    #[test]
    fn usdt_gives_up_after_two_days() {
        let oracle = oracle(&[("USDT_AUD", "2015-09-15,1,1.32,1.30,1,1\n")]);
        let err = oracle.price("USDT", date("2015-09-18")).unwrap_err();
        assert!(matches!(err, PriceError::NotFound { ref pair, .. } if pair == "USDT_AUD"));
    }

    #[test]
    fn other_assets_triangulate_through_btc() {
        let oracle = oracle(&[
            ("BTC_USDT", "2015-09-18,233,240.102,230.662,238,10\n"),
            ("ETH_BTC", "2015-09-18,0.0037,0.00371,0.00369463,0.0037,10\n"),
        ]);
        let day = date("2015-09-18");
        let eth = oracle.price("ETH", day).unwrap();
        let btc = oracle.price("BTC", day).unwrap();

        assert_eq!(btc, dec!(235.382));
        assert_eq!(eth, dec!(0.003702315) * btc);
        assert!((eth - dec!(0.8715)).abs() < dec!(0.0001));
    }

    #[test]
    fn triangulation_needs_the_btc_leg() {
        let oracle = oracle(&[("ETH_BTC", "2015-09-18,0.0037,0.0037,0.0037,0.0037,10\n")]);
        let err = oracle.price("ETH", date("2015-09-18")).unwrap_err();
        assert!(matches!(err, PriceError::NotFound { ref pair, .. } if pair == "BTC_USDT"));
    }

    #[test]
    fn unknown_pair_is_not_found() {
        let oracle = oracle(&[("BTC_USDT", "2015-09-18,233,240.10,230.66,238,10\n")]);
        let err = oracle.price("XMR", date("2015-09-18")).unwrap_err();
        assert!(matches!(err, PriceError::NotFound { ref pair, .. } if pair == "XMR_BTC"));
    }

    #[test]
    fn out_of_range_bar_is_an_error() {
        let oracle = oracle(&[(
            "BTC_USDT",
            "2015-09-18,1,50000000000000000000000000000,50000000000000000000000000000,1,1\n",
        )]);
        let err = oracle.price("BTC", date("2015-09-18")).unwrap_err();
        assert_eq!(
            err,
            PriceError::Overflow {
                asset: "BTC".to_string(),
                date: date("2015-09-18"),
            }
        );
    }

    #[test]
    fn out_of_range_triangulation_is_an_error() {
        let oracle = oracle(&[
            ("BTC_USDT", "2015-09-18,1,10000000000000000,10000000000000000,1,1\n"),
            ("ETH_BTC", "2015-09-18,1,10000000000000000,10000000000000000,1,1\n"),
        ]);
        let err = oracle.price("ETH", date("2015-09-18")).unwrap_err();
        assert!(matches!(err, PriceError::Overflow { ref asset, .. } if asset == "ETH"));
    }
}
