use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::matching::TaxEvent;

/// Share of a discount-eligible gain that is taxed
pub const CGT_DISCOUNT_RATE: Decimal = dec!(0.5);

/// Australian financial year (1 July to 30 June).
/// The value is the end year, e.g. 2016 = 2015/16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FinancialYear(pub i32);

impl FinancialYear {
    pub fn from_date(date: NaiveDate) -> Self {
        if date.month() >= 7 {
            FinancialYear(date.year() + 1)
        } else {
            FinancialYear(date.year())
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0 - 1, 7, 1)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 6, 30)
    }

    /// Display as "2015/16"
    pub fn display(&self) -> String {
        format!("{}/{:02}", self.0 - 1, self.0.rem_euclid(100))
    }
}

impl std::fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Capital gains totals for one financial year
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgtSummary {
    pub disposals: usize,
    pub write_offs: usize,
    pub proceeds: Decimal,
    pub cost_base: Decimal,
    pub fees: Decimal,
    /// Sum of the (positive) losses
    pub losses: Decimal,
    /// Gains on assets held 365 days or less
    pub short_term_gains: Decimal,
    /// Gains on assets held more than 365 days
    pub discountable_gains: Decimal,
    pub net_capital_gain: Decimal,
    pub loss_carried_forward: Decimal,
}

impl CgtSummary {
    /// Fold tax events into totals. Each event's gain is after its fee share.
    ///
    /// Losses are applied to short-term gains first, then to discountable
    /// gains; the discount is applied to whatever discountable gain remains.
    ///
    /// Returns `None` if any total is out of range.
    pub fn from_events<'a, I>(events: I) -> Option<CgtSummary>
    where
        I: IntoIterator<Item = &'a TaxEvent>,
    {
        let mut summary = CgtSummary::default();
        for event in events {
            summary.disposals += 1;
            if event.is_write_off() {
                summary.write_offs += 1;
            }
            summary.proceeds = summary.proceeds.checked_add(event.proceeds_aud)?;
            summary.cost_base = summary.cost_base.checked_add(event.cost_base_aud)?;
            summary.fees = summary.fees.checked_add(event.fee_aud)?;

            let gain = event.net_profit_aud()?;
            if gain < Decimal::ZERO {
                summary.losses = summary.losses.checked_add(-gain)?;
            } else if event.cgt_discount() {
                summary.discountable_gains = summary.discountable_gains.checked_add(gain)?;
            } else {
                summary.short_term_gains = summary.short_term_gains.checked_add(gain)?;
            }
        }

        let short_term = summary
            .short_term_gains
            .checked_sub(summary.losses)?
            .max(Decimal::ZERO);
        let remaining_loss = summary
            .losses
            .checked_sub(summary.short_term_gains)?
            .max(Decimal::ZERO);
        let discountable = summary
            .discountable_gains
            .checked_sub(remaining_loss)?
            .max(Decimal::ZERO);
        summary.loss_carried_forward = remaining_loss
            .checked_sub(summary.discountable_gains)?
            .max(Decimal::ZERO);
        summary.net_capital_gain =
            short_term.checked_add(discountable.checked_mul(CGT_DISCOUNT_RATE)?)?;
        Some(summary)
    }
}

/// Summaries keyed by financial year of the disposal. `None` if any year's
/// totals are out of range.
pub fn summarise_by_year<'a, I>(events: I) -> Option<BTreeMap<FinancialYear, CgtSummary>>
where
    I: IntoIterator<Item = &'a TaxEvent>,
{
    let mut by_year: BTreeMap<FinancialYear, Vec<&TaxEvent>> = BTreeMap::new();
    for event in events {
        by_year
            .entry(FinancialYear::from_date(event.date_sold))
            .or_default()
            .push(event);
    }
    by_year
        .into_iter()
        .map(|(year, events)| Some((year, CgtSummary::from_events(events)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn event(sold: &str, days_held: i64, proceeds: Decimal, cost: Decimal, fee: Decimal) -> TaxEvent {
        TaxEvent {
            id: 0,
            sell_lot: 0,
            buy_lot: Some(0),
            asset: "ETH".to_string(),
            date_purchased: date(sold) - chrono::Duration::days(days_held),
            date_sold: date(sold),
            days_held,
            volume: dec!(1),
            buy_price_aud: cost,
            sell_price_aud: proceeds,
            cost_base_aud: cost,
            proceeds_aud: proceeds,
            profit_aud: proceeds - cost,
            fee_aud: fee,
        }
    }

    #[test]
    fn financial_year_boundaries() {
        assert_eq!(FinancialYear::from_date(date("2016-06-30")), FinancialYear(2016));
        assert_eq!(FinancialYear::from_date(date("2016-07-01")), FinancialYear(2017));
        assert_eq!(FinancialYear(2016).start_date(), Some(date("2015-07-01")));
        assert_eq!(FinancialYear(2016).end_date(), Some(date("2016-06-30")));
        assert_eq!(FinancialYear(2016).display(), "2015/16");
        assert_eq!(FinancialYear(2000).to_string(), "1999/00");
    }

    #[test]
    fn discount_halves_long_term_gains() {
        let events = vec![
            event("2017-01-10", 400, dec!(1000), dec!(400), dec!(0)),
            event("2017-01-10", 10, dec!(500), dec!(300), dec!(0)),
        ];
        let summary = CgtSummary::from_events(&events).unwrap();
        assert_eq!(summary.disposals, 2);
        assert_eq!(summary.discountable_gains, dec!(600));
        assert_eq!(summary.short_term_gains, dec!(200));
        assert_eq!(summary.net_capital_gain, dec!(500));
    }

    #[test]
    fn losses_reduce_short_term_gains_first() {
        let events = vec![
            event("2017-01-10", 400, dec!(1000), dec!(400), dec!(0)),
            event("2017-01-10", 10, dec!(500), dec!(300), dec!(0)),
            event("2017-01-11", 20, dec!(100), dec!(350), dec!(0)),
        ];
        let summary = CgtSummary::from_events(&events).unwrap();
        assert_eq!(summary.losses, dec!(250));
        // 200 short-term absorbed, 50 comes off the 600 before discount
        assert_eq!(summary.net_capital_gain, dec!(275));
        assert_eq!(summary.loss_carried_forward, Decimal::ZERO);
    }

    #[test]
    fn excess_losses_carry_forward() {
        let events = vec![
            event("2017-01-10", 400, dec!(200), dec!(100), dec!(0)),
            event("2017-01-11", 20, dec!(100), dec!(400), dec!(0)),
        ];
        let summary = CgtSummary::from_events(&events).unwrap();
        assert_eq!(summary.net_capital_gain, Decimal::ZERO);
        assert_eq!(summary.loss_carried_forward, dec!(200));
    }

    #[test]
    fn fees_reduce_gains() {
        let events = vec![event("2017-01-10", 10, dec!(500), dec!(300), dec!(20))];
        let summary = CgtSummary::from_events(&events).unwrap();
        assert_eq!(summary.fees, dec!(20));
        assert_eq!(summary.short_term_gains, dec!(180));
        assert_eq!(summary.net_capital_gain, dec!(180));
    }

    #[test]
    fn grouped_by_year_of_sale() {
        let events = vec![
            event("2016-06-30", 10, dec!(500), dec!(300), dec!(0)),
            event("2016-07-01", 10, dec!(500), dec!(400), dec!(0)),
            event("2017-03-01", 10, dec!(500), dec!(450), dec!(0)),
        ];
        let years = summarise_by_year(&events).unwrap();
        assert_eq!(years.len(), 2);
        assert_eq!(years[&FinancialYear(2016)].net_capital_gain, dec!(200));
        assert_eq!(years[&FinancialYear(2017)].disposals, 2);
        assert_eq!(years[&FinancialYear(2017)].net_capital_gain, dec!(150));
    }

    #[test]
    fn out_of_range_totals_are_rejected() {
        let events = vec![
            event("2017-01-10", 10, Decimal::MAX, dec!(0), dec!(0)),
            event("2017-01-11", 10, Decimal::MAX, dec!(0), dec!(0)),
        ];
        assert_eq!(CgtSummary::from_events(&events), None);
        assert_eq!(summarise_by_year(&events), None);
        assert!(CgtSummary::from_events(&events[..1]).is_some());
    }
}
