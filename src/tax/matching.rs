use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::lot::{BuyLotId, LotBook, SellLotId, TradeId};
use super::oracle::AUD;
use super::warnings::Warning;
use super::{LedgerError, CGT_DISCOUNT_DAYS};

/// How a buy lot's asset is compared with the asset being sold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetMatch {
    /// Symbols must be identical
    #[default]
    Exact,
    /// The buy symbol only has to contain the sell symbol, so a sale of
    /// `ETH` may consume `BETH`. Kept for ledgers that rely on it.
    Contains,
}

impl AssetMatch {
    pub fn matches(self, buy_asset: &str, sell_asset: &str) -> bool {
        match self {
            AssetMatch::Exact => buy_asset == sell_asset,
            AssetMatch::Contains => buy_asset.contains(sell_asset),
        }
    }
}

/// What to do with sell volume left over after both matching phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Log it and leave the sell lot partially matched
    #[default]
    Report,
    /// Dispose of the remainder with a zero cost base
    WriteOff,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub asset_match: AssetMatch,
    pub unresolved: UnresolvedPolicy,
}

pub type TaxEventId = usize;

/// A taxable disposal: part of a sell lot matched against part of a buy lot,
/// or a write-off (no buy lot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxEvent {
    pub id: TaxEventId,
    pub sell_lot: SellLotId,
    pub buy_lot: Option<BuyLotId>,
    pub asset: String,
    pub date_purchased: NaiveDate,
    pub date_sold: NaiveDate,
    pub days_held: i64,
    pub volume: Decimal,
    pub buy_price_aud: Decimal,
    pub sell_price_aud: Decimal,
    pub cost_base_aud: Decimal,
    pub proceeds_aud: Decimal,
    pub profit_aud: Decimal,
    pub fee_aud: Decimal,
}

impl TaxEvent {
    pub fn cgt_discount(&self) -> bool {
        self.days_held > CGT_DISCOUNT_DAYS
    }

    pub fn is_write_off(&self) -> bool {
        self.buy_lot.is_none()
    }

    /// Profit after this event's share of the trade fee
    pub fn net_profit_aud(&self) -> Option<Decimal> {
        self.profit_aud.checked_sub(self.fee_aud)
    }
}

/// Result of a matching run: the finalised lots plus what was produced from them
#[derive(Debug, Clone)]
pub struct TaxLedger {
    pub book: LotBook,
    pub events: Vec<TaxEvent>,
    pub warnings: Vec<Warning>,
}

impl TaxLedger {
    /// Tax events either side of the trade record took part in
    pub fn events_for_trade(&self, trade: TradeId) -> Vec<TaxEventId> {
        let mut ids: Vec<_> = self
            .events
            .iter()
            .filter(|e| {
                self.book.sell(e.sell_lot).trade == trade
                    || e.buy_lot.is_some_and(|b| self.book.buy(b).trade == trade)
            })
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn events_for_sell(&self, sell: SellLotId) -> impl Iterator<Item = &TaxEvent> {
        self.events.iter().filter(move |e| e.sell_lot == sell)
    }
}

/// Pairs sell volume with buy volume across the whole trade history.
///
/// Sell lots are resolved newest first. For each one:
/// 1. Buy lots held more than 365 days, most recently bought first, so the
///    discount is kept while consuming the youngest qualifying lots.
/// 2. Then every buy lot, oldest first.
///
/// Any remainder is reported, or written off, per [`UnresolvedPolicy`].
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    options: MatchOptions,
}

impl MatchingEngine {
    pub fn new(options: MatchOptions) -> Self {
        MatchingEngine { options }
    }

    pub fn run(&self, mut book: LotBook) -> Result<TaxLedger, LedgerError> {
        let mut buy_order: Vec<BuyLotId> = (0..book.len()).collect();
        buy_order.sort_by_key(|&id| book.buy(id).date);
        let mut sell_order: Vec<SellLotId> = (0..book.len()).collect();
        sell_order.sort_by_key(|&id| book.sell(id).date);

        let mut events = Vec::new();
        let mut warnings = Vec::new();
        let mut resolved = 0;

        for &sell_id in sell_order.iter().rev() {
            let sell = book.sell(sell_id);
            // disposing of AUD is not a CGT event
            if sell.asset == AUD {
                continue;
            }
            let sell_date = sell.date;
            resolved += 1;

            let long_term: Vec<BuyLotId> = buy_order
                .iter()
                .rev()
                .copied()
                .filter(|&id| (sell_date - book.buy(id).date).num_days() > CGT_DISCOUNT_DAYS)
                .collect();

            for buy_id in long_term.into_iter().chain(buy_order.iter().copied()) {
                if book.sell(sell_id).unclaimed_volume.is_zero() {
                    break;
                }
                self.match_lots(&mut book, sell_id, buy_id, &mut events)?;
            }

            let sell = book.sell(sell_id);
            if !sell.unclaimed_volume.is_zero() {
                warnings.push(self.resolve_remainder(&mut book, sell_id, &mut events)?);
            }
        }

        log::info!(
            "resolved {} sell lots into {} tax events ({} warnings)",
            resolved,
            events.len(),
            warnings.len()
        );
        Ok(TaxLedger {
            book,
            events,
            warnings,
        })
    }

    /// Match as much of the sell lot as the buy lot can cover. Returns the new
    /// event, or `None` when the pair is not eligible.
    fn match_lots(
        &self,
        book: &mut LotBook,
        sell_id: SellLotId,
        buy_id: BuyLotId,
        events: &mut Vec<TaxEvent>,
    ) -> Result<Option<TaxEventId>, LedgerError> {
        let sell = book.sell(sell_id);
        let buy = book.buy(buy_id);

        if !self.options.asset_match.matches(&buy.asset, &sell.asset)
            || sell.date <= buy.date
            || buy.unclaimed_volume.is_zero()
        {
            return Ok(None);
        }

        let (sell_date, sell_asset, sold) = (sell.date, sell.asset.clone(), sell.volume);
        let overflow = || LedgerError::Arithmetic {
            sell: sell_id,
            buy: Some(buy_id),
            date: sell_date,
            asset: sell_asset.clone(),
            volume: sold,
        };
        let volume = sell.unclaimed_volume.min(buy.unclaimed_volume);
        // (volume / sold) * price * volume: the share of the sale times the
        // matched value, kept as the ledger has always computed it
        let cost_base = volume
            .checked_div(sell.volume)
            .and_then(|share| share.checked_mul(buy.price_aud))
            .and_then(|cost| cost.checked_mul(volume))
            .ok_or_else(overflow)?;
        let proceeds = volume.checked_mul(sell.price_aud).ok_or_else(overflow)?;
        let fee = fee_share(sell.fee_aud, volume, sell.volume).ok_or_else(overflow)?;
        let sell_cost_base = sell
            .cost_base_aud
            .checked_add(cost_base)
            .ok_or_else(overflow)?;
        let days_held = (sell.date - buy.date).num_days();

        let event = TaxEvent {
            id: events.len(),
            sell_lot: sell_id,
            buy_lot: Some(buy_id),
            asset: sell.asset.clone(),
            date_purchased: buy.date,
            date_sold: sell.date,
            days_held,
            volume,
            buy_price_aud: buy.price_aud,
            sell_price_aud: sell.price_aud,
            cost_base_aud: cost_base,
            proceeds_aud: proceeds,
            profit_aud: proceeds.checked_sub(cost_base).ok_or_else(overflow)?,
            fee_aud: fee,
        };

        log::debug!(
            "match sell {} <- buy {}: {} {} held {} days, cost base {}",
            sell_id,
            buy_id,
            volume,
            event.asset,
            days_held,
            cost_base
        );

        let sell = book.sell_mut(sell_id);
        sell.cost_base_aud = sell_cost_base;
        sell.unclaimed_volume -= volume;
        sell.days_held = days_held;
        sell.buy_lots.push(buy_id);
        sell.calculate_profit().ok_or_else(overflow)?;
        book.buy_mut(buy_id).claim(volume, sell_id);

        let id = event.id;
        events.push(event);
        Ok(Some(id))
    }

    fn resolve_remainder(
        &self,
        book: &mut LotBook,
        sell_id: SellLotId,
        events: &mut Vec<TaxEvent>,
    ) -> Result<Warning, LedgerError> {
        let sell = book.sell(sell_id);
        let unclaimed = sell.unclaimed_volume;

        match self.options.unresolved {
            UnresolvedPolicy::Report => {
                log::error!("sell lot {} still has unclaimed sell volume", sell_id);
                log::error!("when did I buy that {:.4} {}?", unclaimed, sell.asset);
                Ok(Warning::UnresolvedSellVolume {
                    sell_lot: sell_id,
                    date: sell.date,
                    asset: sell.asset.clone(),
                    unclaimed,
                })
            }
            UnresolvedPolicy::WriteOff => {
                let (sell_date, sell_asset, sold) = (sell.date, sell.asset.clone(), sell.volume);
                let overflow = || LedgerError::Arithmetic {
                    sell: sell_id,
                    buy: None,
                    date: sell_date,
                    asset: sell_asset.clone(),
                    volume: sold,
                };
                let proceeds = unclaimed.checked_mul(sell.price_aud).ok_or_else(overflow)?;
                let fee = fee_share(sell.fee_aud, unclaimed, sell.volume).ok_or_else(overflow)?;
                let event = TaxEvent {
                    id: events.len(),
                    sell_lot: sell_id,
                    buy_lot: None,
                    asset: sell.asset.clone(),
                    date_purchased: sell.date,
                    date_sold: sell.date,
                    days_held: 0,
                    volume: unclaimed,
                    buy_price_aud: Decimal::ZERO,
                    sell_price_aud: sell.price_aud,
                    cost_base_aud: Decimal::ZERO,
                    proceeds_aud: proceeds,
                    profit_aud: proceeds,
                    fee_aud: fee,
                };
                log::warn!(
                    "sell lot {}: writing off {:.4} {} with zero cost base",
                    sell_id,
                    unclaimed,
                    sell.asset
                );
                let warning = Warning::WrittenOff {
                    sell_lot: sell_id,
                    date: sell.date,
                    asset: sell.asset.clone(),
                    volume: unclaimed,
                };

                let sell = book.sell_mut(sell_id);
                sell.unclaimed_volume = Decimal::ZERO;
                sell.written_off = true;
                sell.calculate_profit().ok_or_else(overflow)?;
                events.push(event);
                Ok(warning)
            }
        }
    }
}

/// The part of a trade's fee attributable to `volume` of the `total` sold
fn fee_share(fee: Decimal, volume: Decimal, total: Decimal) -> Option<Decimal> {
    if fee.is_zero() || total.is_zero() {
        return Some(Decimal::ZERO);
    }
    fee.checked_mul(volume)?.checked_div(total)
}
