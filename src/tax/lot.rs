use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::oracle::PriceOracle;
use super::trade::TradeRecord;
use super::{LedgerError, PriceError};

/// Index of a trade record in the [`LotBook`]. Buy and sell lots share it.
pub type TradeId = usize;
pub type BuyLotId = usize;
pub type SellLotId = usize;

/// Matching progress of a sell lot. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotState {
    Unmatched,
    PartiallyMatched,
    FullyMatched,
    WrittenOff,
}

/// The acquired side of a trade record
#[derive(Debug, Clone)]
pub struct BuyLot {
    pub id: BuyLotId,
    pub trade: TradeId,
    pub date: NaiveDate,
    pub asset: String,
    pub volume: Decimal,
    pub unclaimed_volume: Decimal,
    pub price_aud: Decimal,
    pub volume_aud: Decimal,
    /// Sell lots this lot was matched against
    pub sell_lots: Vec<SellLotId>,
}

impl BuyLot {
    pub(crate) fn claim(&mut self, volume: Decimal, sell: SellLotId) {
        debug_assert!(volume <= self.unclaimed_volume);
        self.unclaimed_volume -= volume;
        self.sell_lots.push(sell);
    }
}

/// The disposed side of a trade record
#[derive(Debug, Clone)]
pub struct SellLot {
    pub id: SellLotId,
    pub trade: TradeId,
    pub date: NaiveDate,
    pub asset: String,
    pub volume: Decimal,
    pub unclaimed_volume: Decimal,
    pub price_aud: Decimal,
    pub volume_aud: Decimal,
    pub fee_aud: Decimal,
    pub cost_base_aud: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    /// Holding period of the most recent match only
    pub days_held: i64,
    pub written_off: bool,
    /// Buy lots this lot was matched against
    pub buy_lots: Vec<BuyLotId>,
}

impl SellLot {
    pub fn state(&self) -> LotState {
        if self.written_off {
            LotState::WrittenOff
        } else if self.unclaimed_volume.is_zero() {
            LotState::FullyMatched
        } else if self.unclaimed_volume == self.volume {
            LotState::Unmatched
        } else {
            LotState::PartiallyMatched
        }
    }

    pub fn cgt_discount(&self) -> bool {
        self.days_held > super::CGT_DISCOUNT_DAYS
    }

    /// Refresh the profit fields from the cost base. `None` on overflow.
    pub(crate) fn calculate_profit(&mut self) -> Option<()> {
        self.gross_profit = self.volume_aud.checked_sub(self.cost_base_aud)?;
        self.net_profit = self.gross_profit.checked_sub(self.fee_aud)?;
        Some(())
    }
}

/// All trade records with the buy and sell lot derived from each.
///
/// Lots live in flat vectors indexed by their trade record, so
/// `buys[i]`, `sells[i]` and `trades[i]` belong together.
#[derive(Debug, Clone, Default)]
pub struct LotBook {
    trades: Vec<TradeRecord>,
    buys: Vec<BuyLot>,
    sells: Vec<SellLot>,
}

impl LotBook {
    /// Price both sides (and the fee) of every trade at its own date.
    pub fn build(trades: Vec<TradeRecord>, oracle: &PriceOracle) -> Result<LotBook, LedgerError> {
        let mut buys = Vec::with_capacity(trades.len());
        let mut sells = Vec::with_capacity(trades.len());

        for (id, trade) in trades.iter().enumerate() {
            // unit price and total AUD value of one side of the trade
            let value = |asset: &str, volume: Decimal| {
                let unpriced = |source: PriceError| LedgerError::Unpriced {
                    date: trade.date,
                    asset: asset.to_string(),
                    volume,
                    source,
                };
                let price = oracle.price(asset, trade.date).map_err(unpriced)?;
                let total = price.checked_mul(volume).ok_or_else(|| {
                    unpriced(PriceError::Overflow {
                        asset: asset.to_string(),
                        date: trade.date,
                    })
                })?;
                Ok::<_, LedgerError>((price, total))
            };

            let (buy_price, buy_value) = value(&trade.buy_asset, trade.buy_volume)?;
            let (sell_price, sell_value) = value(&trade.sell_asset, trade.sell_volume)?;
            let (_, fee_value) = value(&trade.fee_asset, trade.fee_volume)?;

            buys.push(BuyLot {
                id,
                trade: id,
                date: trade.date,
                asset: trade.buy_asset.clone(),
                volume: trade.buy_volume,
                unclaimed_volume: trade.buy_volume,
                price_aud: buy_price,
                volume_aud: buy_value,
                sell_lots: Vec::new(),
            });
            sells.push(SellLot {
                id,
                trade: id,
                date: trade.date,
                asset: trade.sell_asset.clone(),
                volume: trade.sell_volume,
                unclaimed_volume: trade.sell_volume,
                price_aud: sell_price,
                volume_aud: sell_value,
                fee_aud: fee_value,
                cost_base_aud: Decimal::ZERO,
                gross_profit: Decimal::ZERO,
                net_profit: Decimal::ZERO,
                days_held: 0,
                written_off: false,
                buy_lots: Vec::new(),
            });
        }

        log::info!("priced {} buy and {} sell lots", buys.len(), sells.len());
        Ok(LotBook { trades, buys, sells })
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn buys(&self) -> &[BuyLot] {
        &self.buys
    }

    pub fn sells(&self) -> &[SellLot] {
        &self.sells
    }

    pub fn buy(&self, id: BuyLotId) -> &BuyLot {
        &self.buys[id]
    }

    pub fn sell(&self, id: SellLotId) -> &SellLot {
        &self.sells[id]
    }

    pub(crate) fn buy_mut(&mut self, id: BuyLotId) -> &mut BuyLot {
        &mut self.buys[id]
    }

    pub(crate) fn sell_mut(&mut self, id: SellLotId) -> &mut SellLot {
        &mut self.sells[id]
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
