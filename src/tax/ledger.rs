use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use super::lot::{BuyLot, SellLot};
use super::matching::{TaxEvent, TaxLedger};
use super::LedgerError;
use crate::utils::{format_4dp, write_csv};

pub const OUTPUT_DATE_FORMAT: &str = "%Y/%m/%d";

pub const TAX_EVENTS_FILE: &str = "output_tax_events.csv";
pub const TRADE_LEDGER_FILE: &str = "output_input_events.csv";
pub const SELL_LOTS_FILE: &str = "output_sell_events.csv";
pub const BUY_LOTS_FILE: &str = "output_buy_events.csv";

#[derive(Debug, Serialize, Deserialize)]
pub struct TaxEventCsvRecord {
    pub id: usize,
    /// Empty for write-offs
    pub buy_ref: Option<usize>,
    pub sell_ref: usize,
    pub date_purchased: String,
    pub date_sold: String,
    pub days_held: i64,
    pub asset_sold: String,
    pub units_sold: String,
    #[serde(rename = "buy_volume(AUD)")]
    pub buy_volume_aud: String,
    #[serde(rename = "buy_price(AUD)")]
    pub buy_price_aud: String,
    #[serde(rename = "sell_volume(AUD)")]
    pub sell_volume_aud: String,
    #[serde(rename = "sell_price(AUD)")]
    pub sell_price_aud: String,
    #[serde(rename = "profit(AUD)")]
    pub profit_aud: String,
    #[serde(rename = "fees(AUD)")]
    pub fees_aud: String,
    #[serde(rename = "CGT_Discount")]
    pub cgt_discount: bool,
}

impl From<&TaxEvent> for TaxEventCsvRecord {
    fn from(event: &TaxEvent) -> Self {
        TaxEventCsvRecord {
            id: event.id,
            buy_ref: event.buy_lot,
            sell_ref: event.sell_lot,
            date_purchased: event.date_purchased.format(OUTPUT_DATE_FORMAT).to_string(),
            date_sold: event.date_sold.format(OUTPUT_DATE_FORMAT).to_string(),
            days_held: event.days_held,
            asset_sold: event.asset.clone(),
            units_sold: format_4dp(event.volume),
            buy_volume_aud: format_4dp(event.cost_base_aud),
            buy_price_aud: format_4dp(event.buy_price_aud),
            sell_volume_aud: format_4dp(event.proceeds_aud),
            sell_price_aud: format_4dp(event.sell_price_aud),
            profit_aud: format_4dp(event.profit_aud),
            fees_aud: format_4dp(event.fee_aud),
            cgt_discount: event.cgt_discount(),
        }
    }
}

/// Per trade record: what is left unclaimed on each side, and the events
/// each side took part in.
#[derive(Debug, Serialize, Deserialize)]
pub struct TradeLedgerCsvRecord {
    pub id: usize,
    pub date: String,
    pub buy_asset: String,
    pub buy_volume: String,
    pub sell_asset: String,
    pub sell_volume: String,
    pub fee_asset: String,
    pub fee_volume: String,
    pub unclaimed_buy_volume: String,
    pub unclaimed_sell_volume: String,
    pub tax_events: String,
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SellLotCsvRecord {
    pub id: usize,
    pub date: String,
    pub input_record: usize,
    pub buy_events: String,
    pub tax_events: String,
    pub cost_base_aud: String,
    pub sell_unclaimed_volume: String,
    pub sell_asset: String,
    pub sell_volume: String,
    pub sell_price_aud: String,
    pub sell_volume_aud: String,
    pub gross_profit: String,
    pub net_profit: String,
    pub fee_aud: String,
    pub days_held: i64,
    pub cgt_discount: bool,
    pub state: String,
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuyLotCsvRecord {
    pub id: usize,
    pub date: String,
    pub input_record: usize,
    pub sell_events: String,
    pub buy_unclaimed_volume: String,
    pub buy_asset: String,
    pub buy_volume: String,
    pub buy_price_aud: String,
    pub buy_volume_aud: String,
    pub comment: String,
}

/// Space separated list of ids
fn id_list(ids: &[usize]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" ")
}

impl TaxLedger {
    pub fn tax_event_records(&self) -> impl Iterator<Item = TaxEventCsvRecord> + '_ {
        self.events.iter().map(TaxEventCsvRecord::from)
    }

    pub fn trade_ledger_records(&self) -> impl Iterator<Item = TradeLedgerCsvRecord> + '_ {
        self.book.trades().iter().enumerate().map(move |(id, trade)| {
            TradeLedgerCsvRecord {
                id,
                date: trade.date.format(OUTPUT_DATE_FORMAT).to_string(),
                buy_asset: trade.buy_asset.clone(),
                buy_volume: format_4dp(trade.buy_volume),
                sell_asset: trade.sell_asset.clone(),
                sell_volume: format_4dp(trade.sell_volume),
                fee_asset: trade.fee_asset.clone(),
                fee_volume: format_4dp(trade.fee_volume),
                unclaimed_buy_volume: format_4dp(self.book.buy(id).unclaimed_volume),
                unclaimed_sell_volume: format_4dp(self.book.sell(id).unclaimed_volume),
                tax_events: id_list(&self.events_for_trade(id)),
                comment: trade.comment.clone(),
            }
        })
    }

    pub fn sell_lot_records(&self) -> impl Iterator<Item = SellLotCsvRecord> + '_ {
        self.book.sells().iter().map(move |sell| self.sell_lot_record(sell))
    }

    pub fn buy_lot_records(&self) -> impl Iterator<Item = BuyLotCsvRecord> + '_ {
        self.book.buys().iter().map(move |buy| self.buy_lot_record(buy))
    }

    fn sell_lot_record(&self, sell: &SellLot) -> SellLotCsvRecord {
        SellLotCsvRecord {
            id: sell.id,
            date: sell.date.format(OUTPUT_DATE_FORMAT).to_string(),
            input_record: sell.trade,
            buy_events: id_list(&sell.buy_lots),
            tax_events: id_list(&self.events_for_sell(sell.id).map(|e| e.id).collect::<Vec<_>>()),
            cost_base_aud: format_4dp(sell.cost_base_aud),
            sell_unclaimed_volume: format_4dp(sell.unclaimed_volume),
            sell_asset: sell.asset.clone(),
            sell_volume: format_4dp(sell.volume),
            sell_price_aud: format_4dp(sell.price_aud),
            sell_volume_aud: format_4dp(sell.volume_aud),
            gross_profit: format_4dp(sell.gross_profit),
            net_profit: format_4dp(sell.net_profit),
            fee_aud: format_4dp(sell.fee_aud),
            days_held: sell.days_held,
            cgt_discount: sell.cgt_discount(),
            state: format!("{:?}", sell.state()),
            comment: self.book.trades()[sell.trade].comment.clone(),
        }
    }

    fn buy_lot_record(&self, buy: &BuyLot) -> BuyLotCsvRecord {
        BuyLotCsvRecord {
            id: buy.id,
            date: buy.date.format(OUTPUT_DATE_FORMAT).to_string(),
            input_record: buy.trade,
            sell_events: id_list(&buy.sell_lots),
            buy_unclaimed_volume: format_4dp(buy.unclaimed_volume),
            buy_asset: buy.asset.clone(),
            buy_volume: format_4dp(buy.volume),
            buy_price_aud: format_4dp(buy.price_aud),
            buy_volume_aud: format_4dp(buy.volume_aud),
            comment: self.book.trades()[buy.trade].comment.clone(),
        }
    }

    /// Write all four output CSVs into `dir`, returning the paths written.
    pub fn write_outputs(&self, dir: &Path) -> Result<Vec<PathBuf>, LedgerError> {
        let create = |name: &str| -> Result<(PathBuf, File), LedgerError> {
            let path = dir.join(name);
            let file = File::create(&path).map_err(|source| LedgerError::Io {
                path: path.clone(),
                source,
            })?;
            Ok((path, file))
        };

        let (tax_events, file) = create(TAX_EVENTS_FILE)?;
        write_csv(self.tax_event_records(), file)?;
        let (trade_ledger, file) = create(TRADE_LEDGER_FILE)?;
        write_csv(self.trade_ledger_records(), file)?;
        let (sell_lots, file) = create(SELL_LOTS_FILE)?;
        write_csv(self.sell_lot_records(), file)?;
        let (buy_lots, file) = create(BUY_LOTS_FILE)?;
        write_csv(self.buy_lot_records(), file)?;

        let written = vec![tax_events, trade_ledger, sell_lots, buy_lots];
        for path in &written {
            log::info!("wrote {}", path.display());
        }
        Ok(written)
    }
}
