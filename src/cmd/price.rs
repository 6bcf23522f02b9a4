//! Price command - resolve the AUD price the calculator would use

use super::load_oracle;
use crate::tax::trade::TRADE_DATE_FORMAT;
use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct PriceCommand {
    /// Asset symbol (e.g., BTC, ETH, USDT)
    asset: String,

    /// Date as DD/MM/YYYY or YYYY-MM-DD
    date: String,

    /// Directory of daily price bar CSV files
    #[arg(short, long, default_value = "bars")]
    bars: PathBuf,
}

impl PriceCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let date = parse_date(&self.date)?;
        let oracle = load_oracle(&self.bars)?;
        let asset = self.asset.trim().to_uppercase();
        let price = oracle.price(&asset, date)?;
        println!("{} {} = ${} AUD", date, asset, price.normalize());
        Ok(())
    }
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, TRADE_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .with_context(|| format!("invalid date '{}'", s))
}
