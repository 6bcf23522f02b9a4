pub mod calculate;
pub mod price;
pub mod schema;
pub mod summary;
pub mod validate;

use crate::tax::{
    trade, AssetMatch, LotBook, MatchOptions, MatchingEngine, PriceOracle, PriceSeriesStore,
    TaxLedger, UnresolvedPolicy,
};
use anyhow::Context;
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

/// Input locations and matching options shared by the commands that run
/// the full calculation
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Directory of trade CSV files
    #[arg(short, long, default_value = "input")]
    pub trades: PathBuf,

    /// Directory of daily price bar CSV files, one per pair (e.g. BTC_USDT.csv)
    #[arg(short, long, default_value = "bars")]
    pub bars: PathBuf,

    /// What to do with sell volume no purchase can be found for
    #[arg(long, value_enum, default_value_t = UnresolvedArg::Report)]
    pub unresolved: UnresolvedArg,

    /// How purchased assets are matched against the asset sold
    #[arg(long, value_enum, default_value_t = AssetMatchArg::Exact)]
    pub asset_match: AssetMatchArg,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum UnresolvedArg {
    /// Log the remainder and leave the sale partially matched
    #[default]
    Report,
    /// Treat the remainder as pure profit (zero cost base)
    WriteOff,
}

impl From<UnresolvedArg> for UnresolvedPolicy {
    fn from(arg: UnresolvedArg) -> Self {
        match arg {
            UnresolvedArg::Report => UnresolvedPolicy::Report,
            UnresolvedArg::WriteOff => UnresolvedPolicy::WriteOff,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum AssetMatchArg {
    /// Symbols must be identical
    #[default]
    Exact,
    /// The purchased symbol only needs to contain the sold symbol
    Contains,
}

impl From<AssetMatchArg> for AssetMatch {
    fn from(arg: AssetMatchArg) -> Self {
        match arg {
            AssetMatchArg::Exact => AssetMatch::Exact,
            AssetMatchArg::Contains => AssetMatch::Contains,
        }
    }
}

impl LedgerArgs {
    pub fn options(&self) -> MatchOptions {
        MatchOptions {
            asset_match: self.asset_match.into(),
            unresolved: self.unresolved.into(),
        }
    }

    /// Load bars and trades, price the lots and run the matching engine
    pub fn build_ledger(&self) -> anyhow::Result<TaxLedger> {
        let oracle = load_oracle(&self.bars)?;
        let trades = trade::read_directory(&self.trades)
            .with_context(|| format!("reading trades from {}", self.trades.display()))?;
        let book = LotBook::build(trades, &oracle)?;
        if book.is_empty() {
            anyhow::bail!("No trade records found in {}", self.trades.display());
        }
        let ledger = MatchingEngine::new(self.options()).run(book)?;
        Ok(ledger)
    }
}

pub fn load_oracle(bars: &Path) -> anyhow::Result<PriceOracle> {
    let store = PriceSeriesStore::read_directory(bars)
        .with_context(|| format!("reading price bars from {}", bars.display()))?;
    for pair in store.pairs() {
        if let Some(series) = store.series(pair) {
            log::debug!(
                "{}: {} bars from {:?} to {:?}",
                pair,
                series.len(),
                series.first_date(),
                series.last_date()
            );
        }
    }
    Ok(PriceOracle::new(store))
}
