//! Calculate command - match every sale and write the output ledgers

use super::LedgerArgs;
use crate::tax::Warning;
use crate::utils::format_4dp;
use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CalculateCommand {
    #[command(flatten)]
    ledger: LedgerArgs,

    /// Directory the output CSV files are written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

impl CalculateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.ledger.build_ledger()?;

        std::fs::create_dir_all(&self.output)
            .with_context(|| format!("creating {}", self.output.display()))?;
        let written = ledger.write_outputs(&self.output)?;

        let profit = ledger
            .events
            .iter()
            .try_fold(Decimal::ZERO, |total, e| total.checked_add(e.net_profit_aud()?))
            .context("net profit is out of range")?;
        println!(
            "{} trade records, {} tax events, net profit ${} AUD",
            ledger.book.len(),
            ledger.events.len(),
            format_4dp(profit)
        );
        for path in &written {
            println!("  {}", path.display());
        }

        let unresolved = ledger
            .warnings
            .iter()
            .filter(|w| matches!(w, Warning::UnresolvedSellVolume { .. }))
            .count();
        if unresolved > 0 {
            println!(
                "{} sale(s) could not be fully matched, run `validate` for details",
                unresolved
            );
        }
        Ok(())
    }
}
