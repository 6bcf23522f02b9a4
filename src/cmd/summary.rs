//! Summary command - capital gains per Australian financial year

use super::LedgerArgs;
use anyhow::Context;
use crate::tax::{summarise_by_year, CgtSummary, FinancialYear};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[command(flatten)]
    ledger: LedgerArgs,

    /// Financial year to report by its end year (e.g., 2016 for 2015/16)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// One financial year, formatted for display
#[derive(Debug, Clone, Tabled, Serialize)]
struct SummaryRow {
    #[tabled(rename = "Year")]
    financial_year: String,
    #[tabled(rename = "Disposals")]
    disposals: usize,
    #[tabled(rename = "Write-offs")]
    write_offs: usize,
    #[tabled(rename = "Proceeds")]
    proceeds: String,
    #[tabled(rename = "Cost Base")]
    cost_base: String,
    #[tabled(rename = "Fees")]
    fees: String,
    #[tabled(rename = "Losses")]
    losses: String,
    #[tabled(rename = "Gains (<=365d)")]
    short_term_gains: String,
    #[tabled(rename = "Gains (>365d)")]
    discountable_gains: String,
    #[tabled(rename = "Net Capital Gain")]
    net_capital_gain: String,
    #[tabled(rename = "Loss c/f")]
    loss_carried_forward: String,
}

impl SummaryRow {
    fn new(year: FinancialYear, summary: &CgtSummary) -> Self {
        SummaryRow {
            financial_year: year.display(),
            disposals: summary.disposals,
            write_offs: summary.write_offs,
            proceeds: format_aud(summary.proceeds),
            cost_base: format_aud(summary.cost_base),
            fees: format_aud(summary.fees),
            losses: format_aud(summary.losses),
            short_term_gains: format_aud(summary.short_term_gains),
            discountable_gains: format_aud(summary.discountable_gains),
            net_capital_gain: format_aud(summary.net_capital_gain),
            loss_carried_forward: format_aud(summary.loss_carried_forward),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryOutput {
    financial_year: String,
    years: Vec<SummaryRow>,
    warnings: usize,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.ledger.build_ledger()?;
        let year = self.year.map(FinancialYear);

        let years: BTreeMap<FinancialYear, CgtSummary> = summarise_by_year(&ledger.events)
            .context("capital gains totals are out of range")?
            .into_iter()
            .filter(|(y, _)| year.is_none_or(|year| *y == year))
            .collect();
        let rows: Vec<SummaryRow> = years
            .iter()
            .map(|(year, summary)| SummaryRow::new(*year, summary))
            .collect();
        let year_str = year.map_or("All Years".to_string(), |y| y.display());

        if self.json {
            let output = SummaryOutput {
                financial_year: year_str,
                years: rows,
                warnings: ledger.warnings.len(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!();
        match year.and_then(|y| Some((y.start_date()?, y.end_date()?))) {
            Some((start, end)) => {
                println!("CAPITAL GAINS SUMMARY ({}: {} to {})", year_str, start, end)
            }
            None => println!("CAPITAL GAINS SUMMARY ({})", year_str),
        }
        println!();
        if rows.is_empty() {
            println!("No disposals found");
        } else {
            let table = Table::new(&rows)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
        }
        if !ledger.warnings.is_empty() {
            println!();
            println!(
                "\u{26A0} {} warning(s), run `validate` for details",
                ledger.warnings.len()
            );
        }
        println!();
        Ok(())
    }
}

fn format_aud(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-${:.2}", amount.abs().round_dp(2))
    } else {
        format!("${:.2}", amount.round_dp(2))
    }
}
