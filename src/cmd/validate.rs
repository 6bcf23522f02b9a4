//! Validate command - surface sales that could not be matched to a purchase

use super::LedgerArgs;
use crate::tax::{FinancialYear, Warning};
use crate::utils::format_4dp;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    ledger: LedgerArgs,

    /// Financial year to filter by its end year (e.g., 2016 for 2015/16)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: &'static str,
    date: String,
    asset: String,
    sell_lot: usize,
    quantity: String,
    proceeds_aud: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    financial_year: String,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.ledger.build_ledger()?;
        let year = self.year.map(FinancialYear);

        let issues: Vec<ValidationIssue> = ledger
            .warnings
            .iter()
            .filter(|w| year.is_none_or(|y| FinancialYear::from_date(w.date()) == y))
            .map(|w| {
                let (sell_lot, asset, quantity) = match w {
                    Warning::UnresolvedSellVolume {
                        sell_lot,
                        asset,
                        unclaimed,
                        ..
                    } => (*sell_lot, asset, *unclaimed),
                    Warning::WrittenOff {
                        sell_lot,
                        asset,
                        volume,
                        ..
                    } => (*sell_lot, asset, *volume),
                };
                let sell = ledger.book.sell(sell_lot);
                ValidationIssue {
                    issue_type: w.name(),
                    date: w.date().format("%Y-%m-%d").to_string(),
                    asset: asset.clone(),
                    sell_lot,
                    quantity: format_4dp(quantity),
                    proceeds_aud: quantity
                        .checked_mul(sell.price_aud)
                        .map_or_else(|| "out of range".to_string(), |p| format!("{:.2}", p.round_dp(2))),
                    message: w.message(),
                }
            })
            .collect();

        let year_str = year.map_or("All Years".to_string(), |y| y.display());
        if self.json {
            let output = ValidationOutput {
                financial_year: year_str,
                issue_count: issues.len(),
                issues: issues.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_text(&issues, &year_str);
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn print_text(issues: &[ValidationIssue], year: &str) {
    println!();
    println!("VALIDATION RESULTS ({})", year);
    println!();

    if issues.is_empty() {
        println!("\u{2713} No issues found.");
        return;
    }

    println!("\u{26A0} {} issue(s) found:", issues.len());
    println!();
    for (i, issue) in issues.iter().enumerate() {
        println!(
            "  {}. [{}] {} Sale of {} {} for ${}",
            i + 1,
            issue.issue_type,
            issue.date,
            issue.quantity,
            issue.asset,
            issue.proceeds_aud
        );
        println!("     {}", issue.message);
        println!();
    }
}
