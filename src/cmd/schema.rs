//! Schema command - print expected input formats

use crate::tax::price::PriceBarCsvRecord;
use crate::tax::trade::TradeCsvRecord;
use crate::tax::CsvColumn;
use clap::{Args, ValueEnum};

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Which input file layout to describe
    #[arg(value_enum, default_value = "trades")]
    input: SchemaInput,

    /// Print only the CSV header row
    #[arg(long)]
    header: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaInput {
    /// Trade record CSVs (with header row)
    Trades,
    /// Daily price bar CSVs (no header row)
    Bars,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (title, columns) = match self.input {
            SchemaInput::Trades => ("Trade CSV Format", TradeCsvRecord::csv_schema()),
            SchemaInput::Bars => ("Price Bar CSV Format", PriceBarCsvRecord::csv_schema()),
        };

        if self.header {
            println!("{}", header_row(columns));
            return Ok(());
        }

        println!("{}", title);
        println!("{}", "=".repeat(title.len()));
        println!();
        for column in columns {
            let req = if column.required { "required" } else { "optional" };
            println!(
                "{:2} {:14} ({:8})  {}",
                column.position, column.name, req, column.description
            );
        }
        println!();
        match self.input {
            SchemaInput::Trades => {
                println!("One or more files in the trades directory, read in file name order.")
            }
            SchemaInput::Bars => {
                println!("One file per pair named after it, e.g. BTC_USDT.csv, ETH_BTC.csv, USDT_AUD.csv.")
            }
        }
        Ok(())
    }
}

fn header_row(columns: &[CsvColumn]) -> String {
    columns.iter().map(|c| c.name).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_header_matches_input_format() {
        assert_eq!(
            header_row(TradeCsvRecord::csv_schema()),
            "date,buy_asset,buy_volume,sell_asset,sell_volume,fee_asset,fee_volume,comment"
        );
    }

    #[test]
    fn comment_is_the_only_optional_trade_column() {
        let optional: Vec<_> = TradeCsvRecord::csv_schema()
            .iter()
            .filter(|c| !c.required)
            .map(|c| c.name)
            .collect();
        assert_eq!(optional, ["comment"]);
    }

    #[test]
    fn bar_columns_are_positional() {
        let columns = PriceBarCsvRecord::csv_schema();
        assert_eq!(columns.len(), 6);
        assert_eq!(columns[0].name, "date");
        assert_eq!(columns[5].position, 5);
        assert!(columns.iter().all(|c| c.required));
    }
}
