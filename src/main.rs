use clap::{Parser, Subcommand};

mod cmd;
mod tax;
mod utils;

#[derive(Parser, Debug)]
#[command(name = "audcgt", version, about = "Calculate Australian Capital Gains Tax (CGT) on crypto trades")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match sales against purchases and write the output CSV ledgers
    Calculate(cmd::calculate::CalculateCommand),
    /// Capital gains totals per financial year
    Summary(cmd::summary::SummaryCommand),
    /// List sales that could not be matched to a purchase
    Validate(cmd::validate::ValidateCommand),
    /// Look up the AUD price of an asset on a date
    Price(cmd::price::PriceCommand),
    /// Describe the input CSV formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Calculate(command) => command.exec(),
        Command::Summary(command) => command.exec(),
        Command::Validate(command) => command.exec(),
        Command::Price(command) => command.exec(),
        Command::Schema(command) => command.exec(),
    }
}
