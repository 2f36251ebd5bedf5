#![warn(clippy::all, clippy::pedantic)]

use cli::commands::fund::Fund;
use cli::commands::inspect::Inspect;
use cli::modules::settings::Settings;

use anyhow::Result;

use clap::{Parser, Subcommand};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Command-line entrypoint for the transaction builder.
#[derive(Parser, Debug)]
#[command(
    name = "txbuilder-cli",
    version,
    about = "Fund and sign transactions described by JSON request files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fund a JSON request from its UTXO pool and optionally fill every input
    Fund(Fund),
    /// Decode a raw transaction
    Inspect(Inspect),
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    logging_init();

    let parsed = Cli::parse();
    let settings = Settings::load()?;

    match parsed.command {
        Commands::Fund(fund) => fund.handle(&settings).await,
        Commands::Inspect(inspect) => inspect.handle(),
    }
}

fn logging_init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
