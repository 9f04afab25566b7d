use anyhow::Result;
use bankcore::cli::Cli;
use bankcore::logging::init_logging;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.run().await
}
