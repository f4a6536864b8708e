use clap::{Args, Subcommand};

mod quote;

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// Print a product's tier table and the unit price at a quantity
    Quote(quote::QuoteArgs),
}

pub(crate) async fn run(command: CatalogCommand) -> Result<(), String> {
    match command.command {
        CatalogSubcommand::Quote(args) => quote::run(args).await,
    }
}
