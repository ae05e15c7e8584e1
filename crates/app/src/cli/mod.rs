use clap::{Parser, Subcommand};
use sacola_app::{config::AppConfig, context::AppContext, observability};

mod address;
mod bag;
mod checkout;
mod menu;
mod orders;
mod payments;
mod rating;
mod render;

#[derive(Debug, Parser)]
#[command(name = "sacola", about = "Sacola storefront client", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List a restaurant's menu
    Menu(menu::MenuArgs),
    /// Show the bag and its totals
    Bag,
    /// Add an item to the bag
    Add(bag::AddArgs),
    /// Change a line's quantity; zero or less removes it
    Quantity(bag::QuantityArgs),
    /// Remove a line from the bag
    Remove(bag::RemoveArgs),
    /// Remove every line from the bag
    Clear,
    /// List payment methods and stored cards
    Methods,
    /// Look up a postal code
    Cep(address::CepArgs),
    /// Show or update the saved delivery address
    Address(address::AddressArgs),
    /// Place an order for the bag
    Checkout(checkout::CheckoutArgs),
    /// Follow an order's status
    Track(orders::TrackArgs),
    /// List past orders
    History,
    /// Rate an order or show its rating
    Rate(rating::RateArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_subscriber(&self.config.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let ctx = AppContext::from_config(&self.config)
            .map_err(|error| format!("failed to initialise client: {error}"))?;

        match self.command {
            Commands::Menu(args) => menu::run(&ctx, args).await,
            Commands::Bag => bag::show(&ctx).await,
            Commands::Add(args) => bag::add(&ctx, args).await,
            Commands::Quantity(args) => bag::quantity(&ctx, args).await,
            Commands::Remove(args) => bag::remove(&ctx, args).await,
            Commands::Clear => bag::clear(&ctx).await,
            Commands::Methods => payments::run(&ctx).await,
            Commands::Cep(args) => address::cep(&ctx, args).await,
            Commands::Address(args) => address::run(&ctx, args).await,
            Commands::Checkout(args) => checkout::run(&ctx, args).await,
            Commands::Track(args) => orders::track(&ctx, args).await,
            Commands::History => orders::history(&ctx).await,
            Commands::Rate(args) => rating::run(&ctx, args).await,
        }
    }
}
