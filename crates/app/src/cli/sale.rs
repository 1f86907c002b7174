use catalogue_predicates::{catalogue::CatalogueInfo, promotions::PromotionId};
use clap::{Args, Subcommand};
use jiff::Timestamp;

use catalogue_app::{config::FixtureConfig, store::Store};

#[derive(Debug, Args)]
pub(crate) struct SaleCommand {
    #[command(subcommand)]
    command: SaleSubcommand,
}

#[derive(Debug, Subcommand)]
enum SaleSubcommand {
    /// Add entries to a sale's catalogue
    Add(SaleCatalogueArgs),

    /// Remove entries from a sale's catalogue
    Remove(SaleCatalogueArgs),
}

#[derive(Debug, Args)]
struct SaleCatalogueArgs {
    /// Sale name as stored in the fixture set
    #[arg(long)]
    sale: String,

    /// Product ids
    #[arg(long = "product")]
    products: Vec<String>,

    /// Category ids
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Collection ids
    #[arg(long = "collection")]
    collections: Vec<String>,

    /// Variant ids
    #[arg(long = "variant")]
    variants: Vec<String>,

    /// Instant prices are recalculated at; now when omitted
    #[arg(long)]
    at: Option<Timestamp>,
}

impl SaleCatalogueArgs {
    fn catalogue(&self) -> CatalogueInfo {
        CatalogueInfo {
            products: self.products.iter().cloned().collect(),
            categories: self.categories.iter().cloned().collect(),
            collections: self.collections.iter().cloned().collect(),
            variants: self.variants.iter().cloned().collect(),
        }
    }
}

pub(crate) async fn run(config: &FixtureConfig, command: SaleCommand) -> Result<(), String> {
    let (context, mut worker) = super::load_context(config)?;

    let (args, adding) = match command.command {
        SaleSubcommand::Add(args) => (args, true),
        SaleSubcommand::Remove(args) => (args, false),
    };

    let sale = find_sale(&context.store, &args.sale).await?;

    let result = if adding {
        context.catalogue.add_to_sale(sale, args.catalogue()).await
    } else {
        context.catalogue.remove_from_sale(sale, args.catalogue()).await
    };

    let current = result.map_err(|error| format!("failed to edit sale {}: {error}", args.sale))?;

    let output = serde_json::to_string_pretty(&current)
        .map_err(|error| format!("failed to serialise catalogue: {error}"))?;

    println!("{output}");

    let updated = worker.drain(args.at.unwrap_or_else(Timestamp::now)).await;

    println!("recalculated {updated} listings");

    super::print_listings(&context.store).await;

    Ok(())
}

async fn find_sale(store: &Store, name: &str) -> Result<PromotionId, String> {
    store
        .read()
        .await
        .promotions
        .values()
        .find(|promotion| promotion.name == name)
        .map(|promotion| promotion.id)
        .ok_or_else(|| format!("no sale named {name}"))
}
