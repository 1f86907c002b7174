use std::sync::Arc;

use catalogue_app::{
    config::{FixtureConfig, LoggingConfig},
    context::AppContext,
    events::{Subscribers, TracingEventSink},
    recalculation::RecalculationWorker,
    store::Store,
};
use clap::{Parser, Subcommand};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

mod predicate;
mod recalculate;
mod sale;

#[derive(Debug, Parser)]
#[command(name = "catalogue-app", about = "Discount catalogue CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    fixtures: FixtureConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Predicate(predicate::PredicateCommand),
    Sale(sale::SaleCommand),
    Recalculate(recalculate::RecalculateArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Predicate(command) => predicate::run(command),
            Commands::Sale(command) => sale::run(&self.fixtures, command).await,
            Commands::Recalculate(args) => recalculate::run(&self.fixtures, args).await,
        }
    }
}

fn load_context(config: &FixtureConfig) -> Result<(AppContext, RecalculationWorker), String> {
    let events = Subscribers::new().with(Arc::new(TracingEventSink));

    AppContext::from_fixtures(config, Arc::new(events))
        .map_err(|error| format!("failed to load fixture set {}: {error}", config.fixture_set))
}

async fn print_listings(store: &Store) {
    let tables = store.read().await;
    let mut builder = Builder::default();

    builder.push_record(["Product", "Channel", "Price", "Discounted Price", "Dirty"]);

    for listing in &tables.listings {
        builder.push_record([
            listing.product_id.clone(),
            listing.channel_id.clone(),
            listing.price.to_string(),
            listing.discounted_price.to_string(),
            if listing.discounted_price_dirty { "yes" } else { "" }.to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..4), Alignment::right());

    println!("{table}");
}
