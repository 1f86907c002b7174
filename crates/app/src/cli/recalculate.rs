use catalogue_app::{config::FixtureConfig, recalculation::RecalculationJob};
use clap::Args;
use jiff::Timestamp;

#[derive(Debug, Args)]
pub(crate) struct RecalculateArgs {
    /// Instant prices are recalculated at; now when omitted
    #[arg(long)]
    at: Option<Timestamp>,
}

pub(crate) async fn run(config: &FixtureConfig, args: RecalculateArgs) -> Result<(), String> {
    let (context, worker) = super::load_context(config)?;

    let job = RecalculationJob {
        products: context.store.read().await.products.keys().cloned().collect(),
        ..RecalculationJob::default()
    };

    let updated = worker
        .process(&job, args.at.unwrap_or_else(Timestamp::now))
        .await;

    println!("recalculated {updated} listings");

    super::print_listings(&context.store).await;

    Ok(())
}
