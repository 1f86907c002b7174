//! Recalculation worker.

use catalogue_predicates::pricing::best_discounted_price;
use jiff::Timestamp;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::{domain::catalogue::repository::CatalogueRepository, store::Store};

use super::RecalculationJob;

/// Drains the queue and recomputes discounted prices.
#[derive(Debug)]
pub struct RecalculationWorker {
    store: Store,
    receiver: UnboundedReceiver<RecalculationJob>,
    repository: CatalogueRepository,
}

impl RecalculationWorker {
    #[must_use]
    pub fn new(store: Store, receiver: UnboundedReceiver<RecalculationJob>) -> Self {
        Self {
            store,
            receiver,
            repository: CatalogueRepository::new(),
        }
    }

    /// Process jobs in arrival order until every queue handle is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            let updated = self.process(&job, Timestamp::now()).await;

            info!(listings = updated, "recalculated discounted prices");
        }
    }

    /// Process every job already queued, without waiting for more.
    pub async fn drain(&mut self, now: Timestamp) -> usize {
        let mut updated = 0;

        while let Ok(job) = self.receiver.try_recv() {
            updated += self.process(&job, now).await;
        }

        updated
    }

    /// Recompute the listings of every product reachable from `job` as of
    /// `now` and clear their dirty flags. Returns the number of listings
    /// written.
    #[tracing::instrument(
        name = "recalculation.worker.process",
        skip(self, job),
        fields(
            products = job.products.len(),
            categories = job.categories.len(),
            collections = job.collections.len(),
            variants = job.variants.len()
        )
    )]
    pub async fn process(&self, job: &RecalculationJob, now: Timestamp) -> usize {
        let mut tables = self.store.write().await;

        let products = self.repository.resolve_products(&tables, &job.catalogue());
        let tables = &mut *tables;
        let mut updated = 0;

        for listing in &mut tables.listings {
            if !products.contains(&listing.product_id) {
                continue;
            }

            let Some(product) = tables.products.get(&listing.product_id) else {
                continue;
            };

            listing.discounted_price = best_discounted_price(
                listing.price,
                &product.facts(),
                &listing.channel_id,
                tables.promotions.values(),
                now,
            );
            listing.discounted_price_dirty = false;
            updated += 1;

            debug!(
                product = %listing.product_id,
                channel = %listing.channel_id,
                discounted_price = %listing.discounted_price,
                "updated listing"
            );
        }

        updated
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use catalogue_predicates::catalogue::CatalogueInfo;
    use rusty_money::{Money, iso};
    use testresult::TestResult;

    use super::*;
    use crate::{
        recalculation::{DiscountTrigger, channel_queue},
        store::Store,
        test::fixture,
    };

    fn midsummer() -> Result<Timestamp, jiff::Error> {
        "2024-07-01T00:00:00Z".parse()
    }

    #[tokio::test]
    async fn processing_clears_dirty_flags_and_applies_best_discount() -> TestResult {
        let store = Store::from_fixture(&fixture()?);
        let (queue, receiver) = channel_queue();
        let mut worker = RecalculationWorker::new(store.clone(), receiver);

        let catalogue = CatalogueInfo {
            categories: ["denim".to_string()].into(),
            collections: ["summer".to_string()].into(),
            ..CatalogueInfo::default()
        };

        {
            let mut tables = store.write().await;
            DiscountTrigger::new(Arc::new(queue)).trigger(&mut tables, &catalogue);
        }

        assert_eq!(worker.drain(midsummer()?).await, 3);

        let tables = store.read().await;

        assert!(tables.listings.iter().all(|listing| !listing.discounted_price_dirty));

        let price = |product: &str, channel: &str| {
            tables
                .listings
                .iter()
                .find(|listing| listing.product_id == product && listing.channel_id == channel)
                .map(|listing| listing.discounted_price)
        };

        assert_eq!(price("tshirt", "default-channel"), Some(Money::from_minor(1000, iso::USD)));
        assert_eq!(price("tshirt", "channel-eur"), Some(Money::from_minor(880, iso::EUR)));
        assert_eq!(price("jeans", "default-channel"), Some(Money::from_minor(4800, iso::USD)));

        Ok(())
    }

    #[tokio::test]
    async fn processing_twice_gives_the_same_prices() -> TestResult {
        let store = Store::from_fixture(&fixture()?);
        let (_queue, receiver) = channel_queue();
        let worker = RecalculationWorker::new(store.clone(), receiver);

        let job = RecalculationJob {
            products: vec!["jeans".to_string(), "tshirt".to_string()],
            ..RecalculationJob::default()
        };

        worker.process(&job, midsummer()?).await;
        let first = store.read().await.listings.clone();

        worker.process(&job, midsummer()?).await;
        let second = store.read().await.listings.clone();

        assert_eq!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn run_stops_when_queue_is_dropped() -> TestResult {
        let store = Store::from_fixture(&fixture()?);
        let (queue, receiver) = channel_queue();
        let worker = RecalculationWorker::new(store, receiver);

        let handle = tokio::spawn(worker.run());

        drop(queue);

        handle.await?;

        Ok(())
    }
}
