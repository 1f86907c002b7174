//! Recalculation trigger.

use std::sync::Arc;

use catalogue_predicates::catalogue::CatalogueInfo;
use tracing::{debug, warn};

use crate::{domain::catalogue::repository::CatalogueRepository, store::Tables};

use super::{RecalculationJob, RecalculationQueue, recalculate_discounted_prices};

/// Marks listings dirty and schedules their recalculation.
#[derive(Clone)]
pub struct DiscountTrigger {
    queue: Arc<dyn RecalculationQueue>,
    repository: CatalogueRepository,
}

impl std::fmt::Debug for DiscountTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscountTrigger").finish_non_exhaustive()
    }
}

impl DiscountTrigger {
    #[must_use]
    pub fn new(queue: Arc<dyn RecalculationQueue>) -> Self {
        Self {
            queue,
            repository: CatalogueRepository::new(),
        }
    }

    /// Flag the listings of every product reachable from `catalogue` and
    /// enqueue a job naming the same ids. Returns the number of flagged
    /// listings; an empty catalogue does nothing.
    ///
    /// A rejected job is logged and otherwise ignored: the listings stay dirty
    /// and the next job touching them picks them up.
    pub fn trigger(&self, tables: &mut Tables, catalogue: &CatalogueInfo) -> usize {
        if catalogue.is_empty() {
            return 0;
        }

        let products = self.repository.resolve_products(tables, catalogue);
        let marked = self.repository.mark_dirty(tables, &products);

        debug!(products = products.len(), listings = marked, "marked listings dirty");

        let job = RecalculationJob::from(catalogue);

        if let Err(error) = recalculate_discounted_prices(
            self.queue.as_ref(),
            job.products,
            job.categories,
            job.collections,
            job.variants,
        ) {
            warn!(%error, listings = marked, "recalculation job rejected");
        }

        marked
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        recalculation::{MockRecalculationQueue, QueueError},
        store::Store,
        test::fixture,
    };

    #[tokio::test]
    async fn empty_catalogue_schedules_nothing() -> TestResult {
        let mut queue = MockRecalculationQueue::new();
        queue.expect_delay().never();

        let store = Store::from_fixture(&fixture()?);
        let mut tables = store.write().await;

        let marked =
            DiscountTrigger::new(Arc::new(queue)).trigger(&mut tables, &CatalogueInfo::default());

        assert_eq!(marked, 0);

        Ok(())
    }

    #[tokio::test]
    async fn category_change_marks_members_and_enqueues_ids() -> TestResult {
        let mut queue = MockRecalculationQueue::new();

        queue
            .expect_delay()
            .once()
            .withf(|job| job.categories == ["apparel"] && job.products.is_empty())
            .return_once(|_| Ok(()));

        let store = Store::from_fixture(&fixture()?);
        let mut tables = store.write().await;

        let catalogue = CatalogueInfo {
            categories: ["apparel".to_string()].into(),
            ..CatalogueInfo::default()
        };

        let marked = DiscountTrigger::new(Arc::new(queue)).trigger(&mut tables, &catalogue);

        assert_eq!(marked, 4);

        Ok(())
    }

    #[tokio::test]
    async fn closed_queue_keeps_listings_dirty() -> TestResult {
        let mut queue = MockRecalculationQueue::new();

        queue
            .expect_delay()
            .once()
            .return_once(|_| Err(QueueError::Closed));

        let store = Store::from_fixture(&fixture()?);
        let mut tables = store.write().await;

        let catalogue = CatalogueInfo {
            products: ["jeans".to_string()].into(),
            ..CatalogueInfo::default()
        };

        let marked = DiscountTrigger::new(Arc::new(queue)).trigger(&mut tables, &catalogue);

        assert_eq!(marked, 1);
        assert!(
            tables
                .listings
                .iter()
                .filter(|listing| listing.product_id == "jeans")
                .all(|listing| listing.discounted_price_dirty)
        );

        Ok(())
    }
}
