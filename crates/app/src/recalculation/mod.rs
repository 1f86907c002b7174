//! Discount Recalculation
//!
//! Catalogue changes mark the affected channel listings dirty and hand a job
//! to a queue. A worker later recomputes the discounted prices and clears the
//! flags. Delivery is FIFO per queue; jobs touching the same products race
//! and the last one to finish wins, which is safe because processing a job is
//! idempotent.

use catalogue_predicates::catalogue::CatalogueInfo;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod queue;
mod trigger;
mod worker;

pub use queue::{ChannelQueue, channel_queue};
pub use trigger::DiscountTrigger;
pub use worker::RecalculationWorker;

/// Ids whose products need their discounted prices recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationJob {
    /// Product ids.
    pub products: Vec<String>,

    /// Category ids.
    pub categories: Vec<String>,

    /// Collection ids.
    pub collections: Vec<String>,

    /// Variant ids.
    pub variants: Vec<String>,
}

impl RecalculationJob {
    /// Whether the job names nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.categories.is_empty()
            && self.collections.is_empty()
            && self.variants.is_empty()
    }

    /// The ids as a catalogue.
    #[must_use]
    pub fn catalogue(&self) -> CatalogueInfo {
        CatalogueInfo {
            products: self.products.iter().cloned().collect(),
            categories: self.categories.iter().cloned().collect(),
            collections: self.collections.iter().cloned().collect(),
            variants: self.variants.iter().cloned().collect(),
        }
    }
}

impl From<&CatalogueInfo> for RecalculationJob {
    fn from(catalogue: &CatalogueInfo) -> Self {
        Self {
            products: catalogue.products.iter().cloned().collect(),
            categories: catalogue.categories.iter().cloned().collect(),
            collections: catalogue.collections.iter().cloned().collect(),
            variants: catalogue.variants.iter().cloned().collect(),
        }
    }
}

/// Errors raised while enqueueing a job.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// Nothing consumes the queue any more.
    #[error("recalculation queue is closed")]
    Closed,
}

/// Accepts jobs and returns immediately.
#[automock]
pub trait RecalculationQueue: Send + Sync {
    /// Enqueue `job` for asynchronous processing.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] when the job can't be accepted.
    fn delay(&self, job: RecalculationJob) -> Result<(), QueueError>;
}

/// Schedule recalculation of every product reachable from the given ids.
///
/// # Errors
///
/// Returns an error when the queue rejects the job.
pub fn recalculate_discounted_prices(
    queue: &dyn RecalculationQueue,
    products: Vec<String>,
    categories: Vec<String>,
    collections: Vec<String>,
    variants: Vec<String>,
) -> Result<(), QueueError> {
    queue.delay(RecalculationJob {
        products,
        categories,
        collections,
        variants,
    })
}
