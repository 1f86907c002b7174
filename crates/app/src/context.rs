//! App Context

use std::sync::Arc;

use catalogue_predicates::fixtures::{Fixture, FixtureError};
use thiserror::Error;

use crate::{
    config::FixtureConfig,
    domain::{
        catalogue::{CatalogueService, StoreCatalogueService},
        promotions::{PromotionsService, StorePromotionsService},
    },
    events::EventSink,
    recalculation::{DiscountTrigger, RecalculationWorker, channel_queue},
    store::Store,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to load fixtures")]
    Fixture(#[from] FixtureError),
}

#[derive(Clone)]
pub struct AppContext {
    pub store: Store,
    pub catalogue: Arc<dyn CatalogueService>,
    pub promotions: Arc<dyn PromotionsService>,
}

impl AppContext {
    /// Build application context over a store seeded from a fixture set.
    ///
    /// The returned worker drains the recalculation queue the services feed;
    /// the caller decides whether to spawn it or drain it by hand.
    ///
    /// # Errors
    ///
    /// Returns an error when the fixture set can't be loaded.
    pub fn from_fixtures(
        config: &FixtureConfig,
        events: Arc<dyn EventSink>,
    ) -> Result<(Self, RecalculationWorker), AppInitError> {
        let fixture = Fixture::from_set_in(&config.fixtures_path, &config.fixture_set)?;

        Ok(Self::from_store(Store::from_fixture(&fixture), events))
    }

    /// Build application context over an existing store.
    #[must_use]
    pub fn from_store(store: Store, events: Arc<dyn EventSink>) -> (Self, RecalculationWorker) {
        let (queue, receiver) = channel_queue();
        let trigger = DiscountTrigger::new(Arc::new(queue));

        let context = Self {
            catalogue: Arc::new(StoreCatalogueService::new(
                store.clone(),
                trigger.clone(),
                events.clone(),
            )),
            promotions: Arc::new(StorePromotionsService::new(store.clone(), trigger, events)),
            store: store.clone(),
        };

        (context, RecalculationWorker::new(store, receiver))
    }
}
