//! In-memory storage
//!
//! All tables live behind one `RwLock`. Holding the write guard is the
//! equivalent of a transaction: services validate, mutate and mark listings
//! dirty under a single guard.

use std::{collections::BTreeMap, sync::Arc};

use catalogue_predicates::{
    channels::Channel,
    fixtures::Fixture,
    predicates::IdSet,
    products::{Product, ProductChannelListing},
    promotions::{Promotion, PromotionId},
    vouchers::{Voucher, VoucherId},
};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Stored catalogue, promotions and vouchers.
#[derive(Debug, Default)]
pub struct Tables {
    /// Channels by id.
    pub channels: BTreeMap<String, Channel>,

    /// Products by id.
    pub products: BTreeMap<String, Product>,

    /// Known category ids.
    pub categories: IdSet,

    /// Known collection ids.
    pub collections: IdSet,

    /// Product channel listings.
    pub listings: Vec<ProductChannelListing>,

    /// Promotions by id, legacy sales included.
    pub promotions: BTreeMap<PromotionId, Promotion>,

    /// Vouchers by id.
    pub vouchers: BTreeMap<VoucherId, Voucher>,
}

impl Tables {
    /// Add a product, registering its category and collections.
    pub fn insert_product(&mut self, product: Product) {
        if let Some(category) = &product.category {
            self.categories.insert(category.clone());
        }

        self.collections.extend(product.collections.iter().cloned());
        self.products.insert(product.id.clone(), product);
    }

    /// Product owning `variant`.
    #[must_use]
    pub fn variant_owner(&self, variant: &str) -> Option<&Product> {
        self.products
            .values()
            .find(|product| product.variants.contains(variant))
    }
}

/// Shared handle to the tables.
#[derive(Debug, Clone, Default)]
pub struct Store {
    tables: Arc<RwLock<Tables>>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from a loaded fixture set.
    #[must_use]
    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut tables = Tables::default();

        for channel in fixture.channels() {
            tables.channels.insert(channel.id.clone(), channel.clone());
        }

        for product in fixture.products() {
            tables.insert_product(product.clone());
        }

        tables.listings = fixture.listings().to_vec();

        for promotion in fixture.promotions() {
            tables.promotions.insert(promotion.id, promotion.clone());
        }

        for voucher in fixture.vouchers() {
            tables.vouchers.insert(voucher.id, voucher.clone());
        }

        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// Shared access to the tables.
    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    /// Exclusive access to the tables.
    pub async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::test::fixture;

    #[tokio::test]
    async fn from_fixture_registers_categories_and_collections() -> TestResult {
        let store = Store::from_fixture(&fixture()?);
        let tables = store.read().await;

        assert_eq!(tables.products.len(), 4);
        assert!(tables.categories.contains("denim"));
        assert!(tables.collections.contains("summer"));
        assert_eq!(
            tables.variant_owner("jeans-34").map(|product| product.id.as_str()),
            Some("jeans")
        );

        Ok(())
    }
}
