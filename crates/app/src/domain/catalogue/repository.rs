//! Catalogue Repository

use catalogue_predicates::{catalogue::CatalogueInfo, predicates::IdSet};

use crate::store::Tables;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CatalogueRepository;

impl CatalogueRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Ids in `catalogue` that don't resolve, per entity field.
    pub(crate) fn missing(&self, tables: &Tables, catalogue: &CatalogueInfo) -> CatalogueInfo {
        CatalogueInfo {
            products: catalogue
                .products
                .iter()
                .filter(|id| !tables.products.contains_key(*id))
                .cloned()
                .collect(),
            categories: catalogue.categories.difference(&tables.categories).cloned().collect(),
            collections: catalogue.collections.difference(&tables.collections).cloned().collect(),
            variants: catalogue
                .variants
                .iter()
                .filter(|id| tables.variant_owner(id).is_none())
                .cloned()
                .collect(),
        }
    }

    /// Products in `ids` that exist but have no variant.
    pub(crate) fn products_without_variants(&self, tables: &Tables, ids: &IdSet) -> IdSet {
        ids.iter()
            .filter(|id| {
                tables
                    .products
                    .get(*id)
                    .is_some_and(|product| !product.has_variants())
            })
            .cloned()
            .collect()
    }

    /// Every product reachable from `catalogue`: named products, members of
    /// named categories and collections, and owners of named variants.
    pub(crate) fn resolve_products(&self, tables: &Tables, catalogue: &CatalogueInfo) -> IdSet {
        tables
            .products
            .values()
            .filter(|product| {
                catalogue.products.contains(&product.id)
                    || product
                        .category
                        .as_ref()
                        .is_some_and(|category| catalogue.categories.contains(category))
                    || !product.collections.is_disjoint(&catalogue.collections)
                    || !product.variants.is_disjoint(&catalogue.variants)
            })
            .map(|product| product.id.clone())
            .collect()
    }

    /// Flag every listing of `products` as stale, returning how many were flagged.
    pub(crate) fn mark_dirty(&self, tables: &mut Tables, products: &IdSet) -> usize {
        let mut marked = 0;

        for listing in &mut tables.listings {
            if products.contains(&listing.product_id) {
                listing.discounted_price_dirty = true;
                marked += 1;
            }
        }

        marked
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{store::Store, test::fixture};

    fn ids(values: &[&str]) -> IdSet {
        values.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn resolves_products_through_every_entity() -> TestResult {
        let store = Store::from_fixture(&fixture()?);
        let tables = store.read().await;
        let repository = CatalogueRepository::new();

        let by_collection = CatalogueInfo {
            collections: ids(&["summer"]),
            ..CatalogueInfo::default()
        };

        let by_variant_and_category = CatalogueInfo {
            categories: ids(&["gift-cards"]),
            variants: ids(&["hoodie-m"]),
            ..CatalogueInfo::default()
        };

        assert_eq!(repository.resolve_products(&tables, &by_collection), ids(&["tshirt"]));
        assert_eq!(
            repository.resolve_products(&tables, &by_variant_and_category),
            ids(&["gift-card", "hoodie"])
        );

        Ok(())
    }

    #[tokio::test]
    async fn reports_missing_ids_and_products_without_variants() -> TestResult {
        let store = Store::from_fixture(&fixture()?);
        let tables = store.read().await;
        let repository = CatalogueRepository::new();

        let catalogue = CatalogueInfo {
            products: ids(&["tshirt", "ghost"]),
            variants: ids(&["tshirt-s", "ghost-1"]),
            ..CatalogueInfo::default()
        };

        let missing = repository.missing(&tables, &catalogue);

        assert_eq!(missing.products, ids(&["ghost"]));
        assert_eq!(missing.variants, ids(&["ghost-1"]));
        assert_eq!(
            repository.products_without_variants(&tables, &ids(&["tshirt", "gift-card"])),
            ids(&["gift-card"])
        );

        Ok(())
    }

    #[tokio::test]
    async fn marks_every_channel_listing_of_a_product() -> TestResult {
        let store = Store::from_fixture(&fixture()?);
        let mut tables = store.write().await;

        let marked = CatalogueRepository::new().mark_dirty(&mut tables, &ids(&["tshirt"]));

        assert_eq!(marked, 2);
        assert!(
            tables
                .listings
                .iter()
                .filter(|listing| listing.discounted_price_dirty)
                .all(|listing| listing.product_id == "tshirt")
        );

        Ok(())
    }
}
