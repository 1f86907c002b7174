//! Catalogue service.
//!
//! Adds and removes catalogue entries on legacy sales (stored as a predicate
//! on the sale's single rule) and on vouchers (stored as flat id sets).

use std::sync::Arc;

use async_trait::async_trait;
use catalogue_predicates::{
    catalogue::{
        CatalogueInfo, extract_catalogue_from_predicate, merge_predicates, subtract_from_predicate,
    },
    errors::{ErrorCode, FieldError, ValidationErrors},
    predicates::{CatalogueEntity, PredicateError, clean_predicate},
    promotions::PromotionId,
    rules::PredicateKind,
    vouchers::VoucherId,
};
use mockall::automock;
use serde_json::Value;
use tracing::{Span, info, warn};

use crate::{
    domain::catalogue::{errors::CatalogueServiceError, repository::CatalogueRepository},
    events::{Event, EventSink},
    recalculation::DiscountTrigger,
    store::{Store, Tables},
};

/// Catalogue service backed by the in-memory store.
#[derive(Clone)]
pub struct StoreCatalogueService {
    store: Store,
    repository: CatalogueRepository,
    trigger: DiscountTrigger,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for StoreCatalogueService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCatalogueService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl StoreCatalogueService {
    #[must_use]
    pub fn new(store: Store, trigger: DiscountTrigger, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            repository: CatalogueRepository::new(),
            trigger,
            events,
        }
    }

    /// Reject unknown ids and products without variants, reporting all of them.
    fn validate_additions(
        &self,
        tables: &Tables,
        catalogue: &CatalogueInfo,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let missing = self.repository.missing(tables, catalogue);

        for entity in CatalogueEntity::ALL {
            let ids = missing.ids(entity);

            if !ids.is_empty() {
                errors.add(
                    entity_field(entity),
                    FieldError::new(
                        ErrorCode::NotFound,
                        format!("Couldn't resolve {} ids.", entity_field(entity)),
                    )
                    .with_ids(ids.iter().cloned()),
                );
            }
        }

        let without_variants = self
            .repository
            .products_without_variants(tables, &catalogue.products);

        if !without_variants.is_empty() {
            errors.add(
                entity_field(CatalogueEntity::Product),
                FieldError::new(
                    ErrorCode::CannotManageProductWithoutVariant,
                    "Cannot manage products without variants.",
                )
                .with_ids(without_variants),
            );
        }

        if !errors.is_empty() {
            warn!(errors = errors.len(), "rejected catalogue additions");
        }

        errors.into_result()
    }

    /// Rewrite a sale's predicate with `edit`, returning the previous and current catalogues.
    fn edit_sale<F>(
        &self,
        tables: &mut Tables,
        sale: PromotionId,
        edit: F,
    ) -> Result<(CatalogueInfo, CatalogueInfo), CatalogueServiceError>
    where
        F: FnOnce(&Value) -> Result<Value, PredicateError>,
    {
        let rule = tables
            .promotions
            .get_mut(&sale)
            .filter(|promotion| promotion.kind == PredicateKind::Catalogue)
            .and_then(|promotion| promotion.sale_rule_mut())
            .ok_or(CatalogueServiceError::SaleNotFound)?;

        let previous = extract_catalogue_from_predicate(&rule.catalogue_predicate);
        let edited = clean_predicate(&edit(&rule.catalogue_predicate)?, None)?;
        let current = extract_catalogue_from_predicate(&edited);

        rule.catalogue_predicate = edited;

        Ok((previous, current))
    }
}

fn entity_field(entity: CatalogueEntity) -> &'static str {
    match entity {
        CatalogueEntity::Product => "products",
        CatalogueEntity::Category => "categories",
        CatalogueEntity::Collection => "collections",
        CatalogueEntity::Variant => "variants",
    }
}

#[async_trait]
impl CatalogueService for StoreCatalogueService {
    #[tracing::instrument(
        name = "catalogue.service.add_to_sale",
        skip(self, catalogue),
        fields(sale_id = %sale, listings_marked = tracing::field::Empty),
        err
    )]
    async fn add_to_sale(
        &self,
        sale: PromotionId,
        catalogue: CatalogueInfo,
    ) -> Result<CatalogueInfo, CatalogueServiceError> {
        let mut tables = self.store.write().await;

        self.validate_additions(&tables, &catalogue)?;

        let (previous, current) =
            self.edit_sale(&mut tables, sale, |predicate| merge_predicates(predicate, &catalogue))?;

        let diff = CatalogueInfo::diff(&previous, &current);
        let marked = self.trigger.trigger(&mut tables, &diff.touched());

        drop(tables);

        Span::current().record("listings_marked", marked);

        if !diff.is_empty() {
            self.events.call_event(&Event::SaleUpdated {
                sale,
                previous,
                current: current.clone(),
            });
        }

        info!(sale = %sale, "added catalogue to sale");

        Ok(current)
    }

    #[tracing::instrument(
        name = "catalogue.service.remove_from_sale",
        skip(self, catalogue),
        fields(sale_id = %sale, listings_marked = tracing::field::Empty),
        err
    )]
    async fn remove_from_sale(
        &self,
        sale: PromotionId,
        catalogue: CatalogueInfo,
    ) -> Result<CatalogueInfo, CatalogueServiceError> {
        let mut tables = self.store.write().await;

        let (previous, current) = self.edit_sale(&mut tables, sale, |predicate| {
            subtract_from_predicate(predicate, &catalogue)
        })?;

        let diff = CatalogueInfo::diff(&previous, &current);
        let marked = self.trigger.trigger(&mut tables, &diff.touched());

        drop(tables);

        Span::current().record("listings_marked", marked);

        if !diff.is_empty() {
            self.events.call_event(&Event::SaleUpdated {
                sale,
                previous,
                current: current.clone(),
            });
        }

        info!(sale = %sale, "removed catalogue from sale");

        Ok(current)
    }

    #[tracing::instrument(
        name = "catalogue.service.add_to_voucher",
        skip(self, catalogue),
        fields(voucher_id = %voucher),
        err
    )]
    async fn add_to_voucher(
        &self,
        voucher: VoucherId,
        catalogue: CatalogueInfo,
    ) -> Result<CatalogueInfo, CatalogueServiceError> {
        let mut tables = self.store.write().await;

        self.validate_additions(&tables, &catalogue)?;

        let stored = tables
            .vouchers
            .get_mut(&voucher)
            .ok_or(CatalogueServiceError::VoucherNotFound)?;

        let diff = stored.add_catalogue(&catalogue);
        let current = stored.catalogue.clone();

        drop(tables);

        if !diff.is_empty() {
            self.events.call_event(&Event::VoucherUpdated { voucher, diff });
        }

        info!(voucher = %voucher, "added catalogue to voucher");

        Ok(current)
    }

    #[tracing::instrument(
        name = "catalogue.service.remove_from_voucher",
        skip(self, catalogue),
        fields(voucher_id = %voucher),
        err
    )]
    async fn remove_from_voucher(
        &self,
        voucher: VoucherId,
        catalogue: CatalogueInfo,
    ) -> Result<CatalogueInfo, CatalogueServiceError> {
        let mut tables = self.store.write().await;

        let stored = tables
            .vouchers
            .get_mut(&voucher)
            .ok_or(CatalogueServiceError::VoucherNotFound)?;

        let diff = stored.remove_catalogue(&catalogue);
        let current = stored.catalogue.clone();

        drop(tables);

        if !diff.is_empty() {
            self.events.call_event(&Event::VoucherUpdated { voucher, diff });
        }

        info!(voucher = %voucher, "removed catalogue from voucher");

        Ok(current)
    }

    async fn sale_catalogue(
        &self,
        sale: PromotionId,
    ) -> Result<CatalogueInfo, CatalogueServiceError> {
        let tables = self.store.read().await;

        tables
            .promotions
            .get(&sale)
            .filter(|promotion| promotion.kind == PredicateKind::Catalogue)
            .and_then(|promotion| promotion.sale_rule())
            .map(|rule| rule.catalogue())
            .ok_or(CatalogueServiceError::SaleNotFound)
    }
}

#[automock]
#[async_trait]
pub trait CatalogueService: Send + Sync {
    /// Add entries to a sale's catalogue, returning the resulting catalogue.
    ///
    /// Nothing is stored when any id is unknown or any product has no variant.
    async fn add_to_sale(
        &self,
        sale: PromotionId,
        catalogue: CatalogueInfo,
    ) -> Result<CatalogueInfo, CatalogueServiceError>;

    /// Remove entries from a sale's catalogue, returning the resulting catalogue.
    async fn remove_from_sale(
        &self,
        sale: PromotionId,
        catalogue: CatalogueInfo,
    ) -> Result<CatalogueInfo, CatalogueServiceError>;

    /// Add entries to a voucher's catalogue, returning the resulting catalogue.
    ///
    /// Nothing is stored when any id is unknown or any product has no variant.
    async fn add_to_voucher(
        &self,
        voucher: VoucherId,
        catalogue: CatalogueInfo,
    ) -> Result<CatalogueInfo, CatalogueServiceError>;

    /// Remove entries from a voucher's catalogue, returning the resulting catalogue.
    async fn remove_from_voucher(
        &self,
        voucher: VoucherId,
        catalogue: CatalogueInfo,
    ) -> Result<CatalogueInfo, CatalogueServiceError>;

    /// Flat catalogue of a sale, for display.
    async fn sale_catalogue(
        &self,
        sale: PromotionId,
    ) -> Result<CatalogueInfo, CatalogueServiceError>;
}

#[cfg(test)]
mod tests {
    use catalogue_predicates::predicates::IdSet;
    use testresult::TestResult;

    use super::*;
    use crate::{events::MockEventSink, test::TestContext};

    fn ids(values: &[&str]) -> IdSet {
        values.iter().map(ToString::to_string).collect()
    }

    fn products(values: &[&str]) -> CatalogueInfo {
        CatalogueInfo {
            products: ids(values),
            ..CatalogueInfo::default()
        }
    }

    #[tokio::test]
    async fn add_to_voucher_rejects_product_without_variants() -> TestResult {
        let ctx = TestContext::new()?;
        let voucher = ctx.voucher_id("welcome")?;

        let result = ctx
            .catalogue
            .add_to_voucher(voucher, products(&["tshirt", "gift-card"]))
            .await;

        let Err(CatalogueServiceError::Validation(errors)) = result else {
            panic!("expected validation error, got {result:?}");
        };

        let reported = errors.get("products");

        assert_eq!(reported.len(), 1);
        assert_eq!(
            reported.first().map(|error| error.code),
            Some(ErrorCode::CannotManageProductWithoutVariant)
        );
        assert_eq!(
            reported.first().map(|error| error.params.ids.clone()),
            Some(vec!["gift-card".to_string()])
        );

        let tables = ctx.store.read().await;
        let stored = tables.vouchers.get(&voucher).ok_or("voucher vanished")?;

        assert!(stored.catalogue.products.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn add_to_voucher_reports_unknown_ids_per_field() -> TestResult {
        let ctx = TestContext::new()?;
        let voucher = ctx.voucher_id("welcome")?;

        let catalogue = CatalogueInfo {
            categories: ids(&["ghost-category"]),
            variants: ids(&["ghost-variant", "tshirt-s"]),
            ..CatalogueInfo::default()
        };

        let result = ctx.catalogue.add_to_voucher(voucher, catalogue).await;

        let Err(CatalogueServiceError::Validation(errors)) = result else {
            panic!("expected validation error, got {result:?}");
        };

        assert!(errors.has("categories", ErrorCode::NotFound));
        assert_eq!(
            errors.get("variants").first().map(|error| error.params.ids.clone()),
            Some(vec!["ghost-variant".to_string()])
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_to_sale_merges_and_schedules_recalculation() -> TestResult {
        let mut ctx = TestContext::new()?;
        let sale = ctx.promotion_id("summer-sale")?;

        let current = ctx.catalogue.add_to_sale(sale, products(&["hoodie"])).await?;

        assert_eq!(current.products, ids(&["hoodie"]));
        assert_eq!(current.collections, ids(&["summer"]));

        let job = ctx.jobs.try_recv()?;

        assert_eq!(job.products, ["hoodie"]);

        let tables = ctx.store.read().await;

        assert!(
            tables
                .listings
                .iter()
                .filter(|listing| listing.product_id == "hoodie")
                .all(|listing| listing.discounted_price_dirty)
        );

        Ok(())
    }

    #[tokio::test]
    async fn closed_queue_still_stores_sale_and_fires_event() -> TestResult {
        let mut events = MockEventSink::new();

        events
            .expect_call_event()
            .withf(|event| matches!(event, Event::SaleUpdated { .. }))
            .once()
            .return_const(());

        let mut ctx = TestContext::with_events(Arc::new(events))?;
        let sale = ctx.promotion_id("summer-sale")?;

        ctx.jobs.close();

        let current = ctx.catalogue.add_to_sale(sale, products(&["hoodie"])).await?;

        assert_eq!(current.products, ids(&["hoodie"]));

        let tables = ctx.store.read().await;
        let stored = tables
            .promotions
            .get(&sale)
            .and_then(|promotion| promotion.sale_rule())
            .map(|rule| extract_catalogue_from_predicate(&rule.catalogue_predicate));

        assert_eq!(stored, Some(current));
        assert!(
            tables
                .listings
                .iter()
                .filter(|listing| listing.product_id == "hoodie")
                .all(|listing| listing.discounted_price_dirty)
        );

        Ok(())
    }

    #[tokio::test]
    async fn adding_same_products_twice_changes_nothing_the_second_time() -> TestResult {
        let mut ctx = TestContext::new()?;
        let sale = ctx.promotion_id("summer-sale")?;

        let first = ctx.catalogue.add_to_sale(sale, products(&["hoodie"])).await?;
        let second = ctx.catalogue.add_to_sale(sale, products(&["hoodie"])).await?;

        assert_eq!(first, second);
        assert!(ctx.jobs.try_recv().is_ok());
        assert!(ctx.jobs.try_recv().is_err());

        Ok(())
    }

    #[tokio::test]
    async fn remove_from_sale_drops_emptied_filters() -> TestResult {
        let ctx = TestContext::new()?;
        let sale = ctx.promotion_id("summer-sale")?;

        let removed = CatalogueInfo {
            collections: ids(&["summer"]),
            ..CatalogueInfo::default()
        };

        let current = ctx.catalogue.remove_from_sale(sale, removed).await?;

        assert_eq!(current.variants, ids(&["jeans-34"]));
        assert!(current.collections.is_empty());

        let tables = ctx.store.read().await;
        let predicate = tables
            .promotions
            .get(&sale)
            .and_then(|promotion| promotion.sale_rule())
            .map(|rule| rule.catalogue_predicate.clone());

        assert_eq!(
            predicate,
            Some(serde_json::json!({"OR": [{"variantPredicate": {"ids": ["jeans-34"]}}]}))
        );

        Ok(())
    }

    #[tokio::test]
    async fn editing_non_catalogue_shaped_predicate_fails() -> TestResult {
        let ctx = TestContext::new()?;
        let promotion = ctx.promotion_id("denim-deal")?;

        let result = ctx.catalogue.add_to_sale(promotion, products(&["hoodie"])).await;

        assert!(matches!(
            result,
            Err(CatalogueServiceError::Predicate(PredicateError::NotCatalogueShaped))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_sale_is_not_found() -> TestResult {
        let ctx = TestContext::new()?;

        let result = ctx.catalogue.sale_catalogue(uuid::Uuid::nil()).await;

        assert!(matches!(result, Err(CatalogueServiceError::SaleNotFound)));

        Ok(())
    }
}
