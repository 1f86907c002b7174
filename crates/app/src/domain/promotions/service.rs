//! Promotions Service

use std::sync::Arc;

use async_trait::async_trait;
use catalogue_predicates::{
    catalogue::CatalogueInfo,
    errors::ValidationErrors,
    promotions::{Promotion, PromotionId, PromotionInput, clean_promotion_create},
    rules::{
        PromotionRule, PromotionRuleId, RuleInput, RuleUpdate, clean_rule_create,
        clean_rule_update,
    },
};
use jiff::Timestamp;
use mockall::automock;
use tracing::{Span, info, warn};
use uuid::Uuid;

use crate::{
    domain::promotions::PromotionsServiceError,
    events::{Event, EventSink},
    recalculation::DiscountTrigger,
    store::{Store, Tables},
};

#[derive(Clone)]
pub struct StorePromotionsService {
    store: Store,
    trigger: DiscountTrigger,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for StorePromotionsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorePromotionsService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl StorePromotionsService {
    #[must_use]
    pub fn new(store: Store, trigger: DiscountTrigger, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            trigger,
            events,
        }
    }
}

fn validated<T>(cleaned: Option<T>, errors: ValidationErrors) -> Result<T, PromotionsServiceError> {
    match cleaned {
        Some(cleaned) if errors.is_empty() => Ok(cleaned),
        _ => {
            warn!(errors = errors.len(), "rejected promotion rule");
            Err(errors.into())
        }
    }
}

fn promotion_mut(
    tables: &mut Tables,
    promotion: PromotionId,
) -> Result<&mut Promotion, PromotionsServiceError> {
    tables
        .promotions
        .get_mut(&promotion)
        .ok_or(PromotionsServiceError::NotFound)
}

#[async_trait]
impl PromotionsService for StorePromotionsService {
    #[tracing::instrument(
        name = "promotions.service.create_promotion",
        skip(self, input),
        fields(
            promotion_id = tracing::field::Empty,
            promotion_kind = ?input.kind,
            rule_count = input.rules.len(),
            listings_marked = tracing::field::Empty
        ),
        err
    )]
    async fn create_promotion(
        &self,
        input: PromotionInput,
    ) -> Result<Promotion, PromotionsServiceError> {
        let cleaned = clean_promotion_create(&input, Timestamp::now()).inspect_err(|errors| {
            warn!(errors = errors.len(), "rejected promotion");
        })?;
        let promotion = cleaned.into_promotion(input);

        let span = Span::current();

        span.record("promotion_id", tracing::field::display(promotion.id));

        let catalogue = promotion
            .rules
            .iter()
            .fold(CatalogueInfo::default(), |acc, rule| acc.union(&rule.catalogue()));

        let mut tables = self.store.write().await;

        tables.promotions.insert(promotion.id, promotion.clone());

        let marked = self.trigger.trigger(&mut tables, &catalogue);

        drop(tables);

        span.record("listings_marked", marked);

        self.events.call_event(&Event::PromotionCreated {
            promotion: promotion.id,
        });

        info!(promotion_id = %promotion.id, "created promotion");

        Ok(promotion)
    }

    #[tracing::instrument(
        name = "promotions.service.create_rule",
        skip(self, input),
        fields(
            promotion_id = %promotion,
            rule_id = tracing::field::Empty,
            listings_marked = tracing::field::Empty
        ),
        err
    )]
    async fn create_rule(
        &self,
        promotion: PromotionId,
        input: RuleInput,
    ) -> Result<PromotionRule, PromotionsServiceError> {
        let mut tables = self.store.write().await;
        let stored = promotion_mut(&mut tables, promotion)?;

        let mut errors = ValidationErrors::new();
        let cleaned = clean_rule_create(&input, Some(stored.kind), None, &mut errors);
        let cleaned = validated(cleaned, errors)?;

        let rule = PromotionRule::from_input(Uuid::now_v7(), input, cleaned);
        let catalogue = rule.catalogue();

        stored.rules.push(rule.clone());

        let marked = self.trigger.trigger(&mut tables, &catalogue);

        drop(tables);

        let span = Span::current();

        span.record("rule_id", tracing::field::display(rule.id));
        span.record("listings_marked", marked);

        self.events.call_event(&Event::PromotionRuleCreated {
            promotion,
            rule: rule.id,
        });

        info!(promotion_id = %promotion, rule_id = %rule.id, "created promotion rule");

        Ok(rule)
    }

    #[tracing::instrument(
        name = "promotions.service.update_rule",
        skip(self, update),
        fields(
            promotion_id = %promotion,
            rule_id = %rule,
            listings_marked = tracing::field::Empty
        ),
        err
    )]
    async fn update_rule(
        &self,
        promotion: PromotionId,
        rule: PromotionRuleId,
        update: RuleUpdate,
    ) -> Result<PromotionRule, PromotionsServiceError> {
        let mut tables = self.store.write().await;
        let stored = promotion_mut(&mut tables, promotion)?;
        let kind = stored.kind;

        let existing = stored
            .rules
            .iter_mut()
            .find(|existing| existing.id == rule)
            .ok_or(PromotionsServiceError::RuleNotFound)?;

        let mut errors = ValidationErrors::new();
        let cleaned = clean_rule_update(existing, &update, Some(kind), &mut errors);
        let cleaned = validated(cleaned, errors)?;

        let previous = existing.catalogue();

        existing.apply_update(update, cleaned);

        let updated = existing.clone();
        let catalogue = previous.union(&updated.catalogue());

        let marked = self.trigger.trigger(&mut tables, &catalogue);

        drop(tables);

        Span::current().record("listings_marked", marked);

        self.events
            .call_event(&Event::PromotionRuleUpdated { promotion, rule });

        info!(promotion_id = %promotion, rule_id = %rule, "updated promotion rule");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "promotions.service.delete_rule",
        skip(self),
        fields(
            promotion_id = %promotion,
            rule_id = %rule,
            listings_marked = tracing::field::Empty
        ),
        err
    )]
    async fn delete_rule(
        &self,
        promotion: PromotionId,
        rule: PromotionRuleId,
    ) -> Result<PromotionRule, PromotionsServiceError> {
        let mut tables = self.store.write().await;
        let stored = promotion_mut(&mut tables, promotion)?;

        let position = stored
            .rules
            .iter()
            .position(|existing| existing.id == rule)
            .ok_or(PromotionsServiceError::RuleNotFound)?;

        let removed = stored.rules.remove(position);

        let marked = self.trigger.trigger(&mut tables, &removed.catalogue());

        drop(tables);

        Span::current().record("listings_marked", marked);

        self.events
            .call_event(&Event::PromotionRuleDeleted { promotion, rule });

        info!(promotion_id = %promotion, rule_id = %rule, "deleted promotion rule");

        Ok(removed)
    }

    async fn get_promotion(
        &self,
        promotion: PromotionId,
    ) -> Result<Promotion, PromotionsServiceError> {
        self.store
            .read()
            .await
            .promotions
            .get(&promotion)
            .cloned()
            .ok_or(PromotionsServiceError::NotFound)
    }
}

#[automock]
#[async_trait]
pub trait PromotionsService: Send + Sync {
    /// Validate and store a promotion with its rules.
    async fn create_promotion(
        &self,
        input: PromotionInput,
    ) -> Result<Promotion, PromotionsServiceError>;

    /// Add a rule to an existing promotion.
    async fn create_rule(
        &self,
        promotion: PromotionId,
        input: RuleInput,
    ) -> Result<PromotionRule, PromotionsServiceError>;

    /// Apply a partial update to a rule.
    async fn update_rule(
        &self,
        promotion: PromotionId,
        rule: PromotionRuleId,
        update: RuleUpdate,
    ) -> Result<PromotionRule, PromotionsServiceError>;

    /// Remove a rule, returning it.
    async fn delete_rule(
        &self,
        promotion: PromotionId,
        rule: PromotionRuleId,
    ) -> Result<PromotionRule, PromotionsServiceError>;

    async fn get_promotion(
        &self,
        promotion: PromotionId,
    ) -> Result<Promotion, PromotionsServiceError>;
}
