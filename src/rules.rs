//! Promotion Rules
//!
//! A rule carries exactly one predicate kind (catalogue or checkout/order)
//! and the reward granted when it matches.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    catalogue::{CatalogueInfo, empty_predicate, extract_catalogue_from_predicate},
    channels::Channel,
    errors::{ErrorCode, FieldError, ValidationErrors},
    predicates::{CataloguePredicate, clean_predicate, is_empty_predicate},
    rewards::{clean_reward_create, clean_reward_update},
};

/// Field names used when attributing rule errors.
pub mod fields {
    /// Catalogue predicate input.
    pub const CATALOGUE_PREDICATE: &str = "catalogue_predicate";

    /// Checkout and order predicate input.
    pub const ORDER_PREDICATE: &str = "order_predicate";

    /// Reward type input.
    pub const REWARD_TYPE: &str = "reward_type";

    /// Reward value type input.
    pub const REWARD_VALUE_TYPE: &str = "reward_value_type";

    /// Reward value input.
    pub const REWARD_VALUE: &str = "reward_value";

    /// Channels on rule creation.
    pub const CHANNELS: &str = "channels";

    /// Channels added on update.
    pub const ADD_CHANNELS: &str = "add_channels";

    /// Channels removed on update.
    pub const REMOVE_CHANNELS: &str = "remove_channels";
}

/// How the reward value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardValueType {
    /// Fixed amount in the channel currency.
    Fixed,

    /// Percentage of the price.
    Percentage,
}

/// What an order rule rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardType {
    /// Discount on the checkout subtotal.
    SubtotalDiscount,

    /// Free gift line; carries no reward value.
    Gift,
}

/// Which predicate a rule (or every rule of a promotion) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    /// Catalogue predicate: discounts product prices.
    Catalogue,

    /// Checkout and order predicate: discounts checkouts and orders.
    Order,
}

/// Rule id.
pub type PromotionRuleId = Uuid;

/// Stored promotion rule.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionRule {
    /// Rule id.
    pub id: PromotionRuleId,

    /// Optional display name.
    pub name: Option<String>,

    /// Normalized catalogue predicate, `{}` when unset.
    pub catalogue_predicate: Value,

    /// Normalized checkout and order predicate, `{}` when unset.
    pub order_predicate: Value,

    /// Reward value type.
    pub reward_value_type: Option<RewardValueType>,

    /// Reward value.
    pub reward_value: Option<Decimal>,

    /// Reward type, order rules only.
    pub reward_type: Option<RewardType>,

    /// Channels the rule applies in.
    pub channels: Vec<Channel>,
}

impl PromotionRule {
    /// An empty rule with the given id.
    #[must_use]
    pub fn new(id: PromotionRuleId) -> Self {
        Self {
            id,
            name: None,
            catalogue_predicate: empty_predicate(),
            order_predicate: empty_predicate(),
            reward_value_type: None,
            reward_value: None,
            reward_type: None,
            channels: Vec::new(),
        }
    }

    /// Build a rule from validated input.
    #[must_use]
    pub fn from_input(id: PromotionRuleId, input: RuleInput, cleaned: CleanedRule) -> Self {
        Self {
            id,
            name: input.name,
            catalogue_predicate: cleaned.catalogue_predicate,
            order_predicate: cleaned.order_predicate,
            reward_value_type: input.reward_value_type,
            reward_value: input.reward_value,
            reward_type: input.reward_type,
            channels: input.channels,
        }
    }

    /// Apply a validated update in place.
    pub fn apply_update(&mut self, update: RuleUpdate, cleaned: CleanedRule) {
        self.catalogue_predicate = cleaned.catalogue_predicate;
        self.order_predicate = cleaned.order_predicate;
        self.channels = final_channels(&self.channels, &update);

        if let Some(name) = update.name {
            self.name = Some(name);
        }

        if let Some(reward_value_type) = update.reward_value_type {
            self.reward_value_type = Some(reward_value_type);
        }

        if let Some(reward_value) = update.reward_value {
            self.reward_value = Some(reward_value);
        }

        if let Some(reward_type) = update.reward_type {
            self.reward_type = Some(reward_type);
        }
    }

    /// Predicate kind in use, `None` for a rule without predicates.
    #[must_use]
    pub fn kind(&self) -> Option<PredicateKind> {
        predicate_kind(&self.catalogue_predicate, &self.order_predicate)
    }

    /// Flat catalogue mentioned by the catalogue predicate.
    #[must_use]
    pub fn catalogue(&self) -> CatalogueInfo {
        extract_catalogue_from_predicate(&self.catalogue_predicate)
    }

    /// Whether the rule applies in `channel_id`.
    #[must_use]
    pub fn has_channel(&self, channel_id: &str) -> bool {
        self.channels.iter().any(|channel| channel.id == channel_id)
    }
}

/// Rule creation input. `None` means the field was not supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleInput {
    /// Display name.
    pub name: Option<String>,

    /// Raw catalogue predicate.
    pub catalogue_predicate: Option<Value>,

    /// Raw checkout and order predicate.
    pub order_predicate: Option<Value>,

    /// Reward value type.
    pub reward_value_type: Option<RewardValueType>,

    /// Reward value.
    pub reward_value: Option<Decimal>,

    /// Reward type.
    pub reward_type: Option<RewardType>,

    /// Channels to attach.
    pub channels: Vec<Channel>,
}

/// Partial rule update. `None` means the field was not supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleUpdate {
    /// Display name.
    pub name: Option<String>,

    /// Replacement catalogue predicate.
    pub catalogue_predicate: Option<Value>,

    /// Replacement checkout and order predicate.
    pub order_predicate: Option<Value>,

    /// Replacement reward value type.
    pub reward_value_type: Option<RewardValueType>,

    /// Replacement reward value.
    pub reward_value: Option<Decimal>,

    /// Replacement reward type.
    pub reward_type: Option<RewardType>,

    /// Channels to attach.
    pub add_channels: Option<Vec<Channel>>,

    /// Ids of channels to detach.
    pub remove_channels: Option<Vec<String>>,
}

/// Normalized predicates of a rule that passed structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRule {
    /// Normalized catalogue predicate, `{}` when unset.
    pub catalogue_predicate: Value,

    /// Normalized order predicate, `{}` when unset.
    pub order_predicate: Value,
}

impl CleanedRule {
    /// Predicate kind of the cleaned rule.
    #[must_use]
    pub fn kind(&self) -> Option<PredicateKind> {
        predicate_kind(&self.catalogue_predicate, &self.order_predicate)
    }
}

fn predicate_kind(catalogue: &Value, order: &Value) -> Option<PredicateKind> {
    if !is_empty_predicate(catalogue) {
        Some(PredicateKind::Catalogue)
    } else if !is_empty_predicate(order) {
        Some(PredicateKind::Order)
    } else {
        None
    }
}

fn supplied(predicate: Option<&Value>) -> bool {
    predicate.is_some_and(|predicate| !is_empty_predicate(predicate))
}

/// Channels a rule ends up with after `update`: existing, minus removed, plus added.
#[must_use]
pub fn final_channels(existing: &[Channel], update: &RuleUpdate) -> Vec<Channel> {
    let removed = update.remove_channels.as_deref().unwrap_or_default();

    let mut channels: Vec<Channel> = existing
        .iter()
        .filter(|channel| !removed.contains(&channel.id))
        .cloned()
        .collect();

    for channel in update.add_channels.iter().flatten() {
        if !channels.iter().any(|existing| existing.id == channel.id) {
            channels.push(channel.clone());
        }
    }

    channels
}

/// Validate a new rule.
///
/// `promotion_kind` is the kind of the parent promotion; `index` locates the
/// rule in bulk inputs. Problems are recorded in `errors`. Structural failures
/// (mixed predicates, malformed predicate) skip the reward checks and return
/// `None`.
pub fn clean_rule_create(
    input: &RuleInput,
    promotion_kind: Option<PredicateKind>,
    index: Option<usize>,
    errors: &mut ValidationErrors,
) -> Option<CleanedRule> {
    let catalogue = input.catalogue_predicate.as_ref();
    let order = input.order_predicate.as_ref();

    if supplied(catalogue) && supplied(order) {
        add_mixed_predicates(errors, true, true, index);
        return None;
    }

    let cleaned = clean_predicates(
        catalogue,
        order,
        input.reward_type.is_some(),
        input.reward_type.is_some(),
        promotion_kind,
        index,
        errors,
    )?;

    if input.reward_type != Some(RewardType::Gift) {
        clean_reward_create(input, cleaned.kind().is_some(), index, errors);
    }

    Some(cleaned)
}

/// Validate a partial update of `rule`.
///
/// Fields missing from `update` are taken from `rule` before validating, so
/// the combined result is what gets checked.
pub fn clean_rule_update(
    rule: &PromotionRule,
    update: &RuleUpdate,
    promotion_kind: Option<PredicateKind>,
    errors: &mut ValidationErrors,
) -> Option<CleanedRule> {
    let catalogue = update
        .catalogue_predicate
        .as_ref()
        .unwrap_or(&rule.catalogue_predicate);

    let order = update
        .order_predicate
        .as_ref()
        .unwrap_or(&rule.order_predicate);

    if supplied(Some(catalogue)) && supplied(Some(order)) {
        add_mixed_predicates(
            errors,
            update.catalogue_predicate.is_some(),
            update.order_predicate.is_some(),
            None,
        );
        return None;
    }

    let reward_type = update.reward_type.or(rule.reward_type);

    let cleaned = clean_predicates(
        Some(catalogue),
        Some(order),
        update.reward_type.is_some(),
        reward_type.is_some(),
        promotion_kind,
        None,
        errors,
    )?;

    if reward_type != Some(RewardType::Gift) {
        clean_reward_update(rule, update, cleaned.kind().is_some(), errors);
    }

    Some(cleaned)
}

fn add_mixed_predicates(
    errors: &mut ValidationErrors,
    catalogue_supplied: bool,
    order_supplied: bool,
    index: Option<usize>,
) {
    let message = "Only one of catalogue_predicate and order_predicate can be set.";

    for (field, was_supplied) in [
        (fields::CATALOGUE_PREDICATE, catalogue_supplied),
        (fields::ORDER_PREDICATE, order_supplied),
    ] {
        if was_supplied {
            errors.add(
                field,
                FieldError::new(ErrorCode::MixedPredicates, message).with_index(index),
            );
        }
    }
}

fn clean_predicates(
    catalogue: Option<&Value>,
    order: Option<&Value>,
    reward_type_supplied: bool,
    reward_type_set: bool,
    promotion_kind: Option<PredicateKind>,
    index: Option<usize>,
    errors: &mut ValidationErrors,
) -> Option<CleanedRule> {
    let mut cleaned = CleanedRule {
        catalogue_predicate: empty_predicate(),
        order_predicate: empty_predicate(),
    };

    if let Some(catalogue) = catalogue.filter(|predicate| !is_empty_predicate(predicate)) {
        let normalized = clean_predicate(catalogue, index)
            .and_then(|normalized| {
                CataloguePredicate::try_from(&normalized).map(|_typed| normalized)
            });

        match normalized {
            Ok(normalized) => cleaned.catalogue_predicate = normalized,
            Err(error) => {
                errors.add(fields::CATALOGUE_PREDICATE, FieldError::from(error).with_index(index));
                return None;
            }
        }

        if reward_type_supplied {
            errors.add(
                fields::REWARD_TYPE,
                FieldError::new(
                    ErrorCode::Invalid,
                    "reward_type can't be set for rules with catalogue_predicate.",
                )
                .with_index(index),
            );
        }

        if promotion_kind == Some(PredicateKind::Order) {
            errors.add(
                fields::CATALOGUE_PREDICATE,
                mixed_promotion_predicates(index),
            );
        }
    } else if let Some(order) = order.filter(|predicate| !is_empty_predicate(predicate)) {
        match clean_predicate(order, index) {
            Ok(normalized) => cleaned.order_predicate = normalized,
            Err(error) => {
                errors.add(fields::ORDER_PREDICATE, FieldError::from(error).with_index(index));
                return None;
            }
        }

        if !reward_type_set {
            errors.add(
                fields::REWARD_TYPE,
                FieldError::new(
                    ErrorCode::Required,
                    "reward_type is required for rules with order_predicate.",
                )
                .with_index(index),
            );
        }

        if promotion_kind == Some(PredicateKind::Catalogue) {
            errors.add(fields::ORDER_PREDICATE, mixed_promotion_predicates(index));
        }
    }

    Some(cleaned)
}

fn mixed_promotion_predicates(index: Option<usize>) -> FieldError {
    FieldError::new(
        ErrorCode::MixedPromotionPredicates,
        "Catalogue and order predicate rules can't be mixed within one promotion.",
    )
    .with_index(index)
}
