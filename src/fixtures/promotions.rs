//! Promotion Fixtures

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    channels::Channel,
    fixtures::FixtureError,
    promotions::{Promotion, PromotionInput, clean_promotion_create},
    rules::{PredicateKind, RewardType, RewardValueType, RuleInput},
};

/// Wrapper for promotions in YAML
#[derive(Debug, Deserialize)]
pub struct PromotionsFixture {
    /// Map of promotion key -> promotion fixture
    pub promotions: FxHashMap<String, PromotionFixture>,
}

/// Promotion fixture from YAML
#[derive(Debug, Deserialize)]
pub struct PromotionFixture {
    /// Promotion name
    pub name: String,

    /// Kind shared by every rule
    pub kind: PredicateKind,

    /// Start date, load time when omitted
    #[serde(default)]
    pub start_date: Option<Timestamp>,

    /// End date
    #[serde(default)]
    pub end_date: Option<Timestamp>,

    /// Promotion rules
    #[serde(default)]
    pub rules: Vec<RuleFixture>,
}

/// Rule fixture from YAML; predicates are given in raw form.
#[derive(Debug, Deserialize)]
pub struct RuleFixture {
    /// Rule name
    #[serde(default)]
    pub name: Option<String>,

    /// Raw catalogue predicate
    #[serde(default)]
    pub catalogue_predicate: Option<Value>,

    /// Raw checkout and order predicate
    #[serde(default)]
    pub order_predicate: Option<Value>,

    /// Reward value type
    #[serde(default)]
    pub reward_value_type: Option<RewardValueType>,

    /// Reward value
    #[serde(default)]
    pub reward_value: Option<Decimal>,

    /// Reward type
    #[serde(default)]
    pub reward_type: Option<RewardType>,

    /// Channel ids
    #[serde(default)]
    pub channels: Vec<String>,
}

impl RuleFixture {
    fn into_input(self, channels: &FxHashMap<String, Channel>) -> Result<RuleInput, FixtureError> {
        let channels = self
            .channels
            .into_iter()
            .map(|id| {
                channels
                    .get(&id)
                    .cloned()
                    .ok_or(FixtureError::ChannelNotFound(id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RuleInput {
            name: self.name,
            catalogue_predicate: self.catalogue_predicate,
            order_predicate: self.order_predicate,
            reward_value_type: self.reward_value_type,
            reward_value: self.reward_value,
            reward_type: self.reward_type,
            channels,
        })
    }
}

impl PromotionFixture {
    /// Validate and convert into a [`Promotion`].
    ///
    /// # Errors
    ///
    /// Returns an error if a rule references an unknown channel or the
    /// promotion fails validation.
    pub fn into_promotion(
        self,
        key: &str,
        channels: &FxHashMap<String, Channel>,
        now: Timestamp,
    ) -> Result<Promotion, FixtureError> {
        let rules = self
            .rules
            .into_iter()
            .map(|rule| rule.into_input(channels))
            .collect::<Result<Vec<_>, _>>()?;

        let input = PromotionInput {
            name: self.name,
            kind: self.kind,
            start_date: self.start_date,
            end_date: self.end_date,
            rules,
        };

        let cleaned =
            clean_promotion_create(&input, now).map_err(|errors| FixtureError::InvalidPromotion {
                key: key.to_string(),
                errors,
            })?;

        Ok(cleaned.into_promotion(input))
    }
}
