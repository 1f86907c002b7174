//! Discounted Prices

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};

use crate::{
    predicates::{CataloguePredicate, ProductFacts},
    promotions::Promotion,
    rules::{PromotionRule, RewardValueType},
};

/// Apply one rule's reward to `price`.
///
/// The result is rounded to the currency's minor unit and never goes below
/// zero. Rules without a complete reward leave the price unchanged.
#[must_use]
pub fn apply_reward(
    price: Money<'static, Currency>,
    reward_value_type: Option<RewardValueType>,
    reward_value: Option<Decimal>,
) -> Money<'static, Currency> {
    let (Some(reward_value_type), Some(reward_value)) = (reward_value_type, reward_value) else {
        return price;
    };

    let amount = *price.amount();

    let discount = match reward_value_type {
        RewardValueType::Fixed => reward_value,
        RewardValueType::Percentage => amount
            .checked_mul(reward_value)
            .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
            .unwrap_or(amount),
    };

    let discounted = amount
        .checked_sub(discount.max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
        .round_dp_with_strategy(price.currency().exponent, RoundingStrategy::MidpointAwayFromZero);

    Money::from_decimal(discounted, price.currency())
}

/// Lowest price `facts` can get in `channel_id` from active catalogue rules.
///
/// Rules whose predicate fails to parse are skipped; the empty predicate
/// matches nothing.
#[must_use]
pub fn best_discounted_price<'p, I>(
    price: Money<'static, Currency>,
    facts: &ProductFacts<'_>,
    channel_id: &str,
    promotions: I,
    now: Timestamp,
) -> Money<'static, Currency>
where
    I: IntoIterator<Item = &'p Promotion>,
{
    promotions
        .into_iter()
        .filter(|promotion| promotion.is_active(now))
        .flat_map(|promotion| promotion.rules.iter())
        .filter(|rule| rule_applies(rule, facts, channel_id))
        .map(|rule| apply_reward(price, rule.reward_value_type, rule.reward_value))
        .min_by(|left, right| left.amount().cmp(right.amount()))
        .map_or(price, |best| if best.amount() < price.amount() { best } else { price })
}

fn rule_applies(rule: &PromotionRule, facts: &ProductFacts<'_>, channel_id: &str) -> bool {
    rule.has_channel(channel_id)
        && CataloguePredicate::try_from(&rule.catalogue_predicate)
            .is_ok_and(|predicate| predicate.matches(facts))
}
