//! Reward Validation
//!
//! Checks `reward_value` and `reward_value_type` against the rule's predicate
//! and the channels the rule will end up attached to. Errors are attributed to
//! the input field the caller actually touched, which differs between create
//! and update.

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use rusty_money::iso::Currency;

use crate::{
    channels::Channel,
    errors::{ErrorCode, FieldError, ValidationErrors},
    rules::{PromotionRule, RewardValueType, RuleInput, RuleUpdate, fields, final_channels},
};

const MAX_PERCENTAGE: Decimal = Decimal::ONE_HUNDRED;

/// Where channel related errors are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Attribution {
    missing_channels: &'static str,
    multiple_currencies: &'static str,
}

impl Attribution {
    const CREATE: Self = Self {
        missing_channels: fields::CHANNELS,
        multiple_currencies: fields::REWARD_VALUE_TYPE,
    };

    fn update(update: &RuleUpdate) -> Self {
        Self {
            missing_channels: if update.remove_channels.is_some() {
                fields::REMOVE_CHANNELS
            } else {
                fields::REWARD_VALUE_TYPE
            },
            multiple_currencies: if update.add_channels.is_some() {
                fields::ADD_CHANNELS
            } else {
                fields::REWARD_VALUE_TYPE
            },
        }
    }
}

/// Validate the reward of a rule being created.
///
/// `has_predicate` is `false` when neither predicate was supplied; nothing is
/// checked in that case.
pub fn clean_reward_create(
    input: &RuleInput,
    has_predicate: bool,
    index: Option<usize>,
    errors: &mut ValidationErrors,
) {
    if !has_predicate {
        return;
    }

    clean_reward(
        input.reward_value_type,
        input.reward_value,
        &input.channels,
        Attribution::CREATE,
        index,
        errors,
    );
}

/// Validate the reward of `rule` after applying `update`.
///
/// Missing fields are inherited from `rule`, and channels are the rule's
/// current channels minus the removed ones plus the added ones.
pub fn clean_reward_update(
    rule: &PromotionRule,
    update: &RuleUpdate,
    has_predicate: bool,
    errors: &mut ValidationErrors,
) {
    if !has_predicate {
        return;
    }

    let channels = final_channels(&rule.channels, update);

    clean_reward(
        update.reward_value_type.or(rule.reward_value_type),
        update.reward_value.or(rule.reward_value),
        &channels,
        Attribution::update(update),
        None,
        errors,
    );
}

fn clean_reward(
    reward_value_type: Option<RewardValueType>,
    reward_value: Option<Decimal>,
    channels: &[Channel],
    attribution: Attribution,
    index: Option<usize>,
    errors: &mut ValidationErrors,
) {
    let Some(reward_value_type) = reward_value_type else {
        errors.add(
            fields::REWARD_VALUE_TYPE,
            FieldError::new(
                ErrorCode::Required,
                "reward_value_type is required when a predicate is provided.",
            )
            .with_index(index),
        );
        return;
    };

    let currency = match reward_value_type {
        RewardValueType::Fixed => single_currency(channels, attribution, index, errors),
        RewardValueType::Percentage => None,
    };

    let Some(reward_value) = reward_value else {
        errors.add(
            fields::REWARD_VALUE,
            FieldError::new(
                ErrorCode::Required,
                "reward_value is required when a predicate is provided.",
            )
            .with_index(index),
        );
        return;
    };

    if reward_value.is_sign_negative() && !reward_value.is_zero() {
        errors.add(
            fields::REWARD_VALUE,
            FieldError::new(ErrorCode::Invalid, "reward_value must not be negative.")
                .with_index(index),
        );
        return;
    }

    match reward_value_type {
        RewardValueType::Percentage if reward_value > MAX_PERCENTAGE => {
            errors.add(
                fields::REWARD_VALUE,
                FieldError::new(
                    ErrorCode::Invalid,
                    "Percentage reward_value can't be greater than 100.",
                )
                .with_index(index),
            );
        }
        RewardValueType::Fixed => {
            if let Some(currency) = currency
                && !fits_precision(reward_value, currency)
            {
                errors.add(
                    fields::REWARD_VALUE,
                    FieldError::new(
                        ErrorCode::InvalidPrecision,
                        format!(
                            "reward_value exceeds the precision of {}.",
                            currency.iso_alpha_code
                        ),
                    )
                    .with_index(index),
                );
            }
        }
        RewardValueType::Percentage => {}
    }
}

/// The one currency shared by `channels`, recording an error otherwise.
fn single_currency(
    channels: &[Channel],
    attribution: Attribution,
    index: Option<usize>,
    errors: &mut ValidationErrors,
) -> Option<&'static Currency> {
    let codes: FxHashSet<&str> = channels.iter().map(Channel::currency_code).collect();

    match (channels.first(), codes.len()) {
        (None, _) => {
            errors.add(
                attribution.missing_channels,
                FieldError::new(
                    ErrorCode::MissingChannels,
                    "Fixed reward requires at least one channel.",
                )
                .with_index(index),
            );
            None
        }
        (Some(channel), 1) => Some(channel.currency),
        (Some(_), _) => {
            errors.add(
                attribution.multiple_currencies,
                FieldError::new(
                    ErrorCode::MultipleCurrenciesNotAllowed,
                    "Fixed reward can't be used with channels in different currencies.",
                )
                .with_index(index),
            );
            None
        }
    }
}

/// Whether `value` has no more decimal places than `currency` allows.
#[must_use]
pub fn fits_precision(value: Decimal, currency: &Currency) -> bool {
    value.normalize().scale() <= currency.exponent
}
