//! Promotions
//!
//! A promotion groups rules of a single predicate kind and an activity
//! window. Legacy sales are catalogue promotions with exactly one rule.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use uuid::Uuid;

use crate::{
    catalogue::{CatalogueInfo, catalogue_predicate},
    channels::Channel,
    errors::{ErrorCode, FieldError, ValidationErrors},
    rules::{
        CleanedRule, PredicateKind, PromotionRule, RewardValueType, RuleInput, clean_rule_create,
    },
};

/// Promotion id.
pub type PromotionId = Uuid;

/// Field names used when attributing promotion errors.
pub mod fields {
    /// Promotion name.
    pub const NAME: &str = "name";

    /// Promotion start date.
    pub const START_DATE: &str = "start_date";

    /// Promotion end date.
    pub const END_DATE: &str = "end_date";

    /// Bulk rule input.
    pub const RULES: &str = "rules";
}

/// A stored promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    /// Promotion id.
    pub id: PromotionId,

    /// Display name.
    pub name: String,

    /// Kind every rule must share.
    pub kind: PredicateKind,

    /// When the promotion starts applying.
    pub start_date: Timestamp,

    /// When the promotion stops applying; open ended when `None`.
    pub end_date: Option<Timestamp>,

    /// Rules of the promotion.
    pub rules: Vec<PromotionRule>,
}

impl Promotion {
    /// Build a legacy sale: a catalogue promotion with one rule.
    #[must_use]
    pub fn sale(sale: SaleInput) -> Self {
        let mut rule = PromotionRule::new(Uuid::now_v7());
        rule.catalogue_predicate = catalogue_predicate(&sale.catalogue).to_value();
        rule.reward_value_type = Some(sale.reward_value_type);
        rule.reward_value = Some(sale.reward_value);
        rule.channels = sale.channels;

        Self {
            id: Uuid::now_v7(),
            name: sale.name,
            kind: PredicateKind::Catalogue,
            start_date: sale.start_date,
            end_date: sale.end_date,
            rules: vec![rule],
        }
    }

    /// The rule carrying a sale's catalogue.
    #[must_use]
    pub fn sale_rule(&self) -> Option<&PromotionRule> {
        self.rules.first()
    }

    /// Mutable access to the rule carrying a sale's catalogue.
    pub fn sale_rule_mut(&mut self) -> Option<&mut PromotionRule> {
        self.rules.first_mut()
    }

    /// Whether the promotion applies at `now`.
    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.start_date <= now && self.end_date.is_none_or(|end| now < end)
    }

    /// Look a rule up by id.
    #[must_use]
    pub fn rule(&self, id: Uuid) -> Option<&PromotionRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }
}

/// Input for a legacy sale.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleInput {
    /// Display name.
    pub name: String,

    /// Initial catalogue.
    pub catalogue: CatalogueInfo,

    /// Reward value type.
    pub reward_value_type: RewardValueType,

    /// Reward value.
    pub reward_value: Decimal,

    /// Channels the sale applies in.
    pub channels: Vec<Channel>,

    /// Start of the sale.
    pub start_date: Timestamp,

    /// End of the sale.
    pub end_date: Option<Timestamp>,
}

/// Input for a new promotion with its rules.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionInput {
    /// Display name.
    pub name: String,

    /// Kind every rule must share.
    pub kind: PredicateKind,

    /// Start date, now when `None`.
    pub start_date: Option<Timestamp>,

    /// End date.
    pub end_date: Option<Timestamp>,

    /// Rules created with the promotion.
    pub rules: Vec<RuleInput>,
}

/// A promotion input that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedPromotion {
    /// Resolved start date.
    pub start_date: Timestamp,

    /// Cleaned rules in input order.
    pub rules: Vec<CleanedRule>,
}

impl CleanedPromotion {
    /// Assemble the promotion, generating ids.
    #[must_use]
    pub fn into_promotion(self, input: PromotionInput) -> Promotion {
        let rules = input
            .rules
            .into_iter()
            .zip(self.rules)
            .map(|(rule, cleaned)| PromotionRule::from_input(Uuid::now_v7(), rule, cleaned))
            .collect();

        Promotion {
            id: Uuid::now_v7(),
            name: input.name,
            kind: input.kind,
            start_date: self.start_date,
            end_date: input.end_date,
            rules,
        }
    }
}

/// Validate a promotion and all its rules.
///
/// Each rule is validated with its position so errors can point at it.
///
/// # Errors
///
/// Returns every problem found across the promotion and its rules.
pub fn clean_promotion_create(
    input: &PromotionInput,
    now: Timestamp,
) -> Result<CleanedPromotion, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if input.name.trim().is_empty() {
        errors.add(
            fields::NAME,
            FieldError::new(ErrorCode::Required, "Promotion name is required."),
        );
    }

    let start_date = input.start_date.unwrap_or(now);
    clean_dates(start_date, input.end_date, &mut errors);

    let mut rules = Vec::with_capacity(input.rules.len());

    for (index, rule) in input.rules.iter().enumerate() {
        if let Some(cleaned) = clean_rule_create(rule, Some(input.kind), Some(index), &mut errors) {
            rules.push(cleaned);
        }
    }

    let kinds: FxHashSet<PredicateKind> = rules.iter().filter_map(CleanedRule::kind).collect();

    if kinds.len() > 1 {
        errors.add(
            fields::RULES,
            FieldError::new(
                ErrorCode::MixedPromotionPredicates,
                "Rules with catalogue and order predicates can't be mixed.",
            ),
        );
    }

    errors.into_result()?;

    Ok(CleanedPromotion { start_date, rules })
}

/// Check the activity window.
pub fn clean_dates(
    start_date: Timestamp,
    end_date: Option<Timestamp>,
    errors: &mut ValidationErrors,
) {
    if let Some(end_date) = end_date
        && end_date < start_date
    {
        errors.add(
            fields::END_DATE,
            FieldError::new(ErrorCode::Invalid, "End date can't be before start date."),
        );
    }
}
