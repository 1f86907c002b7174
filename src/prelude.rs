//! Catalogue predicates prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalogue::{
        CatalogueDiff, CatalogueInfo, build_predicate_from_catalogue, catalogue_from_predicate,
        catalogue_predicate, empty_predicate, extract_catalogue_from_predicate, merge_predicates,
        subtract_from_predicate,
    },
    channels::{Channel, ChannelError},
    errors::{ErrorCode, FieldError, ValidationErrors},
    fixtures::{Fixture, FixtureError},
    predicates::{
        CatalogueEntity, CataloguePredicate, EntityFilter, IdSet, PredicateError, ProductFacts,
        clean_predicate, is_empty_predicate,
    },
    pricing::{apply_reward, best_discounted_price},
    products::{Product, ProductChannelListing},
    promotions::{
        CleanedPromotion, Promotion, PromotionId, PromotionInput, SaleInput,
        clean_promotion_create,
    },
    rewards::{clean_reward_create, clean_reward_update},
    rules::{
        CleanedRule, PredicateKind, PromotionRule, PromotionRuleId, RewardType, RewardValueType,
        RuleInput, RuleUpdate, clean_rule_create, clean_rule_update,
    },
    vouchers::{Voucher, VoucherId},
};
