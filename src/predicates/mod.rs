//! Catalogue Predicates
//!
//! Nested boolean filters over catalogue entities, stored as JSON on promotion rules.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::errors::{ErrorCode, FieldError};

pub mod normalize;
pub mod tree;

pub use normalize::{clean_predicate, to_camel_case};
pub use tree::{CataloguePredicate, EntityFilter, IdSet, ProductFacts};

/// Key of the conjunction operator.
pub const AND: &str = "AND";

/// Key of the disjunction operator.
pub const OR: &str = "OR";

/// Key holding the id list inside an entity filter.
pub const IDS: &str = "ids";

/// Boolean operator of a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// All children must match.
    And,

    /// At least one child must match.
    Or,
}

impl Operator {
    /// Key used in the JSON representation.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::And => AND,
            Self::Or => OR,
        }
    }

    /// Parse an operator key. Matching is case sensitive.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            AND => Some(Self::And),
            OR => Some(Self::Or),
            _ => None,
        }
    }
}

/// Catalogue entity kinds a leaf filter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CatalogueEntity {
    /// Collections.
    Collection,

    /// Categories.
    Category,

    /// Products.
    Product,

    /// Product variants.
    Variant,
}

impl CatalogueEntity {
    /// Entities in canonical predicate order.
    pub const ALL: [Self; 4] = [Self::Collection, Self::Category, Self::Product, Self::Variant];

    /// camelCase field name of the entity's filter.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Collection => "collectionPredicate",
            Self::Category => "categoryPredicate",
            Self::Product => "productPredicate",
            Self::Variant => "variantPredicate",
        }
    }

    /// Resolve a normalized field name.
    #[must_use]
    pub fn from_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|entity| entity.field() == field)
    }
}

impl fmt::Display for CatalogueEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Errors raised while cleaning or converting predicates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    /// An operator key shares its object with other keys.
    #[error("Cannot mix operators with other filter inputs.")]
    MixedOperators {
        /// Position of the rule in a bulk input.
        index: Option<usize>,
    },

    /// Two keys of one object collapse to the same camelCase name.
    #[error("duplicate predicate field: {key}")]
    DuplicateField {
        /// The shared camelCase name.
        key: String,

        /// Position of the rule in a bulk input.
        index: Option<usize>,
    },

    /// A key is neither an operator nor a known entity filter.
    #[error("unknown predicate field: {0}")]
    UnknownField(String),

    /// A node does not have the expected JSON type.
    #[error("malformed predicate at {0}")]
    Malformed(String),

    /// The predicate is not an `OR` of single-entity filters.
    #[error("predicate is not a plain catalogue predicate")]
    NotCatalogueShaped,
}

impl PredicateError {
    /// Rule index carried by the error, if any.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::MixedOperators { index } | Self::DuplicateField { index, .. } => *index,
            _ => None,
        }
    }
}

impl From<PredicateError> for FieldError {
    fn from(error: PredicateError) -> Self {
        let index = error.index();

        FieldError::new(ErrorCode::Invalid, error.to_string()).with_index(index)
    }
}

/// Whether a stored predicate is absent.
///
/// `null` and `{}` both count as "no predicate".
#[must_use]
pub fn is_empty_predicate(predicate: &Value) -> bool {
    match predicate {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
