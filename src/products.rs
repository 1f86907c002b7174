//! Products

use rusty_money::{Money, iso::Currency};

use crate::predicates::{IdSet, ProductFacts};

/// Product and its catalogue memberships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Product id
    pub id: String,

    /// Product name
    pub name: String,

    /// Category id
    pub category: Option<String>,

    /// Collection ids
    pub collections: IdSet,

    /// Variant ids
    pub variants: IdSet,
}

impl Product {
    /// Membership facts used to evaluate catalogue predicates.
    #[must_use]
    pub fn facts(&self) -> ProductFacts<'_> {
        ProductFacts {
            product: &self.id,
            category: self.category.as_deref(),
            collections: &self.collections,
            variants: &self.variants,
        }
    }

    /// Whether the product can be added to a catalogue.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }
}

/// Price of a product in one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductChannelListing {
    /// Product id
    pub product_id: String,

    /// Channel id
    pub channel_id: String,

    /// Undiscounted price
    pub price: Money<'static, Currency>,

    /// Price after the best catalogue discount
    pub discounted_price: Money<'static, Currency>,

    /// Set when `discounted_price` may be stale
    pub discounted_price_dirty: bool,
}

impl ProductChannelListing {
    /// A clean listing whose discounted price equals its price.
    #[must_use]
    pub fn new(
        product_id: impl Into<String>,
        channel_id: impl Into<String>,
        price: Money<'static, Currency>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            channel_id: channel_id.into(),
            price,
            discounted_price: price,
            discounted_price_dirty: false,
        }
    }
}
