//! Product Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    channels::{Channel, find_currency},
    fixtures::FixtureError,
    products::{Product, ProductChannelListing},
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product id -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Category id
    #[serde(default)]
    pub category: Option<String>,

    /// Collection ids
    #[serde(default)]
    pub collections: Vec<String>,

    /// Variant ids
    #[serde(default)]
    pub variants: Vec<String>,

    /// Channel id -> price (e.g., "12.50 USD")
    #[serde(default)]
    pub prices: FxHashMap<String, String>,
}

impl ProductFixture {
    /// Convert into a product and its channel listings.
    ///
    /// # Errors
    ///
    /// Returns an error if a price is malformed, names an unknown channel, or
    /// uses a currency other than the channel's.
    pub fn into_product(
        self,
        id: String,
        channels: &FxHashMap<String, Channel>,
    ) -> Result<(Product, Vec<ProductChannelListing>), FixtureError> {
        let mut listings = Vec::with_capacity(self.prices.len());

        for (channel_id, price) in self.prices {
            let channel = channels
                .get(&channel_id)
                .ok_or_else(|| FixtureError::ChannelNotFound(channel_id.clone()))?;

            let (minor_units, currency) = parse_price(&price)?;

            if currency != channel.currency {
                return Err(FixtureError::CurrencyMismatch {
                    channel: channel_id,
                    expected: channel.currency_code().to_string(),
                    found: currency.iso_alpha_code.to_string(),
                });
            }

            listings.push(ProductChannelListing::new(
                id.clone(),
                channel_id,
                Money::from_minor(minor_units, currency),
            ));
        }

        let product = Product {
            id,
            name: self.name,
            category: self.category,
            collections: self.collections.into_iter().collect(),
            variants: self.variants.into_iter().collect(),
        };

        Ok((product, listings))
    }
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a decimal that fits the currency's minor unit, or if
/// the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(currency_code), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = find_currency(currency_code)?;

    let minor_units = 10_i64
        .checked_pow(currency.exponent)
        .and_then(|scale| amount.checked_mul(Decimal::from(scale)))
        .filter(|value| value.fract().is_zero())
        .and_then(|value| value.to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}
