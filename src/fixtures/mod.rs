//! Fixtures
//!
//! YAML catalogue sets used by tests and the CLI. A set named `apparel` is
//! spread over `channels/apparel.yml`, `products/apparel.yml`,
//! `promotions/apparel.yml` and `vouchers/apparel.yml` under the base path.

use std::{
    fs,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    channels::{Channel, ChannelError},
    errors::ValidationErrors,
    products::{Product, ProductChannelListing},
    promotions::Promotion,
    vouchers::Voucher,
};

pub mod channels;
pub mod products;
pub mod promotions;
pub mod vouchers;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Channel not found
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Promotion not found
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Voucher not found
    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    /// Listing price currency differs from its channel's
    #[error("Currency mismatch in channel {channel}: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Channel id
        channel: String,
        /// Channel currency
        expected: String,
        /// Price currency
        found: String,
    },

    /// Promotion failed validation
    #[error("Invalid promotion {key}: {errors}")]
    InvalidPromotion {
        /// Fixture key
        key: String,
        /// Validation errors
        errors: ValidationErrors,
    },
}

/// Fixture
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Channels by id
    channels: FxHashMap<String, Channel>,

    /// Products sorted by id
    products: Vec<Product>,

    /// Channel listings sorted by product then channel
    listings: Vec<ProductChannelListing>,

    /// Promotions by fixture key
    promotions: FxHashMap<String, Promotion>,

    /// Vouchers by fixture key
    vouchers: FxHashMap<String, Voucher>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            channels: FxHashMap::default(),
            products: Vec::new(),
            listings: Vec::new(),
            promotions: FxHashMap::default(),
            vouchers: FxHashMap::default(),
        }
    }

    fn read<T: DeserializeOwned>(&self, kind: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(kind).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }

    /// Load channels from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a currency is unknown.
    pub fn load_channels(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: channels::ChannelsFixture = self.read("channels", name)?;

        for (id, channel_fixture) in fixture.channels {
            let channel = channel_fixture.into_channel(id.clone())?;

            self.channels.insert(id, channel);
        }

        Ok(self)
    }

    /// Load products and their channel prices from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a price is
    /// malformed, or a price references an unknown channel or the wrong currency.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: products::ProductsFixture = self.read("products", name)?;

        for (id, product_fixture) in fixture.products {
            let (product, listings) = product_fixture.into_product(id, &self.channels)?;

            self.products.push(product);
            self.listings.extend(listings);
        }

        self.products.sort_by(|left, right| left.id.cmp(&right.id));
        self.listings.sort_by(|left, right| {
            (&left.product_id, &left.channel_id).cmp(&(&right.product_id, &right.channel_id))
        });

        Ok(self)
    }

    /// Load promotions from a YAML fixture file
    ///
    /// Promotions go through the same validation as newly created ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a rule references
    /// an unknown channel, or a promotion fails validation.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: promotions::PromotionsFixture = self.read("promotions", name)?;
        let now = Timestamp::now();

        for (key, promotion_fixture) in fixture.promotions {
            let promotion = promotion_fixture.into_promotion(&key, &self.channels, now)?;

            self.promotions.insert(key, promotion);
        }

        Ok(self)
    }

    /// Load vouchers from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_vouchers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: vouchers::VouchersFixture = self.read("vouchers", name)?;

        for (key, voucher_fixture) in fixture.vouchers {
            self.vouchers.insert(key, voucher_fixture.into_voucher());
        }

        Ok(self)
    }

    /// Load a complete fixture set (channels, products, promotions and vouchers with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load a complete fixture set from `base_path`
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl AsRef<Path>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path.as_ref());

        fixture
            .load_channels(name)?
            .load_products(name)?
            .load_promotions(name)?
            .load_vouchers(name)?;

        Ok(fixture)
    }

    /// Get a channel by id
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is not found.
    pub fn channel(&self, id: &str) -> Result<&Channel, FixtureError> {
        self.channels
            .get(id)
            .ok_or_else(|| FixtureError::ChannelNotFound(id.to_string()))
    }

    /// Get a product by id
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, id: &str) -> Result<&Product, FixtureError> {
        self.products
            .iter()
            .find(|product| product.id == id)
            .ok_or_else(|| FixtureError::ProductNotFound(id.to_string()))
    }

    /// Get a promotion by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the promotion is not found.
    pub fn promotion(&self, key: &str) -> Result<&Promotion, FixtureError> {
        self.promotions
            .get(key)
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))
    }

    /// Get a voucher by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the voucher is not found.
    pub fn voucher(&self, key: &str) -> Result<&Voucher, FixtureError> {
        self.vouchers
            .get(key)
            .ok_or_else(|| FixtureError::VoucherNotFound(key.to_string()))
    }

    /// Get all channels
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Get all products
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Get all channel listings
    pub fn listings(&self) -> &[ProductChannelListing] {
        &self.listings
    }

    /// Get all promotions
    pub fn promotions(&self) -> impl Iterator<Item = &Promotion> {
        self.promotions.values()
    }

    /// Get all vouchers
    pub fn vouchers(&self) -> impl Iterator<Item = &Voucher> {
        self.vouchers.values()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rusty_money::{Money, iso};
    use tempfile::TempDir;
    use testresult::TestResult;

    use super::*;
    use crate::rules::PredicateKind;

    fn write_fixture(base: &Path, kind: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(kind);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn fixture_from_set_loads_everything() -> TestResult {
        let fixture = Fixture::from_set("apparel")?;

        assert_eq!(fixture.channels().count(), 2);
        assert_eq!(fixture.products().len(), 4);
        assert_eq!(fixture.promotions().count(), 2);
        assert_eq!(fixture.vouchers().count(), 1);

        let tshirt = fixture.product("tshirt")?;

        assert_eq!(tshirt.category.as_deref(), Some("apparel"));
        assert!(tshirt.variants.contains("tshirt-m"));

        Ok(())
    }

    #[test]
    fn fixture_prices_are_listed_per_channel() -> TestResult {
        let fixture = Fixture::from_set("apparel")?;

        let listing = fixture
            .listings()
            .iter()
            .find(|listing| {
                listing.product_id == "tshirt" && listing.channel_id == "default-channel"
            })
            .ok_or("missing listing")?;

        assert_eq!(listing.price, Money::from_minor(1250, iso::USD));
        assert!(!listing.discounted_price_dirty);

        Ok(())
    }

    #[test]
    fn fixture_promotions_are_normalized() -> TestResult {
        let fixture = Fixture::from_set("apparel")?;
        let sale = fixture.promotion("summer-sale")?;

        assert_eq!(sale.kind, PredicateKind::Catalogue);

        let rule = sale.sale_rule().ok_or("sale without rule")?;

        assert!(rule.catalogue_predicate.get("OR").is_some());
        assert!(rule.catalogue().collections.contains("summer"));

        Ok(())
    }

    #[test]
    fn fixture_product_not_found_returns_error() {
        let fixture = Fixture::new();

        assert!(matches!(
            fixture.product("nonexistent"),
            Err(FixtureError::ProductNotFound(_))
        ));
    }

    const EUR_PRICED_PRODUCTS: &str = r"products:
  apple:
    name: Apple
    variants: [apple-1]
    prices:
      us: 1.00 EUR
";

    const MIXED_OPERATOR_PROMOTIONS: &str = r"promotions:
  broken:
    name: Broken
    kind: catalogue
    rules:
      - catalogue_predicate:
          OR: []
          product_predicate:
            ids: [P1]
        reward_value_type: PERCENTAGE
        reward_value: 10
        channels: [us]
";

    #[test]
    fn fixture_rejects_price_in_wrong_currency() -> TestResult {
        let dir = TempDir::new()?;

        write_fixture(dir.path(), "channels", "set", "channels:\n  us:\n    currency: USD\n")?;
        write_fixture(
            dir.path(),
            "products",
            "set",
            EUR_PRICED_PRODUCTS,
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());

        let result = fixture.load_channels("set")?.load_products("set");

        assert!(matches!(result, Err(FixtureError::CurrencyMismatch { .. })));

        Ok(())
    }

    #[test]
    fn fixture_rejects_invalid_promotions() -> TestResult {
        let dir = TempDir::new()?;

        write_fixture(dir.path(), "channels", "set", "channels:\n  us:\n    currency: USD\n")?;
        write_fixture(
            dir.path(),
            "promotions",
            "set",
            MIXED_OPERATOR_PROMOTIONS,
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());

        let result = fixture.load_channels("set")?.load_promotions("set");

        assert!(matches!(
            result,
            Err(FixtureError::InvalidPromotion { key, .. }) if key == "broken"
        ));

        Ok(())
    }
}
