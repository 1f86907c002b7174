//! Sales Channels

use rusty_money::iso::{self, Currency};
use thiserror::Error;

/// Errors raised when building channels.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The currency code is not a known ISO 4217 code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// A sales channel with its settlement currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Channel id.
    pub id: String,

    /// Channel slug.
    pub slug: String,

    /// Currency all prices in this channel use.
    pub currency: &'static Currency,
}

impl Channel {
    /// Create a channel from an ISO currency code.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::UnknownCurrency`] when the code is not recognised.
    pub fn new(
        id: impl Into<String>,
        slug: impl Into<String>,
        currency_code: &str,
    ) -> Result<Self, ChannelError> {
        Ok(Self {
            id: id.into(),
            slug: slug.into(),
            currency: find_currency(currency_code)?,
        })
    }

    /// ISO code of the channel currency.
    #[must_use]
    pub fn currency_code(&self) -> &'static str {
        self.currency.iso_alpha_code
    }
}

/// Look up an ISO 4217 currency by code.
///
/// # Errors
///
/// Returns [`ChannelError::UnknownCurrency`] when the code is not recognised.
pub fn find_currency(code: &str) -> Result<&'static Currency, ChannelError> {
    iso::find(code).ok_or_else(|| ChannelError::UnknownCurrency(code.to_string()))
}
