//! Channel Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{channels::Channel, fixtures::FixtureError};

/// Wrapper for channels in YAML
#[derive(Debug, Deserialize)]
pub struct ChannelsFixture {
    /// Map of channel id -> channel fixture
    pub channels: FxHashMap<String, ChannelFixture>,
}

/// Channel Fixture
#[derive(Debug, Deserialize)]
pub struct ChannelFixture {
    /// Channel slug, defaults to the id
    #[serde(default)]
    pub slug: Option<String>,

    /// ISO currency code (e.g., "USD")
    pub currency: String,
}

impl ChannelFixture {
    /// Convert into a [`Channel`] with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency code is unknown.
    pub fn into_channel(self, id: String) -> Result<Channel, FixtureError> {
        let slug = self.slug.unwrap_or_else(|| id.clone());

        Ok(Channel::new(id, slug, &self.currency)?)
    }
}
