//! Vouchers
//!
//! Vouchers keep their catalogue as flat id sets rather than a predicate.

use uuid::Uuid;

use crate::catalogue::{CatalogueDiff, CatalogueInfo};

/// Voucher id.
pub type VoucherId = Uuid;

/// A voucher and the catalogue it discounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voucher {
    /// Voucher id.
    pub id: VoucherId,

    /// Code customers enter.
    pub code: String,

    /// Discounted catalogue.
    pub catalogue: CatalogueInfo,
}

impl Voucher {
    /// A voucher with an empty catalogue.
    pub fn new(id: VoucherId, code: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            catalogue: CatalogueInfo::default(),
        }
    }

    /// Add `delta` to the catalogue, returning what changed.
    pub fn add_catalogue(&mut self, delta: &CatalogueInfo) -> CatalogueDiff {
        self.replace_catalogue(self.catalogue.union(delta))
    }

    /// Remove `delta` from the catalogue, returning what changed.
    pub fn remove_catalogue(&mut self, delta: &CatalogueInfo) -> CatalogueDiff {
        self.replace_catalogue(self.catalogue.difference(delta))
    }

    fn replace_catalogue(&mut self, catalogue: CatalogueInfo) -> CatalogueDiff {
        let diff = CatalogueInfo::diff(&self.catalogue, &catalogue);
        self.catalogue = catalogue;
        diff
    }
}
