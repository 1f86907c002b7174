//! Voucher Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::{catalogue::CatalogueInfo, vouchers::Voucher};

/// Wrapper for vouchers in YAML
#[derive(Debug, Deserialize)]
pub struct VouchersFixture {
    /// Map of voucher key -> voucher fixture
    pub vouchers: FxHashMap<String, VoucherFixture>,
}

/// Voucher Fixture
#[derive(Debug, Deserialize)]
pub struct VoucherFixture {
    /// Voucher code
    pub code: String,

    /// Initial catalogue
    #[serde(default)]
    pub catalogue: CatalogueInfo,
}

impl VoucherFixture {
    /// Convert into a [`Voucher`] with a fresh id.
    #[must_use]
    pub fn into_voucher(self) -> Voucher {
        let mut voucher = Voucher::new(Uuid::now_v7(), self.code);
        voucher.catalogue = self.catalogue;
        voucher
    }
}
