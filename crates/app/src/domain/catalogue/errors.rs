//! Catalogue service errors.

use catalogue_predicates::{errors::ValidationErrors, predicates::PredicateError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogueServiceError {
    #[error("sale not found")]
    SaleNotFound,

    #[error("voucher not found")]
    VoucherNotFound,

    #[error("invalid catalogue: {0}")]
    Validation(ValidationErrors),

    #[error("stored predicate can't be edited as a catalogue")]
    Predicate(#[from] PredicateError),
}

impl From<ValidationErrors> for CatalogueServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
