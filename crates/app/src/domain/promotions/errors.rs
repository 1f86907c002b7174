//! Promotions service errors.

use catalogue_predicates::errors::ValidationErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromotionsServiceError {
    #[error("promotion not found")]
    NotFound,

    #[error("promotion rule not found")]
    RuleNotFound,

    #[error("invalid promotion: {0}")]
    Validation(ValidationErrors),
}

impl From<ValidationErrors> for PromotionsServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
