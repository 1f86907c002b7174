//! Promotions

mod errors;
pub mod service;

pub use errors::PromotionsServiceError;
pub use service::*;
