//! Catalogue

pub mod errors;
pub(crate) mod repository;
pub mod service;

pub use errors::CatalogueServiceError;
pub use service::*;
