//! Catalogue Predicates
//!
//! Catalogue predicates describe which products a discount applies to as a
//! nested `AND`/`OR` tree of entity filters. This crate normalizes those
//! trees, converts them to and from flat sale and voucher catalogues, and
//! validates promotion rules and their rewards.

pub mod catalogue;
pub mod channels;
pub mod errors;
pub mod fixtures;
pub mod predicates;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod promotions;
pub mod rewards;
pub mod rules;
pub mod vouchers;
