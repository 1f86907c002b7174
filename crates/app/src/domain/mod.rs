//! Discount Domain Concerns

pub mod catalogue;
pub mod promotions;
