//! Discount catalogue services: catalogue edits on sales and vouchers,
//! promotion rule management, and discounted price recalculation.

pub mod config;
pub mod context;
pub mod domain;
pub mod events;
pub mod observability;
pub mod recalculation;
pub mod store;

#[cfg(test)]
mod test;
