//! Events
//!
//! Notifications fired after a state change has been stored. Sinks are
//! called synchronously and must not fail the operation that fired them.

use std::sync::Arc;

use catalogue_predicates::{
    catalogue::{CatalogueDiff, CatalogueInfo},
    promotions::PromotionId,
    rules::PromotionRuleId,
    vouchers::VoucherId,
};
use mockall::automock;
use serde::Serialize;
use tracing::info;

/// Something that changed in the discount catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A sale's catalogue changed.
    SaleUpdated {
        /// Sale id.
        sale: PromotionId,
        /// Catalogue before the change.
        previous: CatalogueInfo,
        /// Catalogue after the change.
        current: CatalogueInfo,
    },

    /// A voucher's catalogue changed.
    VoucherUpdated {
        /// Voucher id.
        voucher: VoucherId,
        /// What was added and removed.
        diff: CatalogueDiff,
    },

    /// A promotion was created.
    PromotionCreated {
        /// Promotion id.
        promotion: PromotionId,
    },

    /// A rule was added to a promotion.
    PromotionRuleCreated {
        /// Promotion id.
        promotion: PromotionId,
        /// Rule id.
        rule: PromotionRuleId,
    },

    /// A rule changed.
    PromotionRuleUpdated {
        /// Promotion id.
        promotion: PromotionId,
        /// Rule id.
        rule: PromotionRuleId,
    },

    /// A rule was removed.
    PromotionRuleDeleted {
        /// Promotion id.
        promotion: PromotionId,
        /// Rule id.
        rule: PromotionRuleId,
    },
}

impl Event {
    /// Event name as delivered to subscribers.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SaleUpdated { .. } => "sale_updated",
            Self::VoucherUpdated { .. } => "voucher_updated",
            Self::PromotionCreated { .. } => "promotion_created",
            Self::PromotionRuleCreated { .. } => "promotion_rule_created",
            Self::PromotionRuleUpdated { .. } => "promotion_rule_updated",
            Self::PromotionRuleDeleted { .. } => "promotion_rule_deleted",
        }
    }
}

#[automock]
pub trait EventSink: Send + Sync {
    /// Deliver `event`.
    fn call_event(&self, event: &Event);
}

/// Fans an event out to every registered sink, in registration order.
#[derive(Clone, Default)]
pub struct Subscribers {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Subscribers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for Subscribers {
    fn call_event(&self, event: &Event) {
        for sink in &self.sinks {
            sink.call_event(event);
        }
    }
}

/// Logs every event with its JSON payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn call_event(&self, event: &Event) {
        let payload = serde_json::to_string(event).unwrap_or_default();

        info!(event = event.name(), %payload, "event fired");
    }
}
