//! Offers: the products a game puts up for sale.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Purchase type tag for one-off in-app products (entitlements and consumables).
pub const PURCHASE_TYPE_IN_APP: &str = "inapp";

/// Purchase type tag for subscriptions.
pub const PURCHASE_TYPE_SUBSCRIPTION: &str = "subs";

/// How a product behaves once bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    /// Bought once, owned forever (e.g. "full edition").
    Entitlement,
    /// Bought, used up, bought again.
    Consumable,
    /// Renews periodically.
    Subscription,
}

impl OfferType {
    /// The purchase type tag the billing service expects for this offer type.
    pub fn purchase_type(&self) -> &'static str {
        match self {
            OfferType::Entitlement | OfferType::Consumable => PURCHASE_TYPE_IN_APP,
            OfferType::Subscription => PURCHASE_TYPE_SUBSCRIPTION,
        }
    }
}

impl fmt::Display for OfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OfferType::Entitlement => "entitlement",
            OfferType::Consumable => "consumable",
            OfferType::Subscription => "subscription",
        };
        f.write_str(name)
    }
}

/// A product the game sells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offer {
    identifier: String,
    #[serde(rename = "type")]
    offer_type: OfferType,
}

impl Offer {
    pub fn new(identifier: impl Into<String>, offer_type: OfferType) -> Self {
        Self {
            identifier: identifier.into(),
            offer_type,
        }
    }

    pub fn entitlement(identifier: impl Into<String>) -> Self {
        Self::new(identifier, OfferType::Entitlement)
    }

    pub fn consumable(identifier: impl Into<String>) -> Self {
        Self::new(identifier, OfferType::Consumable)
    }

    pub fn subscription(identifier: impl Into<String>) -> Self {
        Self::new(identifier, OfferType::Subscription)
    }

    /// The store identifier (SKU).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn offer_type(&self) -> OfferType {
        self.offer_type
    }
}
