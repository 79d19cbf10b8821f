//! Core types for in-app billing.
//!
//! This crate provides the platform-neutral vocabulary: what can be sold
//! ([`Offer`]), what the store says about it ([`ProductInformation`]), what the
//! store hands back after a sale ([`Transaction`]), and the result codes every
//! remote billing call carries ([`ResponseCode`]). Talking to the store is the
//! job of `gamepay-billing`.

mod information;
mod offer;
mod response;
mod transaction;

pub use information::ProductInformation;
pub use offer::{Offer, OfferType, PURCHASE_TYPE_IN_APP, PURCHASE_TYPE_SUBSCRIPTION};
pub use response::ResponseCode;
pub use transaction::{PurchaseState, Transaction};

/// Error decoding a payload returned by the billing service.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid {what} json: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown purchase state: {0}")]
    UnknownPurchaseState(i64),
}

impl DecodeError {
    pub(crate) fn json(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Json { what, source }
    }
}
