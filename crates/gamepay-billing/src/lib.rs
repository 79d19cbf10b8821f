//! Connection adapter between a game and a platform in-app billing service.
//!
//! [`BillingService`] owns a single connection to the platform's billing
//! capability. The platform side is reached through two seams:
//!
//! - [`BillingHost`]: the hosting application. Binds and unbinds services and
//!   launches the purchase confirmation flow.
//! - [`RemoteBilling`]: the bound billing service. Built from the raw
//!   [`ServiceBinder`] by a factory handed to [`BillingService::new`].
//!
//! The platform reports bind progress by sending [`ConnectionEvent`]s through
//! the [`ServiceConnection`] it was given; the adapter applies them to its
//! state machine and notifies the game's [`ConnectionListener`].

mod config;
mod connection;
mod error;
mod listener;
mod platform;
mod remote;
mod service;

pub use config::{
    BILLING_API_VERSION, BillingConfig, DEFAULT_DEVELOPER_PAYLOAD, DEFAULT_REQUEST_CODE,
    SERVICE_ACTION, SERVICE_PACKAGE,
};
pub use connection::{ConnectionEvent, ConnectionState, ServiceConnection};
pub use error::BillingError;
pub use listener::{ConnectionListener, PurchaseOutcome, PurchaseRequestListener};
pub use platform::{
    BIND_AUTO_CREATE, BillingHost, BindError, FlowIntent, FlowLaunchError, FlowResult,
    IntentSender, RESULT_CANCELED, RESULT_OK, ServiceBinder, ServiceIntent,
};
pub use remote::{
    BuyIntentResponse, PurchasesResponse, RemoteBilling, RemoteCallError, RemoteFactory,
    SkuDetailsRequest, SkuDetailsResponse,
};
pub use service::BillingService;

pub use gamepay_core::{
    Offer, OfferType, PURCHASE_TYPE_IN_APP, PURCHASE_TYPE_SUBSCRIPTION, ProductInformation,
    PurchaseState, ResponseCode, Transaction,
};
