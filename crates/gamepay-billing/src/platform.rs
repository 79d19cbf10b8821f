//! The hosting application and the handles the platform passes around.

use crate::connection::ServiceConnection;
use std::collections::BTreeMap;

/// Bind flag: create the service if it is not running yet.
pub const BIND_AUTO_CREATE: i32 = 1;

/// Flow result code: the flow completed.
pub const RESULT_OK: i32 = -1;

/// Flow result code: the user backed out of the flow.
pub const RESULT_CANCELED: i32 = 0;

/// Addresses the service to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIntent {
    pub action: String,
    pub package: String,
}

/// Raw handle to a bound service, as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBinder {
    descriptor: String,
}

impl ServiceBinder {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
        }
    }

    /// Interface descriptor of the remote object.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

/// Launchable handle for the purchase confirmation flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentSender(String);

impl IntentSender {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Fill-in data merged into the flow when it is launched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowIntent {
    pub extras: BTreeMap<String, String>,
}

/// What the purchase confirmation flow hands back on completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowResult {
    /// Missing means the flow reported no code, which the platform treats as ok.
    pub response_code: Option<i32>,
    pub purchase_data: Option<String>,
    pub data_signature: Option<String>,
}

/// Error raised by the bind call itself.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// The application lacks the permission to bind.
    #[error("not allowed to bind to service: {0}")]
    Security(String),
}

/// The host could not start the external flow.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FlowLaunchError(pub String);

/// The hosting application, as far as billing is concerned.
pub trait BillingHost: Send + Sync {
    /// Package name the application is installed under.
    fn package_name(&self) -> String;

    /// Ask the platform to bind a service. `Ok(false)` means the platform
    /// declined; on `Ok(true)` it reports progress through `connection`.
    fn bind_service(
        &self,
        intent: &ServiceIntent,
        connection: ServiceConnection,
        flags: i32,
    ) -> Result<bool, BindError>;

    fn unbind_service(&self, connection: &ServiceConnection);

    /// Launch the external flow behind `sender`. The result comes back later
    /// through [`BillingService::on_flow_result`](crate::BillingService::on_flow_result)
    /// with `request_code`.
    fn start_external_flow(
        &self,
        sender: &IntentSender,
        request_code: i32,
        fill_in: FlowIntent,
        flags_mask: i32,
        flags_values: i32,
        extra_flags: i32,
    ) -> Result<(), FlowLaunchError>;
}
