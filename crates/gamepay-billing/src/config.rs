//! Adapter configuration.

use crate::platform::{BIND_AUTO_CREATE, ServiceIntent};
use serde::Deserialize;

/// Version of the billing API every remote call is made against.
pub const BILLING_API_VERSION: i32 = 3;

/// Developer payload attached to purchases unless the caller supplies one.
pub const DEFAULT_DEVELOPER_PAYLOAD: &str = "JustRandomStringTooHardToRememberTralala";

/// Request code the purchase flow result is reported back with.
pub const DEFAULT_REQUEST_CODE: i32 = 1002;

/// Intent action the billing service is bound with.
pub const SERVICE_ACTION: &str = "com.android.vending.billing.InAppBillingService.BIND";

/// Package hosting the billing service.
pub const SERVICE_PACKAGE: &str = "com.android.vending";

/// Configuration for a [`BillingService`](crate::BillingService).
///
/// Every field has a default, so a config file only needs to name what it
/// changes:
///
/// ```toml
/// request_code = 4242
/// developer_payload = "my-game"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Request code passed to the purchase flow and expected back in
    /// [`BillingService::on_flow_result`](crate::BillingService::on_flow_result).
    pub request_code: i32,
    /// Payload for purchases started without an explicit one.
    pub developer_payload: String,
    /// Flags passed to the bind call.
    pub bind_flags: i32,
    pub service_action: String,
    pub service_package: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            request_code: DEFAULT_REQUEST_CODE,
            developer_payload: DEFAULT_DEVELOPER_PAYLOAD.to_string(),
            bind_flags: BIND_AUTO_CREATE,
            service_action: SERVICE_ACTION.to_string(),
            service_package: SERVICE_PACKAGE.to_string(),
        }
    }
}

impl BillingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_request_code(mut self, request_code: i32) -> Self {
        self.request_code = request_code;
        self
    }

    #[must_use]
    pub fn with_developer_payload(mut self, payload: impl Into<String>) -> Self {
        self.developer_payload = payload.into();
        self
    }

    /// The intent used to bind the billing service.
    pub fn service_intent(&self) -> ServiceIntent {
        ServiceIntent {
            action: self.service_action.clone(),
            package: self.service_package.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BillingConfig::new();
        assert_eq!(config.request_code, 1002);
        assert_eq!(config.bind_flags, BIND_AUTO_CREATE);
        assert_eq!(config.developer_payload, DEFAULT_DEVELOPER_PAYLOAD);
        assert_eq!(config.service_intent().package, "com.android.vending");
    }

    #[test]
    fn partial_override() {
        let config: BillingConfig =
            serde_json::from_str(r#"{"request_code": 7, "developer_payload": "x"}"#).unwrap();
        assert_eq!(config, BillingConfig::new().with_request_code(7).with_developer_payload("x"));
    }
}
