//! The remote billing interface, once bound.

use crate::platform::{IntentSender, ServiceBinder};
use gamepay_core::ResponseCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Turns the raw handle from the platform into a callable billing interface.
pub type RemoteFactory = Box<dyn Fn(ServiceBinder) -> Arc<dyn RemoteBilling> + Send + Sync>;

/// Batch of product identifiers to look up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuDetailsRequest {
    #[serde(rename = "ITEM_ID_LIST")]
    pub item_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuDetailsResponse {
    #[serde(rename = "RESPONSE_CODE")]
    pub response_code: ResponseCode,
    /// One JSON blob per product; empty unless the code is ok.
    #[serde(rename = "DETAILS_LIST", default)]
    pub details_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyIntentResponse {
    pub response_code: ResponseCode,
    pub buy_intent: Option<IntentSender>,
}

/// One page of owned purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasesResponse {
    #[serde(rename = "RESPONSE_CODE")]
    pub response_code: ResponseCode,
    #[serde(rename = "INAPP_PURCHASE_DATA_LIST", default)]
    pub purchase_data_list: Vec<String>,
    /// Parallel to `purchase_data_list`.
    #[serde(rename = "INAPP_DATA_SIGNATURE_LIST", default)]
    pub signature_list: Vec<String>,
    /// Present when more pages follow.
    #[serde(rename = "INAPP_CONTINUATION_TOKEN", default)]
    pub continuation_token: Option<String>,
}

/// Transport failure talking to the remote service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteCallError {
    #[error("remote billing service is dead")]
    DeadObject,
    #[error("remote call failed: {0}")]
    Failed(String),
}

/// Procedures exposed by the bound billing service.
///
/// Every call is blocking from the caller's point of view.
pub trait RemoteBilling: Send + Sync {
    fn get_sku_details(
        &self,
        api_version: i32,
        package_name: &str,
        purchase_type: &str,
        request: &SkuDetailsRequest,
    ) -> Result<SkuDetailsResponse, RemoteCallError>;

    fn get_buy_intent(
        &self,
        api_version: i32,
        package_name: &str,
        sku: &str,
        purchase_type: &str,
        developer_payload: &str,
    ) -> Result<BuyIntentResponse, RemoteCallError>;

    fn get_purchases(
        &self,
        api_version: i32,
        package_name: &str,
        purchase_type: &str,
        continuation_token: Option<&str>,
    ) -> Result<PurchasesResponse, RemoteCallError>;

    fn consume_purchase(
        &self,
        api_version: i32,
        package_name: &str,
        purchase_token: &str,
    ) -> Result<ResponseCode, RemoteCallError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_details_bundle_keys() {
        let request = SkuDetailsRequest {
            item_ids: vec!["full_edition".into()],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "ITEM_ID_LIST": ["full_edition"] })
        );

        let response: SkuDetailsResponse =
            serde_json::from_str(r#"{"RESPONSE_CODE": 0, "DETAILS_LIST": ["{}"]}"#).unwrap();
        assert_eq!(response.response_code, ResponseCode::Ok);
        assert_eq!(response.details_list, vec!["{}".to_string()]);

        let failed: SkuDetailsResponse = serde_json::from_str(r#"{"RESPONSE_CODE": 2}"#).unwrap();
        assert_eq!(failed.response_code, ResponseCode::ServiceUnavailable);
        assert!(failed.details_list.is_empty());
    }

    #[test]
    fn purchases_bundle_keys() {
        let page: PurchasesResponse = serde_json::from_str(
            r#"{
                "RESPONSE_CODE": 0,
                "INAPP_PURCHASE_DATA_LIST": ["data"],
                "INAPP_DATA_SIGNATURE_LIST": ["sig"],
                "INAPP_CONTINUATION_TOKEN": "page-2"
            }"#,
        )
        .unwrap();
        assert_eq!(page.purchase_data_list, vec!["data".to_string()]);
        assert_eq!(page.signature_list, vec!["sig".to_string()]);
        assert_eq!(page.continuation_token.as_deref(), Some("page-2"));

        let last: PurchasesResponse = serde_json::from_str(r#"{"RESPONSE_CODE": 0}"#).unwrap();
        assert_eq!(last.continuation_token, None);
    }
}
