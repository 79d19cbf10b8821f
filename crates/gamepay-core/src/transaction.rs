//! Completed purchases.

use crate::DecodeError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a purchase as the store reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseState {
    Purchased,
    Canceled,
    Refunded,
}

impl PurchaseState {
    fn from_code(code: i64) -> Result<Self, DecodeError> {
        match code {
            0 => Ok(PurchaseState::Purchased),
            1 => Ok(PurchaseState::Canceled),
            2 => Ok(PurchaseState::Refunded),
            other => Err(DecodeError::UnknownPurchaseState(other)),
        }
    }
}

/// A purchase returned by the store, either from the purchase flow or from
/// the list of owned purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store identifier (SKU) of the purchased product.
    pub identifier: String,
    /// Absent for test purchases.
    pub order_id: Option<String>,
    pub package_name: String,
    /// Milliseconds since the Unix epoch.
    pub purchase_time: i64,
    pub state: PurchaseState,
    pub developer_payload: Option<String>,
    /// Token used to consume the purchase.
    pub purchase_token: String,
    /// The purchase data exactly as received, for signature verification.
    pub original_json: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseData {
    order_id: Option<String>,
    package_name: String,
    product_id: String,
    purchase_time: i64,
    purchase_state: i64,
    developer_payload: Option<String>,
    #[serde(alias = "token")]
    purchase_token: String,
}

impl Transaction {
    /// Decode purchase data JSON together with its signature.
    pub fn from_purchase_data(json: &str, signature: &str) -> Result<Self, DecodeError> {
        let data: PurchaseData =
            serde_json::from_str(json).map_err(DecodeError::json("purchase data"))?;
        Ok(Self {
            identifier: data.product_id,
            order_id: data.order_id,
            package_name: data.package_name,
            purchase_time: data.purchase_time,
            state: PurchaseState::from_code(data.purchase_state)?,
            developer_payload: data.developer_payload,
            purchase_token: data.purchase_token,
            original_json: json.to_string(),
            signature: signature.to_string(),
        })
    }

    pub fn is_purchased(&self) -> bool {
        self.state == PurchaseState::Purchased
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PURCHASE: &str = r#"{
        "orderId": "GPA.1234-5678-9012-34567",
        "packageName": "com.gdx.pay.dummy.activity",
        "productId": "full_edition",
        "purchaseTime": 1345678900000,
        "purchaseState": 0,
        "developerPayload": "payload",
        "purchaseToken": "opaque-token-up-to-1000-characters"
    }"#;

    #[test]
    fn decode_purchase_data() {
        let tx = Transaction::from_purchase_data(PURCHASE, "sig").unwrap();
        assert_eq!(tx.identifier, "full_edition");
        assert_eq!(tx.order_id.as_deref(), Some("GPA.1234-5678-9012-34567"));
        assert_eq!(tx.purchase_time, 1345678900000);
        assert!(tx.is_purchased());
        assert_eq!(tx.purchase_token, "opaque-token-up-to-1000-characters");
        assert_eq!(tx.original_json, PURCHASE);
        assert_eq!(tx.signature, "sig");
    }

    #[test]
    fn refunded_purchase() {
        let json = PURCHASE.replace(r#""purchaseState": 0"#, r#""purchaseState": 2"#);
        let tx = Transaction::from_purchase_data(&json, "").unwrap();
        assert_eq!(tx.state, PurchaseState::Refunded);
        assert!(!tx.is_purchased());
    }

    #[test]
    fn unknown_state_is_rejected() {
        let json = PURCHASE.replace(r#""purchaseState": 0"#, r#""purchaseState": 9"#);
        let err = Transaction::from_purchase_data(&json, "").unwrap_err();
        assert!(matches!(err, DecodeError::UnknownPurchaseState(9)));
    }
}
