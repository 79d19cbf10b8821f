//! In-process stand-in for the platform billing service.

use crate::config::{CatalogEntry, ShopConfig};
use gamepay_billing::{
    BILLING_API_VERSION, BuyIntentResponse, IntentSender, OfferType, PurchasesResponse,
    RemoteBilling, RemoteCallError, ResponseCode, SkuDetailsRequest, SkuDetailsResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const STORE_DESCRIPTOR: &str = "com.android.vending.billing.IInAppBillingService";

const PAGE_SIZE: usize = 10;

/// What a buy intent launches; carried inside the intent sender token.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuyTicket {
    pub sku: String,
    pub developer_payload: String,
}

#[derive(Debug, Clone)]
struct Owned {
    sku: String,
    offer_type: OfferType,
    token: String,
    data: String,
    signature: String,
}

pub struct SimulatedStore {
    package: String,
    catalog: Vec<CatalogEntry>,
    owned: Mutex<Vec<Owned>>,
    orders: AtomicU64,
}

impl SimulatedStore {
    pub fn new(config: &ShopConfig) -> Self {
        Self {
            package: config.package.clone(),
            catalog: config.catalog.clone(),
            owned: Mutex::new(Vec::new()),
            orders: AtomicU64::new(0),
        }
    }

    fn entry(&self, sku: &str) -> Option<&CatalogEntry> {
        self.catalog.iter().find(|e| e.offer.identifier() == sku)
    }

    fn check_caller(&self, api_version: i32, package_name: &str) -> Option<ResponseCode> {
        if api_version != BILLING_API_VERSION {
            return Some(ResponseCode::BillingUnavailable);
        }
        if package_name != self.package {
            return Some(ResponseCode::DeveloperError);
        }
        None
    }

    /// Record a confirmed purchase, returning its data and signature.
    pub fn confirm(&self, ticket: &BuyTicket) -> Option<(String, String)> {
        let entry = self.entry(&ticket.sku)?;
        let order = self.orders.fetch_add(1, Ordering::Relaxed) + 1;
        let purchase_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        let token = format!("token-{}-{}", ticket.sku, order);
        let data = serde_json::json!({
            "orderId": format!("GPA.0000-{:04}", order),
            "packageName": self.package,
            "productId": ticket.sku,
            "purchaseTime": purchase_time,
            "purchaseState": 0,
            "developerPayload": ticket.developer_payload,
            "purchaseToken": token,
        })
        .to_string();

        let signature = format!("simulated-signature-{}", order);
        self.owned.lock().ok()?.push(Owned {
            sku: ticket.sku.clone(),
            offer_type: entry.offer.offer_type(),
            token,
            data: data.clone(),
            signature: signature.clone(),
        });
        Some((data, signature))
    }
}

impl RemoteBilling for SimulatedStore {
    fn get_sku_details(
        &self,
        api_version: i32,
        package_name: &str,
        purchase_type: &str,
        request: &SkuDetailsRequest,
    ) -> Result<SkuDetailsResponse, RemoteCallError> {
        if let Some(code) = self.check_caller(api_version, package_name) {
            return Ok(SkuDetailsResponse {
                response_code: code,
                details_list: Vec::new(),
            });
        }

        let details_list = request
            .item_ids
            .iter()
            .filter_map(|sku| self.entry(sku))
            .filter(|e| e.offer.offer_type().purchase_type() == purchase_type)
            .map(|e| {
                serde_json::json!({
                    "productId": e.offer.identifier(),
                    "type": purchase_type,
                    "price": format!("{:.2} {}", e.price_micros as f64 / 1e6, e.currency),
                    "price_amount_micros": e.price_micros,
                    "price_currency_code": e.currency,
                    "title": e.title,
                    "description": e.description,
                })
                .to_string()
            })
            .collect();

        Ok(SkuDetailsResponse {
            response_code: ResponseCode::Ok,
            details_list,
        })
    }

    fn get_buy_intent(
        &self,
        api_version: i32,
        package_name: &str,
        sku: &str,
        _purchase_type: &str,
        developer_payload: &str,
    ) -> Result<BuyIntentResponse, RemoteCallError> {
        let code = if let Some(code) = self.check_caller(api_version, package_name) {
            code
        } else {
            match self.entry(sku) {
                None => ResponseCode::ItemUnavailable,
                // Consumables too, until they are consumed.
                Some(_) if self.owns(sku) => ResponseCode::ItemAlreadyOwned,
                Some(_) => ResponseCode::Ok,
            }
        };
        if !code.is_ok() {
            return Ok(BuyIntentResponse {
                response_code: code,
                buy_intent: None,
            });
        }

        let ticket = BuyTicket {
            sku: sku.to_string(),
            developer_payload: developer_payload.to_string(),
        };
        let token = serde_json::to_string(&ticket)
            .map_err(|e| RemoteCallError::Failed(e.to_string()))?;
        Ok(BuyIntentResponse {
            response_code: ResponseCode::Ok,
            buy_intent: Some(IntentSender::new(token)),
        })
    }

    fn get_purchases(
        &self,
        api_version: i32,
        package_name: &str,
        purchase_type: &str,
        continuation_token: Option<&str>,
    ) -> Result<PurchasesResponse, RemoteCallError> {
        if let Some(code) = self.check_caller(api_version, package_name) {
            return Ok(PurchasesResponse {
                response_code: code,
                purchase_data_list: Vec::new(),
                signature_list: Vec::new(),
                continuation_token: None,
            });
        }

        let start = continuation_token
            .map(|t| t.parse::<usize>())
            .transpose()
            .map_err(|e| RemoteCallError::Failed(format!("bad continuation token: {}", e)))?
            .unwrap_or(0);
        let owned = self
            .owned
            .lock()
            .map_err(|_| RemoteCallError::DeadObject)?;
        let matching: Vec<&Owned> = owned
            .iter()
            .filter(|o| o.offer_type.purchase_type() == purchase_type)
            .collect();
        let page: Vec<&Owned> = matching.iter().skip(start).take(PAGE_SIZE).copied().collect();
        let next = start + page.len();

        Ok(PurchasesResponse {
            response_code: ResponseCode::Ok,
            purchase_data_list: page.iter().map(|o| o.data.clone()).collect(),
            signature_list: page.iter().map(|o| o.signature.clone()).collect(),
            continuation_token: (next < matching.len()).then(|| next.to_string()),
        })
    }

    fn consume_purchase(
        &self,
        api_version: i32,
        package_name: &str,
        purchase_token: &str,
    ) -> Result<ResponseCode, RemoteCallError> {
        if let Some(code) = self.check_caller(api_version, package_name) {
            return Ok(code);
        }
        let mut owned = self
            .owned
            .lock()
            .map_err(|_| RemoteCallError::DeadObject)?;
        match owned.iter().position(|o| o.token == purchase_token) {
            Some(idx) => {
                owned.remove(idx);
                Ok(ResponseCode::Ok)
            }
            None => Ok(ResponseCode::ItemNotOwned),
        }
    }
}

impl SimulatedStore {
    fn owns(&self, sku: &str) -> bool {
        self.owned
            .lock()
            .map(|owned| owned.iter().any(|o| o.sku == sku))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(sku: &str) -> BuyTicket {
        BuyTicket {
            sku: sku.to_string(),
            developer_payload: "payload".to_string(),
        }
    }

    #[test]
    fn restored_purchase_keeps_its_signature() {
        let config = ShopConfig::default();
        let store = SimulatedStore::new(&config);

        let (data, signature) = store.confirm(&ticket("full_edition")).unwrap();
        let page = store
            .get_purchases(BILLING_API_VERSION, &config.package, "inapp", None)
            .unwrap();

        assert_eq!(page.purchase_data_list, vec![data]);
        assert_eq!(page.signature_list, vec![signature]);
    }

    #[test]
    fn orders_are_numbered_in_sequence() {
        let store = SimulatedStore::new(&ShopConfig::default());

        let (_, first) = store.confirm(&ticket("full_edition")).unwrap();
        let (_, second) = store.confirm(&ticket("coins_100")).unwrap();

        assert_eq!(first, "simulated-signature-1");
        assert_eq!(second, "simulated-signature-2");
        assert!(store.confirm(&ticket("not_listed")).is_none());
    }
}
