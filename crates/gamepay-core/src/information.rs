//! Product information as reported by the store.

use crate::DecodeError;
use serde::{Deserialize, Serialize};

/// Localized store listing for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInformation {
    /// Store identifier (SKU).
    pub identifier: String,
    pub localized_title: String,
    pub localized_description: String,
    /// Formatted price including currency symbol, e.g. `"€ 1.00"`.
    pub localized_price: String,
    /// ISO 4217 currency code, e.g. `"EUR"`.
    pub price_currency_code: Option<String>,
    /// Price in millionths of the currency unit.
    pub price_amount_micros: Option<i64>,
}

/// One entry of the SKU details list, as the billing service serializes it.
#[derive(Debug, Deserialize)]
struct SkuDetails {
    #[serde(rename = "productId")]
    product_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    price: String,
    price_currency_code: Option<String>,
    price_amount_micros: Option<i64>,
}

impl ProductInformation {
    /// Decode a SKU details JSON blob.
    pub fn from_sku_details_json(json: &str) -> Result<Self, DecodeError> {
        let details: SkuDetails =
            serde_json::from_str(json).map_err(DecodeError::json("sku details"))?;
        Ok(Self {
            identifier: details.product_id,
            localized_title: details.title,
            localized_description: details.description,
            localized_price: details.price,
            price_currency_code: details.price_currency_code,
            price_amount_micros: details.price_amount_micros,
        })
    }

    /// Price in cents, derived from the micros amount.
    pub fn price_in_cents(&self) -> Option<i64> {
        self.price_amount_micros.map(|micros| micros / 10_000)
    }
}
