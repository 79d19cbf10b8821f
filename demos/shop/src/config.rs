//! Shop configuration file.

use gamepay_billing::{BillingConfig, Offer};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Package name the game is installed under.
    pub package: String,
    pub billing: BillingConfig,
    pub catalog: Vec<CatalogEntry>,
}

/// A product the simulated store lists.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub offer: Offer,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_micros: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "EUR".to_string()
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            package: "com.example.dungeon".to_string(),
            billing: BillingConfig::default(),
            catalog: vec![
                CatalogEntry {
                    offer: Offer::entitlement("full_edition"),
                    title: "Full Edition".to_string(),
                    description: "Unlock all levels".to_string(),
                    price_micros: 1_000_000,
                    currency: default_currency(),
                },
                CatalogEntry {
                    offer: Offer::consumable("coins_100"),
                    title: "100 Coins".to_string(),
                    description: "A pile of coins".to_string(),
                    price_micros: 490_000,
                    currency: default_currency(),
                },
            ],
        }
    }
}

impl ShopConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
