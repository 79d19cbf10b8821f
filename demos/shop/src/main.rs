//! In-app purchase walkthrough against a simulated store.
//!
//! Connects to the billing service, lists the catalog, optionally buys a
//! product, then lists what the player owns:
//!
//!   cargo run -p gamepay-demo-shop -- --buy full_edition
//!   cargo run -p gamepay-demo-shop -- --buy coins_100 --cancel
//!   cargo run -p gamepay-demo-shop -- --config shop.toml --refuse-bind

mod config;
mod host;
mod store;

use clap::Parser;
use config::ShopConfig;
use gamepay_billing::{BillingService, OfferType, PurchaseOutcome, RemoteBilling};
use host::{Behavior, SimulatedHost};
use std::path::PathBuf;
use std::sync::Arc;
use store::SimulatedStore;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shop", about = "Buy things from a simulated in-app store")]
struct Args {
    /// TOML file with package name, billing settings and catalog.
    #[arg(long, env = "SHOP_CONFIG")]
    config: Option<PathBuf>,
    /// Product identifier to buy.
    #[arg(long)]
    buy: Option<String>,
    /// Back out of the purchase confirmation screen.
    #[arg(long)]
    cancel: bool,
    /// Have the platform refuse the bind.
    #[arg(long)]
    refuse_bind: bool,
    /// Have the platform reject the bind for lack of permission.
    #[arg(long)]
    deny_bind: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("gamepay_demo_shop=info".parse()?)
                .add_directive("gamepay_billing=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ShopConfig::load(path)?,
        None => ShopConfig::default(),
    };

    let store = Arc::new(SimulatedStore::new(&config));
    let (completions_tx, mut completions) = mpsc::unbounded_channel();
    let behavior = Behavior {
        refuse_bind: args.refuse_bind,
        deny_bind: args.deny_bind,
        cancel_purchases: args.cancel,
    };
    let host = Arc::new(SimulatedHost::new(
        config.package.clone(),
        store.clone(),
        behavior,
        completions_tx,
    ));
    let billing = BillingService::new(host, config.billing.clone(), move |binder| {
        tracing::debug!("Attaching to {}", binder.descriptor());
        store.clone() as Arc<dyn RemoteBilling>
    });

    // Plays the part of the activity result callback.
    let router = billing.clone();
    tokio::spawn(async move {
        while let Some(done) = completions.recv().await {
            if !router.on_flow_result(done.request_code, done.result_code, done.data) {
                tracing::warn!("Flow result for unknown request {}", done.request_code);
            }
        }
    });

    billing.connect_async().await?;
    tracing::info!("Connected as {}", config.package);

    let identifiers: Vec<String> = config
        .catalog
        .iter()
        .map(|entry| entry.offer.identifier().to_string())
        .collect();
    let listings = billing.get_product_information(identifiers)?;
    for entry in &config.catalog {
        match listings.get(entry.offer.identifier()) {
            Some(info) => tracing::info!(
                "{} [{}]: {} - {}",
                info.localized_title,
                entry.offer.offer_type(),
                info.localized_price,
                info.localized_description
            ),
            None => tracing::warn!("{} is not listed", entry.offer.identifier()),
        }
    }

    if let Some(sku) = &args.buy {
        match billing.purchase(sku).await? {
            PurchaseOutcome::Purchased(transaction) => {
                tracing::info!(
                    "Bought {} (order {})",
                    transaction.identifier,
                    transaction.order_id.as_deref().unwrap_or("-")
                );
                let consumable = config.catalog.iter().any(|entry| {
                    entry.offer.identifier() == transaction.identifier
                        && entry.offer.offer_type() == OfferType::Consumable
                });
                if consumable {
                    billing.consume_purchase(&transaction.purchase_token)?;
                    tracing::info!("Consumed {}", transaction.identifier);
                }
            }
            PurchaseOutcome::Cancelled => tracing::info!("Purchase of {} cancelled", sku),
        }
    }

    let owned = billing.get_purchases(OfferType::Entitlement)?;
    tracing::info!("Player owns {} entitlement(s)", owned.len());
    for transaction in &owned {
        tracing::info!("  {}", transaction.identifier);
    }

    billing.disconnect();
    Ok(())
}
