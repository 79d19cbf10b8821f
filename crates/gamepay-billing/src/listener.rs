//! Callbacks the adapter reports through.

use crate::error::BillingError;
use gamepay_core::Transaction;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Receives connection lifecycle notifications.
pub trait ConnectionListener: Send + Sync {
    fn connected(&self);
    fn disconnected(&self, error: BillingError);
}

/// Receives the outcome of a single purchase request.
pub trait PurchaseRequestListener: Send + Sync {
    fn purchase_success(&self, transaction: Transaction);
    fn purchase_cancelled(&self);
    fn purchase_error(&self, error: BillingError);
}

/// How a purchase that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased(Transaction),
    Cancelled,
}

/// Resolves a oneshot with the first connection notification.
pub(crate) struct OneshotConnectionListener {
    tx: Mutex<Option<oneshot::Sender<Result<(), BillingError>>>>,
}

impl OneshotConnectionListener {
    pub(crate) fn new(tx: oneshot::Sender<Result<(), BillingError>>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    fn resolve(&self, result: Result<(), BillingError>) {
        let tx = self.tx.lock().ok().and_then(|mut slot| slot.take());
        match tx {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => {
                if let Err(e) = result {
                    tracing::debug!("Connection notification after resolve: {}", e);
                }
            }
        }
    }
}

impl ConnectionListener for OneshotConnectionListener {
    fn connected(&self) {
        self.resolve(Ok(()));
    }

    fn disconnected(&self, error: BillingError) {
        self.resolve(Err(error));
    }
}

/// Resolves a oneshot with the purchase outcome.
pub(crate) struct OneshotPurchaseListener {
    tx: Mutex<Option<oneshot::Sender<Result<PurchaseOutcome, BillingError>>>>,
}

impl OneshotPurchaseListener {
    pub(crate) fn new(tx: oneshot::Sender<Result<PurchaseOutcome, BillingError>>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    fn resolve(&self, result: Result<PurchaseOutcome, BillingError>) {
        if let Some(tx) = self.tx.lock().ok().and_then(|mut slot| slot.take()) {
            let _ = tx.send(result);
        }
    }
}

impl PurchaseRequestListener for OneshotPurchaseListener {
    fn purchase_success(&self, transaction: Transaction) {
        self.resolve(Ok(PurchaseOutcome::Purchased(transaction)));
    }

    fn purchase_cancelled(&self) {
        self.resolve(Ok(PurchaseOutcome::Cancelled));
    }

    fn purchase_error(&self, error: BillingError) {
        self.resolve(Err(error));
    }
}
