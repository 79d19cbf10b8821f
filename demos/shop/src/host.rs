//! Simulated platform: binds the store on a background task and plays the
//! purchase confirmation screen.

use crate::store::{BuyTicket, STORE_DESCRIPTOR, SimulatedStore};
use gamepay_billing::{
    BillingHost, BindError, FlowIntent, FlowLaunchError, FlowResult, IntentSender,
    RESULT_CANCELED, RESULT_OK, ServiceBinder, ServiceConnection, ServiceIntent,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Delay before the platform reports the service or the flow result.
const PLATFORM_LATENCY: Duration = Duration::from_millis(50);

/// A finished external flow, routed back to whoever launched it.
#[derive(Debug)]
pub struct FlowCompletion {
    pub request_code: i32,
    pub result_code: i32,
    pub data: FlowResult,
}

/// How the simulated user and platform behave.
#[derive(Debug, Clone, Copy, Default)]
pub struct Behavior {
    pub refuse_bind: bool,
    pub deny_bind: bool,
    pub cancel_purchases: bool,
}

pub struct SimulatedHost {
    package: String,
    store: Arc<SimulatedStore>,
    behavior: Behavior,
    completions: mpsc::UnboundedSender<FlowCompletion>,
}

impl SimulatedHost {
    pub fn new(
        package: String,
        store: Arc<SimulatedStore>,
        behavior: Behavior,
        completions: mpsc::UnboundedSender<FlowCompletion>,
    ) -> Self {
        Self {
            package,
            store,
            behavior,
            completions,
        }
    }
}

impl BillingHost for SimulatedHost {
    fn package_name(&self) -> String {
        self.package.clone()
    }

    fn bind_service(
        &self,
        intent: &ServiceIntent,
        connection: ServiceConnection,
        flags: i32,
    ) -> Result<bool, BindError> {
        if self.behavior.deny_bind {
            return Err(BindError::Security(format!(
                "{} may not bind to {}",
                self.package, intent.package
            )));
        }
        if self.behavior.refuse_bind {
            return Ok(false);
        }

        tracing::debug!("Binding {} with flags {}", intent.action, flags);
        tokio::spawn(async move {
            tokio::time::sleep(PLATFORM_LATENCY).await;
            connection.service_connected(ServiceBinder::new(STORE_DESCRIPTOR));
        });
        Ok(true)
    }

    fn unbind_service(&self, connection: &ServiceConnection) {
        tracing::debug!("Unbinding generation {}", connection.generation());
    }

    fn start_external_flow(
        &self,
        sender: &IntentSender,
        request_code: i32,
        _fill_in: FlowIntent,
        _flags_mask: i32,
        _flags_values: i32,
        _extra_flags: i32,
    ) -> Result<(), FlowLaunchError> {
        let ticket: BuyTicket = serde_json::from_str(sender.token())
            .map_err(|e| FlowLaunchError(format!("unreadable intent sender: {}", e)))?;
        let store = self.store.clone();
        let completions = self.completions.clone();
        let cancel = self.behavior.cancel_purchases;

        tokio::spawn(async move {
            tokio::time::sleep(PLATFORM_LATENCY).await;
            let completion = if cancel {
                tracing::info!("User backed out of buying {}", ticket.sku);
                FlowCompletion {
                    request_code,
                    result_code: RESULT_CANCELED,
                    data: FlowResult::default(),
                }
            } else {
                let (purchase_data, data_signature) = match store.confirm(&ticket) {
                    Some((data, signature)) => (Some(data), Some(signature)),
                    None => (None, None),
                };
                FlowCompletion {
                    request_code,
                    result_code: RESULT_OK,
                    data: FlowResult {
                        response_code: Some(if purchase_data.is_some() { 0 } else { 6 }),
                        purchase_data,
                        data_signature,
                    },
                }
            };
            if completions.send(completion).is_err() {
                tracing::warn!("Flow finished after the game stopped listening");
            }
        });
        Ok(())
    }
}
