//! The billing connection adapter.

use crate::config::{BILLING_API_VERSION, BillingConfig};
use crate::connection::{ConnectionEvent, ConnectionState, ServiceConnection};
use crate::error::BillingError;
use crate::listener::{
    ConnectionListener, OneshotConnectionListener, OneshotPurchaseListener, PurchaseOutcome,
    PurchaseRequestListener,
};
use crate::platform::{
    BillingHost, BindError, FlowIntent, FlowResult, RESULT_CANCELED, RESULT_OK, ServiceBinder,
};
use crate::remote::{RemoteBilling, RemoteFactory, SkuDetailsRequest};
use gamepay_core::{
    OfferType, PURCHASE_TYPE_IN_APP, ProductInformation, ResponseCode, Transaction,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Adapter owning one connection to the platform billing service.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct BillingService {
    shared: Arc<Shared>,
}

pub(crate) struct Shared {
    host: Arc<dyn BillingHost>,
    factory: RemoteFactory,
    config: BillingConfig,
    inner: Mutex<Inner>,
}

struct Inner {
    state: ConnectionState,
    /// Incremented per bind attempt.
    generation: u64,
    listener: Option<Arc<dyn ConnectionListener>>,
    connection: Option<ServiceConnection>,
    remote: Option<Arc<dyn RemoteBilling>>,
    pending: Option<PendingPurchase>,
}

/// A purchase whose flow has been (or is about to be) launched.
struct PendingPurchase {
    identifier: String,
    generation: u64,
    listener: Arc<dyn PurchaseRequestListener>,
}

/// A connected remote plus what a request needs to call it.
struct Session {
    remote: Arc<dyn RemoteBilling>,
    package_name: String,
}

impl BillingService {
    /// Create a disconnected adapter.
    ///
    /// `factory` turns the binder the platform hands over on connect into the
    /// remote billing interface.
    pub fn new<F>(host: Arc<dyn BillingHost>, config: BillingConfig, factory: F) -> Self
    where
        F: Fn(ServiceBinder) -> Arc<dyn RemoteBilling> + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                host,
                factory: Box::new(factory),
                config,
                inner: Mutex::new(Inner {
                    state: ConnectionState::Disconnected,
                    generation: 0,
                    listener: None,
                    connection: None,
                    remote: None,
                    pending: None,
                }),
            }),
        }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.shared.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Bind the billing service.
    ///
    /// Bind failures are reported through `listener.disconnected`, before this
    /// returns. On a successful bind the listener hears `connected` once the
    /// platform delivers the service. Calling this while a connection exists or
    /// is being set up is rejected without touching it.
    pub fn connect(&self, listener: Arc<dyn ConnectionListener>) -> Result<(), BillingError> {
        let connection = {
            let mut inner = self.shared.lock();
            match inner.state {
                ConnectionState::Connecting => return Err(BillingError::ConnectionInProgress),
                ConnectionState::Connected => return Err(BillingError::AlreadyConnected),
                ConnectionState::Disconnected => {}
            }
            inner.generation += 1;
            inner.state = ConnectionState::Connecting;
            inner.listener = Some(listener);
            let connection = ServiceConnection::new(Arc::downgrade(&self.shared), inner.generation);
            inner.connection = Some(connection.clone());
            connection
        };

        let generation = connection.generation();
        let intent = self.shared.config.service_intent();
        tracing::debug!("Binding {} (generation {})", intent.action, generation);

        match self
            .shared
            .host
            .bind_service(&intent, connection, self.shared.config.bind_flags)
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Bind to {} refused", intent.package);
                self.shared.fail_connect(generation, BillingError::BindRefused);
            }
            Err(BindError::Security(message)) => {
                tracing::warn!("Bind to {} denied: {}", intent.package, message);
                self.shared
                    .fail_connect(generation, BillingError::PermissionDenied(message));
            }
        }
        Ok(())
    }

    /// Connect and wait for the outcome.
    pub async fn connect_async(&self) -> Result<(), BillingError> {
        let (tx, rx) = oneshot::channel();
        self.connect(Arc::new(OneshotConnectionListener::new(tx)))?;
        rx.await.unwrap_or(Err(BillingError::ConnectionAborted))
    }

    /// Tear down the connection.
    ///
    /// A listener still waiting for its connection hears
    /// [`BillingError::ConnectionAborted`]. Pending purchases are dropped and
    /// their flow results ignored.
    pub fn disconnect(&self) {
        let (previous, connection, listener) = {
            let mut inner = self.shared.lock();
            let previous = inner.state;
            if previous == ConnectionState::Disconnected {
                return;
            }
            inner.state = ConnectionState::Disconnected;
            inner.remote = None;
            inner.pending = None;
            (previous, inner.connection.take(), inner.listener.take())
        };

        if let Some(connection) = connection {
            self.shared.host.unbind_service(&connection);
        }
        tracing::info!("Disconnected from billing service");

        if previous == ConnectionState::Connecting
            && let Some(listener) = listener
        {
            listener.disconnected(BillingError::ConnectionAborted);
        }
    }

    /// Look up store listings for `identifiers`, keyed by identifier.
    ///
    /// Either every listing is returned or the call fails; a rejected request
    /// never yields a partial map. Listings for products that were not asked
    /// for, or listed twice, make the whole response malformed.
    pub fn get_product_information<I, S>(
        &self,
        identifiers: I,
    ) -> Result<HashMap<String, ProductInformation>, BillingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let session = self.shared.session()?;
        let request = SkuDetailsRequest {
            item_ids: identifiers.into_iter().map(Into::into).collect(),
        };
        if request.item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let response = session.remote.get_sku_details(
            BILLING_API_VERSION,
            &session.package_name,
            PURCHASE_TYPE_IN_APP,
            &request,
        )?;
        if !response.response_code.is_ok() {
            tracing::warn!("SKU details request failed: {}", response.response_code);
            return Err(BillingError::RemoteService {
                operation: "get sku details",
                code: response.response_code,
            });
        }

        let requested: HashSet<&str> = request.item_ids.iter().map(String::as_str).collect();
        let mut listings = HashMap::with_capacity(response.details_list.len());
        for json in &response.details_list {
            let info = ProductInformation::from_sku_details_json(json)?;
            if !requested.contains(info.identifier.as_str()) {
                return Err(BillingError::MalformedResponse(format!(
                    "details for unrequested product {}",
                    info.identifier
                )));
            }
            if listings.contains_key(&info.identifier) {
                return Err(BillingError::MalformedResponse(format!(
                    "duplicate details for product {}",
                    info.identifier
                )));
            }
            listings.insert(info.identifier.clone(), info);
        }
        Ok(listings)
    }

    /// Start the purchase flow for `identifier` with the configured developer
    /// payload.
    ///
    /// Only a missing connection fails synchronously; everything after that is
    /// reported to `listener`.
    pub fn start_purchase_request(
        &self,
        identifier: &str,
        listener: Arc<dyn PurchaseRequestListener>,
    ) -> Result<(), BillingError> {
        let payload = self.shared.config.developer_payload.clone();
        self.start_purchase_request_with_payload(identifier, &payload, listener)
    }

    pub fn start_purchase_request_with_payload(
        &self,
        identifier: &str,
        developer_payload: &str,
        listener: Arc<dyn PurchaseRequestListener>,
    ) -> Result<(), BillingError> {
        let (remote, generation) = {
            let mut inner = self.shared.lock();
            let remote = match (&inner.remote, inner.state) {
                (Some(remote), ConnectionState::Connected) => remote.clone(),
                _ => return Err(BillingError::NotConnected),
            };
            if inner.pending.is_some() {
                drop(inner);
                listener.purchase_error(BillingError::PurchaseInProgress);
                return Ok(());
            }
            // Reserved before the remote call so a concurrent request sees it.
            inner.pending = Some(PendingPurchase {
                identifier: identifier.to_string(),
                generation: inner.generation,
                listener: listener.clone(),
            });
            (remote, inner.generation)
        };
        let session = Session {
            remote,
            package_name: self.shared.host.package_name(),
        };

        if let Err(e) = self.launch_purchase(&session, identifier, developer_payload) {
            tracing::warn!("Purchase of {} not started: {}", identifier, e);
            self.shared.clear_pending(generation);
            listener.purchase_error(e);
        }
        Ok(())
    }

    fn launch_purchase(
        &self,
        session: &Session,
        identifier: &str,
        developer_payload: &str,
    ) -> Result<(), BillingError> {
        let response = session.remote.get_buy_intent(
            BILLING_API_VERSION,
            &session.package_name,
            identifier,
            PURCHASE_TYPE_IN_APP,
            developer_payload,
        )?;
        if !response.response_code.is_ok() {
            return Err(BillingError::RemoteService {
                operation: "get buy intent",
                code: response.response_code,
            });
        }
        let sender = response.buy_intent.ok_or_else(|| {
            BillingError::MalformedResponse("buy intent response without intent sender".into())
        })?;

        self.shared
            .host
            .start_external_flow(
                &sender,
                self.shared.config.request_code,
                FlowIntent::default(),
                0,
                0,
                0,
            )
            .map_err(|e| BillingError::FlowLaunch(e.0))?;
        tracing::info!("Purchase flow started for {}", identifier);
        Ok(())
    }

    /// Purchase `identifier` and wait for the flow to finish.
    ///
    /// Fails with [`BillingError::ServiceDisconnected`] if the connection is
    /// torn down before the flow reports back.
    pub async fn purchase(&self, identifier: &str) -> Result<PurchaseOutcome, BillingError> {
        let (tx, rx) = oneshot::channel();
        self.start_purchase_request(identifier, Arc::new(OneshotPurchaseListener::new(tx)))?;
        rx.await.unwrap_or(Err(BillingError::ServiceDisconnected))
    }

    /// Deliver the result of an external flow.
    ///
    /// Returns `false` if `request_code` is not the one this adapter launches
    /// flows with, so the host can route the result elsewhere. Results for a
    /// purchase that is no longer pending are dropped.
    pub fn on_flow_result(&self, request_code: i32, result_code: i32, data: FlowResult) -> bool {
        if request_code != self.shared.config.request_code {
            return false;
        }

        let pending = {
            let mut inner = self.shared.lock();
            match inner.pending.take() {
                Some(pending)
                    if pending.generation == inner.generation
                        && inner.state == ConnectionState::Connected =>
                {
                    pending
                }
                _ => {
                    tracing::warn!("Ignoring flow result with no pending purchase");
                    return true;
                }
            }
        };

        match translate_flow_result(&pending.identifier, result_code, data) {
            Ok(PurchaseOutcome::Purchased(transaction)) => {
                tracing::info!("Purchased {}", transaction.identifier);
                pending.listener.purchase_success(transaction);
            }
            Ok(PurchaseOutcome::Cancelled) => {
                tracing::info!("Purchase of {} cancelled", pending.identifier);
                pending.listener.purchase_cancelled();
            }
            Err(e) => {
                tracing::warn!("Purchase of {} failed: {}", pending.identifier, e);
                pending.listener.purchase_error(e);
            }
        }
        true
    }

    /// Purchases the user owns, following continuation tokens to the end.
    pub fn get_purchases(&self, offer_type: OfferType) -> Result<Vec<Transaction>, BillingError> {
        let session = self.shared.session()?;
        let mut transactions = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = session.remote.get_purchases(
                BILLING_API_VERSION,
                &session.package_name,
                offer_type.purchase_type(),
                continuation.as_deref(),
            )?;
            if !page.response_code.is_ok() {
                return Err(BillingError::RemoteService {
                    operation: "get purchases",
                    code: page.response_code,
                });
            }
            if page.purchase_data_list.len() != page.signature_list.len() {
                return Err(BillingError::MalformedResponse(format!(
                    "{} purchases but {} signatures",
                    page.purchase_data_list.len(),
                    page.signature_list.len()
                )));
            }
            for (data, signature) in page.purchase_data_list.iter().zip(&page.signature_list) {
                transactions.push(Transaction::from_purchase_data(data, signature)?);
            }

            match page.continuation_token {
                Some(token) if !token.is_empty() => continuation = Some(token),
                _ => break,
            }
        }

        tracing::debug!("{} owned {} purchases", transactions.len(), offer_type);
        Ok(transactions)
    }

    /// Consume a purchase so the product can be bought again.
    pub fn consume_purchase(&self, purchase_token: &str) -> Result<(), BillingError> {
        let session = self.shared.session()?;
        let code = session.remote.consume_purchase(
            BILLING_API_VERSION,
            &session.package_name,
            purchase_token,
        )?;
        if !code.is_ok() {
            return Err(BillingError::RemoteService {
                operation: "consume purchase",
                code,
            });
        }
        Ok(())
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot what a request needs, failing unless connected.
    fn session(&self) -> Result<Session, BillingError> {
        let remote = {
            let inner = self.lock();
            match (&inner.remote, inner.state) {
                (Some(remote), ConnectionState::Connected) => remote.clone(),
                _ => return Err(BillingError::NotConnected),
            }
        };
        Ok(Session {
            remote,
            package_name: self.host.package_name(),
        })
    }

    fn clear_pending(&self, generation: u64) {
        let mut inner = self.lock();
        if inner
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == generation)
        {
            inner.pending = None;
        }
    }

    /// Settle a failed bind attempt.
    fn fail_connect(&self, generation: u64, error: BillingError) {
        let listener = {
            let mut inner = self.lock();
            if inner.generation != generation || inner.state != ConnectionState::Connecting {
                return;
            }
            inner.state = ConnectionState::Disconnected;
            inner.connection = None;
            inner.listener.take()
        };
        if let Some(listener) = listener {
            listener.disconnected(error);
        }
    }

    pub(crate) fn handle_event(&self, generation: u64, event: ConnectionEvent) {
        match event {
            ConnectionEvent::ServiceConnected(binder) => self.on_connected(generation, binder),
            ConnectionEvent::ServiceDisconnected => self.on_disconnected(generation),
        }
    }

    fn on_connected(&self, generation: u64, binder: ServiceBinder) {
        if !self.is_current(generation, ConnectionState::Connecting) {
            tracing::warn!("Ignoring stale service connection (generation {})", generation);
            return;
        }

        let remote = (self.factory)(binder);

        let listener = {
            let mut inner = self.lock();
            if inner.generation != generation || inner.state != ConnectionState::Connecting {
                tracing::warn!("Connection torn down while attaching (generation {})", generation);
                return;
            }
            inner.remote = Some(remote);
            inner.state = ConnectionState::Connected;
            inner.listener.clone()
        };

        tracing::info!("Connected to billing service (generation {})", generation);
        if let Some(listener) = listener {
            listener.connected();
        }
    }

    fn on_disconnected(&self, generation: u64) {
        let (connection, listener) = {
            let mut inner = self.lock();
            if inner.generation != generation || inner.state == ConnectionState::Disconnected {
                tracing::debug!("Ignoring stale service loss (generation {})", generation);
                return;
            }
            inner.state = ConnectionState::Disconnected;
            inner.remote = None;
            inner.pending = None;
            (inner.connection.take(), inner.listener.take())
        };

        tracing::warn!("Billing service lost (generation {})", generation);
        if let Some(connection) = connection {
            self.host.unbind_service(&connection);
        }
        if let Some(listener) = listener {
            listener.disconnected(BillingError::ServiceDisconnected);
        }
    }

    fn is_current(&self, generation: u64, state: ConnectionState) -> bool {
        let inner = self.lock();
        inner.generation == generation && inner.state == state
    }
}

fn translate_flow_result(
    identifier: &str,
    result_code: i32,
    data: FlowResult,
) -> Result<PurchaseOutcome, BillingError> {
    match result_code {
        RESULT_CANCELED => return Ok(PurchaseOutcome::Cancelled),
        RESULT_OK => {}
        other => return Err(BillingError::UnexpectedFlowResult(other)),
    }

    let code = data
        .response_code
        .map(ResponseCode::from_code)
        .unwrap_or(ResponseCode::Ok);
    match code {
        ResponseCode::Ok => {}
        ResponseCode::UserCanceled => return Ok(PurchaseOutcome::Cancelled),
        code => {
            return Err(BillingError::RemoteService {
                operation: "purchase",
                code,
            });
        }
    }

    let (Some(purchase_data), Some(signature)) = (data.purchase_data, data.data_signature) else {
        return Err(BillingError::MalformedResponse(
            "purchase result without purchase data or signature".into(),
        ));
    };
    let transaction = Transaction::from_purchase_data(&purchase_data, &signature)?;
    if transaction.identifier != identifier {
        return Err(BillingError::MalformedResponse(format!(
            "purchase result for {} while buying {}",
            transaction.identifier, identifier
        )));
    }
    Ok(PurchaseOutcome::Purchased(transaction))
}
