//! Connection lifecycle state and the handle the platform reports through.

use crate::platform::ServiceBinder;
use crate::service::Shared;
use std::fmt;
use std::sync::Weak;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no bind in flight.
    Disconnected,
    /// Bind issued, waiting for the service to come up.
    Connecting,
    /// Remote interface available, requests allowed.
    Connected,
}

/// Something the platform reports about a bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The service is up; the binder is the raw handle to it.
    ServiceConnected(ServiceBinder),
    /// The service went away (process died, update installed, ...).
    ServiceDisconnected,
}

/// Handle given to the platform with each bind call.
///
/// Tagged with the bind attempt it belongs to, so events arriving for an
/// attempt that has since been torn down are dropped. Holds only a weak
/// reference to the adapter; events sent after the adapter is gone go nowhere.
#[derive(Clone)]
pub struct ServiceConnection {
    service: Weak<Shared>,
    generation: u64,
}

impl ServiceConnection {
    pub(crate) fn new(service: Weak<Shared>, generation: u64) -> Self {
        Self {
            service,
            generation,
        }
    }

    /// Bind attempt this handle belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn service_connected(&self, binder: ServiceBinder) {
        self.deliver(ConnectionEvent::ServiceConnected(binder));
    }

    pub fn service_disconnected(&self) {
        self.deliver(ConnectionEvent::ServiceDisconnected);
    }

    /// Feed an event into the adapter's state machine.
    pub fn deliver(&self, event: ConnectionEvent) {
        match self.service.upgrade() {
            Some(shared) => shared.handle_event(self.generation, event),
            None => tracing::debug!(
                "Dropping {:?} for generation {}: billing service gone",
                event,
                self.generation
            ),
        }
    }
}

impl fmt::Debug for ServiceConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConnection")
            .field("generation", &self.generation)
            .finish()
    }
}

impl PartialEq for ServiceConnection {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation && Weak::ptr_eq(&self.service, &other.service)
    }
}

impl Eq for ServiceConnection {}
