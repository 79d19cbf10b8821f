//! Adapter errors.

use crate::remote::RemoteCallError;
use gamepay_core::{DecodeError, ResponseCode};

/// Everything that can go wrong talking to the billing service.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("not allowed to bind to billing service: {0}")]
    PermissionDenied(String),
    #[error("billing service refused to bind")]
    BindRefused,
    #[error("billing service is not connected")]
    NotConnected,
    #[error("connection to billing service already in progress")]
    ConnectionInProgress,
    #[error("already connected to billing service")]
    AlreadyConnected,
    #[error("connection attempt aborted by disconnect")]
    ConnectionAborted,
    #[error("billing service disconnected")]
    ServiceDisconnected,
    #[error("{operation} failed: {code}")]
    RemoteService {
        operation: &'static str,
        code: ResponseCode,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("another purchase is already in progress")]
    PurchaseInProgress,
    #[error("could not launch purchase flow: {0}")]
    FlowLaunch(String),
    #[error("unexpected purchase flow result code: {0}")]
    UnexpectedFlowResult(i32),
    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),
}

impl BillingError {
    /// The response code, if the remote service rejected the request.
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            BillingError::RemoteService { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the failure came from the remote service rather than the
    /// connection lifecycle.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            BillingError::RemoteService { .. }
                | BillingError::MalformedResponse(_)
                | BillingError::RemoteCall(_)
        )
    }
}

impl From<DecodeError> for BillingError {
    fn from(err: DecodeError) -> Self {
        BillingError::MalformedResponse(err.to_string())
    }
}
