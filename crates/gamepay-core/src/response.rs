//! Result codes returned by every remote billing call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A billing service response code.
///
/// Only [`ResponseCode::Ok`] comes with a usable payload. Codes the service
/// may add later are kept as [`ResponseCode::Unknown`] rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ResponseCode {
    Ok,
    UserCanceled,
    /// Network connection is down.
    ServiceUnavailable,
    /// Billing API version is not supported for the type requested.
    BillingUnavailable,
    /// Requested product is not available for purchase.
    ItemUnavailable,
    /// Invalid arguments provided to the API.
    DeveloperError,
    /// Fatal error during the API action.
    Error,
    ItemAlreadyOwned,
    ItemNotOwned,
    Unknown(i32),
}

impl ResponseCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ResponseCode::Ok,
            1 => ResponseCode::UserCanceled,
            2 => ResponseCode::ServiceUnavailable,
            3 => ResponseCode::BillingUnavailable,
            4 => ResponseCode::ItemUnavailable,
            5 => ResponseCode::DeveloperError,
            6 => ResponseCode::Error,
            7 => ResponseCode::ItemAlreadyOwned,
            8 => ResponseCode::ItemNotOwned,
            other => ResponseCode::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ResponseCode::Ok => 0,
            ResponseCode::UserCanceled => 1,
            ResponseCode::ServiceUnavailable => 2,
            ResponseCode::BillingUnavailable => 3,
            ResponseCode::ItemUnavailable => 4,
            ResponseCode::DeveloperError => 5,
            ResponseCode::Error => 6,
            ResponseCode::ItemAlreadyOwned => 7,
            ResponseCode::ItemNotOwned => 8,
            ResponseCode::Unknown(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseCode::Ok)
    }
}

impl From<i32> for ResponseCode {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<ResponseCode> for i32 {
    fn from(code: ResponseCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseCode::Ok => "ok",
            ResponseCode::UserCanceled => "user canceled",
            ResponseCode::ServiceUnavailable => "service unavailable",
            ResponseCode::BillingUnavailable => "billing unavailable",
            ResponseCode::ItemUnavailable => "item unavailable",
            ResponseCode::DeveloperError => "developer error",
            ResponseCode::Error => "error",
            ResponseCode::ItemAlreadyOwned => "item already owned",
            ResponseCode::ItemNotOwned => "item not owned",
            ResponseCode::Unknown(_) => "unknown",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(ResponseCode::from_code(0), ResponseCode::Ok);
        assert_eq!(ResponseCode::from_code(2), ResponseCode::ServiceUnavailable);
        assert_eq!(ResponseCode::ItemNotOwned.code(), 8);
        assert!(ResponseCode::Ok.is_ok());
        assert!(!ResponseCode::UserCanceled.is_ok());
    }

    #[test]
    fn unknown_code_is_preserved() {
        let code = ResponseCode::from_code(-1001);
        assert_eq!(code, ResponseCode::Unknown(-1001));
        assert_eq!(code.code(), -1001);
        assert_eq!(code.to_string(), "unknown (-1001)");
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&ResponseCode::DeveloperError).unwrap(), "5");
        let code: ResponseCode = serde_json::from_str("3").unwrap();
        assert_eq!(code, ResponseCode::BillingUnavailable);
    }
}
