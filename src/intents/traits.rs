use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{ExecutionDetails, Quote, QuoteRequest};

/// Swap operation result type
pub type SwapResult<T> = Result<T, SwapError>;

/// Swap core errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwapError {
    #[error("Invalid trade data: {0}")]
    InvalidTradeData(String),

    #[error("Unsupported asset: {symbol}")]
    UnsupportedAsset { symbol: String },

    #[error("Could not parse amount from \"{text}\"")]
    AmountParseError { text: String },

    #[error("Unauthorized: {0}")]
    AuthError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found or service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Unknown error (status {status}): {message}")]
    UnknownError { status: u16, message: String },

    #[error("Transfer rejected: {0}")]
    TransferRejected(String),

    #[error("Tracking timed out after {attempts} attempts")]
    TrackingTimeout { attempts: u32 },

    #[error("Quote expired at {deadline}")]
    QuoteExpired { deadline: String },

    #[error("Deposit address {0} is already being tracked")]
    AlreadyTracking(String),

    #[error("No pending trade to act on")]
    NoPendingTrade,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Stable, serializable error code used in structured failure results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidTradeData,
    UnsupportedAsset,
    AmountParseError,
    AuthError,
    InvalidRequest,
    ServiceUnavailable,
    UnknownError,
    TransferRejected,
    TrackingTimeout,
    QuoteExpired,
    AlreadyTracking,
    NoPendingTrade,
    NetworkError,
    DecodeError,
}

impl SwapError {
    /// Map a non-success HTTP status from the quote service.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => SwapError::AuthError(message),
            400 => SwapError::InvalidRequest(message),
            404 => SwapError::ServiceUnavailable(message),
            _ => SwapError::UnknownError { status, message },
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SwapError::InvalidTradeData(_) => ErrorCode::InvalidTradeData,
            SwapError::UnsupportedAsset { .. } => ErrorCode::UnsupportedAsset,
            SwapError::AmountParseError { .. } => ErrorCode::AmountParseError,
            SwapError::AuthError(_) => ErrorCode::AuthError,
            SwapError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            SwapError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
            SwapError::UnknownError { .. } => ErrorCode::UnknownError,
            SwapError::TransferRejected(_) => ErrorCode::TransferRejected,
            SwapError::TrackingTimeout { .. } => ErrorCode::TrackingTimeout,
            SwapError::QuoteExpired { .. } => ErrorCode::QuoteExpired,
            SwapError::AlreadyTracking(_) => ErrorCode::AlreadyTracking,
            SwapError::NoPendingTrade => ErrorCode::NoPendingTrade,
            SwapError::Network(_) => ErrorCode::NetworkError,
            SwapError::Decode(_) => ErrorCode::DecodeError,
        }
    }

    /// Unauthorized and not-found poll errors end a tracking session.
    pub fn is_fatal_for_tracking(&self) -> bool {
        matches!(self, SwapError::AuthError(_) | SwapError::ServiceUnavailable(_))
    }

    /// Validation errors are raised to the caller, never folded into results.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SwapError::InvalidTradeData(_)
                | SwapError::UnsupportedAsset { .. }
                | SwapError::AmountParseError { .. }
        )
    }
}

/// Cross-chain swap quoting and execution-status service
#[async_trait]
pub trait QuoteService: Send + Sync + std::fmt::Debug {
    /// Service name for logs
    fn name(&self) -> &'static str;

    /// Request a priced quote
    async fn get_quote(&self, request: &QuoteRequest) -> SwapResult<Quote>;

    /// Check execution status of the swap behind a deposit address
    async fn get_execution_status(&self, deposit_address: &str) -> SwapResult<ExecutionDetails>;
}

/// Single action inside a signed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Action {
    Transfer {
        /// Amount in yoctoNEAR, base-10 integer string
        deposit: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransactionRequest {
    pub receiver_id: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignAndSendRequest {
    pub transactions: Vec<SignedTransactionRequest>,
}

/// Wallet signing capability supplied by the host application.
///
/// The call may suspend for as long as the user takes to approve. The shape
/// of the returned value is wallet-specific, so it is passed back as raw JSON.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_and_send_transactions(
        &self,
        request: SignAndSendRequest,
    ) -> Result<serde_json::Value, SwapError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(SwapError::from_http_status(401, "jwt").code(), ErrorCode::AuthError);
        assert_eq!(SwapError::from_http_status(400, "bad").code(), ErrorCode::InvalidRequest);
        assert_eq!(SwapError::from_http_status(404, "gone").code(), ErrorCode::ServiceUnavailable);
        assert_eq!(SwapError::from_http_status(500, "boom").code(), ErrorCode::UnknownError);
        assert_eq!(SwapError::from_http_status(429, "slow").code(), ErrorCode::UnknownError);
    }

    #[test]
    fn test_fatal_classification() {
        assert!(SwapError::AuthError("x".into()).is_fatal_for_tracking());
        assert!(SwapError::ServiceUnavailable("x".into()).is_fatal_for_tracking());
        assert!(!SwapError::Network("x".into()).is_fatal_for_tracking());
        assert!(!SwapError::UnknownError { status: 502, message: "x".into() }.is_fatal_for_tracking());
    }

    #[test]
    fn test_transfer_action_shape() {
        let request = SignAndSendRequest {
            transactions: vec![SignedTransactionRequest {
                receiver_id: "deposit.near".to_string(),
                actions: vec![Action::Transfer { deposit: "1000".to_string() }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["transactions"][0]["receiverId"], "deposit.near");
        assert_eq!(json["transactions"][0]["actions"][0]["type"], "Transfer");
        assert_eq!(json["transactions"][0]["actions"][0]["params"]["deposit"], "1000");
    }
}
