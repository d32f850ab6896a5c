use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use chrono::{DateTime, Utc};

use crate::constants::is_placeholder_deposit_address;
use crate::intents::traits::SwapError;

/// Trade request recognized from a chat message.
///
/// Fields are optional because the recognizer is external and may return a
/// partial object; the normalizer decides whether it is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeIntent {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub origin_asset: Option<String>,
    #[serde(default)]
    pub destination_asset: Option<String>,
    #[serde(default)]
    pub preferred_chain: Option<String>,
}

impl TradeIntent {
    pub fn new(amount: Decimal, origin_asset: &str, destination_asset: &str) -> Self {
        Self {
            amount: Some(amount),
            origin_asset: Some(origin_asset.to_string()),
            destination_asset: Some(destination_asset.to_string()),
            preferred_chain: None,
        }
    }

    pub fn on_chain(mut self, chain: &str) -> Self {
        self.preferred_chain = Some(chain.to_string());
        self
    }

    /// Origin symbol, upper-cased. Empty when absent.
    pub fn origin_symbol(&self) -> String {
        self.origin_asset
            .as_deref()
            .map(|s| s.trim().to_uppercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapType {
    ExactInput,
    ExactOutput,
    FlexInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositType {
    OriginChain,
    Intents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientType {
    DestinationChain,
    Intents,
}

/// Body sent to the quote service. Amount is an integer string in base units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub dry: bool,
    pub swap_type: SwapType,
    #[serde(rename = "slippageTolerance")]
    pub slippage_tolerance_bps: u32,
    #[serde(rename = "originAsset")]
    pub origin_asset_id: String,
    pub deposit_type: DepositType,
    #[serde(rename = "destinationAsset")]
    pub destination_asset_id: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_to: Option<String>,
    pub refund_type: DepositType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub recipient_type: RecipientType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Priced, time-bounded swap offer returned by the quote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub correlation_id: Option<String>,
    pub deposit_address: Option<String>,
    pub amount_in: String,
    pub amount_in_formatted: String,
    pub amount_in_usd: Option<String>,
    pub amount_out: String,
    pub amount_out_formatted: String,
    pub amount_out_usd: Option<String>,
    pub min_amount_out: String,
    pub deadline: Option<DateTime<Utc>>,
    /// Estimated completion time in seconds
    pub time_estimate: u64,
    pub slippage_tolerance_bps: u32,
    pub swap_type: SwapType,
}

impl Quote {
    /// A quote without a deadline never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Deposit address usable for an automatic transfer, if any.
    pub fn executable_deposit_address(&self) -> Option<&str> {
        self.deposit_address
            .as_deref()
            .filter(|addr| !is_placeholder_deposit_address(addr))
    }
}

/// Outcome of a single transfer attempt. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferResult {
    Success {
        transaction_hash: String,
        deposit_address: String,
        /// Human-readable amount, e.g. "1.2"
        amount_transferred: String,
    },
    Failure {
        error: SwapError,
        deposit_address: String,
        amount_requested: String,
    },
}

impl TransferResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferResult::Success { .. })
    }

    pub fn deposit_address(&self) -> &str {
        match self {
            TransferResult::Success { deposit_address, .. }
            | TransferResult::Failure { deposit_address, .. } => deposit_address,
        }
    }

    pub fn transaction_hash(&self) -> Option<&str> {
        match self {
            TransferResult::Success { transaction_hash, .. } => Some(transaction_hash),
            TransferResult::Failure { .. } => None,
        }
    }
}

/// Execution status reported by the swap service.
///
/// Tagged over the five statuses the tracker understands; anything else is
/// kept verbatim in `Unrecognized`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SwapStatus {
    Pending,
    Processing,
    Complete,
    Failed,
    Refunded,
    Unrecognized(String),
}

impl SwapStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Processing => "processing",
            SwapStatus::Complete => "complete",
            SwapStatus::Failed => "failed",
            SwapStatus::Refunded => "refunded",
            SwapStatus::Unrecognized(raw) => raw,
        }
    }

    /// complete, failed and refunded end a tracking session
    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapStatus::Complete | SwapStatus::Failed | SwapStatus::Refunded)
    }
}

impl From<&str> for SwapStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "pending_deposit" | "known_deposit_tx" | "incomplete_deposit" => SwapStatus::Pending,
            "processing" => SwapStatus::Processing,
            "complete" | "completed" | "success" => SwapStatus::Complete,
            "failed" => SwapStatus::Failed,
            "refunded" => SwapStatus::Refunded,
            _ => SwapStatus::Unrecognized(raw.to_string()),
        }
    }
}

impl From<String> for SwapStatus {
    fn from(raw: String) -> Self {
        SwapStatus::from(raw.as_str())
    }
}

impl From<SwapStatus> for String {
    fn from(status: SwapStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot returned by the execution-status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDetails {
    pub status: SwapStatus,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Service-specific swap details, passed through untouched
    #[serde(default, rename = "swapDetails")]
    pub details: serde_json::Value,
}
