use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::presentation::{progress_bar, progress_percent};
use super::tracker::{StatusEvent, StatusUpdate, TimeoutReason};
use super::traits::{ErrorCode, SwapError};
use crate::types::{Quote, TradeIntent, TransferResult};

const PROGRESS_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    QuoteSummary,
    QuoteFailure,
    QuoteExpired,
    ManualTransfer,
    TransferSuccess,
    TransferFailure,
    Cancellation,
    TrackingStarted,
    TrackingStatus,
    /// Exactly one per tracking session
    TrackingOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub kind: MessageKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            kind,
            content: content.into(),
            status: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(kind: MessageKind, content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, kind, content)
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Append-only conversation log
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn of_kind(&self, kind: MessageKind) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(move |m| m.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn symbol(asset: &Option<String>) -> String {
    asset.as_deref().unwrap_or("?").trim().to_uppercase()
}

pub fn quote_summary(intent: &TradeIntent, quote: &Quote) -> ChatMessage {
    let from = symbol(&intent.origin_asset);
    let to = symbol(&intent.destination_asset);

    let mut content = format!(
        "💱 Quote: {} {} → {} {} (minimum {} base units after {:.2}% slippage).\n⏱️ Estimated time: ~{}s.",
        quote.amount_in_formatted,
        from,
        quote.amount_out_formatted,
        to,
        quote.min_amount_out,
        quote.slippage_tolerance_bps as f64 / 100.0,
        quote.time_estimate,
    );
    if let Some(usd) = &quote.amount_out_usd {
        content.push_str(&format!(" Worth about ${}.", usd));
    }
    if let Some(deadline) = quote.deadline {
        content.push_str(&format!("\nValid until {}.", deadline.format("%H:%M:%S UTC")));
    }
    content.push_str("\nReply confirm to proceed or cancel to discard.");

    ChatMessage::assistant(MessageKind::QuoteSummary, content)
}

pub fn quote_failure(code: ErrorCode, error: &str) -> ChatMessage {
    let hint = match code {
        ErrorCode::AuthError => "The swap service rejected our credentials. Please try again later.",
        ErrorCode::InvalidRequest => "The service could not price this trade. Try a different amount or pair.",
        _ => "The swap service is not answering right now. Please try again in a moment.",
    };
    ChatMessage::assistant(MessageKind::QuoteFailure, format!("❌ Could not get a quote: {}\n{}", error, hint))
}

pub fn quote_expired(error: &SwapError) -> ChatMessage {
    ChatMessage::assistant(
        MessageKind::QuoteExpired,
        format!("⏰ {}. Nothing was sent. Ask for a fresh quote to continue.", error),
    )
}

/// Instructions for origins this assistant cannot transfer itself
pub fn manual_transfer(intent: &TradeIntent, quote: &Quote) -> ChatMessage {
    let from = symbol(&intent.origin_asset);
    let content = match quote.executable_deposit_address() {
        Some(address) => format!(
            "📋 {} transfers can't be sent automatically. Send exactly {} {} to:\n{}\nThe swap starts once the deposit is detected.",
            from, quote.amount_in_formatted, from, address
        ),
        None => format!(
            "📋 This quote has no deposit address yet, so {} {} can't be sent. Ask for a new quote to get one.",
            quote.amount_in_formatted, from
        ),
    };
    ChatMessage::assistant(MessageKind::ManualTransfer, content)
}

pub fn transfer_result(result: &TransferResult) -> ChatMessage {
    match result {
        TransferResult::Success { transaction_hash, deposit_address, amount_transferred } => {
            ChatMessage::assistant(
                MessageKind::TransferSuccess,
                format!(
                    "✅ Sent {} NEAR to {}.\nTransaction: {}\nI'll keep you posted on the swap.",
                    amount_transferred, deposit_address, transaction_hash
                ),
            )
            .with_status("submitted")
        }
        TransferResult::Failure { error, deposit_address, amount_requested } => {
            let next_steps = match error {
                SwapError::TransferRejected(_) => "The transfer was not approved. Confirm again when you're ready.",
                SwapError::AmountParseError { .. } => "Ask for a new quote so the amount can be read correctly.",
                _ => "Check your wallet connection and balance, then request a new quote.",
            };
            ChatMessage::assistant(
                MessageKind::TransferFailure,
                format!(
                    "❌ Transfer of {} to {} failed: {}\n{}",
                    amount_requested, deposit_address, error, next_steps
                ),
            )
            .with_status("failed")
        }
    }
}

pub fn cancellation(intent: &TradeIntent) -> ChatMessage {
    ChatMessage::assistant(
        MessageKind::Cancellation,
        format!(
            "🚫 Cancelled the {} → {} swap. Nothing was sent.",
            symbol(&intent.origin_asset),
            symbol(&intent.destination_asset)
        ),
    )
    .with_status("cancelled")
}

pub fn tracking_started(deposit_address: &str) -> ChatMessage {
    ChatMessage::assistant(
        MessageKind::TrackingStarted,
        format!("🔍 Tracking the swap for deposit {}.\n{}", deposit_address, progress_bar(progress_percent(None), PROGRESS_WIDTH)),
    )
}

/// Progress update for a non-final status or a transient error
pub fn tracking_status(update: &StatusUpdate) -> ChatMessage {
    let info = update.status_info();
    let content = match &update.event {
        StatusEvent::Error { error } => {
            format!("{} (attempt {}): {}. Retrying.", info.message, update.attempts, error)
        }
        _ => format!(
            "{}\n{}",
            info.message,
            progress_bar(progress_percent(update.status()), PROGRESS_WIDTH)
        ),
    };
    ChatMessage::assistant(MessageKind::TrackingStatus, content).with_status(update.label())
}

/// Final message for a tracking session
pub fn tracking_outcome(update: &StatusUpdate) -> ChatMessage {
    let info = update.status_info();
    let next_steps = match &update.event {
        StatusEvent::Timeout { reason: TimeoutReason::AttemptsExhausted } => {
            let error = SwapError::TrackingTimeout { attempts: update.attempts };
            format!(" {}. Ask me to track {} again later.", error, update.deposit_address)
        }
        StatusEvent::Timeout { reason: TimeoutReason::WallClock } => {
            format!(" Ask me to track {} again later.", update.deposit_address)
        }
        StatusEvent::Error { error } => format!(" Tracking stopped: {}.", error),
        StatusEvent::Status { .. } => String::new(),
    };

    let mut content = format!("{}\n{}{}", info.message, info.description, next_steps);
    if update.status().is_some() {
        content.push('\n');
        content.push_str(&progress_bar(progress_percent(update.status()), PROGRESS_WIDTH));
    }

    ChatMessage::assistant(MessageKind::TrackingOutcome, content).with_status(update.label())
}
