use tracing::{info, warn};

use super::chat::{self, ChatTranscript};
use super::executor::TransferExecutor;
use super::traits::{SwapError, SwapResult, TransactionSigner};
use crate::constants::NEAR_SYMBOL;
use crate::types::{Quote, TradeIntent, TransferResult};

/// Trade awaiting the user's yes or no
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTrade {
    pub intent: TradeIntent,
    pub quote: Quote,
}

impl PendingTrade {
    /// Native NEAR with a real deposit address can be sent by the signer.
    pub fn auto_transfer_address(&self) -> Option<&str> {
        if self.intent.origin_symbol() != NEAR_SYMBOL {
            return None;
        }
        self.quote.executable_deposit_address()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// The signer was invoked once; success or failure is in the result
    Transferred(TransferResult),
    /// The user was told how to send the funds themselves
    ManualTransfer,
    /// The quote deadline had passed; nothing was sent
    Expired(SwapError),
}

impl ConfirmOutcome {
    /// Deposit address to start tracking, if funds actually moved.
    pub fn tracking_address(&self) -> Option<&str> {
        match self {
            ConfirmOutcome::Transferred(result @ TransferResult::Success { .. }) => Some(result.deposit_address()),
            _ => None,
        }
    }
}

/// Holds at most one pending trade. Each trade is settled by exactly one
/// `confirm` or `cancel`.
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    pending: Option<PendingTrade>,
    executor: TransferExecutor,
}

impl ConfirmationGate {
    pub fn new(executor: TransferExecutor) -> Self {
        Self { pending: None, executor }
    }

    /// Hold a trade for confirmation. Returns the trade it replaced, if any.
    pub fn propose(&mut self, intent: TradeIntent, quote: Quote) -> Option<PendingTrade> {
        let replaced = self.pending.replace(PendingTrade { intent, quote });
        if replaced.is_some() {
            info!("🔁 Replacing the pending trade with a newer quote");
        }
        replaced
    }

    pub fn pending(&self) -> Option<&PendingTrade> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Settle the pending trade. Exactly one chat message describing the
    /// outcome is appended to `transcript`.
    pub async fn confirm(
        &mut self,
        signer: &dyn TransactionSigner,
        transcript: &mut ChatTranscript,
    ) -> SwapResult<ConfirmOutcome> {
        // Cleared before any await so a second confirm finds nothing
        let trade = self.pending.take().ok_or(SwapError::NoPendingTrade)?;

        if trade.quote.is_expired() {
            let deadline = trade
                .quote
                .deadline
                .map(|d| d.to_rfc3339())
                .unwrap_or_default();
            let error = SwapError::QuoteExpired { deadline };
            warn!("⏰ Refusing to execute: {}", error);
            transcript.push(chat::quote_expired(&error));
            return Ok(ConfirmOutcome::Expired(error));
        }

        let Some(deposit_address) = trade.auto_transfer_address() else {
            info!("📋 {} origin needs a manual transfer", trade.intent.origin_symbol());
            transcript.push(chat::manual_transfer(&trade.intent, &trade.quote));
            return Ok(ConfirmOutcome::ManualTransfer);
        };

        let result = self
            .executor
            .execute_transfer(&trade.quote.amount_in_formatted, deposit_address, signer)
            .await;
        transcript.push(chat::transfer_result(&result));

        Ok(ConfirmOutcome::Transferred(result))
    }

    /// Discard the pending trade and record the cancellation.
    pub fn cancel(&mut self, transcript: &mut ChatTranscript) -> SwapResult<PendingTrade> {
        let trade = self.pending.take().ok_or(SwapError::NoPendingTrade)?;
        info!("🚫 Pending trade cancelled");
        transcript.push(chat::cancellation(&trade.intent));
        Ok(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::chat::MessageKind;
    use crate::mocks::MockSigner;
    use crate::types::SwapType;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn quote(deposit: &str, amount_in_formatted: &str) -> Quote {
        Quote {
            correlation_id: None,
            deposit_address: Some(deposit.to_string()),
            amount_in: "1000000000000000000000000".to_string(),
            amount_in_formatted: amount_in_formatted.to_string(),
            amount_in_usd: None,
            amount_out: "2950000".to_string(),
            amount_out_formatted: "2.95".to_string(),
            amount_out_usd: None,
            min_amount_out: "2920500".to_string(),
            deadline: Some(Utc::now() + Duration::minutes(10)),
            time_estimate: 20,
            slippage_tolerance_bps: 100,
            swap_type: SwapType::ExactInput,
        }
    }

    #[tokio::test]
    async fn test_near_origin_transfers_once() {
        let mut gate = ConfirmationGate::default();
        let mut transcript = ChatTranscript::new();
        let signer = MockSigner::returning(json!({"transaction": {"hash": "abcHash"}}));

        gate.propose(TradeIntent::new(Decimal::ONE, "NEAR", "USDC"), quote("dep.near", "1.0"));
        let outcome = gate.confirm(&signer, &mut transcript).await.unwrap();

        assert_eq!(outcome.tracking_address(), Some("dep.near"));
        assert_eq!(signer.calls().len(), 1);
        assert_eq!(transcript.len(), 1);
        assert!(transcript.messages()[0].content.contains("abcHash"));
        assert!(!gate.has_pending());
    }

    #[tokio::test]
    async fn test_non_near_origin_never_signs() {
        let mut gate = ConfirmationGate::default();
        let mut transcript = ChatTranscript::new();
        let signer = MockSigner::new();

        gate.propose(TradeIntent::new(Decimal::from(100), "USDT", "NEAR"), quote("0xdep", "100"));
        let outcome = gate.confirm(&signer, &mut transcript).await.unwrap();

        assert_eq!(outcome, ConfirmOutcome::ManualTransfer);
        assert!(signer.calls().is_empty());
        assert_eq!(transcript.of_kind(MessageKind::ManualTransfer).count(), 1);
    }

    #[tokio::test]
    async fn test_placeholder_address_falls_back_to_manual() {
        let mut gate = ConfirmationGate::default();
        let mut transcript = ChatTranscript::new();
        let signer = MockSigner::new();

        gate.propose(TradeIntent::new(Decimal::ONE, "near", "USDC"), quote("N/A", "1.0"));
        let outcome = gate.confirm(&signer, &mut transcript).await.unwrap();

        assert_eq!(outcome, ConfirmOutcome::ManualTransfer);
        assert!(signer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_expired_quote_is_refused() {
        let mut gate = ConfirmationGate::default();
        let mut transcript = ChatTranscript::new();
        let signer = MockSigner::new();

        let mut stale = quote("dep.near", "1.0");
        stale.deadline = Some(Utc::now() - Duration::seconds(1));
        gate.propose(TradeIntent::new(Decimal::ONE, "NEAR", "USDC"), stale);

        let outcome = gate.confirm(&signer, &mut transcript).await.unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Expired(SwapError::QuoteExpired { .. })));
        assert!(signer.calls().is_empty());
        assert_eq!(transcript.of_kind(MessageKind::QuoteExpired).count(), 1);
    }

    #[tokio::test]
    async fn test_failed_transfer_still_reports_once() {
        let mut gate = ConfirmationGate::default();
        let mut transcript = ChatTranscript::new();
        let signer = MockSigner::failing(SwapError::TransferRejected("declined".to_string()));

        gate.propose(TradeIntent::new(Decimal::ONE, "NEAR", "USDC"), quote("dep.near", "1.0"));
        let outcome = gate.confirm(&signer, &mut transcript).await.unwrap();

        assert_eq!(outcome.tracking_address(), None);
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].kind, MessageKind::TransferFailure);
    }

    #[tokio::test]
    async fn test_confirm_and_cancel_are_single_use() {
        let mut gate = ConfirmationGate::default();
        let mut transcript = ChatTranscript::new();
        let signer = MockSigner::new();

        assert_eq!(gate.confirm(&signer, &mut transcript).await.unwrap_err(), SwapError::NoPendingTrade);

        gate.propose(TradeIntent::new(Decimal::ONE, "USDT", "USDC"), quote("0xdep", "1"));
        let cancelled = gate.cancel(&mut transcript).unwrap();
        assert_eq!(cancelled.intent.origin_symbol(), "USDT");
        assert_eq!(transcript.of_kind(MessageKind::Cancellation).count(), 1);

        assert_eq!(gate.cancel(&mut transcript).unwrap_err(), SwapError::NoPendingTrade);
        assert_eq!(gate.confirm(&signer, &mut transcript).await.unwrap_err(), SwapError::NoPendingTrade);
        assert_eq!(transcript.len(), 1);
    }
}
