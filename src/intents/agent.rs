use std::sync::Arc;

use tracing::{info, warn};

use super::chat::{self, ChatMessage, ChatRole, ChatTranscript, MessageKind};
use super::confirmation::{ConfirmOutcome, ConfirmationGate};
use super::executor::TransferExecutor;
use super::normalizer::{QuoteOptions, TradeNormalizer};
use super::quoter::{QuoteOutcome, Quoter};
use super::tracker::{StatusStream, StatusUpdate, SwapStatusTracker, TrackingHandle, TrackingOptions};
use super::traits::{QuoteService, SwapResult, TransactionSigner};
use crate::config::Config;
use crate::types::TradeIntent;

/// Active tracking session owned by the agent
pub struct TrackingSession {
    pub handle: TrackingHandle,
    pub stream: StatusStream,
}

/// Drives one conversation: quote, confirmation, transfer and tracking,
/// recording every user-visible step in the transcript.
pub struct SwapAgent {
    quoter: Quoter,
    gate: ConfirmationGate,
    tracker: SwapStatusTracker,
    signer: Arc<dyn TransactionSigner>,
    tracking_options: TrackingOptions,
    transcript: ChatTranscript,
    session: Option<TrackingSession>,
}

impl SwapAgent {
    pub fn new(config: &Config, service: Arc<dyn QuoteService>, signer: Arc<dyn TransactionSigner>) -> Self {
        let normalizer = TradeNormalizer::new(Arc::new(config.asset_registry()), config.quote.clone());
        let quoter = Quoter::new(normalizer, Arc::clone(&service), config.quote.quote_deadline_secs);

        Self {
            quoter,
            gate: ConfirmationGate::new(TransferExecutor::new()),
            tracker: SwapStatusTracker::new(service),
            signer,
            tracking_options: config.tracking.options(),
            transcript: ChatTranscript::new(),
            session: None,
        }
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    pub fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    pub fn tracker(&self) -> &SwapStatusTracker {
        &self.tracker
    }

    pub fn tracking_handle(&self) -> Option<&TrackingHandle> {
        self.session.as_ref().map(|s| &s.handle)
    }

    pub fn say(&mut self, text: &str) {
        self.transcript.push(ChatMessage::new(ChatRole::User, MessageKind::Text, text));
    }

    /// Quote the intent and hold it for confirmation.
    ///
    /// Asks for an executable (non-dry) quote unless `options` says otherwise.
    pub async fn propose_trade(&mut self, intent: TradeIntent, mut options: QuoteOptions) -> SwapResult<QuoteOutcome> {
        options.dry.get_or_insert(false);
        let outcome = self.quoter.request_quote(Some(&intent), &options).await?;

        match &outcome {
            QuoteOutcome::Quoted(quote) => {
                self.transcript.push(chat::quote_summary(&intent, quote));
                self.gate.propose(intent, quote.clone());
            }
            QuoteOutcome::Failed { code, error, .. } => {
                self.transcript.push(chat::quote_failure(*code, error));
            }
        }
        Ok(outcome)
    }

    /// Execute the pending trade. A successful transfer starts tracking its
    /// deposit address right away.
    pub async fn confirm(&mut self) -> SwapResult<ConfirmOutcome> {
        let outcome = self.gate.confirm(self.signer.as_ref(), &mut self.transcript).await?;

        // A sent transfer is reported even if tracking fails to start
        if let Some(deposit_address) = outcome.tracking_address().map(str::to_string) {
            if let Err(e) = self.start_tracking(deposit_address.clone()) {
                warn!("⚠️ Transfer to {} sent but tracking could not start: {}", deposit_address, e);
            }
        }
        Ok(outcome)
    }

    pub fn cancel(&mut self) -> SwapResult<()> {
        self.gate.cancel(&mut self.transcript).map(|_| ())
    }

    /// Track a deposit address, replacing any session this agent holds.
    pub fn start_tracking(&mut self, deposit_address: String) -> SwapResult<&TrackingHandle> {
        if let Some(previous) = self.session.take() {
            previous.handle.stop();
        }

        let (handle, stream) = self.tracker.start_tracking(&deposit_address, self.tracking_options)?;
        self.transcript.push(chat::tracking_started(&deposit_address));
        info!("🔍 Agent tracking {}", deposit_address);

        let session = self.session.insert(TrackingSession { handle, stream });
        Ok(&session.handle)
    }

    pub fn stop_tracking(&mut self) {
        if let Some(session) = self.session.take() {
            session.handle.stop();
        }
    }

    /// Drain the current session into the transcript. Returns the last update
    /// received, after which the session is released.
    pub async fn follow_tracking(&mut self) -> Option<StatusUpdate> {
        let mut session = self.session.take()?;
        let mut last = None;

        while let Some(update) = session.stream.recv().await {
            if update.ends_session() {
                self.transcript.push(chat::tracking_outcome(&update));
            } else {
                self.transcript.push(chat::tracking_status(&update));
            }
            last = Some(update);
        }

        if last.as_ref().map_or(true, |u| !u.ends_session()) {
            warn!("⚠️ Tracking {} ended without a final status", session.handle.deposit_address());
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockQuoteService, MockSigner};
    use crate::types::{Quote, SwapStatus, SwapType};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn near_quote() -> Quote {
        Quote {
            correlation_id: Some("corr".to_string()),
            deposit_address: Some("abc123deposit".to_string()),
            amount_in: "1000000000000000000000000".to_string(),
            amount_in_formatted: "1.0 NEAR".to_string(),
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

    fn agent(service: Arc<MockQuoteService>, signer: Arc<MockSigner>) -> SwapAgent {
        SwapAgent::new(&Config::load_test_config(), service, signer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_near_swap_end_to_end() {
        let service = Arc::new(MockQuoteService::new());
        service.respond_with_quote(near_quote());
        service.script_statuses("abc123deposit", vec![
            Ok(SwapStatus::Pending),
            Ok(SwapStatus::Processing),
            Ok(SwapStatus::Complete),
        ]);
        let signer = Arc::new(MockSigner::returning(json!({"transaction": {"hash": "TxHash111"}})));
        let mut agent = agent(service.clone(), signer.clone());

        let intent = TradeIntent::new(Decimal::ONE, "NEAR", "USDC");
        let outcome = agent.propose_trade(intent, QuoteOptions::default()).await.unwrap();
        assert!(outcome.is_success());
        assert!(!service.quote_requests()[0].dry);

        agent.confirm().await.unwrap();

        let calls = signer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].transactions[0].receiver_id, "abc123deposit");
        assert_eq!(
            calls[0].transactions[0].actions[0],
            crate::intents::traits::Action::Transfer { deposit: "1000000000000000000000000".to_string() }
        );

        let successes: Vec<_> = agent.transcript().of_kind(MessageKind::TransferSuccess).collect();
        assert_eq!(successes.len(), 1);
        assert!(successes[0].content.contains("TxHash111"));
        assert!(agent.tracker().is_tracking("abc123deposit"));
        assert_eq!(agent.transcript().last().unwrap().kind, MessageKind::TrackingStarted);

        let last = agent.follow_tracking().await.unwrap();
        assert_eq!(last.status(), Some(&SwapStatus::Complete));
        assert_eq!(agent.transcript().of_kind(MessageKind::TrackingOutcome).count(), 1);
        assert_eq!(agent.transcript().of_kind(MessageKind::TrackingStatus).count(), 2);
        assert!(!agent.tracker().is_tracking("abc123deposit"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_outcome_kept_when_tracking_cannot_start() {
        let service = Arc::new(MockQuoteService::new());
        service.respond_with_quote(near_quote());
        service.always_status("abc123deposit", SwapStatus::Pending);
        let signer = Arc::new(MockSigner::returning(json!({"transaction": {"hash": "TxHash222"}})));
        let mut agent = agent(service, signer.clone());

        // Someone else already tracks the deposit address
        let (other, _other_stream) = agent
            .tracker()
            .start_tracking("abc123deposit", TrackingOptions::default())
            .unwrap();

        agent
            .propose_trade(TradeIntent::new(Decimal::ONE, "NEAR", "USDC"), QuoteOptions::default())
            .await
            .unwrap();
        let outcome = agent.confirm().await.unwrap();

        assert!(matches!(outcome, ConfirmOutcome::Transferred(crate::types::TransferResult::Success { .. })));
        assert_eq!(outcome.tracking_address(), Some("abc123deposit"));
        assert_eq!(signer.calls().len(), 1);
        assert_eq!(agent.transcript().of_kind(MessageKind::TransferSuccess).count(), 1);
        assert_eq!(agent.transcript().of_kind(MessageKind::TrackingStarted).count(), 0);
        assert!(agent.tracking_handle().is_none());
        assert!(!agent.gate().has_pending());

        other.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_transfer_does_not_track() {
        let service = Arc::new(MockQuoteService::new());
        service.respond_with_quote(near_quote());
        let signer = Arc::new(MockSigner::failing(crate::intents::traits::SwapError::TransferRejected(
            "User rejected".to_string(),
        )));
        let mut agent = agent(service, signer);

        agent
            .propose_trade(TradeIntent::new(Decimal::ONE, "NEAR", "USDC"), QuoteOptions::default())
            .await
            .unwrap();
        agent.confirm().await.unwrap();

        assert_eq!(agent.transcript().of_kind(MessageKind::TransferFailure).count(), 1);
        assert!(agent.tracking_handle().is_none());
        assert!(agent.follow_tracking().await.is_none());
    }

    #[tokio::test]
    async fn test_quote_failure_leaves_nothing_pending() {
        let service = Arc::new(MockQuoteService::new());
        service.fail_quotes_with(crate::intents::traits::SwapError::from_http_status(503, "maintenance"));
        let mut agent = agent(service, Arc::new(MockSigner::new()));

        let outcome = agent
            .propose_trade(TradeIntent::new(Decimal::ONE, "NEAR", "USDC"), QuoteOptions::default())
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert!(!agent.gate().has_pending());
        assert_eq!(agent.transcript().of_kind(MessageKind::QuoteFailure).count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_records_message() {
        let service = Arc::new(MockQuoteService::new());
        let mut agent = agent(service, Arc::new(MockSigner::new()));
        agent.say("swap 5 usdt to near");

        agent
            .propose_trade(TradeIntent::new(Decimal::from(5), "USDT", "NEAR"), QuoteOptions::default())
            .await
            .unwrap();
        agent.cancel().unwrap();

        assert!(agent.cancel().is_err());
        let kinds: Vec<MessageKind> = agent.transcript().messages().iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MessageKind::Text, MessageKind::QuoteSummary, MessageKind::Cancellation]);
    }
}
