use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::get_mock_config;
use crate::intents::traits::{SignAndSendRequest, SwapError, TransactionSigner};

#[derive(Debug, Clone)]
enum Reply {
    Fixed(Value),
    Fail(SwapError),
    /// Fresh `{transaction: {hash}}` per call
    Generated,
}

/// Wallet double that records every request it is asked to sign
#[derive(Debug)]
pub struct MockSigner {
    reply: Reply,
    latency: Duration,
    calls: Mutex<Vec<SignAndSendRequest>>,
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::with_reply(Reply::Generated)
    }
}

impl MockSigner {
    fn with_reply(reply: Reply) -> Self {
        Self { reply, latency: Duration::ZERO, calls: Mutex::default() }
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(result: Value) -> Self {
        Self::with_reply(Reply::Fixed(result))
    }

    pub fn failing(error: SwapError) -> Self {
        Self::with_reply(Reply::Fail(error))
    }

    pub fn from_env() -> Self {
        let config = get_mock_config();
        let mut signer = if config.signer_rejects {
            Self::failing(SwapError::TransferRejected("User rejected the request".to_string()))
        } else {
            Self::new()
        };
        signer.latency = Duration::from_millis(config.network_latency_ms);
        signer
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<SignAndSendRequest>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn calls(&self) -> Vec<SignAndSendRequest> {
        self.recorded().clone()
    }
}

#[async_trait]
impl TransactionSigner for MockSigner {
    async fn sign_and_send_transactions(&self, request: SignAndSendRequest) -> Result<Value, SwapError> {
        self.recorded().push(request);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match &self.reply {
            Reply::Fixed(value) => Ok(value.clone()),
            Reply::Fail(error) => Err(error.clone()),
            Reply::Generated => {
                let hash = Uuid::new_v4().simple().to_string();
                debug!("🎭 [MOCK] signed transfer {}", hash);
                Ok(json!({ "transaction": { "hash": hash } }))
            }
        }
    }
}
