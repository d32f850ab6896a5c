use std::sync::Arc;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::normalizer::{QuoteOptions, TradeNormalizer};
use super::traits::{ErrorCode, QuoteService, SwapResult};
use crate::types::{Quote, TradeIntent};

/// Result of a quoting round trip. Service failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuoteOutcome {
    Quoted(Quote),
    Failed { success: bool, code: ErrorCode, error: String },
}

impl QuoteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, QuoteOutcome::Quoted(_))
    }

    pub fn quote(&self) -> Option<&Quote> {
        match self {
            QuoteOutcome::Quoted(quote) => Some(quote),
            QuoteOutcome::Failed { .. } => None,
        }
    }
}

/// Normalizes intents and asks the quote service for a price.
#[derive(Debug, Clone)]
pub struct Quoter {
    normalizer: TradeNormalizer,
    service: Arc<dyn QuoteService>,
    deadline_secs: u64,
}

impl Quoter {
    pub fn new(normalizer: TradeNormalizer, service: Arc<dyn QuoteService>, deadline_secs: u64) -> Self {
        Self { normalizer, service, deadline_secs }
    }

    pub fn normalizer(&self) -> &TradeNormalizer {
        &self.normalizer
    }

    /// Validation problems are returned as `Err`; anything the service
    /// reports comes back as `QuoteOutcome::Failed`.
    pub async fn request_quote(
        &self,
        intent: Option<&TradeIntent>,
        options: &QuoteOptions,
    ) -> SwapResult<QuoteOutcome> {
        let mut request = self.normalizer.create_quote_request(intent, options)?;
        if !request.dry {
            request.deadline = Some(Utc::now() + chrono::Duration::seconds(self.deadline_secs as i64));
        }

        match self.service.get_quote(&request).await {
            Ok(quote) => {
                info!(
                    "💱 {} quote: {} in -> {} out (~{}s)",
                    self.service.name(), quote.amount_in_formatted, quote.amount_out_formatted, quote.time_estimate
                );
                Ok(QuoteOutcome::Quoted(quote))
            }
            Err(e) => {
                warn!("❌ {} quote failed: {}", self.service.name(), e);
                Ok(QuoteOutcome::Failed {
                    success: false,
                    code: e.code(),
                    error: e.to_string(),
                })
            }
        }
    }
}
