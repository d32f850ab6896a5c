use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use num_bigint::BigUint;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{get_mock_config, MockConfig};
use crate::intents::assets::DEFAULT_ASSETS;
use crate::intents::traits::{QuoteService, SwapError, SwapResult};
use crate::types::{ExecutionDetails, Quote, QuoteRequest, SwapStatus};
use crate::utils::math::{format_base_units, to_base_units};

type ScriptedStatus = Result<SwapStatus, SwapError>;

#[derive(Debug, Default)]
struct MockState {
    quote_requests: Vec<QuoteRequest>,
    quote_failure: Option<SwapError>,
    quote_template: Option<Quote>,
    /// Remaining scripted answers; the last one repeats once reached
    scripts: HashMap<String, VecDeque<ScriptedStatus>>,
    status_calls: HashMap<String, usize>,
}

/// In-process stand-in for the 1Click API
#[derive(Debug, Default)]
pub struct MockQuoteService {
    config: MockConfig,
    state: Mutex<MockState>,
}

impl MockQuoteService {
    /// No latency; unscripted addresses settle after three polls.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let config = get_mock_config();
        debug!("🎭 MockQuoteService initialized ({}ms latency)", config.network_latency_ms);
        Self { config, state: Mutex::default() }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fail_quotes_with(&self, error: SwapError) {
        self.state().quote_failure = Some(error);
    }

    /// Answer every quote request with `quote`.
    pub fn respond_with_quote(&self, quote: Quote) {
        self.state().quote_template = Some(quote);
    }

    pub fn script_statuses(&self, deposit_address: &str, statuses: Vec<ScriptedStatus>) {
        self.state()
            .scripts
            .insert(deposit_address.to_string(), statuses.into());
    }

    pub fn always_status(&self, deposit_address: &str, status: SwapStatus) {
        self.script_statuses(deposit_address, vec![Ok(status)]);
    }

    pub fn quote_requests(&self) -> Vec<QuoteRequest> {
        self.state().quote_requests.clone()
    }

    pub fn status_calls(&self, deposit_address: &str) -> usize {
        self.state().status_calls.get(deposit_address).copied().unwrap_or(0)
    }

    async fn simulate_latency(&self) {
        if self.config.network_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.network_latency_ms)).await;
        }
    }

    fn progressive_status(&self, calls: usize) -> SwapStatus {
        let settle_at = self.config.polls_until_complete.max(1) as usize;
        if calls >= settle_at {
            SwapStatus::from(self.config.final_status.as_str())
        } else if calls == 1 {
            SwapStatus::Pending
        } else {
            SwapStatus::Processing
        }
    }
}

/// 1:1 in human units, so the output reads back like the input.
fn synthesize_quote(request: &QuoteRequest) -> Quote {
    let decimals_of = |asset_id: &str| {
        DEFAULT_ASSETS
            .find_by_asset_id(asset_id)
            .map(|entry| entry.decimals)
            .unwrap_or(0)
    };
    let in_decimals = decimals_of(&request.origin_asset_id);
    let out_decimals = decimals_of(&request.destination_asset_id);

    let amount_in_formatted =
        format_base_units(&request.amount, in_decimals).unwrap_or_else(|| request.amount.clone());
    let amount_out = Decimal::from_str(&amount_in_formatted)
        .ok()
        .and_then(|human| to_base_units(human, out_decimals))
        .unwrap_or_else(|| "0".to_string());
    let min_amount_out = BigUint::from_str(&amount_out)
        .map(|out| out * (10_000u32 - request.slippage_tolerance_bps.min(10_000)) / 10_000u32)
        .map(|min| min.to_str_radix(10))
        .unwrap_or_else(|_| "0".to_string());
    let amount_out_formatted =
        format_base_units(&amount_out, out_decimals).unwrap_or_else(|| amount_out.clone());

    Quote {
        correlation_id: Some(Uuid::new_v4().to_string()),
        deposit_address: if request.dry {
            None
        } else {
            Some(format!("mock{}", Uuid::new_v4().simple()))
        },
        amount_in: request.amount.clone(),
        amount_in_formatted,
        amount_in_usd: None,
        amount_out,
        amount_out_formatted,
        amount_out_usd: None,
        min_amount_out,
        deadline: request.deadline,
        time_estimate: 20,
        slippage_tolerance_bps: request.slippage_tolerance_bps,
        swap_type: request.swap_type,
    }
}

#[async_trait]
impl QuoteService for MockQuoteService {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_quote(&self, request: &QuoteRequest) -> SwapResult<Quote> {
        self.simulate_latency().await;

        let mut state = self.state();
        state.quote_requests.push(request.clone());

        if let Some(error) = &state.quote_failure {
            return Err(error.clone());
        }
        let quote = match &state.quote_template {
            Some(template) => template.clone(),
            None => synthesize_quote(request),
        };
        debug!("🎭 [MOCK] quote {} -> {}", quote.amount_in_formatted, quote.amount_out_formatted);
        Ok(quote)
    }

    async fn get_execution_status(&self, deposit_address: &str) -> SwapResult<ExecutionDetails> {
        self.simulate_latency().await;

        let mut state = self.state();
        let calls = {
            let counter = state.status_calls.entry(deposit_address.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };

        let answer = match state.scripts.get_mut(deposit_address) {
            Some(script) if script.len() > 1 => script.pop_front(),
            Some(script) => script.front().cloned(),
            None => None,
        };
        let status = match answer {
            Some(scripted) => scripted?,
            None => self.progressive_status(calls),
        };

        debug!("🎭 [MOCK] status #{} for {}: {}", calls, deposit_address, status);
        Ok(ExecutionDetails {
            status,
            updated_at: Some(Utc::now()),
            details: json!({ "depositAddress": deposit_address, "pollCount": calls }),
        })
    }
}
