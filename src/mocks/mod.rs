pub mod quote_service;
pub mod signer;

pub use quote_service::MockQuoteService;
pub use signer::MockSigner;

use std::env;

/// Check if mock mode is enabled
pub fn is_mock_mode() -> bool {
    env::var("API_MODE").unwrap_or_default() == "mock"
}

/// Get mock configuration values
pub fn get_mock_config() -> MockConfig {
    MockConfig {
        network_latency_ms: env::var("MOCK_NETWORK_LATENCY")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50),
        polls_until_complete: env::var("MOCK_POLLS_UNTIL_COMPLETE")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .unwrap_or(3),
        final_status: env::var("MOCK_FINAL_STATUS")
            .unwrap_or_else(|_| "SUCCESS".to_string()),
        signer_rejects: env::var("MOCK_SIGNER_REJECTS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    }
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Simulated round-trip per service call
    pub network_latency_ms: u64,
    /// Status polls answered before the swap reports its final status
    pub polls_until_complete: u32,
    pub final_status: String,
    pub signer_rejects: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            network_latency_ms: 0,
            polls_until_complete: 3,
            final_status: "SUCCESS".to_string(),
            signer_rejects: false,
        }
    }
}
