// NEAR swap agent library

pub mod config;
pub mod constants;
pub mod types;
pub mod utils;
pub mod intents;
pub mod mocks;

// Re-exports for convenience
pub use config::Config;
pub use intents::*;
pub use types::{Quote, QuoteRequest, SwapStatus, TradeIntent, TransferResult};
