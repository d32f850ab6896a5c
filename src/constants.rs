// NEAR native token
pub const NEAR_SYMBOL: &str = "NEAR";
pub const NEAR_DECIMALS: u32 = 24; // 1 NEAR = 10^24 yoctoNEAR

// 1Click API
pub const ONE_CLICK_API_BASE: &str = "https://1click.chaindefuser.com";
pub const QUOTE_PATH: &str = "/v0/quote";
pub const STATUS_PATH: &str = "/v0/status";

// Quote request defaults
pub const DEFAULT_SLIPPAGE_BPS: u32 = 100; // 1%
pub const MAX_SLIPPAGE_BPS: u32 = 10_000;
pub const DEFAULT_QUOTE_DEADLINE_SECS: u64 = 600; // 10 minutes

// Tracking defaults
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_TRACKING_TIMEOUT_MS: u64 = 600_000; // 10 minutes

// Returned when the signer result carries no recognizable hash
pub const UNKNOWN_TX_HASH: &str = "transaction-hash-unavailable";

// Deposit address values that mean "no real address yet"
pub const PLACEHOLDER_DEPOSIT_ADDRESSES: [&str; 4] = ["", "N/A", "pending", "dry-run"];

pub fn is_placeholder_deposit_address(address: &str) -> bool {
    let trimmed = address.trim();
    PLACEHOLDER_DEPOSIT_ADDRESSES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(trimmed))
}
