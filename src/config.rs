use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};

use crate::constants::*;
use crate::intents::assets::{AssetEntry, AssetRegistry};
use crate::intents::tracker::TrackingOptions;
use crate::types::{DepositType, SwapType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub quote: QuoteConfig,
    pub tracking: TrackingConfig,
    /// Extra asset metadata merged over the built-in table
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token for the quote service. ONE_CLICK_JWT overrides it.
    #[serde(default)]
    pub jwt_token: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteConfig {
    pub swap_type: SwapType,
    pub slippage_tolerance_bps: u32,
    pub deposit_type: DepositType,
    pub dry: bool,
    #[serde(default)]
    pub refund_to: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    /// Deadline requested from the service for executable quotes
    #[serde(default = "default_quote_deadline_secs")]
    pub quote_deadline_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub timeout_ms: u64,
}

// 기본값 함수들
fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_quote_deadline_secs() -> u64 {
    DEFAULT_QUOTE_DEADLINE_SECS
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            swap_type: SwapType::ExactInput,
            slippage_tolerance_bps: DEFAULT_SLIPPAGE_BPS,
            deposit_type: DepositType::OriginChain,
            dry: true,
            refund_to: None,
            recipient: None,
            quote_deadline_secs: DEFAULT_QUOTE_DEADLINE_SECS,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_ms: DEFAULT_TRACKING_TIMEOUT_MS,
        }
    }
}

impl TrackingConfig {
    pub fn options(&self) -> TrackingOptions {
        TrackingOptions {
            poll_interval: std::time::Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_attempts,
            timeout: std::time::Duration::from_millis(self.timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: ONE_CLICK_API_BASE.to_string(),
                jwt_token: None,
                request_timeout_ms: default_request_timeout_ms(),
            },
            quote: QuoteConfig::default(),
            tracking: TrackingConfig::default(),
            assets: Vec::new(),
        }
    }
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets come from the environment (.env is honoured).
    pub fn apply_env_overrides(&mut self) {
        let _ = dotenvy::dotenv();

        if let Ok(token) = std::env::var("ONE_CLICK_JWT") {
            if !token.trim().is_empty() {
                self.api.jwt_token = Some(token);
            }
        }
        if let Ok(url) = std::env::var("ONE_CLICK_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
    }

    pub async fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Built-in assets extended by the `[[assets]]` entries.
    pub fn asset_registry(&self) -> AssetRegistry {
        AssetRegistry::builtin_with(&self.assets)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("API base URL cannot be empty"));
        }

        if self.quote.slippage_tolerance_bps > MAX_SLIPPAGE_BPS {
            return Err(anyhow::anyhow!(
                "Slippage tolerance {} bps exceeds {} bps",
                self.quote.slippage_tolerance_bps,
                MAX_SLIPPAGE_BPS
            ));
        }

        if self.tracking.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("Poll interval must be greater than 0"));
        }

        if self.tracking.max_attempts == 0 {
            return Err(anyhow::anyhow!("Max attempts must be greater than 0"));
        }

        if self.tracking.timeout_ms < self.tracking.poll_interval_ms {
            return Err(anyhow::anyhow!("Tracking timeout must not be shorter than the poll interval"));
        }

        for asset in &self.assets {
            if asset.symbol.trim().is_empty() || asset.asset_id.trim().is_empty() {
                return Err(anyhow::anyhow!("Asset entries need a symbol and an asset id"));
            }
            if asset.decimals > 36 {
                return Err(anyhow::anyhow!("Asset {} has unsupported decimals {}", asset.symbol, asset.decimals));
            }
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn load_test_config() -> Self {
        let mut config = Self::default();

        config.api.base_url = "http://127.0.0.1:0".to_string();
        config.tracking.poll_interval_ms = 10;
        config.tracking.max_attempts = 5;
        config.tracking.timeout_ms = 1_000;

        config
    }
}
