use std::sync::Arc;
use tracing::debug;

use super::assets::{AssetRegistry, DEFAULT_ASSETS};
use super::traits::{SwapError, SwapResult};
use crate::config::QuoteConfig;
use crate::types::{DepositType, QuoteRequest, RecipientType, SwapType, TradeIntent};
use crate::utils::math::to_base_units;

/// Per-call overrides for quote request defaults
#[derive(Debug, Clone, Default)]
pub struct QuoteOptions {
    pub preferred_chain: Option<String>,
    pub dry: Option<bool>,
    pub swap_type: Option<SwapType>,
    pub slippage_tolerance_bps: Option<u32>,
    pub deposit_type: Option<DepositType>,
    pub refund_to: Option<String>,
    pub recipient: Option<String>,
}

/// Turns recognized trade intents into quote requests.
#[derive(Debug, Clone)]
pub struct TradeNormalizer {
    assets: Arc<AssetRegistry>,
    defaults: QuoteConfig,
}

impl TradeNormalizer {
    pub fn new(assets: Arc<AssetRegistry>, defaults: QuoteConfig) -> Self {
        Self { assets, defaults }
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn create_quote_request(
        &self,
        intent: Option<&TradeIntent>,
        options: &QuoteOptions,
    ) -> SwapResult<QuoteRequest> {
        build_quote_request(&self.assets, &self.defaults, intent, options)
    }
}

/// Build a quote request against the built-in asset table and default settings.
pub fn create_quote_request(
    intent: Option<&TradeIntent>,
    options: &QuoteOptions,
) -> SwapResult<QuoteRequest> {
    build_quote_request(&DEFAULT_ASSETS, &QuoteConfig::default(), intent, options)
}

fn build_quote_request(
    assets: &AssetRegistry,
    defaults: &QuoteConfig,
    intent: Option<&TradeIntent>,
    options: &QuoteOptions,
) -> SwapResult<QuoteRequest> {
    let intent = intent.ok_or_else(|| SwapError::InvalidTradeData("trade intent is missing".to_string()))?;

    let origin = non_empty(intent.origin_asset.as_deref());
    let destination = non_empty(intent.destination_asset.as_deref());

    let mut missing = Vec::new();
    if intent.amount.is_none() {
        missing.push("amount");
    }
    if origin.is_none() {
        missing.push("originAsset");
    }
    if destination.is_none() {
        missing.push("destinationAsset");
    }

    let (Some(amount), Some(origin), Some(destination)) = (intent.amount, origin, destination) else {
        return Err(SwapError::InvalidTradeData(format!("missing {}", missing.join(", "))));
    };

    if amount.is_sign_negative() || amount.is_zero() {
        return Err(SwapError::InvalidTradeData(format!("amount must be positive, got {}", amount)));
    }

    let chain = options
        .preferred_chain
        .as_deref()
        .or(intent.preferred_chain.as_deref());

    let origin_entry = assets.resolve(origin, chain)?;
    let destination_entry = assets.resolve(destination, chain)?;

    let base_amount = to_base_units(amount, origin_entry.decimals)
        .ok_or_else(|| SwapError::InvalidTradeData(format!("amount {} cannot be converted", amount)))?;

    debug!(
        "🧮 {} {} -> {} base units ({} decimals)",
        amount, origin_entry.symbol, base_amount, origin_entry.decimals
    );

    let deposit_type = options.deposit_type.unwrap_or(defaults.deposit_type);

    Ok(QuoteRequest {
        dry: options.dry.unwrap_or(defaults.dry),
        swap_type: options.swap_type.unwrap_or(defaults.swap_type),
        slippage_tolerance_bps: options
            .slippage_tolerance_bps
            .unwrap_or(defaults.slippage_tolerance_bps),
        origin_asset_id: origin_entry.asset_id.clone(),
        deposit_type,
        destination_asset_id: destination_entry.asset_id.clone(),
        amount: base_amount,
        refund_to: options.refund_to.clone().or_else(|| defaults.refund_to.clone()),
        refund_type: deposit_type,
        recipient: options.recipient.clone().or_else(|| defaults.recipient.clone()),
        recipient_type: RecipientType::DestinationChain,
        deadline: None,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
