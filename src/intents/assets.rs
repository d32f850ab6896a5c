use std::collections::HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::traits::{SwapError, SwapResult};

/// Asset metadata entry: symbol on a chain, its service asset id and decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub symbol: String,
    pub chain: String,
    pub asset_id: String,
    pub decimals: u32,
    /// Entry used when the symbol is requested without a chain
    #[serde(default)]
    pub default: bool,
}

// (symbol, chain, asset id, decimals, default)
const BUILTIN_ASSETS: &[(&str, &str, &str, u32, bool)] = &[
    ("NEAR", "near", "nep141:wrap.near", 24, true),
    ("USDC", "near", "nep141:17208628f84f5d6ad33f0da3bbbeb27ffcb398eac501a31bd6ad2011e36133a1", 6, true),
    ("USDC", "eth", "nep141:eth-0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.omft.near", 6, false),
    ("USDC", "base", "nep141:base-0x833589fcd6edb6e08f4c7c32d4f71b54bda02913.omft.near", 6, false),
    ("USDC", "arb", "nep141:arb-0xaf88d065e77c8cc2239327c5edb3a432268e5831.omft.near", 6, false),
    ("USDT", "near", "nep141:usdt.tether-token.near", 6, true),
    ("USDT", "eth", "nep141:eth-0xdac17f958d2ee523a2206206994597c13d831ec7.omft.near", 6, false),
    ("ETH", "eth", "nep141:eth.omft.near", 18, true),
    ("ETH", "base", "nep141:base.omft.near", 18, false),
    ("ETH", "arb", "nep141:arb.omft.near", 18, false),
    ("BTC", "btc", "nep141:btc.omft.near", 8, true),
    ("SOL", "sol", "nep141:sol.omft.near", 9, true),
];

/// Built-in table, loaded once.
pub static DEFAULT_ASSETS: Lazy<AssetRegistry> = Lazy::new(AssetRegistry::builtin);

/// Immutable lookup table keyed by bare symbol and by (symbol, chain).
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    defaults: HashMap<String, AssetEntry>,
    by_chain: HashMap<(String, String), AssetEntry>,
}

impl AssetRegistry {
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_ASSETS.iter().map(|(symbol, chain, asset_id, decimals, default)| {
            AssetEntry {
                symbol: symbol.to_string(),
                chain: chain.to_string(),
                asset_id: asset_id.to_string(),
                decimals: *decimals,
                default: *default,
            }
        }))
    }

    /// Later entries replace earlier ones with the same key.
    pub fn from_entries<I: IntoIterator<Item = AssetEntry>>(entries: I) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            registry.insert(entry);
        }
        registry
    }

    /// Built-in table extended (and overridden) by `extra`.
    pub fn builtin_with(extra: &[AssetEntry]) -> Self {
        let mut registry = Self::builtin();
        for entry in extra {
            registry.insert(entry.clone());
        }
        registry
    }

    fn insert(&mut self, mut entry: AssetEntry) {
        entry.symbol = entry.symbol.trim().to_uppercase();
        entry.chain = entry.chain.trim().to_lowercase();

        let symbol = entry.symbol.clone();
        let key = (symbol.clone(), entry.chain.clone());
        // First entry seen for a symbol is its default until one is flagged.
        // Overriding the default's own chain replaces the default as well.
        let replaces_default = self
            .defaults
            .get(&symbol)
            .map_or(true, |current| current.chain == entry.chain);
        if entry.default || replaces_default {
            self.defaults.insert(symbol, entry.clone());
        }
        self.by_chain.insert(key, entry);
    }

    pub fn lookup(&self, symbol: &str) -> Option<&AssetEntry> {
        self.defaults.get(&symbol.trim().to_uppercase())
    }

    pub fn lookup_on_chain(&self, symbol: &str, chain: &str) -> Option<&AssetEntry> {
        self.by_chain
            .get(&(symbol.trim().to_uppercase(), chain.trim().to_lowercase()))
    }

    pub fn find_by_asset_id(&self, asset_id: &str) -> Option<&AssetEntry> {
        self.by_chain.values().find(|entry| entry.asset_id == asset_id)
    }

    /// Resolve a symbol, preferring the entry on `preferred_chain` when one exists.
    pub fn resolve(&self, symbol: &str, preferred_chain: Option<&str>) -> SwapResult<&AssetEntry> {
        let chained = preferred_chain
            .filter(|chain| !chain.trim().is_empty())
            .and_then(|chain| self.lookup_on_chain(symbol, chain));

        chained
            .or_else(|| self.lookup(symbol))
            .ok_or_else(|| SwapError::UnsupportedAsset { symbol: symbol.to_string() })
    }

    pub fn is_token_supported(&self, symbol: Option<&str>) -> bool {
        match symbol {
            Some(s) if !s.trim().is_empty() => self.lookup(s).is_some(),
            _ => false,
        }
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.defaults.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn len(&self) -> usize {
        self.by_chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chain.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = AssetRegistry::builtin();

        let near = registry.lookup("near").unwrap();
        assert_eq!(near.asset_id, "nep141:wrap.near");
        assert_eq!(near.decimals, 24);

        let usdc_eth = registry.lookup_on_chain("USDC", "ETH").unwrap();
        assert!(usdc_eth.asset_id.starts_with("nep141:eth-0xa0b8"));

        assert_eq!(registry.lookup("USDC").unwrap().chain, "near");
        assert_eq!(registry.lookup("ETH").unwrap().decimals, 18);
    }

    #[test]
    fn test_resolve_prefers_chain_entry() {
        let registry = AssetRegistry::builtin();

        let usdc = registry.resolve("USDC", Some("base")).unwrap();
        assert_eq!(usdc.chain, "base");

        // Unknown chain falls back to the default entry
        let usdc = registry.resolve("USDC", Some("tron")).unwrap();
        assert_eq!(usdc.chain, "near");

        let err = registry.resolve("DOGE", None).unwrap_err();
        assert_eq!(err, SwapError::UnsupportedAsset { symbol: "DOGE".to_string() });
    }

    #[test]
    fn test_is_token_supported() {
        let registry = AssetRegistry::builtin();

        for symbol in registry.symbols() {
            assert!(registry.is_token_supported(Some(symbol)), "{symbol} should be supported");
        }
        assert!(registry.is_token_supported(Some("usdt")));

        assert!(!registry.is_token_supported(None));
        assert!(!registry.is_token_supported(Some("")));
        assert!(!registry.is_token_supported(Some("   ")));
        assert!(!registry.is_token_supported(Some("PEPE")));
    }

    #[test]
    fn test_extra_entries_override_defaults() {
        let registry = AssetRegistry::builtin_with(&[AssetEntry {
            symbol: "aurora".to_string(),
            chain: "near".to_string(),
            asset_id: "nep141:aaaaaa20d9e0e2461697782ef11675f668207961.factory.bridge.near".to_string(),
            decimals: 18,
            default: false,
        }]);

        assert!(registry.is_token_supported(Some("AURORA")));
        assert_eq!(registry.lookup("AURORA").unwrap().decimals, 18);
        assert_eq!(registry.len(), AssetRegistry::builtin().len() + 1);
    }

    #[test]
    fn test_override_of_default_chain_entry_updates_bare_lookup() {
        let registry = AssetRegistry::builtin_with(&[AssetEntry {
            symbol: "usdc".to_string(),
            chain: "NEAR".to_string(),
            asset_id: "nep141:new-usdc.near".to_string(),
            decimals: 8,
            default: false,
        }]);

        let bare = registry.lookup("USDC").unwrap();
        assert_eq!(bare.asset_id, "nep141:new-usdc.near");
        assert_eq!(bare.decimals, 8);
        assert_eq!(registry.lookup_on_chain("USDC", "near"), Some(bare));
        assert_eq!(registry.resolve("USDC", None).unwrap().decimals, 8);

        // Overriding a non-default chain leaves the default alone
        let registry = AssetRegistry::builtin_with(&[AssetEntry {
            symbol: "USDC".to_string(),
            chain: "eth".to_string(),
            asset_id: "nep141:eth-usdc-v2.omft.near".to_string(),
            decimals: 6,
            default: false,
        }]);
        assert_eq!(registry.lookup("USDC").unwrap().chain, "near");
        assert_eq!(registry.lookup_on_chain("USDC", "eth").unwrap().asset_id, "nep141:eth-usdc-v2.omft.near");
    }
}
