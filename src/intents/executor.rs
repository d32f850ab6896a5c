use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{error, info, warn};

use super::traits::{Action, SignAndSendRequest, SignedTransactionRequest, SwapError, SwapResult, TransactionSigner};
use crate::constants::{NEAR_DECIMALS, UNKNOWN_TX_HASH};
use crate::types::TransferResult;
use crate::utils::math::to_base_units;

// Tried in order: "<n> NEAR", "<n> N" at end of text, bare "<n>"
static AMOUNT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\d+(?:\.\d+)?)\s*NEAR\b",
        r"(?i)(\d+(?:\.\d+)?)\s*N\s*$",
        r"(\d+(?:\.\d+)?)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

// "1,000" or "1_000": the patterns would read only the leading group
static DIGIT_GROUPING: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d[,_]\d").ok());

/// Extract a positive amount from free-form text such as "1.2 NEAR".
///
/// Grouped digits are rejected rather than truncated.
pub fn parse_amount(text: &str) -> SwapResult<Decimal> {
    if DIGIT_GROUPING.as_ref().map_or(false, |grouping| grouping.is_match(text)) {
        return Err(SwapError::AmountParseError { text: text.to_string() });
    }

    for pattern in AMOUNT_PATTERNS.iter() {
        let Some(captures) = pattern.captures(text) else {
            continue;
        };
        let parsed = captures
            .get(1)
            .and_then(|m| Decimal::from_str(m.as_str()).ok())
            .filter(|amount| *amount > Decimal::ZERO);

        if let Some(amount) = parsed {
            return Ok(amount.normalize());
        }
    }

    Err(SwapError::AmountParseError { text: text.to_string() })
}

/// Pull a transaction hash out of whatever the signer returned.
///
/// Known shapes: `{transaction: {hash}}` / `{transaction_outcome: {id}}`,
/// an array of those, and a flat `{hash}` / `{transactionHash}` or a bare
/// string.
pub fn extract_transaction_hash(result: &Value) -> Option<String> {
    match result {
        Value::String(hash) if !hash.is_empty() => Some(hash.clone()),
        Value::Array(outcomes) => outcomes.iter().find_map(extract_transaction_hash),
        Value::Object(map) => {
            let nested = map
                .get("transaction")
                .and_then(|tx| tx.get("hash"))
                .or_else(|| map.get("transaction_outcome").and_then(|o| o.get("id")));

            nested
                .or_else(|| map.get("transactionHash"))
                .or_else(|| map.get("hash"))
                .and_then(Value::as_str)
                .filter(|hash| !hash.is_empty())
                .map(str::to_string)
        }
        _ => None,
    }
}

fn classify_signer_error(err: SwapError) -> SwapError {
    let text = err.to_string().to_lowercase();
    let rejected = ["reject", "denied", "cancel", "declin"].iter().any(|w| text.contains(w));

    match err {
        SwapError::TransferRejected(_) => err,
        _ if rejected => SwapError::TransferRejected(err.to_string()),
        _ => err,
    }
}

/// Sends native NEAR to a deposit address through the wallet signer.
#[derive(Debug, Clone)]
pub struct TransferExecutor {
    decimals: u32,
}

impl Default for TransferExecutor {
    fn default() -> Self {
        Self { decimals: NEAR_DECIMALS }
    }
}

impl TransferExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no retry. Every failure is returned as
    /// `TransferResult::Failure`; nothing is submitted if the amount is bad.
    pub async fn execute_transfer(
        &self,
        amount_text: &str,
        deposit_address: &str,
        signer: &dyn TransactionSigner,
    ) -> TransferResult {
        let failure = |error: SwapError| TransferResult::Failure {
            error,
            deposit_address: deposit_address.to_string(),
            amount_requested: amount_text.to_string(),
        };

        let amount = match parse_amount(amount_text) {
            Ok(amount) => amount,
            Err(e) => {
                warn!("⚠️ Transfer skipped, {}", e);
                return failure(e);
            }
        };

        let Some(deposit) = to_base_units(amount, self.decimals) else {
            return failure(SwapError::AmountParseError { text: amount_text.to_string() });
        };

        let request = SignAndSendRequest {
            transactions: vec![SignedTransactionRequest {
                receiver_id: deposit_address.to_string(),
                actions: vec![Action::Transfer { deposit: deposit.clone() }],
            }],
        };

        info!("📤 Transferring {} NEAR ({} yocto) to {}", amount, deposit, deposit_address);

        match signer.sign_and_send_transactions(request).await {
            Ok(result) => {
                let transaction_hash = extract_transaction_hash(&result).unwrap_or_else(|| {
                    warn!("⚠️ Signer result carried no transaction hash: {}", result);
                    UNKNOWN_TX_HASH.to_string()
                });

                info!("✅ Transfer submitted: {}", transaction_hash);
                TransferResult::Success {
                    transaction_hash,
                    deposit_address: deposit_address.to_string(),
                    amount_transferred: amount.to_string(),
                }
            }
            Err(e) => {
                let e = classify_signer_error(e);
                error!("❌ Transfer to {} failed: {}", deposit_address, e);
                failure(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockSigner;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_patterns() {
        assert_eq!(parse_amount("1.2 NEAR").unwrap(), dec("1.2"));
        assert_eq!(parse_amount("send 3near please").unwrap(), dec("3"));
        assert_eq!(parse_amount("0.5 N").unwrap(), dec("0.5"));
        assert_eq!(parse_amount("1.0").unwrap(), dec("1"));
        assert_eq!(parse_amount("about 42").unwrap(), dec("42"));
    }

    #[test]
    fn test_parse_amount_skips_non_positive() {
        // "0 NEAR" matches the first pattern but is not positive
        assert!(parse_amount("0 NEAR").is_err());
        assert!(matches!(parse_amount("no digits"), Err(SwapError::AmountParseError { .. })));
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_parse_amount_rejects_digit_grouping() {
        for text in ["1,000 NEAR", "1_000 NEAR", "send 2,500.5 N", "12,345"] {
            assert!(
                matches!(parse_amount(text), Err(SwapError::AmountParseError { .. })),
                "{text} should not parse"
            );
        }
        // A comma that is not between digits is just punctuation
        assert_eq!(parse_amount("ok, 3 NEAR").unwrap(), dec("3"));
    }

    #[test]
    fn test_extract_transaction_hash_shapes() {
        assert_eq!(
            extract_transaction_hash(&json!({"transaction": {"hash": "H1"}})).as_deref(),
            Some("H1")
        );
        assert_eq!(
            extract_transaction_hash(&json!([{"transaction": {"hash": "H2"}}])).as_deref(),
            Some("H2")
        );
        assert_eq!(
            extract_transaction_hash(&json!({"transaction_outcome": {"id": "H3"}})).as_deref(),
            Some("H3")
        );
        assert_eq!(extract_transaction_hash(&json!({"transactionHash": "H4"})).as_deref(), Some("H4"));
        assert_eq!(extract_transaction_hash(&json!("H5")).as_deref(), Some("H5"));
        assert_eq!(extract_transaction_hash(&json!({"status": "ok"})), None);
        assert_eq!(extract_transaction_hash(&json!(null)), None);
    }

    #[tokio::test]
    async fn test_successful_transfer() {
        let signer = MockSigner::returning(json!({"transaction": {"hash": "9xQhash"}}));
        let result = TransferExecutor::new().execute_transfer("1.2 NEAR", "deposit.near", &signer).await;

        assert_eq!(
            result,
            TransferResult::Success {
                transaction_hash: "9xQhash".to_string(),
                deposit_address: "deposit.near".to_string(),
                amount_transferred: "1.2".to_string(),
            }
        );

        let calls = signer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].transactions[0].receiver_id, "deposit.near");
        assert_eq!(
            calls[0].transactions[0].actions[0],
            Action::Transfer { deposit: "1200000000000000000000000".to_string() }
        );
    }

    #[tokio::test]
    async fn test_unknown_result_shape_uses_placeholder_hash() {
        let signer = MockSigner::returning(json!({"ok": true}));
        let result = TransferExecutor::new().execute_transfer("2", "deposit.near", &signer).await;
        assert_eq!(result.transaction_hash(), Some(UNKNOWN_TX_HASH));
    }

    #[tokio::test]
    async fn test_bad_amount_submits_nothing() {
        let signer = MockSigner::returning(json!("never"));
        let result = TransferExecutor::new().execute_transfer("lots", "deposit.near", &signer).await;

        match result {
            TransferResult::Failure { error, amount_requested, .. } => {
                assert!(matches!(error, SwapError::AmountParseError { .. }));
                assert_eq!(amount_requested, "lots");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(signer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_grouped_amount_submits_nothing() {
        let signer = MockSigner::returning(json!("never"));
        let result = TransferExecutor::new().execute_transfer("1,000 NEAR", "deposit.near", &signer).await;

        assert!(matches!(
            result,
            TransferResult::Failure { error: SwapError::AmountParseError { .. }, .. }
        ));
        assert!(signer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_user_rejection_is_classified() {
        let signer = MockSigner::failing(SwapError::Network("User rejected the request".to_string()));
        let result = TransferExecutor::new().execute_transfer("1 NEAR", "deposit.near", &signer).await;

        match result {
            TransferResult::Failure { error, .. } => assert!(matches!(error, SwapError::TransferRejected(_))),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(signer.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_network_failure_is_returned_as_data() {
        let signer = MockSigner::failing(SwapError::Network("RPC timeout".to_string()));
        let result = TransferExecutor::new().execute_transfer("1 NEAR", "deposit.near", &signer).await;

        assert!(!result.is_success());
        assert_eq!(result.deposit_address(), "deposit.near");
    }
}
