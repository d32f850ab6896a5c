use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{QuoteService, SwapError, SwapResult};
use crate::config::ApiConfig;
use crate::constants::{QUOTE_PATH, STATUS_PATH};
use crate::types::{ExecutionDetails, Quote, QuoteRequest};

/// 1Click quote response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OneClickQuoteResponse {
    #[serde(default)]
    correlation_id: Option<String>,
    quote_request: OneClickEchoedRequest,
    quote: OneClickQuote,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OneClickEchoedRequest {
    swap_type: crate::types::SwapType,
    slippage_tolerance: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OneClickQuote {
    #[serde(default)]
    deposit_address: Option<String>,
    amount_in: String,
    amount_in_formatted: String,
    #[serde(default)]
    amount_in_usd: Option<String>,
    amount_out: String,
    amount_out_formatted: String,
    #[serde(default)]
    amount_out_usd: Option<String>,
    min_amount_out: String,
    #[serde(default)]
    deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    time_estimate: u64,
}

#[derive(Debug, Deserialize)]
struct OneClickErrorBody {
    message: String,
}

impl From<OneClickQuoteResponse> for Quote {
    fn from(response: OneClickQuoteResponse) -> Self {
        let OneClickQuoteResponse { correlation_id, quote_request, quote } = response;
        Quote {
            correlation_id,
            deposit_address: quote.deposit_address,
            amount_in: quote.amount_in,
            amount_in_formatted: quote.amount_in_formatted,
            amount_in_usd: quote.amount_in_usd,
            amount_out: quote.amount_out,
            amount_out_formatted: quote.amount_out_formatted,
            amount_out_usd: quote.amount_out_usd,
            min_amount_out: quote.min_amount_out,
            deadline: quote.deadline,
            time_estimate: quote.time_estimate,
            slippage_tolerance_bps: quote_request.slippage_tolerance,
            swap_type: quote_request.swap_type,
        }
    }
}

/// HTTP client for the 1Click swap API
pub struct OneClickClient {
    client: Client,
    base_url: String,
    jwt_token: Option<String>,
}

impl std::fmt::Debug for OneClickClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneClickClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.jwt_token.is_some())
            .finish()
    }
}

impl OneClickClient {
    pub fn new(base_url: impl Into<String>, jwt_token: Option<String>, timeout: Duration) -> SwapResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwapError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            jwt_token,
        })
    }

    pub fn from_config(config: &ApiConfig) -> SwapResult<Self> {
        Self::new(
            config.base_url.clone(),
            config.jwt_token.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    fn build_headers(&self) -> SwapResult<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        if let Some(token) = &self.jwt_token {
            let value = format!("Bearer {}", token)
                .parse()
                .map_err(|_| SwapError::AuthError("JWT token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn into_error(response: Response) -> SwapError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<OneClickErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        warn!("⚠️ 1Click API error {}: {}", status, message);
        SwapError::from_http_status(status, message)
    }
}

#[async_trait]
impl QuoteService for OneClickClient {
    fn name(&self) -> &'static str {
        "1Click"
    }

    async fn get_quote(&self, request: &QuoteRequest) -> SwapResult<Quote> {
        let url = format!("{}{}", self.base_url, QUOTE_PATH);
        debug!(
            "🔄 Requesting quote: {} -> {} ({}, dry={})",
            request.origin_asset_id, request.destination_asset_id, request.amount, request.dry
        );

        let response = self.client
            .post(&url)
            .headers(self.build_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| SwapError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_error(response).await);
        }

        let quote: OneClickQuoteResponse = response
            .json()
            .await
            .map_err(|e| SwapError::Decode(e.to_string()))?;

        Ok(quote.into())
    }

    async fn get_execution_status(&self, deposit_address: &str) -> SwapResult<ExecutionDetails> {
        let url = format!("{}{}", self.base_url, STATUS_PATH);

        let response = self.client
            .get(&url)
            .headers(self.build_headers()?)
            .query(&[("depositAddress", deposit_address)])
            .send()
            .await
            .map_err(|e| SwapError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_error(response).await);
        }

        response
            .json::<ExecutionDetails>()
            .await
            .map_err(|e| SwapError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DepositType, RecipientType, SwapStatus, SwapType};
    use mockito::{Matcher, Server};

    fn sample_request() -> QuoteRequest {
        QuoteRequest {
            dry: false,
            swap_type: SwapType::ExactInput,
            slippage_tolerance_bps: 100,
            origin_asset_id: "nep141:wrap.near".to_string(),
            deposit_type: DepositType::OriginChain,
            destination_asset_id: "nep141:usdt.tether-token.near".to_string(),
            amount: "1000000000000000000000000".to_string(),
            refund_to: Some("alice.near".to_string()),
            refund_type: DepositType::OriginChain,
            recipient: Some("alice.near".to_string()),
            recipient_type: RecipientType::DestinationChain,
            deadline: None,
        }
    }

    fn client(server: &Server) -> OneClickClient {
        OneClickClient::new(server.url(), Some("test-jwt".to_string()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_quote() {
        let mut server = Server::new_async().await;

        let mock_response = r#"{
            "timestamp": "2025-06-01T12:00:00Z",
            "signature": "ed25519:abc",
            "correlationId": "corr-1",
            "quoteRequest": {
                "dry": false,
                "swapType": "EXACT_INPUT",
                "slippageTolerance": 100,
                "originAsset": "nep141:wrap.near",
                "depositType": "ORIGIN_CHAIN",
                "destinationAsset": "nep141:usdt.tether-token.near",
                "amount": "1000000000000000000000000"
            },
            "quote": {
                "depositAddress": "3e1c5f0b7a",
                "amountIn": "1000000000000000000000000",
                "amountInFormatted": "1.0",
                "amountInUsd": "2.95",
                "minAmountIn": "1000000000000000000000000",
                "amountOut": "2950000",
                "amountOutFormatted": "2.95",
                "amountOutUsd": "2.95",
                "minAmountOut": "2920500",
                "deadline": "2025-06-01T12:10:00Z",
                "timeWhenInactive": "2025-06-01T12:10:00Z",
                "timeEstimate": 20
            }
        }"#;

        let mock = server
            .mock("POST", "/v0/quote")
            .match_header("authorization", "Bearer test-jwt")
            .match_body(Matcher::PartialJsonString(
                r#"{"originAsset":"nep141:wrap.near","slippageTolerance":100,"swapType":"EXACT_INPUT"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mock_response)
            .create_async()
            .await;

        let quote = client(&server).get_quote(&sample_request()).await.unwrap();
        mock.assert_async().await;

        assert_eq!(quote.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(quote.deposit_address.as_deref(), Some("3e1c5f0b7a"));
        assert_eq!(quote.amount_in_formatted, "1.0");
        assert_eq!(quote.min_amount_out, "2920500");
        assert_eq!(quote.time_estimate, 20);
        assert_eq!(quote.slippage_tolerance_bps, 100);
        assert!(quote.deadline.is_some());
    }

    #[tokio::test]
    async fn test_quote_error_status_mapping() {
        let mut server = Server::new_async().await;

        for (status, expected) in [(401, "AuthError"), (400, "InvalidRequest"), (404, "ServiceUnavailable"), (503, "UnknownError")] {
            let mock = server
                .mock("POST", "/v0/quote")
                .with_status(status)
                .with_header("content-type", "application/json")
                .with_body(r#"{"message":"nope"}"#)
                .create_async()
                .await;

            let err = client(&server).get_quote(&sample_request()).await.unwrap_err();
            assert!(format!("{:?}", err).starts_with(expected), "{status} -> {err:?}");
            assert!(err.to_string().contains("nope"));
            mock.remove_async().await;
        }
    }

    #[tokio::test]
    async fn test_get_execution_status() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v0/status")
            .match_query(Matcher::UrlEncoded("depositAddress".into(), "3e1c5f0b7a".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"PROCESSING","updatedAt":"2025-06-01T12:01:00Z","swapDetails":{"intentHashes":["h1"]}}"#)
            .create_async()
            .await;

        let details = client(&server).get_execution_status("3e1c5f0b7a").await.unwrap();
        mock.assert_async().await;

        assert_eq!(details.status, SwapStatus::Processing);
        assert_eq!(details.details["intentHashes"][0], "h1");
    }

    #[tokio::test]
    async fn test_malformed_status_body() {
        let mut server = Server::new_async().await;

        let _mock = server
            .mock("GET", "/v0/status")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client(&server).get_execution_status("addr").await.unwrap_err();
        assert!(matches!(err, SwapError::Decode(_)));
    }
}
