//! Dashboard backend REST adapter
//!
//! The backend proxies the bonding-curve contract's read calls and wraps every
//! answer in a `{ success, data, error }` envelope.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::config::BackendConfig;
use crate::domain::{SwapDirection, TokenKind};
use crate::error::{ProviderFault, Result, SwapFlowError};
use crate::flow::{BalanceProvider, QuoteProvider};

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl Envelope {
    fn into_amount(self) -> Result<u128> {
        if !self.success {
            return Err(SwapFlowError::Backend(
                self.error
                    .unwrap_or_else(|| "Failed to simulate swap".to_string()),
            ));
        }
        match self.data {
            Some(value) => parse_amount_value(&value),
            None => Err(SwapFlowError::Backend("response carried no data".to_string())),
        }
    }
}

/// Parse an on-chain integer returned as a decimal string, hex string, or
/// JSON number.
fn parse_amount_value(value: &Value) -> Result<u128> {
    let parsed = match value {
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u128::from_str_radix(hex, 16).ok(),
                None => s.parse::<u128>().ok(),
            }
        }
        // `arbitrary_precision` keeps the source digits, so values past u64 survive
        Value::Number(n) => n.to_string().parse::<u128>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| SwapFlowError::Backend(format!("unparseable amount: {}", value)))
}

/// Quote and balance reads for one agent market
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    agent_id: String,
}

impl BackendClient {
    pub fn new(base_url: &str, agent_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(SwapFlowError::Validation(format!(
                "backend URL cannot be used as a base: {}",
                base_url
            )));
        }

        let http = Client::builder()
            .user_agent("curve-swap/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| SwapFlowError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            agent_id: agent_id.into(),
        })
    }

    pub fn from_config(config: &BackendConfig, agent_id: impl Into<String>) -> Result<Self> {
        Self::new(&config.base_url, agent_id, config.timeout())
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `GET {base}/agents/{id}/simulate/{buy|sell}?amount=`
    pub fn simulate_url(&self, direction: SwapDirection, amount: u128) -> Url {
        let side = match direction {
            SwapDirection::Buy => "buy",
            SwapDirection::Sell => "sell",
        };
        let mut url = self.endpoint(&["agents", &self.agent_id, "simulate", side]);
        url.query_pairs_mut()
            .append_pair("amount", &amount.to_string());
        url
    }

    /// `GET {base}/agents/{id}/balances/{address}?token=agent|base`
    pub fn balance_url(&self, address: &str, token: TokenKind) -> Url {
        let mut url = self.endpoint(&["agents", &self.agent_id, "balances", address]);
        url.query_pairs_mut().append_pair("token", token.as_str());
        url
    }

    async fn fetch_amount(&self, url: Url) -> Result<u128> {
        debug!(%url, "Backend request");
        let resp = self.http.get(url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(%url, %status, "Backend request failed");
            return Err(SwapFlowError::Backend(format!("HTTP {}: {}", status, body)));
        }

        resp.json::<Envelope>().await?.into_amount()
    }
}

/// Backend errors pass their message through verbatim so they can be classified.
fn into_fault(err: SwapFlowError) -> ProviderFault {
    match err {
        SwapFlowError::Backend(message) => ProviderFault::new(message),
        other => other.into(),
    }
}

#[async_trait]
impl QuoteProvider for BackendClient {
    async fn simulate(
        &self,
        direction: SwapDirection,
        amount: u128,
    ) -> std::result::Result<u128, ProviderFault> {
        self.fetch_amount(self.simulate_url(direction, amount))
            .await
            .map_err(into_fault)
    }
}

#[async_trait]
impl BalanceProvider for BackendClient {
    async fn balance_of(
        &self,
        address: &str,
        token: TokenKind,
    ) -> std::result::Result<u128, ProviderFault> {
        self.fetch_amount(self.balance_url(address, token))
            .await
            .map_err(into_fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> BackendClient {
        BackendClient::new("https://dash.example/api/", "agent-7", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(
            client.simulate_url(SwapDirection::Buy, 1_500_000).as_str(),
            "https://dash.example/api/agents/agent-7/simulate/buy?amount=1500000"
        );
        assert_eq!(
            client.balance_url("0xabc", TokenKind::Agent).as_str(),
            "https://dash.example/api/agents/agent-7/balances/0xabc?token=agent"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(BackendClient::new("mailto:ops@example.com", "a", Duration::from_secs(1)).is_err());
        assert!(BackendClient::new("not a url", "a", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_envelope_success() {
        let envelope: Envelope =
            serde_json::from_value(json!({"success": true, "data": "3000000000000000000"}))
                .unwrap();
        assert_eq!(envelope.into_amount().unwrap(), 3_000_000_000_000_000_000);
    }

    #[test]
    fn test_numeric_amount_above_u64() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"success": true, "data": 25000000000000000000}"#,
        )
        .unwrap();
        assert_eq!(envelope.into_amount().unwrap(), 25_000_000_000_000_000_000);
    }

    #[test]
    fn test_envelope_failure_keeps_contract_message() {
        let envelope: Envelope = serde_json::from_value(
            json!({"success": false, "error": "Option::unwrap failed"}),
        )
        .unwrap();
        let fault = into_fault(envelope.into_amount().unwrap_err());
        assert_eq!(fault.message, "Option::unwrap failed");
    }

    #[test]
    fn test_parse_amount_value_forms() {
        assert_eq!(parse_amount_value(&json!("0x10")).unwrap(), 16);
        assert_eq!(parse_amount_value(&json!(" 42 ")).unwrap(), 42);
        assert_eq!(parse_amount_value(&json!(7)).unwrap(), 7);
        assert!(parse_amount_value(&json!(1.5)).is_err());
        assert!(parse_amount_value(&json!(-1)).is_err());
        assert!(parse_amount_value(&json!("1.5")).is_err());
        assert!(parse_amount_value(&json!(null)).is_err());
    }
}
