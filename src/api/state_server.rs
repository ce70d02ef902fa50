use crate::models::{Instrument, MarketSnapshot, TradeCommand, TradeSignal};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const REQUEST_TIMEOUT_SECS: u64 = 5;

/// What can go wrong talking to the state server
#[derive(Debug, Error)]
pub enum ClientError {
    /// connect, timeout or body-decode failure
    #[error("state server request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// the server answered, but with a non-success status
    #[error("state server returned {status} for {endpoint}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
}

fn check_status(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status { endpoint, status })
    }
}

/// Full-universe snapshot from `GET /state`
#[derive(Debug, Clone, Deserialize)]
pub struct StateResponse {
    pub symbols: Vec<String>,
    pub state: HashMap<String, MarketSnapshot>,
    pub instruments: Vec<Instrument>,
}

/// Synthetic signal payload for `POST /tv-signal`
///
/// Writes straight into the server's authoritative store; the data flows
/// back through the normal `/state` poll, so the engine never sees a
/// difference between injected and live signals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalInjection {
    pub symbol: String,
    pub signal: TradeSignal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
struct LtpInjection<'a> {
    symbol: &'a str,
    ltp: f64,
}

/// Client for the state server: market state source, trade sink and
/// synthetic signal injector live behind the same base URL
#[derive(Clone)]
pub struct StateServerClient {
    client: Client,
    base_url: String,
}

impl StateServerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the full market snapshot covering every symbol and instrument
    pub async fn get_state(&self) -> Result<StateResponse, ClientError> {
        let url = format!("{}/state", self.base_url);

        let response = self.client.get(&url).send().await?;
        let response = check_status("/state", response)?
            .json::<StateResponse>()
            .await?;

        tracing::debug!(
            symbols = response.symbols.len(),
            instruments = response.instruments.len(),
            "Fetched state snapshot"
        );

        Ok(response)
    }

    /// Submit a trade command; only the HTTP status is consulted, the
    /// response body is opaque to the engine
    pub async fn send_trade(&self, command: &TradeCommand) -> Result<(), ClientError> {
        let url = format!("{}/trade", self.base_url);

        let response = self.client.post(&url).json(command).send().await?;
        check_status("/trade", response)?;

        Ok(())
    }

    /// Inject a synthetic strategy signal (test collaborator)
    pub async fn send_signal(&self, injection: &SignalInjection) -> Result<(), ClientError> {
        let url = format!("{}/tv-signal", self.base_url);

        let response = self.client.post(&url).json(injection).send().await?;
        check_status("/tv-signal", response)?;

        Ok(())
    }

    /// Inject a synthetic last-traded price (test collaborator)
    pub async fn send_ltp(&self, symbol: &str, ltp: f64) -> Result<(), ClientError> {
        let url = format!("{}/fake-ltp", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&LtpInjection { symbol, ltp })
            .send()
            .await?;
        check_status("/fake-ltp", response)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuyCondition, TradeAction, TradeDirection, TradeMode};

    #[tokio::test]
    async fn test_get_state_parses_full_response() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "symbols": ["NIFTY", "BANKNIFTY"],
            "state": {
                "NIFTY": {
                    "ltp": 24500.5,
                    "buyThreshold": 24490.0,
                    "lastBuyThreshold": null,
                    "buyThresholdCondn": true,
                    "lastSignal": "BUY",
                    "sellSignalsAfterBuy": 0,
                    "reEnterBuyCondition": false
                },
                "BANKNIFTY": {
                    "ltp": null,
                    "buyThreshold": null,
                    "lastBuyThreshold": null,
                    "buyThresholdCondn": null,
                    "lastSignal": null,
                    "sellSignalsAfterBuy": 0,
                    "reEnterBuyCondition": false
                }
            },
            "instruments": [
                {"symbol": "NIFTY", "exchange": "NFO", "tradingsymbol": "NIFTY25SEPFUT", "token": 256265, "lot": 75}
            ]
        }"#;

        let mock = server
            .mock("GET", "/state")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = StateServerClient::new(server.url());
        let response = client.get_state().await.unwrap();

        assert_eq!(response.symbols, vec!["NIFTY", "BANKNIFTY"]);
        assert_eq!(response.state["NIFTY"].ltp, Some(24500.5));
        assert_eq!(response.state["BANKNIFTY"].ltp, None);
        assert_eq!(
            response.state["BANKNIFTY"].buy_condition,
            BuyCondition::Unknown
        );
        assert_eq!(response.instruments[0].lot, 75);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_state_http_error_is_err() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/state")
            .with_status(500)
            .create_async()
            .await;

        let client = StateServerClient::new(server.url());
        let err = client.get_state().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status { endpoint: "/state", status }
                if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
        ));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_trade_posts_wire_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/trade")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "symbol": "NIFTY",
                "mode": "livesim",
                "action": "OPEN",
                "direction": "BUY",
                "qty": 75
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = StateServerClient::new(server.url());
        let command = TradeCommand {
            symbol: "NIFTY".to_string(),
            mode: TradeMode::LiveSim,
            action: TradeAction::Open,
            direction: TradeDirection::Buy,
            qty: 75,
        };

        client.send_trade(&command).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_signal_omits_missing_threshold() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tv-signal")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "symbol": "NIFTY",
                "signal": "SELL"
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = StateServerClient::new(server.url());
        let injection = SignalInjection {
            symbol: "NIFTY".to_string(),
            signal: TradeSignal::Sell,
            buy_threshold: None,
        };

        client.send_signal(&injection).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_ltp_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/fake-ltp")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "symbol": "NIFTY",
                "ltp": 24510.0
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = StateServerClient::new(server.url());
        client.send_ltp("NIFTY", 24510.0).await.unwrap();
        mock.assert_async().await;
    }
}
