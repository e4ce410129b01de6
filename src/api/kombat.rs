//! Clicker game HTTP client.
//!
//! All endpoints are `POST` under `{base_url}/clicker/` and authenticate with
//! the raw `Authorization` header value the user supplies (`Bearer …`).
//! Browser-like `Origin`/`Referer` headers are required by the server.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::GameApi;
use crate::config::ApiConfig;
use crate::types::{BuyUpgradeRequest, PurchaseStatus, SyncResponse, Upgrade, UpgradesForBuy};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.hamsterkombatgame.io";
const WEB_ORIGIN: &str = "https://hamsterkombat.io";
const WEB_REFERER: &str = "https://hamsterkombat.io/";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the upgrade shop.
pub struct KombatClient {
    http: Client,
    base_url: String,
    authorization: SecretString,
}

impl KombatClient {
    /// Create a client against `base_url`.
    pub fn new(
        base_url: &str,
        authorization: SecretString,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(ORIGIN, HeaderValue::from_static(WEB_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static(WEB_REFERER));

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client for game API")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization,
        })
    }

    /// Create a client from the `[api]` config section.
    pub fn from_config(cfg: &ApiConfig, authorization: SecretString) -> Result<Self> {
        Self::new(
            &cfg.base_url,
            authorization,
            &cfg.user_agent,
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- Internal helpers ------------------------------------------------

    fn post(&self, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/clicker/{endpoint}", self.base_url);
        debug!(url = %url, "Game API request");
        self.http
            .post(url)
            .header("Authorization", self.authorization.expose_secret().as_str())
    }

    /// Send a request and decode a successful JSON body.
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        req: RequestBuilder,
        endpoint: &str,
    ) -> Result<T> {
        let resp = req
            .send()
            .await
            .with_context(|| format!("Game API request to {endpoint} failed"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Game API error {status} on {endpoint}: {body}");
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse {endpoint} response"))
    }
}

// ---------------------------------------------------------------------------
// GameApi trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl GameApi for KombatClient {
    async fn fetch_upgrades(&self) -> Result<Vec<Upgrade>> {
        let body: UpgradesForBuy = self
            .send_json(self.post("upgrades-for-buy"), "upgrades-for-buy")
            .await?;

        info!(total = body.upgrades_for_buy.len(), "Upgrade catalog fetched");
        Ok(body.upgrades_for_buy)
    }

    async fn sync_balance(&self) -> Result<f64> {
        let body: SyncResponse = self.send_json(self.post("sync"), "sync").await?;
        Ok(body.clicker_user.balance_coins)
    }

    async fn buy_upgrade(&self, upgrade_id: &str) -> Result<PurchaseStatus> {
        let request = BuyUpgradeRequest {
            upgrade_id: upgrade_id.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        let resp = self
            .post("buy-upgrade")
            .json(&request)
            .send()
            .await
            .context("Buy upgrade request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read buy response")?;

        let outcome = classify_buy_response(status, &text)?;
        if let PurchaseStatus::Rejected { code, message } = &outcome {
            warn!(upgrade_id, code = %code, message = %message, "Purchase rejected");
        }
        Ok(outcome)
    }
}

/// Interpret a buy-upgrade response.
///
/// Refusals come back as a JSON body with `error_code`, sometimes with a 4xx
/// status. A non-2xx response without one, or a body that is not JSON, is a
/// hard error.
fn classify_buy_response(status: StatusCode, text: &str) -> Result<PurchaseStatus> {
    let body: serde_json::Value = match serde_json::from_str(text) {
        Ok(body) => body,
        Err(e) => {
            anyhow::bail!("Game API error {status} on buy-upgrade (unparseable body: {e}): {text}")
        }
    };

    let outcome = PurchaseStatus::from_body(&body);
    if !status.is_success() && outcome.is_accepted() {
        anyhow::bail!("Game API error {status} on buy-upgrade: {text}");
    }
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
