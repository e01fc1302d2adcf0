use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

use crate::models::MarketMeta;
use super::normalizer::parse_timestamp;
use super::types::ApiMarketDetail;

#[derive(Debug, Error)]
pub enum FeedClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Pull-based client for the venue API: recent executed fills plus
/// per-market metadata. Transport failures surface as errors here; the
/// monitor treats them as "zero new trades this cycle" and retries on the
/// next tick.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FeedClient {
    pub fn new(http: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.get(format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }

    /// Fetch the most recent executed fills. The envelope is
    /// `{ "data": [...] }`; a bare array is accepted too.
    pub async fn recent_fills(&self) -> Result<Vec<Value>, FeedClientError> {
        let resp = self
            .get("/orders/matches")
            .send()
            .await?
            .error_for_status()?;

        let body: Value = resp.json().await?;
        match body {
            Value::Array(items) => Ok(items),
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(FeedClientError::Unexpected(
                    "missing data array in fills response".into(),
                )),
            },
            _ => Err(FeedClientError::Unexpected(
                "fills response is neither array nor object".into(),
            )),
        }
    }

    /// Fetch metadata for one market. `None` on any failure; callers
    /// degrade to their permissive/unknown branches rather than block.
    pub async fn market_detail(&self, market_id: &str) -> Option<MarketMeta> {
        let resp = match self.get(&format!("/markets/{market_id}")).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, market = %market_id, "Market metadata fetch failed");
                return None;
            }
        };

        if !resp.status().is_success() {
            tracing::debug!(
                status = %resp.status(),
                market = %market_id,
                "Market metadata returned non-2xx"
            );
            return None;
        }

        let body: Value = resp.json().await.ok()?;
        let detail = body.get("data").unwrap_or(&body);
        let parsed: ApiMarketDetail = serde_json::from_value(detail.clone()).ok()?;

        Some(MarketMeta {
            market_id: market_id.to_string(),
            title: parsed.title,
            description: parsed.description,
            end_date: parse_timestamp(parsed.end_date.as_ref()),
            yes_price: parsed.yes_price.as_ref().and_then(|v| match v {
                Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
                Value::String(s) => Decimal::from_str(s).ok(),
                _ => None,
            }),
        })
    }
}
