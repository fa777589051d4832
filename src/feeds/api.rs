use super::{
    Alert, AlertPage, AlertStatus, Backend, CoinAnalysis, ContentAnalysis, Influencer,
    ScanSummary, Token, TokenRequest, Tweet,
};
use crate::error::{DashError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

const USER_AGENT: &str = concat!("memedash/", env!("CARGO_PKG_VERSION"));

/// HTTP implementation of [`Backend`] against the dashboard REST API.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(&url).send().await?;
        read_response(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        read_response(response).await
    }
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    decode_response(status, &body)
}

/// Turns a raw HTTP answer into a typed value.
///
/// A top-level `"error"` string wins over everything else, including a 2xx
/// status, since the backend reports most failures that way.
pub(crate) fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    let value: Option<Value> = serde_json::from_str(body).ok();

    if let Some(message) = value
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
    {
        return Err(DashError::Server(message.to_string()));
    }

    if !(200..300).contains(&status) {
        return Err(DashError::HttpStatus {
            status,
            body: body.to_string(),
        });
    }

    let value = value.ok_or_else(|| DashError::Server("response was not valid JSON".to_string()))?;
    serde_json::from_value(value)
        .map_err(|e| DashError::Server(format!("unexpected response shape: {}", e)))
}

#[async_trait]
impl Backend for ApiClient {
    async fn fetch_alerts(&self) -> Result<AlertPage> {
        self.get("/api/alerts").await
    }

    async fn fetch_alert(&self, id: &str) -> Result<Alert> {
        self.get(&format!("/api/alerts/{}", urlencoding::encode(id)))
            .await
    }

    async fn update_alert_status(&self, id: &str, status: AlertStatus) -> Result<()> {
        let ack: Value = self
            .post(
                &format!("/api/alerts/{}/status", urlencoding::encode(id)),
                &json!({ "status": status }),
            )
            .await?;

        if ack.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(DashError::Server(format!(
                "Failed to set alert status to {}",
                status
            )))
        }
    }

    async fn analyze_coin(&self, address: &str, blockchain: &str) -> Result<CoinAnalysis> {
        self.post(
            "/api/analyze/coin",
            &json!({ "address": address, "blockchain": blockchain }),
        )
        .await
    }

    async fn scan_trending(&self) -> Result<ScanSummary> {
        self.get("/api/scan/trending").await
    }

    async fn analyze_content(&self, content: &str) -> Result<ContentAnalysis> {
        self.post("/api/analyze", &json!({ "content": content }))
            .await
    }

    async fn fetch_tweets(&self) -> Result<Vec<Tweet>> {
        self.get("/api/tweets").await
    }

    async fn fetch_tokens(&self) -> Result<Vec<Token>> {
        self.get("/api/tokens").await
    }

    async fn create_token(&self, request: &TokenRequest) -> Result<Token> {
        self.post("/api/tokens", request).await
    }

    async fn fetch_influencers(&self) -> Result<Vec<Influencer>> {
        self.get("/api/influencers").await
    }
}
