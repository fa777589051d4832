pub mod api;
pub mod push;

use crate::error::{DashError, Result};
use crate::list::Keyed;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Which live list a record or request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Alerts,
    Tweets,
    Tokens,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [ListKind::Alerts, ListKind::Tweets, ListKind::Tokens];

    pub fn label(&self) -> &'static str {
        match self {
            ListKind::Alerts => "alerts",
            ListKind::Tweets => "tweets",
            ListKind::Tokens => "tokens",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub blockchain: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemeInfo {
    #[serde(default)]
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemeInfo {
    pub fn headline(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.text.as_deref().filter(|t| !t.is_empty()))
            .unwrap_or("Untitled Meme")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetySummary {
    #[serde(default)]
    pub score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meme_virality: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejection_reasons: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Meme-to-coin alert raised by the alert engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub coin: CoinInfo,
    #[serde(default)]
    pub meme: MemeInfo,
    #[serde(default, rename = "match")]
    pub match_info: MatchInfo,
    #[serde(default)]
    pub safety: SafetySummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<Optimization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Alert {
    /// Optimizer score, 0 when the optimizer has not scored this alert.
    pub fn optimized_score(&self) -> f64 {
        self.optimization
            .as_ref()
            .and_then(|o| o.optimized_score)
            .unwrap_or(0.0)
    }

    /// Score shown on the alert card: optimizer score, else match confidence.
    pub fn display_score(&self) -> f64 {
        self.optimization
            .as_ref()
            .and_then(|o| o.optimized_score)
            .filter(|s| *s != 0.0)
            .unwrap_or(self.match_info.score)
    }

    pub fn rejection_reasons(&self) -> &[String] {
        self.optimization
            .as_ref()
            .map(|o| o.rejection_reasons.as_slice())
            .unwrap_or(&[])
    }
}

impl Keyed for Alert {
    fn key(&self) -> String {
        self.id.clone()
    }
}

/// Influencer tweet analysed by the trend service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub tweet_id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub viral_score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keyed for Tweet {
    fn key(&self) -> String {
        self.tweet_id.clone()
    }
}

/// Creator token minted through the trend service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub blockchain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keyed for Token {
    fn key(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Influencer {
    pub name: String,
    pub twitter_handle: String,
}

/// `GET /api/alerts` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPage {
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Triggered,
    Pending,
    Dismissed,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Triggered => "triggered",
            AlertStatus::Pending => "pending",
            AlertStatus::Dismissed => "dismissed",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "triggered" => Ok(AlertStatus::Triggered),
            "pending" => Ok(AlertStatus::Pending),
            "dismissed" => Ok(AlertStatus::Dismissed),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(DashError::Validation(format!(
                "Invalid status '{}'. Must be one of: triggered, pending, dismissed, resolved",
                other
            ))),
        }
    }
}

/// Safety report from `POST /api/analyze/coin`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    #[serde(default)]
    pub overall_score: f64,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SafetyReport {
    pub fn risk_label(&self) -> &'static str {
        if self.overall_score > 0.7 {
            "Low Risk"
        } else if self.overall_score > 0.4 {
            "Medium Risk"
        } else {
            "High Risk"
        }
    }
}

/// Block explorer page for a contract, on chains that have a known explorer.
pub fn explorer_url(blockchain: &str, address: &str) -> Option<String> {
    match blockchain {
        "ethereum" => Some(format!("https://etherscan.io/token/{}", address)),
        "solana" => Some(format!("https://explorer.solana.com/address/{}", address)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinAnalysis {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub blockchain: String,
    pub safety: SafetyReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<String>,
}

/// Result of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub viral_score: f64,
    #[serde(default)]
    pub potential_matches: Vec<Value>,
}

/// Result of `GET /api/scan/trending`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub count: u64,
    #[serde(default)]
    pub memes: Vec<Value>,
}

/// Body of `POST /api/tokens`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub name: String,
    pub symbol: String,
    pub creator: String,
    pub initial_supply: u64,
    #[serde(default)]
    pub description: String,
}

impl TokenRequest {
    /// Name, symbol, creator and a non-zero supply are required.
    pub fn validate(&self) -> Result<()> {
        let missing = self.name.trim().is_empty()
            || self.symbol.trim().is_empty()
            || self.creator.trim().is_empty()
            || self.initial_supply == 0;
        if missing {
            return Err(DashError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bucket used to colour scores and to filter alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreClass {
    High,
    Medium,
    Low,
}

impl ScoreClass {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            ScoreClass::High
        } else if score >= 0.4 {
            ScoreClass::Medium
        } else {
            ScoreClass::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn from_score(score: f64) -> Self {
        if score > 0.05 {
            Sentiment::Positive
        } else if score < -0.05 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }
}

/// Pull/mutation surface of the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_alerts(&self) -> Result<AlertPage>;
    async fn fetch_alert(&self, id: &str) -> Result<Alert>;
    async fn update_alert_status(&self, id: &str, status: AlertStatus) -> Result<()>;
    async fn analyze_coin(&self, address: &str, blockchain: &str) -> Result<CoinAnalysis>;
    async fn scan_trending(&self) -> Result<ScanSummary>;
    async fn analyze_content(&self, content: &str) -> Result<ContentAnalysis>;
    async fn fetch_tweets(&self) -> Result<Vec<Tweet>>;
    async fn fetch_tokens(&self) -> Result<Vec<Token>>;
    async fn create_token(&self, request: &TokenRequest) -> Result<Token>;
    async fn fetch_influencers(&self) -> Result<Vec<Influencer>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alert_keeps_unknown_fields() {
        let raw = json!({
            "id": "a-1",
            "status": "triggered",
            "coin": {"name": "Doge", "symbol": "DOGE", "address": "0xabc", "blockchain": "ethereum"},
            "meme": {"platform": "reddit", "title": "Such wow"},
            "match": {"keyword": "doge", "score": 0.82},
            "safety": {"score": 0.6},
            "keywords": ["doge", "moon"]
        });
        let alert: Alert = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(alert.coin.symbol, "DOGE");
        assert_eq!(alert.match_info.keyword, "doge");
        assert_eq!(alert.extra.get("keywords"), Some(&json!(["doge", "moon"])));
        assert_eq!(serde_json::to_value(&alert).unwrap(), raw);
    }

    #[test]
    fn test_display_score_falls_back_to_match() {
        let mut alert: Alert =
            serde_json::from_value(json!({"id": "a", "match": {"score": 0.5}})).unwrap();
        assert_eq!(alert.optimized_score(), 0.0);
        assert_eq!(alert.display_score(), 0.5);

        alert.optimization = Some(Optimization {
            optimized_score: Some(0.9),
            ..Default::default()
        });
        assert_eq!(alert.optimized_score(), 0.9);
        assert_eq!(alert.display_score(), 0.9);
    }

    #[test]
    fn test_meme_headline() {
        let meme = MemeInfo {
            text: Some("from text".to_string()),
            ..Default::default()
        };
        assert_eq!(meme.headline(), "from text");
        assert_eq!(MemeInfo::default().headline(), "Untitled Meme");
    }

    #[test]
    fn test_record_keys() {
        let tweet: Tweet =
            serde_json::from_value(json!({"id": 3, "tweet_id": "tweet_1_2", "author": "elonmusk"}))
                .unwrap();
        assert_eq!(tweet.key(), "tweet_1_2");

        let token: Token =
            serde_json::from_value(json!({"id": 7, "name": "Pepe Coin", "symbol": "PPC"}))
                .unwrap();
        assert_eq!(token.key(), "7");
    }

    #[test]
    fn test_alert_status_parse() {
        assert_eq!(
            "Dismissed".parse::<AlertStatus>().unwrap(),
            AlertStatus::Dismissed
        );
        assert!("archived".parse::<AlertStatus>().unwrap_err().is_validation());
        assert_eq!(
            serde_json::to_value(AlertStatus::Resolved).unwrap(),
            json!("resolved")
        );
    }

    #[test]
    fn test_token_request_validation() {
        let mut request = TokenRequest {
            name: "Moon Coin".to_string(),
            symbol: "MN".to_string(),
            creator: "elonmusk".to_string(),
            initial_supply: 1_000_000,
            description: String::new(),
        };
        assert!(request.validate().is_ok());

        request.symbol = "  ".to_string();
        assert!(request.validate().unwrap_err().is_validation());

        request.symbol = "MN".to_string();
        request.initial_supply = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_explorer_and_risk() {
        assert_eq!(
            explorer_url("solana", "So1").as_deref(),
            Some("https://explorer.solana.com/address/So1")
        );
        assert!(explorer_url("dogechain", "0x1").is_none());

        let report = SafetyReport {
            overall_score: 0.71,
            ..Default::default()
        };
        assert_eq!(report.risk_label(), "Low Risk");
        assert_eq!(SafetyReport::default().risk_label(), "High Risk");
    }

    #[test]
    fn test_score_buckets() {
        assert_eq!(ScoreClass::from_score(0.7), ScoreClass::High);
        assert_eq!(ScoreClass::from_score(0.69), ScoreClass::Medium);
        assert_eq!(ScoreClass::from_score(0.4), ScoreClass::Medium);
        assert_eq!(ScoreClass::from_score(0.1), ScoreClass::Low);

        assert_eq!(Sentiment::from_score(0.3), Sentiment::Positive);
        assert_eq!(Sentiment::from_score(0.05), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(-0.2), Sentiment::Negative);
    }
}
