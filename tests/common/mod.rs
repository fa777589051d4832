//! In-memory backend and push connector for driving the client in tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use memedash::app::{ClientSettings, DashboardState, LiveListClient, Notification};
use memedash::error::{DashError, Result};
use memedash::feeds::push::{ChannelFrame, FrameStream, PushConnector};
use memedash::feeds::{
    Alert, AlertPage, AlertStatus, Backend, CoinAnalysis, ContentAnalysis, Influencer,
    SafetyReport, ScanSummary, Token, TokenRequest, Tweet,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub fn alert(id: &str) -> Alert {
    serde_json::from_value(json!({
        "id": id,
        "coin": {"name": format!("Coin {}", id), "symbol": "CN", "address": "0xabc", "blockchain": "ethereum"},
        "meme": {"platform": "reddit", "title": "such wow"},
        "match": {"keyword": "doge", "score": 0.8}
    }))
    .unwrap()
}

pub fn tweet(id: &str) -> Tweet {
    serde_json::from_value(json!({
        "tweet_id": id,
        "author": "elonmusk",
        "content": "doge to the moon"
    }))
    .unwrap()
}

pub fn token(id: u64) -> Token {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Token {}", id),
        "symbol": "TKN",
        "creator": "elonmusk"
    }))
    .unwrap()
}

/// Serves whatever the test put into it and remembers every call.
#[derive(Default)]
pub struct FakeBackend {
    pub alerts: Mutex<Vec<Alert>>,
    pub tweets: Mutex<Vec<Tweet>>,
    pub tokens: Mutex<Vec<Token>>,
    /// Latency of successive `fetch_alerts` calls; empty means instant.
    pub alert_delays: Mutex<VecDeque<Duration>>,
    failing: Mutex<Vec<&'static str>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, call: &'static str) {
        self.failing.lock().unwrap().push(call);
    }

    pub fn calls(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&call) {
            return Err(DashError::Server(format!("{} failed", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_alerts(&self) -> Result<AlertPage> {
        self.record("fetch_alerts")?;
        let alerts = self.alerts.lock().unwrap().clone();
        let delay = self.alert_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(AlertPage {
            total: alerts.len() as u64,
            alerts,
        })
    }

    async fn fetch_alert(&self, id: &str) -> Result<Alert> {
        self.record("fetch_alert")?;
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| DashError::Server("Alert not found".to_string()))
    }

    async fn update_alert_status(&self, _id: &str, _status: AlertStatus) -> Result<()> {
        self.record("update_alert_status")
    }

    async fn analyze_coin(&self, address: &str, blockchain: &str) -> Result<CoinAnalysis> {
        self.record("analyze_coin")?;
        Ok(CoinAnalysis {
            address: address.to_string(),
            blockchain: blockchain.to_string(),
            safety: SafetyReport {
                overall_score: 0.8,
                ..Default::default()
            },
            analyzed_at: None,
        })
    }

    async fn scan_trending(&self) -> Result<ScanSummary> {
        self.record("scan_trending")?;
        Ok(ScanSummary {
            count: 3,
            memes: Vec::new(),
        })
    }

    async fn analyze_content(&self, content: &str) -> Result<ContentAnalysis> {
        self.record("analyze_content")?;
        Ok(ContentAnalysis {
            content: Some(content.to_string()),
            keywords: vec!["moon".to_string()],
            sentiment_score: 0.4,
            viral_score: 0.6,
            potential_matches: Vec::new(),
        })
    }

    async fn fetch_tweets(&self) -> Result<Vec<Tweet>> {
        self.record("fetch_tweets")?;
        Ok(self.tweets.lock().unwrap().clone())
    }

    async fn fetch_tokens(&self) -> Result<Vec<Token>> {
        self.record("fetch_tokens")?;
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn create_token(&self, request: &TokenRequest) -> Result<Token> {
        self.record("create_token")?;
        let mut created = token(99);
        created.name = request.name.clone();
        created.symbol = request.symbol.clone();
        created.creator = request.creator.clone();
        Ok(created)
    }

    async fn fetch_influencers(&self) -> Result<Vec<Influencer>> {
        self.record("fetch_influencers")?;
        Ok(vec![Influencer {
            name: "Elon Musk".to_string(),
            twitter_handle: "elonmusk".to_string(),
        }])
    }
}

/// What one connection attempt does.
pub enum Session {
    /// The attempt fails before opening.
    Refuse,
    /// Opens, delivers the frames, then closes.
    Close(Vec<ChannelFrame>),
    /// Opens, delivers the frames, then stays open.
    Hold(Vec<ChannelFrame>),
}

/// Plays scripted sessions in order; once the script runs out every attempt
/// is refused.
pub struct FakeConnector {
    script: Mutex<VecDeque<Session>>,
    attempts: Mutex<Vec<Instant>>,
}

impl FakeConnector {
    pub fn new(script: Vec<Session>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            attempts: Mutex::new(Vec::new()),
        })
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushConnector for FakeConnector {
    async fn connect(&self) -> Result<FrameStream> {
        self.attempts.lock().unwrap().push(Instant::now());
        let session = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Session::Refuse);

        match session {
            Session::Refuse => Err(DashError::ChannelClosed("connection refused".to_string())),
            Session::Close(frames) => Ok(stream::iter(frames).boxed()),
            Session::Hold(frames) => Ok(stream::iter(frames).chain(stream::pending()).boxed()),
        }
    }
}

/// Settings with polling off, so tests only see the traffic they trigger.
pub fn quiet_settings() -> ClientSettings {
    ClientSettings {
        poll_kinds: Vec::new(),
        ..ClientSettings::default()
    }
}

pub fn client_with(
    backend: Arc<FakeBackend>,
    connector: Arc<FakeConnector>,
    settings: ClientSettings,
) -> LiveListClient {
    LiveListClient::new(backend, connector, settings, DashboardState::default())
}

/// Collects every notification the client raises.
pub fn capture_notifications(client: &mut LiveListClient) -> Arc<Mutex<Vec<Notification>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.on_notification(move |n| sink.lock().unwrap().push(n.clone()));
    seen
}

/// Lets background tasks run to completion on the paused clock.
pub async fn settle(client: &mut LiveListClient) {
    client
        .run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await;
}
