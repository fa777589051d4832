use crate::config::Config;
use crate::feeds::{
    Alert, CoinAnalysis, ContentAnalysis, Influencer, ListKind, ScoreClass, Token, Tweet,
};
use crate::list::BoundedList;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// View filter over the alert list, keyed on the optimizer score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertFilter {
    #[default]
    All,
    High,
    Medium,
    Low,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        let class = ScoreClass::from_score(alert.optimized_score());
        match self {
            AlertFilter::All => true,
            AlertFilter::High => class == ScoreClass::High,
            AlertFilter::Medium => class == ScoreClass::Medium,
            AlertFilter::Low => class == ScoreClass::Low,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AlertFilter::All => AlertFilter::High,
            AlertFilter::High => AlertFilter::Medium,
            AlertFilter::Medium => AlertFilter::Low,
            AlertFilter::Low => AlertFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertFilter::All => "all",
            AlertFilter::High => "high",
            AlertFilter::Medium => "medium",
            AlertFilter::Low => "low",
        }
    }
}

/// Progress of a one-shot request.
#[derive(Debug, Clone, PartialEq)]
pub enum Remote<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Remote<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Remote::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Remote::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Tickets handed to full-list fetches, in issue order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchTracker {
    issued: u64,
    applied: u64,
}

impl FetchTracker {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Accepts a response unless a newer fetch has already been applied.
    pub fn accept(&mut self, ticket: u64) -> bool {
        if ticket < self.applied {
            return false;
        }
        self.applied = ticket;
        true
    }
}

/// One live list plus its load/error affordances.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub items: BoundedList<T>,
    pub error: Option<String>,
    pub loaded: bool,
    pub tracker: FetchTracker,
}

impl<T> ListView<T> {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            items: match capacity {
                Some(cap) => BoundedList::with_capacity(cap),
                None => BoundedList::unbounded(),
            },
            error: None,
            loaded: false,
            tracker: FetchTracker::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.loaded && self.error.is_none()
    }
}

/// Everything the dashboard shows. Owned by exactly one client.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub connection: ConnectionState,
    pub alerts: ListView<Alert>,
    pub alert_total: u64,
    pub alert_filter: AlertFilter,
    pub tweets: ListView<Tweet>,
    pub tokens: ListView<Token>,
    pub influencers: Remote<Vec<Influencer>>,
    pub alert_detail: Remote<Alert>,
    pub content_analysis: Remote<ContentAnalysis>,
    pub coin_analysis: Remote<CoinAnalysis>,
    pub token_submission: Remote<Token>,
    pub scan_in_flight: bool,
}

impl DashboardState {
    pub fn new(
        max_alerts: Option<usize>,
        max_tweets: Option<usize>,
        max_tokens: Option<usize>,
    ) -> Self {
        Self {
            connection: ConnectionState::Connecting,
            alerts: ListView::new(max_alerts),
            alert_total: 0,
            alert_filter: AlertFilter::All,
            tweets: ListView::new(max_tweets),
            tokens: ListView::new(max_tokens),
            influencers: Remote::Idle,
            alert_detail: Remote::Idle,
            content_analysis: Remote::Idle,
            coin_analysis: Remote::Idle,
            token_submission: Remote::Idle,
            scan_in_flight: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.alerts.max_items,
            config.tweets.max_items,
            config.tokens.max_items,
        )
    }

    pub fn issue_ticket(&mut self, kind: ListKind) -> u64 {
        match kind {
            ListKind::Alerts => self.alerts.tracker.issue(),
            ListKind::Tweets => self.tweets.tracker.issue(),
            ListKind::Tokens => self.tokens.tracker.issue(),
        }
    }

    /// Alerts passing the active filter, newest first.
    pub fn visible_alerts(&self) -> Vec<&Alert> {
        self.alerts
            .items
            .iter()
            .filter(|alert| self.alert_filter.matches(alert))
            .collect()
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(Some(20), Some(10), None)
    }
}
