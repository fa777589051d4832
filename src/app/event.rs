use super::state::AlertFilter;
use crate::error::{DashError, Result};
use crate::feeds::push::PushEvent;
use crate::feeds::{
    Alert, AlertPage, AlertStatus, CoinAnalysis, ContentAnalysis, Influencer, ListKind,
    ScanSummary, Token, Tweet,
};
use std::time::Duration;

/// Everything that can change the dashboard state.
///
/// Produced by the push channel, the poll timer, request tasks and the user.
/// Applied one at a time by [`super::reducer::reduce`].
#[derive(Debug)]
pub enum DashboardEvent {
    ChannelConnecting,
    ChannelOpened,
    ChannelError(String),
    ChannelClosed {
        retry_in: Duration,
    },
    Push(PushEvent),

    PollDue(ListKind),
    AlertsFetched {
        ticket: u64,
        result: Result<AlertPage>,
    },
    TweetsFetched {
        ticket: u64,
        result: Result<Vec<Tweet>>,
    },
    TokensFetched {
        ticket: u64,
        result: Result<Vec<Token>>,
    },
    InfluencersFetched(Result<Vec<Influencer>>),

    Started(RequestKind),
    Reset(RequestKind),
    AlertDetailLoaded {
        id: String,
        result: Result<Alert>,
    },
    StatusChanged {
        id: String,
        status: AlertStatus,
        result: Result<()>,
    },
    ScanFinished(Result<ScanSummary>),
    ContentAnalyzed(Result<ContentAnalysis>),
    CoinAnalyzed(Result<CoinAnalysis>),
    TokenCreated(Result<Token>),

    FilterChanged(AlertFilter),
    Rejected(DashError),
}

/// One-shot requests whose progress is tracked in the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    AlertDetail,
    Scan,
    ContentAnalysis,
    CoinAnalysis,
    TokenCreation,
}

/// Follow-up work a transition asks the client to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    FetchAll(ListKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// User-facing toast.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: NotificationLevel::Error,
        }
    }
}

/// What applying one event did.
#[derive(Debug, Default, PartialEq)]
pub struct Outcome {
    pub changed: bool,
    pub notification: Option<Notification>,
    pub commands: Vec<Command>,
}

impl Outcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed() -> Self {
        Self {
            changed: true,
            ..Self::default()
        }
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }
}
