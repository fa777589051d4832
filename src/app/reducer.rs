//! State transitions. No I/O happens here; effects come back as [`Command`]s.

use super::event::*;
use super::state::*;
use crate::error::DashError;
use crate::feeds::push::PushEvent;
use crate::feeds::{AlertStatus, ListKind};
use crate::list::Keyed;

pub fn reduce(state: &mut DashboardState, ev: DashboardEvent) -> Outcome {
    match ev {
        DashboardEvent::ChannelConnecting => set_connection(state, ConnectionState::Connecting),
        DashboardEvent::ChannelOpened => set_connection(state, ConnectionState::Connected),
        DashboardEvent::ChannelError(_) | DashboardEvent::ChannelClosed { .. } => {
            set_connection(state, ConnectionState::Disconnected)
        }
        DashboardEvent::Push(push) => reduce_push(state, push),

        DashboardEvent::PollDue(kind) => Outcome::unchanged().with_command(Command::FetchAll(kind)),
        DashboardEvent::AlertsFetched { ticket, result } => {
            if !state.alerts.tracker.accept(ticket) {
                tracing::debug!(ticket, "discarding stale alerts response");
                return Outcome::unchanged();
            }
            match result {
                Ok(page) => {
                    state.alerts.items.replace(page.alerts);
                    state.alert_total = page.total;
                    state.alerts.error = None;
                    state.alerts.loaded = true;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to fetch alerts");
                    state.alerts.error = Some(err.to_string());
                }
            }
            Outcome::changed()
        }
        DashboardEvent::TweetsFetched { ticket, result } => {
            if !state.tweets.tracker.accept(ticket) {
                tracing::debug!(ticket, "discarding stale tweets response");
                return Outcome::unchanged();
            }
            apply_snapshot(&mut state.tweets, result, ListKind::Tweets)
        }
        DashboardEvent::TokensFetched { ticket, result } => {
            if !state.tokens.tracker.accept(ticket) {
                tracing::debug!(ticket, "discarding stale tokens response");
                return Outcome::unchanged();
            }
            apply_snapshot(&mut state.tokens, result, ListKind::Tokens)
        }
        DashboardEvent::InfluencersFetched(result) => {
            state.influencers = match result {
                Ok(influencers) => Remote::Ready(influencers),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to fetch influencers");
                    Remote::Failed(err.to_string())
                }
            };
            Outcome::changed()
        }

        DashboardEvent::Started(kind) => {
            match kind {
                RequestKind::AlertDetail => state.alert_detail = Remote::Loading,
                RequestKind::Scan => state.scan_in_flight = true,
                RequestKind::ContentAnalysis => state.content_analysis = Remote::Loading,
                RequestKind::CoinAnalysis => state.coin_analysis = Remote::Loading,
                RequestKind::TokenCreation => state.token_submission = Remote::Loading,
            }
            Outcome::changed()
        }
        DashboardEvent::Reset(kind) => {
            match kind {
                RequestKind::AlertDetail => state.alert_detail = Remote::Idle,
                RequestKind::Scan => state.scan_in_flight = false,
                RequestKind::ContentAnalysis => state.content_analysis = Remote::Idle,
                RequestKind::CoinAnalysis => state.coin_analysis = Remote::Idle,
                RequestKind::TokenCreation => state.token_submission = Remote::Idle,
            }
            Outcome::changed()
        }
        DashboardEvent::AlertDetailLoaded { id, result } => {
            let open = state.alert_detail.is_loading();
            match result {
                Ok(alert) if open => {
                    state.alert_detail = Remote::Ready(alert);
                    Outcome::changed()
                }
                Ok(_) => {
                    tracing::debug!(alert_id = %id, "alert detail closed before it loaded");
                    Outcome::unchanged()
                }
                Err(err) => {
                    tracing::warn!(alert_id = %id, error = %err, "failed to load alert details");
                    let outcome = if open {
                        state.alert_detail = Remote::Idle;
                        Outcome::changed()
                    } else {
                        Outcome::unchanged()
                    };
                    outcome.with_notification(Notification::error(
                        "Error",
                        "Failed to load alert details",
                    ))
                }
            }
        }
        DashboardEvent::StatusChanged { id, status, result } => {
            reduce_status_change(state, id, status, result)
        }
        DashboardEvent::ScanFinished(result) => {
            state.scan_in_flight = false;
            match result {
                Ok(summary) => Outcome::changed()
                    .with_notification(Notification::success(
                        "Scan Complete",
                        format!("Found {} trending memes", summary.count),
                    ))
                    .with_command(Command::FetchAll(ListKind::Alerts)),
                Err(err) => {
                    tracing::warn!(error = %err, "trending scan failed");
                    Outcome::changed()
                        .with_notification(Notification::error("Scan Failed", err.to_string()))
                }
            }
        }
        DashboardEvent::ContentAnalyzed(result) => {
            if !state.content_analysis.is_loading() {
                tracing::debug!("content analysis closed before it finished");
                return Outcome::unchanged();
            }
            state.content_analysis = match result {
                Ok(analysis) => Remote::Ready(analysis),
                Err(err) => {
                    tracing::warn!(error = %err, "content analysis failed");
                    Remote::Failed(err.to_string())
                }
            };
            Outcome::changed()
        }
        DashboardEvent::CoinAnalyzed(result) => {
            if !state.coin_analysis.is_loading() {
                tracing::debug!("coin analysis closed before it finished");
                return Outcome::unchanged();
            }
            state.coin_analysis = match result {
                Ok(analysis) => Remote::Ready(analysis),
                Err(err) => {
                    tracing::warn!(error = %err, "coin analysis failed");
                    Remote::Failed(err.to_string())
                }
            };
            Outcome::changed()
        }
        DashboardEvent::TokenCreated(result) => match result {
            Ok(token) => {
                let notification = Notification::success(
                    "Token Created",
                    format!(
                        "{} ({}) has been successfully created!",
                        token.name, token.symbol
                    ),
                );
                state.tokens.items.push_front(token.clone());
                state.token_submission = Remote::Ready(token);
                Outcome::changed().with_notification(notification)
            }
            Err(err) => {
                tracing::warn!(error = %err, "token creation failed");
                let message = err.to_string();
                state.token_submission = Remote::Failed(message.clone());
                Outcome::changed().with_notification(Notification::error(
                    "Error",
                    format!("Failed to create token: {}", message),
                ))
            }
        },

        DashboardEvent::FilterChanged(filter) => {
            if state.alert_filter == filter {
                return Outcome::unchanged();
            }
            state.alert_filter = filter;
            Outcome::changed()
        }
        DashboardEvent::Rejected(err) => {
            let notification = match err {
                DashError::Validation(message) => Notification::warning("Error", message),
                other => Notification::error("Error", other.to_string()),
            };
            Outcome::unchanged().with_notification(notification)
        }
    }
}

fn set_connection(state: &mut DashboardState, next: ConnectionState) -> Outcome {
    if state.connection == next {
        return Outcome::unchanged();
    }
    state.connection = next;
    Outcome::changed()
}

fn reduce_push(state: &mut DashboardState, push: PushEvent) -> Outcome {
    match push {
        PushEvent::NewAlert(alert) => {
            let notification = Notification::success(
                "New Meme Coin Alert",
                format!(
                    "{} ({}) matched with {} content",
                    alert.coin.name, alert.coin.symbol, alert.meme.platform
                ),
            );
            let evicted = state.alerts.items.push_front(alert);
            if !evicted.is_empty() {
                tracing::debug!(evicted = evicted.len(), "alert list over capacity");
            }
            Outcome::changed().with_notification(notification)
        }
        PushEvent::NewTweet(tweet) => {
            let notification = Notification::success(
                "New Tweet Detected",
                format!("New tweet from @{} analyzed", tweet.author),
            );
            state.tweets.items.push_front(tweet);
            Outcome::changed().with_notification(notification)
        }
        PushEvent::TokenCreated(token) => {
            let notification = Notification::success(
                "Token Created",
                format!("{} ({}) successfully created", token.name, token.symbol),
            );
            state.tokens.items.push_front(token);
            Outcome::changed().with_notification(notification)
        }
    }
}

fn apply_snapshot<T>(
    view: &mut ListView<T>,
    result: crate::error::Result<Vec<T>>,
    kind: ListKind,
) -> Outcome {
    match result {
        Ok(items) => {
            view.items.replace(items);
            view.error = None;
            view.loaded = true;
        }
        Err(err) => {
            tracing::warn!(list = %kind, error = %err, "failed to fetch list");
            view.error = Some(err.to_string());
        }
    }
    Outcome::changed()
}

fn reduce_status_change(
    state: &mut DashboardState,
    id: String,
    status: AlertStatus,
    result: crate::error::Result<()>,
) -> Outcome {
    let (verb, done) = match status {
        AlertStatus::Dismissed => ("dismiss", "dismissed"),
        AlertStatus::Resolved => ("resolve", "resolved"),
        AlertStatus::Pending | AlertStatus::Triggered => ("update", "updated"),
    };

    match result {
        Ok(()) => {
            state.alerts.items.remove_key(&id);
            state.alert_total = state.alerts.items.len() as u64;
            if state
                .alert_detail
                .ready()
                .is_some_and(|alert| alert.key() == id)
            {
                state.alert_detail = Remote::Idle;
            }
            Outcome::changed().with_notification(Notification::success(
                "Success",
                format!("Alert {} successfully", done),
            ))
        }
        Err(err) => {
            tracing::warn!(alert_id = %id, %status, error = %err, "alert status change failed");
            Outcome::unchanged().with_notification(Notification::error(
                "Error",
                format!("Failed to {} alert", verb),
            ))
        }
    }
}
