//! Push channel: decoding server events and keeping the socket alive.
//!
//! The server pushes JSON objects tagged by `type`. Known tags carry the new
//! record under an entity-named field (`alert`, `tweet`, `token`), or under
//! `payload` for newer servers. Unknown tags are ignored so that the server
//! can add event types without breaking older dashboards.

use super::{Alert, Token, Tweet};
use crate::app::event::DashboardEvent;
use crate::error::{DashError, Result};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// A record pushed by the server without being asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    NewAlert(Alert),
    NewTweet(Tweet),
    TokenCreated(Token),
}

/// Decodes one push message.
///
/// Returns `Ok(None)` for event types this client does not know about.
pub fn decode_push(text: &str) -> Result<Option<PushEvent>> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DashError::Parse("missing \"type\" tag".to_string()))?;

    let event = match kind {
        "new_alert" => PushEvent::NewAlert(entity(&value, "alert")?),
        "new_tweet" => PushEvent::NewTweet(entity(&value, "tweet")?),
        "token_created" => PushEvent::TokenCreated(entity(&value, "token")?),
        other => {
            tracing::trace!(kind = other, "ignoring unknown push event");
            return Ok(None);
        }
    };
    Ok(Some(event))
}

fn entity<T: DeserializeOwned>(value: &Value, field: &str) -> Result<T> {
    let raw = value
        .get(field)
        .or_else(|| value.get("payload"))
        .ok_or_else(|| DashError::Parse(format!("missing \"{}\" payload", field)))?;
    serde_json::from_value(raw.clone()).map_err(|e| DashError::Parse(format!("{}: {}", field, e)))
}

/// Derives the push endpoint from the HTTP base URL.
pub fn websocket_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let rest = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        format!("ws://{}", base)
    };
    format!("{}/ws", rest)
}

/// One thing observed on an open channel. End of stream means closed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelFrame {
    Text(String),
    Error(String),
}

pub type FrameStream = BoxStream<'static, ChannelFrame>;

/// Opens push channels. Each call is one connection attempt.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self) -> Result<FrameStream>;
}

/// WebSocket connector.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(&self) -> Result<FrameStream> {
        let (ws, _) = connect_async(self.url.as_str()).await?;

        let frames = ws.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(txt)) => Some(ChannelFrame::Text(txt)),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "close frame");
                    None
                }
                // pings are answered by tungstenite itself
                Ok(_) => None,
                Err(err) => Some(ChannelFrame::Error(err.to_string())),
            }
        });
        Ok(frames.boxed())
    }
}

/// Keeps a push channel open forever, feeding `events`.
///
/// Every close (including a failed open) is followed by exactly one new
/// attempt after `reconnect_delay`. There is no backoff and no attempt limit;
/// the loop only ends when the receiving side of `events` is gone or the task
/// is aborted.
pub async fn run_push_channel(
    connector: Arc<dyn PushConnector>,
    reconnect_delay: Duration,
    events: UnboundedSender<DashboardEvent>,
) {
    loop {
        if events.send(DashboardEvent::ChannelConnecting).is_err() {
            return;
        }

        match connector.connect().await {
            Ok(mut frames) => {
                tracing::info!("push channel connected");
                if events.send(DashboardEvent::ChannelOpened).is_err() {
                    return;
                }

                while let Some(frame) = frames.next().await {
                    match frame {
                        ChannelFrame::Text(text) => match decode_push(&text) {
                            Ok(Some(push)) => {
                                if events.send(DashboardEvent::Push(push)).is_err() {
                                    return;
                                }
                            }
                            Ok(None) => {}
                            Err(err) => {
                                tracing::warn!(error = %err, "dropping malformed push message");
                            }
                        },
                        ChannelFrame::Error(message) => {
                            tracing::warn!(error = %message, "push channel error");
                            let _ = events.send(DashboardEvent::ChannelError(message));
                            break;
                        }
                    }
                }
                tracing::info!("push channel closed");
            }
            Err(err) => {
                tracing::warn!(error = %err, "push channel connect failed");
                let _ = events.send(DashboardEvent::ChannelError(err.to_string()));
            }
        }

        if events
            .send(DashboardEvent::ChannelClosed {
                retry_in: reconnect_delay,
            })
            .is_err()
        {
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_new_alert() {
        let text = r#"{"type": "new_alert", "alert": {"id": "a1", "coin": {"name": "Doge", "symbol": "DOGE"}}}"#;
        match decode_push(text).unwrap() {
            Some(PushEvent::NewAlert(alert)) => {
                assert_eq!(alert.id, "a1");
                assert_eq!(alert.coin.name, "Doge");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_payload_fallback() {
        let text = r#"{"type": "token_created", "payload": {"id": 4, "name": "Pepe Coin", "symbol": "PPC"}}"#;
        assert!(matches!(
            decode_push(text).unwrap(),
            Some(PushEvent::TokenCreated(ref t)) if t.id == 4
        ));
    }

    #[test]
    fn test_decode_new_tweet_with_extra_fields() {
        let text = r#"{"type": "new_tweet", "tweet": {"id": 1, "tweet_id": "t1", "author": "elonmusk", "content": "doge"}, "potential_matches": []}"#;
        assert!(matches!(
            decode_push(text).unwrap(),
            Some(PushEvent::NewTweet(ref t)) if t.author == "elonmusk"
        ));
    }

    #[test]
    fn test_decode_unknown_type_is_ignored() {
        assert_eq!(
            decode_push(r#"{"type": "price_tick", "price": 1.0}"#).unwrap(),
            None
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode_push("{oops"), Err(DashError::Parse(_))));
        assert!(matches!(
            decode_push(r#"{"alert": {"id": "a"}}"#),
            Err(DashError::Parse(_))
        ));
        assert!(matches!(
            decode_push(r#"{"type": "new_alert"}"#),
            Err(DashError::Parse(_))
        ));
        assert!(matches!(
            decode_push(r#"{"type": "new_alert", "alert": {"coin": {}}}"#),
            Err(DashError::Parse(_))
        ));
    }

    #[test]
    fn test_websocket_url() {
        assert_eq!(websocket_url("http://localhost:5000"), "ws://localhost:5000/ws");
        assert_eq!(websocket_url("https://dash.example.com/"), "wss://dash.example.com/ws");
        assert_eq!(websocket_url("localhost:8000"), "ws://localhost:8000/ws");
    }

    #[test]
    fn test_ws_connector_keeps_url() {
        let connector = WsConnector::new("ws://localhost:5000/ws");
        assert_eq!(connector.url(), "ws://localhost:5000/ws");
    }
}
