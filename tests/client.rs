//! End-to-end behavior of the live list client against in-memory fakes.

mod common;

use common::*;
use memedash::app::{ClientSettings, ConnectionState, NotificationLevel, Remote};
use memedash::feeds::push::ChannelFrame;
use memedash::feeds::{ListKind, TokenRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn new_alert_frame(id: &str) -> ChannelFrame {
    ChannelFrame::Text(format!(
        r#"{{"type": "new_alert", "alert": {{"id": "{}", "coin": {{"name": "Pepe", "symbol": "PEPE"}}, "meme": {{"platform": "reddit"}}}}}}"#,
        id
    ))
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_on_a_fixed_delay() {
    let connector = FakeConnector::new(Vec::new());
    let mut client = client_with(FakeBackend::new(), connector.clone(), quiet_settings());

    client.connect();
    client
        .run_until(tokio::time::sleep(Duration::from_millis(16_000)))
        .await;

    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 4);
    for pair in attempts.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_secs(5));
    }
    assert_eq!(client.state().connection, ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_after_server_close() {
    let connector = FakeConnector::new(vec![
        Session::Close(vec![new_alert_frame("a1")]),
        Session::Hold(Vec::new()),
    ]);
    let mut client = client_with(FakeBackend::new(), connector.clone(), quiet_settings());

    client.connect();
    client
        .run_until(tokio::time::sleep(Duration::from_millis(6_000)))
        .await;

    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1] - attempts[0], Duration::from_secs(5));
    assert_eq!(client.state().connection, ConnectionState::Connected);
    assert_eq!(client.state().alerts.items.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_push_prepends_and_notifies() {
    let connector = FakeConnector::new(vec![Session::Hold(vec![
        new_alert_frame("a1"),
        ChannelFrame::Text(r#"{"type": "heartbeat"}"#.to_string()),
        ChannelFrame::Text("{not json".to_string()),
        new_alert_frame("a2"),
    ])]);
    let mut client = client_with(FakeBackend::new(), connector, quiet_settings());
    let seen = capture_notifications(&mut client);

    client.connect();
    settle(&mut client).await;

    let ids: Vec<_> = client.state().alerts.items.iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids, vec!["a2".to_string(), "a1".to_string()]);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].title, "New Meme Coin Alert");
    assert_eq!(seen[0].message, "Pepe (PEPE) matched with reddit content");
}

#[tokio::test(start_paused = true)]
async fn test_push_evicts_oldest_alert() {
    let frames = (0..21).map(|i| new_alert_frame(&format!("a{}", i))).collect();
    let connector = FakeConnector::new(vec![Session::Hold(frames)]);
    let mut client = client_with(FakeBackend::new(), connector, quiet_settings());

    client.connect();
    settle(&mut client).await;

    let alerts = &client.state().alerts.items;
    assert_eq!(alerts.len(), 20);
    assert_eq!(alerts.front().map(|a| a.id.as_str()), Some("a20"));
    assert!(alerts.iter().all(|a| a.id != "a0"));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_all_replaces_list() {
    let backend = FakeBackend::new();
    *backend.alerts.lock().unwrap() = vec![alert("b"), alert("c")];
    let connector = FakeConnector::new(vec![Session::Hold(vec![new_alert_frame("pushed")])]);
    let mut client = client_with(backend, connector, quiet_settings());

    client.connect();
    settle(&mut client).await;
    assert_eq!(client.state().alerts.items.len(), 1);

    client.fetch_all(ListKind::Alerts);
    settle(&mut client).await;

    let ids: Vec<_> = client.state().alerts.items.iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids, vec!["b".to_string(), "c".to_string()]);
    assert_eq!(client.state().alert_total, 2);
    assert!(client.state().alerts.loaded);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_keeps_list() {
    let backend = FakeBackend::new();
    *backend.tweets.lock().unwrap() = vec![tweet("t1")];
    let mut client = client_with(backend.clone(), FakeConnector::new(Vec::new()), quiet_settings());

    client.fetch_all(ListKind::Tweets);
    settle(&mut client).await;
    assert_eq!(client.state().tweets.items.len(), 1);

    backend.fail("fetch_tweets");
    client.fetch_all(ListKind::Tweets);
    settle(&mut client).await;

    assert_eq!(client.state().tweets.items.len(), 1);
    assert!(client.state().tweets.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_does_not_overwrite_newer_one() {
    let backend = FakeBackend::new();
    *backend.alerts.lock().unwrap() = vec![alert("old")];
    backend
        .alert_delays
        .lock()
        .unwrap()
        .extend([Duration::from_secs(2), Duration::ZERO]);
    let mut client = client_with(backend.clone(), FakeConnector::new(Vec::new()), quiet_settings());

    client.fetch_all(ListKind::Alerts);
    settle(&mut client).await;

    *backend.alerts.lock().unwrap() = vec![alert("new")];
    client.fetch_all(ListKind::Alerts);
    client
        .run_until(tokio::time::sleep(Duration::from_secs(5)))
        .await;

    let ids: Vec<_> = client.state().alerts.items.iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids, vec!["new".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_removes_alert() {
    let backend = FakeBackend::new();
    *backend.alerts.lock().unwrap() = vec![alert("a"), alert("b")];
    let mut client = client_with(backend, FakeConnector::new(Vec::new()), quiet_settings());
    let seen = capture_notifications(&mut client);

    client.fetch_all(ListKind::Alerts);
    settle(&mut client).await;
    client.dismiss("a");
    settle(&mut client).await;

    let ids: Vec<_> = client.state().alerts.items.iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids, vec!["b".to_string()]);
    assert_eq!(client.state().alert_total, 1);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.last().map(|n| n.message.as_str()), Some("Alert dismissed successfully"));
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_failure_keeps_alert() {
    let backend = FakeBackend::new();
    *backend.alerts.lock().unwrap() = vec![alert("a")];
    backend.fail("update_alert_status");
    let mut client = client_with(backend, FakeConnector::new(Vec::new()), quiet_settings());
    let seen = capture_notifications(&mut client);

    client.fetch_all(ListKind::Alerts);
    settle(&mut client).await;
    client.dismiss("a");
    settle(&mut client).await;

    assert_eq!(client.state().alerts.items.len(), 1);
    let seen = seen.lock().unwrap();
    let last = seen.last().unwrap();
    assert_eq!(last.level, NotificationLevel::Error);
    assert_eq!(last.message, "Failed to dismiss alert");
}

#[tokio::test(start_paused = true)]
async fn test_fetch_one_loads_detail() {
    let backend = FakeBackend::new();
    *backend.alerts.lock().unwrap() = vec![alert("a")];
    let mut client = client_with(backend, FakeConnector::new(Vec::new()), quiet_settings());
    let seen = capture_notifications(&mut client);

    client.fetch_one("a");
    assert!(client.state().alert_detail.is_loading());
    settle(&mut client).await;
    assert_eq!(client.state().alert_detail.ready().map(|a| a.id.as_str()), Some("a"));

    client.fetch_one("missing");
    settle(&mut client).await;
    assert_eq!(client.state().alert_detail, Remote::Idle);
    assert_eq!(
        seen.lock().unwrap().last().map(|n| n.message.clone()),
        Some("Failed to load alert details".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_input_sends_nothing() {
    let backend = FakeBackend::new();
    let mut client = client_with(backend.clone(), FakeConnector::new(Vec::new()), quiet_settings());
    let seen = capture_notifications(&mut client);

    assert!(client.analyze_content("   ").is_err());
    assert!(client.analyze_coin("", "ethereum").is_err());
    assert!(client.create_token(TokenRequest::default()).is_err());
    settle(&mut client).await;

    assert_eq!(backend.calls("analyze_content"), 0);
    assert_eq!(backend.calls("analyze_coin"), 0);
    assert_eq!(backend.calls("create_token"), 0);
    assert_eq!(client.state().content_analysis, Remote::Idle);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].message, "Please enter content to analyze");
    assert!(seen.iter().all(|n| n.level == NotificationLevel::Warning));
}

#[tokio::test(start_paused = true)]
async fn test_analysis_results_land_in_state() {
    let backend = FakeBackend::new();
    let mut client = client_with(backend, FakeConnector::new(Vec::new()), quiet_settings());

    client.analyze_content("doge to the moon").unwrap();
    client.analyze_coin("0xabc", "solana").unwrap();
    settle(&mut client).await;

    let content = client.state().content_analysis.ready().unwrap();
    assert_eq!(content.keywords, vec!["moon".to_string()]);
    let coin = client.state().coin_analysis.ready().unwrap();
    assert_eq!(coin.blockchain, "solana");
    assert_eq!(coin.safety.risk_label(), "Low Risk");
}

#[tokio::test(start_paused = true)]
async fn test_token_creation() {
    let backend = FakeBackend::new();
    let mut client = client_with(backend.clone(), FakeConnector::new(Vec::new()), quiet_settings());
    let seen = capture_notifications(&mut client);
    let request = TokenRequest {
        name: "Moon Coin".to_string(),
        symbol: "MOON".to_string(),
        creator: "elonmusk".to_string(),
        initial_supply: 1_000_000,
        description: String::new(),
    };

    client.create_token(request.clone()).unwrap();
    assert!(client.state().token_submission.is_loading());
    settle(&mut client).await;
    assert_eq!(client.state().tokens.items.front().map(|t| t.name.as_str()), Some("Moon Coin"));
    assert!(client.state().token_submission.ready().is_some());

    backend.fail("create_token");
    client.create_token(request).unwrap();
    settle(&mut client).await;
    assert!(matches!(client.state().token_submission, Remote::Failed(_)));
    assert_eq!(client.state().tokens.items.len(), 1);
    assert_eq!(
        seen.lock().unwrap().last().map(|n| n.message.clone()),
        Some("Failed to create token: create_token failed".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_scan_refreshes_alerts() {
    let backend = FakeBackend::new();
    let mut client = client_with(backend.clone(), FakeConnector::new(Vec::new()), quiet_settings());
    let seen = capture_notifications(&mut client);

    client.scan_trending();
    client.scan_trending();
    assert!(client.state().scan_in_flight);
    settle(&mut client).await;

    assert!(!client.state().scan_in_flight);
    assert_eq!(backend.calls("scan_trending"), 1);
    assert_eq!(backend.calls("fetch_alerts"), 1);
    assert_eq!(seen.lock().unwrap()[0].message, "Found 3 trending memes");
}

#[tokio::test(start_paused = true)]
async fn test_polling_refreshes_configured_lists() {
    let backend = FakeBackend::new();
    let settings = ClientSettings::default();
    let mut client = client_with(backend.clone(), FakeConnector::new(Vec::new()), settings);

    client.start_polling();
    client
        .run_until(tokio::time::sleep(Duration::from_millis(29_000)))
        .await;
    assert_eq!(backend.calls("fetch_alerts"), 0);

    client
        .run_until(tokio::time::sleep(Duration::from_millis(32_000)))
        .await;
    assert_eq!(backend.calls("fetch_alerts"), 2);
    assert_eq!(backend.calls("fetch_tweets"), 2);
    assert_eq!(backend.calls("fetch_tokens"), 0);

    client.stop();
    client
        .run_until(tokio::time::sleep(Duration::from_millis(60_000)))
        .await;
    assert_eq!(backend.calls("fetch_alerts"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_start_loads_everything() {
    let backend = FakeBackend::new();
    *backend.tokens.lock().unwrap() = vec![token(1), token(2)];
    let connector = FakeConnector::new(vec![Session::Hold(Vec::new())]);
    let mut client = client_with(backend.clone(), connector, ClientSettings::default());

    let renders = Arc::new(AtomicUsize::new(0));
    let counter = renders.clone();
    client.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    client.start();
    settle(&mut client).await;

    assert_eq!(backend.calls("fetch_alerts"), 1);
    assert_eq!(backend.calls("fetch_tweets"), 1);
    assert_eq!(backend.calls("fetch_tokens"), 1);
    assert_eq!(backend.calls("fetch_influencers"), 1);
    assert_eq!(client.state().tokens.items.len(), 2);
    assert_eq!(client.state().connection, ConnectionState::Connected);
    assert!(client.state().influencers.ready().is_some());
    assert!(renders.load(Ordering::SeqCst) >= 5);

    client.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_marks_channel_disconnected() {
    let connector = FakeConnector::new(vec![Session::Hold(Vec::new())]);
    let mut client = client_with(FakeBackend::new(), connector.clone(), quiet_settings());

    client.connect();
    settle(&mut client).await;
    assert_eq!(client.state().connection, ConnectionState::Connected);

    client.stop();
    assert_eq!(client.state().connection, ConnectionState::Disconnected);

    client
        .run_until(tokio::time::sleep(Duration::from_millis(10_000)))
        .await;
    assert_eq!(client.state().connection, ConnectionState::Disconnected);
    assert_eq!(connector.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_channel_opens() {
    let connector = FakeConnector::new(vec![Session::Hold(Vec::new())]);
    let mut client = client_with(FakeBackend::new(), connector, quiet_settings());

    client.connect();
    client.stop();
    settle(&mut client).await;

    assert_eq!(client.state().connection, ConnectionState::Disconnected);
}
