use super::event::{Command, DashboardEvent, Notification, RequestKind};
use super::reducer::reduce;
use super::state::{AlertFilter, DashboardState};
use crate::config::Config;
use crate::error::{DashError, Result};
use crate::feeds::api::ApiClient;
use crate::feeds::push::{run_push_channel, PushConnector, WsConnector};
use crate::feeds::{AlertStatus, Backend, ListKind, TokenRequest};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Timing knobs for the background tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub poll_interval: Duration,
    pub reconnect_delay: Duration,
    /// Lists refreshed by the poll timer.
    pub poll_kinds: Vec<ListKind>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(30_000),
            reconnect_delay: Duration::from_millis(5_000),
            poll_kinds: vec![ListKind::Alerts, ListKind::Tweets],
        }
    }
}

impl ClientSettings {
    pub fn from_config(config: &Config) -> Self {
        let refresh = &config.refresh;
        let poll_kinds = [
            (ListKind::Alerts, refresh.poll_alerts),
            (ListKind::Tweets, refresh.poll_tweets),
            (ListKind::Tokens, refresh.poll_tokens),
        ]
        .into_iter()
        .filter_map(|(kind, enabled)| enabled.then_some(kind))
        .collect();

        Self {
            poll_interval: Duration::from_millis(refresh.poll_interval_ms),
            reconnect_delay: Duration::from_millis(refresh.reconnect_delay_ms),
            poll_kinds,
        }
    }
}

type Observer = Box<dyn FnMut(&DashboardState) + Send>;
type NotificationSink = Box<dyn FnMut(&Notification) + Send>;

/// Keeps the alert, tweet and token lists in sync with the server.
///
/// Background work (the push channel, the poll timer and every request) runs
/// in spawned tasks that only ever send [`DashboardEvent`]s back. The owner
/// drives [`LiveListClient::process_next`] or [`LiveListClient::drain`] to
/// apply them, so the state is only touched from one place.
pub struct LiveListClient {
    backend: Arc<dyn Backend>,
    connector: Arc<dyn PushConnector>,
    settings: ClientSettings,
    state: DashboardState,
    events_tx: UnboundedSender<DashboardEvent>,
    events_rx: UnboundedReceiver<DashboardEvent>,
    observers: Vec<Observer>,
    notification_sinks: Vec<NotificationSink>,
    push_task: Option<JoinHandle<()>>,
    poll_task: Option<JoinHandle<()>>,
}

impl LiveListClient {
    pub fn new(
        backend: Arc<dyn Backend>,
        connector: Arc<dyn PushConnector>,
        settings: ClientSettings,
        state: DashboardState,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            connector,
            settings,
            state,
            events_tx,
            events_rx,
            observers: Vec::new(),
            notification_sinks: Vec::new(),
            push_task: None,
            poll_task: None,
        }
    }

    /// Client talking HTTP and WebSocket to the configured server.
    pub fn from_config(config: &Config) -> Self {
        let backend = ApiClient::new(
            &config.server.base_url,
            Duration::from_secs(config.server.request_timeout_secs),
        );
        let connector = WsConnector::new(config.websocket_url());
        tracing::info!(
            base_url = %config.server.base_url,
            push_url = %connector.url(),
            "dashboard client configured"
        );

        Self::new(
            Arc::new(backend),
            Arc::new(connector),
            ClientSettings::from_config(config),
            DashboardState::from_config(config),
        )
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Registers a render callback, invoked after every state change.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&DashboardState) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn on_notification<F>(&mut self, sink: F)
    where
        F: FnMut(&Notification) + Send + 'static,
    {
        self.notification_sinks.push(Box::new(sink));
    }

    /// Initial load of every list, then the push channel and the poll timer.
    pub fn start(&mut self) {
        for kind in ListKind::ALL {
            self.fetch_all(kind);
        }
        self.fetch_influencers();
        self.connect();
        self.start_polling();
    }

    /// Starts the push channel. A channel that is already running is kept.
    pub fn connect(&mut self) {
        if self.push_task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        let connector = self.connector.clone();
        let events = self.events_tx.clone();
        let delay = self.settings.reconnect_delay;
        self.push_task = Some(tokio::spawn(run_push_channel(connector, delay, events)));
    }

    /// Starts the periodic refresh. The first tick fires one full interval
    /// after this call.
    pub fn start_polling(&mut self) {
        if self.poll_task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        if self.settings.poll_kinds.is_empty() {
            tracing::debug!("polling disabled");
            return;
        }

        let period = self.settings.poll_interval;
        let kinds = self.settings.poll_kinds.clone();
        let events = self.events_tx.clone();
        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                for kind in &kinds {
                    if events.send(DashboardEvent::PollDue(*kind)).is_err() {
                        return;
                    }
                }
            }
        }));
    }

    /// Aborts the push channel and the poll timer.
    ///
    /// The connection ends up `Disconnected`; channel status events still in
    /// the queue are dropped.
    pub fn stop(&mut self) {
        let push = self.push_task.take();
        let had_push = push.is_some();
        let tasks = [push, self.poll_task.take()];
        let mut aborted = 0;
        for task in tasks.into_iter().flatten() {
            task.abort();
            aborted += 1;
        }
        if had_push {
            self.apply(DashboardEvent::ChannelClosed {
                retry_in: Duration::ZERO,
            });
        }
        if aborted > 0 {
            tracing::info!(tasks = aborted, "dashboard client stopped");
        }
    }

    pub fn fetch_all(&mut self, kind: ListKind) {
        let ticket = self.state.issue_ticket(kind);
        let backend = self.backend.clone();
        tracing::debug!(list = %kind, ticket, "fetching list");
        self.spawn_request(async move {
            match kind {
                ListKind::Alerts => DashboardEvent::AlertsFetched {
                    ticket,
                    result: backend.fetch_alerts().await,
                },
                ListKind::Tweets => DashboardEvent::TweetsFetched {
                    ticket,
                    result: backend.fetch_tweets().await,
                },
                ListKind::Tokens => DashboardEvent::TokensFetched {
                    ticket,
                    result: backend.fetch_tokens().await,
                },
            }
        });
    }

    /// Loads one alert's full detail for the detail view.
    pub fn fetch_one(&mut self, id: &str) {
        self.apply(DashboardEvent::Started(RequestKind::AlertDetail));
        let backend = self.backend.clone();
        let id = id.to_string();
        self.spawn_request(async move {
            let result = backend.fetch_alert(&id).await;
            DashboardEvent::AlertDetailLoaded { id, result }
        });
    }

    pub fn mutate_status(&mut self, id: &str, status: AlertStatus) {
        let backend = self.backend.clone();
        let id = id.to_string();
        self.spawn_request(async move {
            let result = backend.update_alert_status(&id, status).await;
            DashboardEvent::StatusChanged { id, status, result }
        });
    }

    pub fn dismiss(&mut self, id: &str) {
        self.mutate_status(id, AlertStatus::Dismissed);
    }

    pub fn scan_trending(&mut self) {
        if self.state.scan_in_flight {
            return;
        }
        self.apply(DashboardEvent::Started(RequestKind::Scan));
        let backend = self.backend.clone();
        self.spawn_request(async move { DashboardEvent::ScanFinished(backend.scan_trending().await) });
    }

    pub fn analyze_content(&mut self, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return self.reject("Please enter content to analyze");
        }

        self.apply(DashboardEvent::Started(RequestKind::ContentAnalysis));
        let backend = self.backend.clone();
        let content = content.to_string();
        self.spawn_request(async move {
            DashboardEvent::ContentAnalyzed(backend.analyze_content(&content).await)
        });
        Ok(())
    }

    pub fn analyze_coin(&mut self, address: &str, blockchain: &str) -> Result<()> {
        let address = address.trim();
        if address.is_empty() {
            return self.reject("Please enter a coin address");
        }

        self.apply(DashboardEvent::Started(RequestKind::CoinAnalysis));
        let backend = self.backend.clone();
        let address = address.to_string();
        let blockchain = blockchain.to_string();
        self.spawn_request(async move {
            DashboardEvent::CoinAnalyzed(backend.analyze_coin(&address, &blockchain).await)
        });
        Ok(())
    }

    pub fn create_token(&mut self, request: TokenRequest) -> Result<()> {
        if let Err(err) = request.validate() {
            return self.reject(&err.to_string());
        }

        self.apply(DashboardEvent::Started(RequestKind::TokenCreation));
        let backend = self.backend.clone();
        self.spawn_request(async move {
            DashboardEvent::TokenCreated(backend.create_token(&request).await)
        });
        Ok(())
    }

    pub fn fetch_influencers(&mut self) {
        let backend = self.backend.clone();
        self.spawn_request(async move {
            DashboardEvent::InfluencersFetched(backend.fetch_influencers().await)
        });
    }

    pub fn set_filter(&mut self, filter: AlertFilter) {
        self.apply(DashboardEvent::FilterChanged(filter));
    }

    /// Forgets the result of a one-shot request, e.g. when its modal closes.
    pub fn reset(&mut self, kind: RequestKind) {
        self.apply(DashboardEvent::Reset(kind));
    }

    /// Runs one event through the reducer, then observers, notification
    /// sinks and any follow-up commands.
    pub fn apply(&mut self, event: DashboardEvent) {
        let outcome = reduce(&mut self.state, event);

        if outcome.changed {
            for observer in self.observers.iter_mut() {
                observer(&self.state);
            }
        }
        if let Some(notification) = outcome.notification {
            tracing::debug!(title = %notification.title, "notification");
            for sink in self.notification_sinks.iter_mut() {
                sink(&notification);
            }
        }
        for command in outcome.commands {
            match command {
                Command::FetchAll(kind) => self.fetch_all(kind),
            }
        }
    }

    /// Waits for the next background event and applies it.
    pub async fn process_next(&mut self) {
        // the client holds a sender, so the queue never closes
        if let Some(event) = self.events_rx.recv().await {
            self.apply_queued(event);
        }
    }

    /// Applies every event already queued. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    self.apply_queued(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Applies events until the future returned by `stop_when` resolves.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, stop_when: F) {
        tokio::pin!(stop_when);
        loop {
            tokio::select! {
                _ = &mut stop_when => return,
                _ = self.process_next() => {}
            }
        }
    }

    fn apply_queued(&mut self, event: DashboardEvent) {
        let channel_status = matches!(
            event,
            DashboardEvent::ChannelConnecting
                | DashboardEvent::ChannelOpened
                | DashboardEvent::ChannelError(_)
                | DashboardEvent::ChannelClosed { .. }
        );
        if channel_status && self.push_task.is_none() {
            tracing::debug!("dropping channel status from a stopped push channel");
            return;
        }
        self.apply(event);
    }

    fn reject(&mut self, message: &str) -> Result<()> {
        tracing::debug!(message, "request rejected before sending");
        self.apply(DashboardEvent::Rejected(DashError::Validation(
            message.to_string(),
        )));
        Err(DashError::Validation(message.to_string()))
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = DashboardEvent> + Send + 'static,
    {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = events.send(request.await);
        });
    }
}

impl Drop for LiveListClient {
    fn drop(&mut self) {
        self.stop();
    }
}
