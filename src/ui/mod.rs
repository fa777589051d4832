pub mod widgets;

use crate::app::{
    ConnectionState, DashboardState, LiveListClient, Notification, NotificationLevel, RequestKind,
};
use crate::config::Config;
use crate::feeds::ListKind;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use widgets::alerts::AlertsPanel;
use widgets::influencers::InfluencersPanel;
use widgets::tokens::TokensPanel;
use widgets::tweets::TweetsPanel;
use widgets::{Panel, PanelAction};

const TOAST_TTL: Duration = Duration::from_millis(5_000);
const CLOCK_TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub notification: Notification,
    pub shown_at: Instant,
}

/// Interactive dashboard on top of a [`LiveListClient`].
pub struct App {
    client: LiveListClient,
    panels: Vec<Box<dyn Panel>>,
    selected_panel: usize,
    toasts: Vec<Toast>,
    notifications: UnboundedReceiver<Notification>,
    dirty: Arc<AtomicBool>,
}

impl App {
    pub fn new(mut client: LiveListClient, config: &Config) -> Self {
        let (tx, notifications) = mpsc::unbounded_channel();
        client.on_notification(move |notification| {
            let _ = tx.send(notification.clone());
        });

        let dirty = Arc::new(AtomicBool::new(true));
        let observer_flag = dirty.clone();
        client.subscribe(move |_| observer_flag.store(true, Ordering::Relaxed));

        let mut panels: Vec<Box<dyn Panel>> = vec![
            Box::new(AlertsPanel::new(config.alerts.clone())),
            Box::new(TweetsPanel::new(config.tweets.clone())),
            Box::new(TokensPanel::new(config.tokens.clone())),
            Box::new(InfluencersPanel::new(config.influencers.clone())),
        ];
        panels.sort_by_key(|panel| panel.position());
        if let Some(first) = panels.first_mut() {
            first.set_selected(true);
        }

        Self {
            client,
            panels,
            selected_panel: 0,
            toasts: Vec::new(),
            notifications,
            dirty,
        }
    }

    pub fn client(&self) -> &LiveListClient {
        &self.client
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn selected_panel_id(&self) -> Option<String> {
        self.panels.get(self.selected_panel).map(|p| p.id())
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        self.client.start();
        let mut input = EventStream::new();

        loop {
            self.tick(Instant::now());

            if self.dirty.swap(false, Ordering::Relaxed) {
                terminal.draw(|frame| self.render(frame))?;
            }

            tokio::select! {
                maybe_event = input.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if !self.handle_key(key) {
                            break;
                        }
                        self.dirty.store(true, Ordering::Relaxed);
                    }
                    Some(Ok(Event::Resize(..))) => self.dirty.store(true, Ordering::Relaxed),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        self.client.stop();
                        return Err(err.into());
                    }
                    None => break,
                },
                _ = self.client.process_next() => {}
                // keep the header clock moving
                _ = tokio::time::sleep(CLOCK_TICK) => {
                    self.dirty.store(true, Ordering::Relaxed);
                }
            }
        }

        self.client.stop();
        Ok(())
    }

    /// Applies queued events, collects toasts and lets panels catch up.
    pub fn tick(&mut self, now: Instant) {
        self.client.drain();

        while let Ok(notification) = self.notifications.try_recv() {
            self.toasts.push(Toast {
                notification,
                shown_at: now,
            });
            self.dirty.store(true, Ordering::Relaxed);
        }

        let before = self.toasts.len();
        self.toasts
            .retain(|toast| now.duration_since(toast.shown_at) < TOAST_TTL);
        if self.toasts.len() != before {
            self.dirty.store(true, Ordering::Relaxed);
        }

        let mut actions = Vec::new();
        for panel in self.panels.iter_mut() {
            if let Some(action) = panel.sync(self.client.state()) {
                actions.push(action);
            }
        }
        for action in actions {
            self.perform(action);
        }
    }

    /// Returns false when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }

        let modal = self
            .panels
            .get(self.selected_panel)
            .is_some_and(|panel| panel.is_modal_open(self.client.state()));

        if !modal {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return false,
                KeyCode::Tab | KeyCode::Right => {
                    self.select_panel(self.selected_panel + 1);
                    return true;
                }
                KeyCode::BackTab | KeyCode::Left => {
                    let count = self.panels.len();
                    self.select_panel((self.selected_panel + count).saturating_sub(1));
                    return true;
                }
                KeyCode::Char('R') => {
                    for kind in ListKind::ALL {
                        self.client.fetch_all(kind);
                    }
                    return true;
                }
                _ => {}
            }
        }

        let action = {
            let state = self.client.state();
            let Some(panel) = self.panels.get_mut(self.selected_panel) else {
                return true;
            };

            if modal {
                panel.handle_key(key.code, state)
            } else {
                match key.code {
                    KeyCode::Down | KeyCode::Char('j') => {
                        panel.scroll_down(state);
                        None
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        panel.scroll_up();
                        None
                    }
                    KeyCode::Char('o') => panel.selected_url(state).map(PanelAction::OpenUrl),
                    code => panel.handle_key(code, state),
                }
            }
        };

        if let Some(action) = action {
            self.perform(action);
        }
        true
    }

    fn select_panel(&mut self, index: usize) {
        if self.panels.is_empty() {
            return;
        }
        if let Some(panel) = self.panels.get_mut(self.selected_panel) {
            panel.set_selected(false);
        }
        self.selected_panel = index % self.panels.len();
        if let Some(panel) = self.panels.get_mut(self.selected_panel) {
            panel.set_selected(true);
        }
    }

    pub fn perform(&mut self, action: PanelAction) {
        tracing::debug!(?action, "panel action");
        match action {
            PanelAction::Refresh(kind) => self.client.fetch_all(kind),
            PanelAction::ShowAlert(id) => self.client.fetch_one(&id),
            PanelAction::CloseAlert => self.client.reset(RequestKind::AlertDetail),
            PanelAction::Dismiss(id) => self.client.dismiss(&id),
            PanelAction::CycleFilter => {
                let next = self.client.state().alert_filter.next();
                self.client.set_filter(next);
            }
            PanelAction::Scan => self.client.scan_trending(),
            PanelAction::AnalyzeCoin {
                address,
                blockchain,
            } => {
                let blockchain = if blockchain.is_empty() {
                    "ethereum".to_string()
                } else {
                    blockchain
                };
                if let Err(err) = self.client.analyze_coin(&address, &blockchain) {
                    tracing::debug!(error = %err, "coin analysis not sent");
                }
            }
            PanelAction::CloseCoinAnalysis => self.client.reset(RequestKind::CoinAnalysis),
            PanelAction::AnalyzeContent(content) => {
                if let Err(err) = self.client.analyze_content(&content) {
                    tracing::debug!(error = %err, "content analysis not sent");
                }
            }
            PanelAction::CloseContentAnalysis => self.client.reset(RequestKind::ContentAnalysis),
            PanelAction::DraftToken(suggestion) => {
                self.client.reset(RequestKind::ContentAnalysis);
                self.client.reset(RequestKind::TokenCreation);
                let target = self.panels.iter_mut().position(|panel| {
                    panel
                        .as_any_mut()
                        .and_then(|any| any.downcast_mut::<TokensPanel>())
                        .is_some()
                });
                if let Some(index) = target {
                    if let Some(tokens) = self.panels[index]
                        .as_any_mut()
                        .and_then(|any| any.downcast_mut::<TokensPanel>())
                    {
                        tokens.open_form(suggestion);
                    }
                    self.select_panel(index);
                }
            }
            PanelAction::CreateToken(request) => {
                if let Err(err) = self.client.create_token(request) {
                    tracing::debug!(error = %err, "token creation not sent");
                }
            }
            PanelAction::CloseTokenForm => self.client.reset(RequestKind::TokenCreation),
            PanelAction::OpenUrl(url) => {
                if let Err(err) = open::that(&url) {
                    tracing::warn!(url = %url, error = %err, "failed to open browser");
                    self.toasts.push(Toast {
                        notification: Notification::error("Error", format!("Could not open {}", url)),
                        shown_at: Instant::now(),
                    });
                }
            }
        }
        self.dirty.store(true, Ordering::Relaxed);
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let state = self.client.state();
        frame.render_widget(Paragraph::new(header_line(state)), chunks[0]);

        let areas = grid_areas(
            &self.panels.iter().map(|p| p.position()).collect::<Vec<_>>(),
            chunks[1],
        );
        for (idx, (panel, area)) in self.panels.iter().zip(areas).enumerate() {
            panel.render(frame, area, state, idx == self.selected_panel);
        }

        let panel_help = self
            .panels
            .get(self.selected_panel)
            .map(|p| p.help())
            .unwrap_or_default();
        let footer = Line::from(vec![
            Span::styled(
                "q quit | Tab switch | j/k scroll | o open | R refresh all | ",
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(panel_help, Style::default().fg(Color::Gray)),
        ]);
        frame.render_widget(Paragraph::new(footer), chunks[2]);

        render_toasts(frame, chunks[1], &self.toasts);
    }
}

fn header_line(state: &DashboardState) -> Line<'static> {
    let (symbol, color) = match state.connection {
        ConnectionState::Connected => ("●", Color::Green),
        ConnectionState::Connecting => ("◌", Color::Yellow),
        ConnectionState::Disconnected => ("○", Color::Red),
    };

    Line::from(vec![
        Span::styled(
            " memedash ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} {} ", symbol, state.connection),
            Style::default().fg(color),
        ),
        Span::raw(format!(
            "| alerts {} | tweets {} | tokens {} ",
            state.alert_total,
            state.tweets.items.len(),
            state.tokens.items.len()
        )),
        Span::styled(
            chrono::Local::now().format("| %H:%M:%S").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Lays panels out row by row; panels sharing a row split it evenly.
pub fn grid_areas(positions: &[(usize, usize)], area: Rect) -> Vec<Rect> {
    let mut rows: Vec<usize> = positions.iter().map(|(row, _)| *row).collect();
    rows.sort_unstable();
    rows.dedup();
    if rows.is_empty() {
        return Vec::new();
    }

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows.len() as u32); rows.len()])
        .split(area);

    positions
        .iter()
        .map(|(row, col)| {
            let row_idx = rows.iter().position(|r| r == row).unwrap_or(0);
            let mut cols: Vec<usize> = positions
                .iter()
                .filter(|(r, _)| r == row)
                .map(|(_, c)| *c)
                .collect();
            cols.sort_unstable();
            cols.dedup();
            let col_idx = cols.iter().position(|c| c == col).unwrap_or(0);

            let col_areas = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, cols.len() as u32); cols.len()])
                .split(row_areas[row_idx]);
            col_areas[col_idx]
        })
        .collect()
}

fn render_toasts(frame: &mut Frame, area: Rect, toasts: &[Toast]) {
    let width = 44.min(area.width);
    let height = 4;
    for (idx, toast) in toasts.iter().rev().enumerate() {
        let y = area.y + (idx as u16) * height;
        if y + height > area.bottom() {
            break;
        }
        let rect = Rect::new(area.right().saturating_sub(width), y, width, height);

        let color = match toast.notification.level {
            NotificationLevel::Success => Color::Green,
            NotificationLevel::Warning => Color::Yellow,
            NotificationLevel::Error => Color::Red,
        };
        let block = Block::default()
            .title(format!(" {} ", toast.notification.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let paragraph = Paragraph::new(toast.notification.message.as_str())
            .block(block)
            .wrap(Wrap { trim: true });

        frame.render_widget(Clear, rect);
        frame.render_widget(paragraph, rect);
    }
}

/// Takes over the terminal and runs the dashboard until the user quits.
pub async fn run(client: LiveListClient, config: &Config) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client, config);
    let result = app.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_two_by_two() {
        let area = Rect::new(0, 0, 100, 40);
        let areas = grid_areas(&[(0, 0), (0, 1), (1, 0), (1, 1)], area);
        assert_eq!(areas.len(), 4);
        assert_eq!(areas[0], Rect::new(0, 0, 50, 20));
        assert_eq!(areas[1].x, 50);
        assert_eq!(areas[2].y, 20);
        assert_eq!(areas[3], Rect::new(50, 20, 50, 20));
    }

    #[test]
    fn test_grid_uneven_rows() {
        let area = Rect::new(0, 0, 90, 30);
        let areas = grid_areas(&[(0, 0), (1, 0), (1, 1), (1, 2)], area);
        assert_eq!(areas[0].width, 90);
        assert_eq!(areas[1].width, 30);
        assert_eq!(areas[3].x, 60);
    }

    #[test]
    fn test_header_shows_connection() {
        let mut state = DashboardState::default();
        state.connection = ConnectionState::Disconnected;
        state.alert_total = 12;
        let text: String = header_line(&state)
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert!(text.contains("Disconnected"));
        assert!(text.contains("alerts 12"));
    }
}
