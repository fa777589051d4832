pub mod alerts;
pub mod influencers;
pub mod tokens;
pub mod tweets;

use crate::app::DashboardState;
use crate::feeds::{ListKind, ScoreClass, TokenRequest};
use crate::tokens::TokenSuggestion;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    Frame,
};
use std::any::Any;

/// Something a panel wants the dashboard to do on its behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Refresh(ListKind),
    ShowAlert(String),
    CloseAlert,
    Dismiss(String),
    CycleFilter,
    Scan,
    AnalyzeCoin { address: String, blockchain: String },
    CloseCoinAnalysis,
    AnalyzeContent(String),
    CloseContentAnalysis,
    DraftToken(TokenSuggestion),
    CreateToken(TokenRequest),
    CloseTokenForm,
    OpenUrl(String),
}

/// One dashboard pane. Panels render straight from the shared state and keep
/// only view-local bits (scroll position, input buffers) themselves.
pub trait Panel {
    fn id(&self) -> String;
    fn title(&self) -> &str;
    fn position(&self) -> (usize, usize);
    fn render(&self, frame: &mut Frame, area: Rect, state: &DashboardState, selected: bool);
    fn scroll_up(&mut self);
    fn scroll_down(&mut self, state: &DashboardState);
    fn set_selected(&mut self, selected: bool);

    /// Keys not consumed by the dashboard itself.
    fn handle_key(&mut self, _key: KeyCode, _state: &DashboardState) -> Option<PanelAction> {
        None
    }

    /// While true, every key goes to the panel.
    fn is_modal_open(&self, _state: &DashboardState) -> bool {
        false
    }

    /// Called after the state changed, before the next frame.
    fn sync(&mut self, _state: &DashboardState) -> Option<PanelAction> {
        None
    }

    fn selected_url(&self, _state: &DashboardState) -> Option<String> {
        None
    }

    /// Short key reference shown in the footer.
    fn help(&self) -> &'static str {
        ""
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

pub fn center_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn border_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn score_style(score: f64) -> Style {
    match ScoreClass::from_score(score) {
        ScoreClass::High => Style::default().fg(Color::Green),
        ScoreClass::Medium => Style::default().fg(Color::Yellow),
        ScoreClass::Low => Style::default().fg(Color::Red),
    }
}

/// Server timestamps come as RFC 3339 or as naive ISO datetimes.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    match chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Shortens long contract addresses to `head...tail`.
pub fn truncate_middle(text: &str, max_len: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return text.to_string();
    }
    let half = max_len / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[chars.len() - half..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn compact_number(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{:.2}", value)
    }
}

/// Moves a list cursor one step down, stopping at the last of `len` rows.
pub(crate) fn step_down(current: Option<usize>, len: usize) -> Option<usize> {
    match current {
        Some(i) if i < len.saturating_sub(1) => Some(i + 1),
        Some(i) => Some(i),
        None => Some(0),
    }
}

pub(crate) fn step_up(current: Option<usize>) -> Option<usize> {
    match current {
        Some(i) if i > 0 => Some(i - 1),
        other => other,
    }
}
