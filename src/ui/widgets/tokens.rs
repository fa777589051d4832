use super::{
    border_style, center_rect, compact_number, format_timestamp, step_down, step_up,
    truncate_middle, Panel, PanelAction,
};
use crate::app::{DashboardState, Remote};
use crate::config::TokensConfig;
use crate::feeds::{explorer_url, ListKind, Token, TokenRequest};
use crate::tokens::{TokenSuggestion, DEFAULT_SUPPLY};
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::any::Any;

const FIELD_LABELS: [&str; 5] = ["Name", "Symbol", "Creator", "Initial supply", "Description"];

/// Token creation form. Survives a failed submission so it can be retried.
#[derive(Debug, Clone, PartialEq)]
struct TokenForm {
    fields: [String; 5],
    focus: usize,
}

impl TokenForm {
    fn blank() -> Self {
        Self::from_suggestion(TokenSuggestion {
            name: String::new(),
            symbol: String::new(),
            description: String::new(),
        })
    }

    fn from_suggestion(suggestion: TokenSuggestion) -> Self {
        Self {
            fields: [
                suggestion.name,
                suggestion.symbol,
                String::new(),
                DEFAULT_SUPPLY.to_string(),
                suggestion.description,
            ],
            focus: 0,
        }
    }

    fn request(&self) -> TokenRequest {
        let [name, symbol, creator, supply, description] = &self.fields;
        TokenRequest {
            name: name.trim().to_string(),
            symbol: symbol.trim().to_uppercase(),
            creator: creator.trim().trim_start_matches('@').to_string(),
            // unparsable supply is rejected by validation as zero
            initial_supply: supply.trim().parse().unwrap_or(0),
            description: description.trim().to_string(),
        }
    }

    fn focused(&mut self) -> &mut String {
        &mut self.fields[self.focus]
    }
}

pub struct TokensPanel {
    config: TokensConfig,
    scroll_state: ListState,
    selected: bool,
    form: Option<TokenForm>,
}

impl TokensPanel {
    pub fn new(config: TokensConfig) -> Self {
        let mut scroll_state = ListState::default();
        scroll_state.select(Some(0));

        Self {
            config,
            scroll_state,
            selected: false,
            form: None,
        }
    }

    /// Opens the creation form pre-filled from a suggestion.
    pub fn open_form(&mut self, suggestion: TokenSuggestion) {
        self.form = Some(TokenForm::from_suggestion(suggestion));
    }

    fn selected_token<'a>(&self, state: &'a DashboardState) -> Option<&'a Token> {
        let idx = self.scroll_state.selected()?;
        state.tokens.items.get(idx)
    }

    fn token_item(token: &Token) -> ListItem<'_> {
        let title_line = Line::from(vec![
            Span::styled(
                format!("{} ", token.name),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("${} ", token.symbol),
                Style::default().fg(Color::Green),
            ),
            Span::styled(&token.blockchain, Style::default().fg(Color::DarkGray)),
        ]);

        let market_cap = token
            .market_cap
            .map(|cap| format!("${}", compact_number(cap)))
            .unwrap_or_else(|| "N/A".to_string());
        let created = token
            .created_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_else(|| "Unknown".to_string());

        let meta_line = Line::from(vec![
            Span::styled(
                format!("   by {} | ", token.creator),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                format!("{} | ", created),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("mcap {} | ", market_cap),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(truncate_middle(&token.address, 16)),
        ]);

        ListItem::new(vec![title_line, meta_line])
    }

    fn render_form(&self, frame: &mut Frame, area: Rect, form: &TokenForm, state: &DashboardState) {
        let modal_area = center_rect(70, 60, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Create Token");

        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let mut lines = vec![Line::from("")];
        for (idx, (label, value)) in FIELD_LABELS.iter().zip(form.fields.iter()).enumerate() {
            let focused = idx == form.focus;
            let style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:>15}: ", label), style.add_modifier(Modifier::BOLD)),
                Span::styled(value.as_str(), style),
                Span::styled(if focused { "_" } else { "" }, style),
            ]));
        }
        lines.push(Line::from(""));

        match &state.token_submission {
            Remote::Loading => lines.push(Line::from(Span::styled(
                "Creating token...",
                Style::default().fg(Color::Yellow),
            ))),
            Remote::Failed(error) => lines.push(Line::from(Span::styled(
                format!("Failed to create token: {}", error),
                Style::default().fg(Color::Red),
            ))),
            Remote::Idle | Remote::Ready(_) => {}
        }
        lines.push(Line::from(Span::styled(
            "Tab next field | Enter create | Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }
}

impl Panel for TokensPanel {
    fn id(&self) -> String {
        format!(
            "tokens-{}-{}",
            self.config.position.row, self.config.position.col
        )
    }

    fn title(&self) -> &str {
        &self.config.title
    }

    fn position(&self) -> (usize, usize) {
        (self.config.position.row, self.config.position.col)
    }

    fn render(&self, frame: &mut Frame, area: Rect, state: &DashboardState, selected: bool) {
        let block = Block::default()
            .title(format!(" {} ({}) ", self.config.title, state.tokens.items.len()))
            .borders(Borders::ALL)
            .border_style(border_style(selected));

        let view = &state.tokens;
        if view.is_loading() {
            let loading_text = List::new(vec![ListItem::new("Loading...")]).block(block);
            frame.render_widget(loading_text, area);
        } else if view.items.is_empty() {
            let message = match &view.error {
                Some(error) => format!("Failed to load tokens: {}", error),
                None => "You haven't created any tokens yet.".to_string(),
            };
            frame.render_widget(List::new(vec![ListItem::new(message)]).block(block), area);
        } else {
            let items: Vec<ListItem> = view.items.iter().map(Self::token_item).collect();
            let list = List::new(items).block(block).highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );

            let mut scroll = self.scroll_state.clone();
            frame.render_stateful_widget(list, area, &mut scroll);
        }

        if let Some(form) = &self.form {
            self.render_form(frame, area, form, state);
        }
    }

    fn scroll_up(&mut self) {
        let next = step_up(self.scroll_state.selected());
        self.scroll_state.select(next);
    }

    fn scroll_down(&mut self, state: &DashboardState) {
        let next = step_down(self.scroll_state.selected(), state.tokens.items.len());
        self.scroll_state.select(next);
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn handle_key(&mut self, key: KeyCode, state: &DashboardState) -> Option<PanelAction> {
        if let Some(form) = self.form.as_mut() {
            let submitting = state.token_submission.is_loading();
            return match key {
                KeyCode::Esc => {
                    self.form = None;
                    Some(PanelAction::CloseTokenForm)
                }
                KeyCode::Enter if !submitting => Some(PanelAction::CreateToken(form.request())),
                KeyCode::Tab | KeyCode::Down => {
                    form.focus = (form.focus + 1) % FIELD_LABELS.len();
                    None
                }
                KeyCode::BackTab | KeyCode::Up => {
                    form.focus = (form.focus + FIELD_LABELS.len() - 1) % FIELD_LABELS.len();
                    None
                }
                KeyCode::Backspace => {
                    form.focused().pop();
                    None
                }
                KeyCode::Char(c) => {
                    form.focused().push(c);
                    None
                }
                _ => None,
            };
        }

        match key {
            KeyCode::Char('n') => {
                self.form = Some(TokenForm::blank());
                None
            }
            KeyCode::Char('r') => Some(PanelAction::Refresh(ListKind::Tokens)),
            _ => None,
        }
    }

    fn is_modal_open(&self, _state: &DashboardState) -> bool {
        self.form.is_some()
    }

    fn sync(&mut self, state: &DashboardState) -> Option<PanelAction> {
        let len = state.tokens.items.len();
        if let Some(idx) = self.scroll_state.selected() {
            if idx >= len {
                self.scroll_state.select(Some(len.saturating_sub(1)));
            }
        }

        if self.form.is_some() && state.token_submission.ready().is_some() {
            self.form = None;
            self.scroll_state.select(Some(0));
            return Some(PanelAction::CloseTokenForm);
        }
        None
    }

    fn selected_url(&self, state: &DashboardState) -> Option<String> {
        self.selected_token(state)
            .and_then(|token| explorer_url(&token.blockchain, &token.address))
    }

    fn help(&self) -> &'static str {
        "n new token | o open explorer"
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Position;
    use serde_json::json;

    fn make_config() -> TokensConfig {
        TokensConfig {
            title: "Test Tokens".to_string(),
            position: Position { row: 1, col: 0 },
            max_items: None,
        }
    }

    fn make_token(id: u64) -> Token {
        serde_json::from_value(json!({
            "id": id,
            "name": "Pepe Coin",
            "symbol": "PPC",
            "creator": "elonmusk",
            "address": "0x1234567890abcdef1234567890abcdef12345678",
            "blockchain": "ethereum"
        }))
        .unwrap()
    }

    fn type_text(panel: &mut TokensPanel, state: &DashboardState, text: &str) {
        for c in text.chars() {
            panel.handle_key(KeyCode::Char(c), state);
        }
    }

    #[test]
    fn test_widget_id() {
        let panel = TokensPanel::new(make_config());
        assert_eq!(panel.id(), "tokens-1-0");
        assert_eq!(panel.title(), "Test Tokens");
    }

    #[test]
    fn test_blank_form_submission() {
        let mut panel = TokensPanel::new(make_config());
        let state = DashboardState::default();

        panel.handle_key(KeyCode::Char('n'), &state);
        assert!(panel.is_modal_open(&state));
        type_text(&mut panel, &state, "Moon Coin");
        panel.handle_key(KeyCode::Tab, &state);
        type_text(&mut panel, &state, "mn");
        panel.handle_key(KeyCode::Tab, &state);
        type_text(&mut panel, &state, "@elonmusk");

        match panel.handle_key(KeyCode::Enter, &state) {
            Some(PanelAction::CreateToken(request)) => {
                assert_eq!(request.name, "Moon Coin");
                assert_eq!(request.symbol, "MN");
                assert_eq!(request.creator, "elonmusk");
                assert_eq!(request.initial_supply, DEFAULT_SUPPLY);
                assert!(request.validate().is_ok());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_form_survives_failure_and_closes_on_success() {
        let mut panel = TokensPanel::new(make_config());
        panel.open_form(TokenSuggestion {
            name: "Doge Coin".to_string(),
            symbol: "DG".to_string(),
            description: "wow".to_string(),
        });

        let mut state = DashboardState::default();
        state.token_submission = Remote::Failed("network down".to_string());
        assert_eq!(panel.sync(&state), None);
        assert!(panel.is_modal_open(&state));
        assert_eq!(panel.form.as_ref().unwrap().fields[0], "Doge Coin");

        state.token_submission = Remote::Ready(make_token(9));
        assert_eq!(panel.sync(&state), Some(PanelAction::CloseTokenForm));
        assert!(!panel.is_modal_open(&state));
    }

    #[test]
    fn test_enter_ignored_while_submitting() {
        let mut panel = TokensPanel::new(make_config());
        panel.handle_key(KeyCode::Char('n'), &DashboardState::default());

        let mut state = DashboardState::default();
        state.token_submission = Remote::Loading;
        assert_eq!(panel.handle_key(KeyCode::Enter, &state), None);
    }

    #[test]
    fn test_focus_wraps() {
        let mut panel = TokensPanel::new(make_config());
        let state = DashboardState::default();
        panel.handle_key(KeyCode::Char('n'), &state);
        panel.handle_key(KeyCode::BackTab, &state);
        assert_eq!(panel.form.as_ref().unwrap().focus, 4);
        panel.handle_key(KeyCode::Tab, &state);
        assert_eq!(panel.form.as_ref().unwrap().focus, 0);
    }

    #[test]
    fn test_selected_url() {
        let panel = TokensPanel::new(make_config());
        let mut state = DashboardState::default();
        state.tokens.items.replace(vec![make_token(1)]);
        assert_eq!(
            panel.selected_url(&state).as_deref(),
            Some("https://etherscan.io/token/0x1234567890abcdef1234567890abcdef12345678")
        );
    }
}
