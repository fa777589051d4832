use super::{
    border_style, center_rect, format_timestamp, score_style, step_down, step_up, Panel,
    PanelAction,
};
use crate::app::{DashboardState, Remote};
use crate::config::AlertsConfig;
use crate::feeds::{explorer_url, Alert, CoinAnalysis, ListKind};
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const BLOCKCHAINS: [&str; 2] = ["ethereum", "solana"];

#[derive(Debug, Clone, PartialEq)]
enum AlertsMode {
    Normal,
    CoinInput,
    /// Waiting for y/n before dismissing the alert with this id.
    ConfirmDismiss(String),
}

pub struct AlertsPanel {
    config: AlertsConfig,
    scroll_state: ListState,
    selected: bool,
    mode: AlertsMode,
    address_input: String,
    chain_index: usize,
}

impl AlertsPanel {
    pub fn new(config: AlertsConfig) -> Self {
        let mut scroll_state = ListState::default();
        scroll_state.select(Some(0));

        Self {
            config,
            scroll_state,
            selected: false,
            mode: AlertsMode::Normal,
            address_input: String::new(),
            chain_index: 0,
        }
    }

    fn selected_alert<'a>(&self, state: &'a DashboardState) -> Option<&'a Alert> {
        let idx = self.scroll_state.selected()?;
        state.visible_alerts().get(idx).copied()
    }

    fn blockchain(&self) -> &'static str {
        BLOCKCHAINS[self.chain_index % BLOCKCHAINS.len()]
    }

    fn analyze(alert: &Alert) -> PanelAction {
        PanelAction::AnalyzeCoin {
            address: alert.coin.address.clone(),
            blockchain: alert.coin.blockchain.clone(),
        }
    }

    fn confirm_dismiss(&mut self, alert: Option<&Alert>) -> Option<PanelAction> {
        if let Some(alert) = alert {
            self.mode = AlertsMode::ConfirmDismiss(alert.id.clone());
        }
        None
    }

    fn handle_confirm(&mut self, key: KeyCode, id: String) -> Option<PanelAction> {
        match key {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.mode = AlertsMode::Normal;
                Some(PanelAction::Dismiss(id))
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.mode = AlertsMode::Normal;
                None
            }
            _ => None,
        }
    }

    fn handle_coin_input(&mut self, key: KeyCode) -> Option<PanelAction> {
        match key {
            KeyCode::Esc => {
                self.mode = AlertsMode::Normal;
                self.address_input.clear();
                None
            }
            KeyCode::Enter => {
                self.mode = AlertsMode::Normal;
                Some(PanelAction::AnalyzeCoin {
                    address: std::mem::take(&mut self.address_input),
                    blockchain: self.blockchain().to_string(),
                })
            }
            KeyCode::Tab => {
                self.chain_index = (self.chain_index + 1) % BLOCKCHAINS.len();
                None
            }
            KeyCode::Backspace => {
                self.address_input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.address_input.push(c);
                None
            }
            _ => None,
        }
    }

    fn alert_item(alert: &Alert) -> ListItem<'_> {
        let score = alert.display_score();
        let title_line = Line::from(vec![
            Span::styled(
                format!("● {:>3.0}% ", score * 100.0),
                score_style(score).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{} ({})", alert.coin.name, alert.coin.symbol),
                Style::default().fg(Color::White),
            ),
        ]);

        let mut meta = vec![Span::styled(
            format!("   {} | ", alert.meme.headline()),
            Style::default().fg(Color::Cyan),
        )];
        if !alert.meme.platform.is_empty() {
            meta.push(Span::styled(
                format!("{} | ", alert.meme.platform),
                Style::default().fg(Color::Yellow),
            ));
        }
        if let Some(created) = &alert.created_at {
            meta.push(Span::styled(
                format_timestamp(created),
                Style::default().fg(Color::DarkGray),
            ));
        }

        ListItem::new(vec![title_line, Line::from(meta)])
    }

    fn render_coin_input(&self, frame: &mut Frame, area: Rect) {
        let modal_area = center_rect(60, 30, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Analyze Coin");

        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let text = vec![
            Line::from(""),
            Line::from(format!("Address: {}", self.address_input)),
            Line::from(format!("Blockchain: {}", self.blockchain())),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to analyze | Tab to switch chain | Esc to cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn render_confirm(&self, frame: &mut Frame, area: Rect) {
        let modal_area = center_rect(50, 20, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title("Dismiss Alert");

        let text = vec![
            Line::from("Are you sure you want to dismiss this alert?"),
            Line::from(""),
            Line::from(Span::styled(
                "y confirm | n cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, modal_area);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, detail: &Remote<Alert>) {
        let modal_area = center_rect(80, 80, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Alert Detail");

        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let alert = match detail {
            Remote::Ready(alert) => alert,
            _ => {
                frame.render_widget(Paragraph::new("Loading alert details..."), inner);
                return;
            }
        };

        let score = alert.optimized_score();
        let wrap_width = inner.width.saturating_sub(2).max(10) as usize;
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("{} ({}) ", alert.coin.name, alert.coin.symbol),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{:.0}%", score * 100.0), score_style(score)),
            ]),
            Line::from(""),
        ];

        lines.extend(
            textwrap::wrap(alert.meme.headline(), wrap_width)
                .into_iter()
                .map(|l| Line::from(l.into_owned())),
        );
        lines.push(Line::from(format!("Platform: {}", alert.meme.platform)));
        if let Some(url) = &alert.meme.url {
            lines.push(Line::from(format!("Link: {}", url)));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "Match: {} ({:.0}% confidence)",
            alert.match_info.keyword,
            alert.match_info.score * 100.0
        )));
        lines.push(Line::from(vec![
            Span::raw("Safety: "),
            Span::styled(
                format!("{:.0}%", alert.safety.score * 100.0),
                score_style(alert.safety.score),
            ),
        ]));
        lines.push(Line::from(format!(
            "Contract: {} on {}",
            alert.coin.address, alert.coin.blockchain
        )));
        if let Some(url) = explorer_url(&alert.coin.blockchain, &alert.coin.address) {
            lines.push(Line::from(Span::styled(url, Style::default().fg(Color::Blue))));
        }

        let reasons = alert.rejection_reasons();
        if !reasons.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Rejection reasons:",
                Style::default().fg(Color::Red),
            )));
            for reason in reasons {
                lines.push(Line::from(format!("  - {}", reason)));
            }
        }
        if let Some(created) = &alert.created_at {
            lines.push(Line::from(""));
            lines.push(Line::from(format!("Detected: {}", format_timestamp(created))));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "d dismiss | a analyze coin | o open meme | Esc close",
            Style::default().fg(Color::DarkGray),
        )));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn render_coin_analysis(&self, frame: &mut Frame, area: Rect, analysis: &Remote<CoinAnalysis>) {
        let modal_area = center_rect(70, 60, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Coin Safety Analysis");

        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let lines = match analysis {
            Remote::Idle | Remote::Loading => vec![Line::from("Analyzing coin...")],
            Remote::Failed(error) => vec![
                Line::from(Span::styled(
                    format!("Error: {}", error),
                    Style::default().fg(Color::Red),
                )),
                Line::from(""),
                Line::from(Span::styled("Esc to close", Style::default().fg(Color::DarkGray))),
            ],
            Remote::Ready(result) => {
                let safety = &result.safety;
                let mut lines = vec![
                    Line::from(vec![
                        Span::raw("Safety: "),
                        Span::styled(
                            format!("{:.0}%", safety.overall_score * 100.0),
                            score_style(safety.overall_score).add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(format!("  ({})", safety.risk_label())),
                    ]),
                    Line::from(format!("Address: {}", result.address)),
                    Line::from(format!("Blockchain: {}", result.blockchain)),
                    Line::from(""),
                ];
                if safety.risk_factors.is_empty() {
                    lines.push(Line::from("No risk factors detected."));
                } else {
                    lines.push(Line::from("Risk factors:"));
                    for factor in &safety.risk_factors {
                        lines.push(Line::from(format!("  - {}", factor)));
                    }
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "o open explorer | Esc close",
                    Style::default().fg(Color::DarkGray),
                )));
                lines
            }
        };

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, message: &str) {
        let status_area = Rect::new(
            area.x + 2,
            area.y + area.height.saturating_sub(3),
            area.width.saturating_sub(4),
            3.min(area.height),
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red));

        let paragraph = Paragraph::new(format!("Error: {}", message)).block(block);
        frame.render_widget(Clear, status_area);
        frame.render_widget(paragraph, status_area);
    }
}

impl Panel for AlertsPanel {
    fn id(&self) -> String {
        format!(
            "alerts-{}-{}",
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
        let mut title = format!(
            " {} ({}) [{}] ",
            self.config.title,
            state.alert_total,
            state.alert_filter.label()
        );
        if state.scan_in_flight {
            title.push_str("scanning... ");
        }

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style(selected));

        let view = &state.alerts;
        let visible = state.visible_alerts();

        if view.is_loading() {
            let loading_text = List::new(vec![ListItem::new("Loading...")]).block(block);
            frame.render_widget(loading_text, area);
        } else if view.items.is_empty() {
            let message = match &view.error {
                Some(error) => format!("Error: {}", error),
                None => "No meme-to-coin alerts have been detected yet.".to_string(),
            };
            frame.render_widget(List::new(vec![ListItem::new(message)]).block(block), area);
        } else if visible.is_empty() {
            let empty_text =
                List::new(vec![ListItem::new("No alerts match the current filter")]).block(block);
            frame.render_widget(empty_text, area);
        } else {
            let items: Vec<ListItem> = visible.iter().map(|a| Self::alert_item(a)).collect();
            let list = List::new(items).block(block).highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );

            let mut scroll = self.scroll_state.clone();
            frame.render_stateful_widget(list, area, &mut scroll);

            if let Some(error) = &view.error {
                self.render_status(frame, area, error);
            }
        }

        if self.mode == AlertsMode::CoinInput {
            self.render_coin_input(frame, area);
        }
        if !matches!(state.alert_detail, Remote::Idle) {
            self.render_detail(frame, area, &state.alert_detail);
        }
        if !matches!(state.coin_analysis, Remote::Idle) {
            self.render_coin_analysis(frame, area, &state.coin_analysis);
        }
        if matches!(self.mode, AlertsMode::ConfirmDismiss(_)) {
            self.render_confirm(frame, area);
        }
    }

    fn scroll_up(&mut self) {
        let next = step_up(self.scroll_state.selected());
        self.scroll_state.select(next);
    }

    fn scroll_down(&mut self, state: &DashboardState) {
        let len = state.visible_alerts().len();
        let next = step_down(self.scroll_state.selected(), len);
        self.scroll_state.select(next);
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn handle_key(&mut self, key: KeyCode, state: &DashboardState) -> Option<PanelAction> {
        if let AlertsMode::ConfirmDismiss(id) = &self.mode {
            let id = id.clone();
            return self.handle_confirm(key, id);
        }

        if !matches!(state.coin_analysis, Remote::Idle) {
            return match key {
                KeyCode::Esc => Some(PanelAction::CloseCoinAnalysis),
                KeyCode::Char('o') => state
                    .coin_analysis
                    .ready()
                    .and_then(|r| explorer_url(&r.blockchain, &r.address))
                    .map(PanelAction::OpenUrl),
                _ => None,
            };
        }

        if self.mode == AlertsMode::CoinInput {
            return self.handle_coin_input(key);
        }

        if !matches!(state.alert_detail, Remote::Idle) {
            let alert = state.alert_detail.ready();
            return match key {
                KeyCode::Esc => Some(PanelAction::CloseAlert),
                KeyCode::Char('d') => self.confirm_dismiss(alert),
                KeyCode::Char('a') => alert.map(Self::analyze),
                KeyCode::Char('o') => alert
                    .and_then(|a| a.meme.url.clone())
                    .map(PanelAction::OpenUrl),
                _ => None,
            };
        }

        match key {
            KeyCode::Enter => self
                .selected_alert(state)
                .map(|a| PanelAction::ShowAlert(a.id.clone())),
            KeyCode::Char('d') => {
                let alert = self.selected_alert(state);
                self.confirm_dismiss(alert)
            }
            KeyCode::Char('a') => self.selected_alert(state).map(Self::analyze),
            KeyCode::Char('c') => {
                self.mode = AlertsMode::CoinInput;
                self.address_input.clear();
                None
            }
            KeyCode::Char('f') => Some(PanelAction::CycleFilter),
            KeyCode::Char('s') => Some(PanelAction::Scan),
            KeyCode::Char('r') => Some(PanelAction::Refresh(ListKind::Alerts)),
            _ => None,
        }
    }

    fn is_modal_open(&self, state: &DashboardState) -> bool {
        self.mode != AlertsMode::Normal
            || !matches!(state.alert_detail, Remote::Idle)
            || !matches!(state.coin_analysis, Remote::Idle)
    }

    fn sync(&mut self, state: &DashboardState) -> Option<PanelAction> {
        let len = state.visible_alerts().len();
        if let Some(idx) = self.scroll_state.selected() {
            if idx >= len {
                self.scroll_state.select(Some(len.saturating_sub(1)));
            }
        }
        None
    }

    fn selected_url(&self, state: &DashboardState) -> Option<String> {
        self.selected_alert(state).and_then(|a| a.meme.url.clone())
    }

    fn help(&self) -> &'static str {
        "Enter detail | d dismiss | a analyze coin | c analyze address | f filter | s scan"
    }
}
