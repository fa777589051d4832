use super::{
    border_style, center_rect, format_timestamp, score_style, step_down, step_up, Panel,
    PanelAction,
};
use crate::app::{DashboardState, Remote};
use crate::config::TweetsConfig;
use crate::feeds::{ContentAnalysis, ListKind, Sentiment, Tweet};
use crate::tokens;
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
enum TweetsMode {
    Normal,
    Analyze,
}

pub struct TweetsPanel {
    config: TweetsConfig,
    scroll_state: ListState,
    selected: bool,
    mode: TweetsMode,
    content_input: String,
    /// Text behind the analysis currently on screen.
    analyzed_text: String,
}

impl TweetsPanel {
    pub fn new(config: TweetsConfig) -> Self {
        let mut scroll_state = ListState::default();
        scroll_state.select(Some(0));

        Self {
            config,
            scroll_state,
            selected: false,
            mode: TweetsMode::Normal,
            content_input: String::new(),
            analyzed_text: String::new(),
        }
    }

    fn selected_tweet<'a>(&self, state: &'a DashboardState) -> Option<&'a Tweet> {
        let idx = self.scroll_state.selected()?;
        state.tweets.items.get(idx)
    }

    fn analyze(&mut self, content: String) -> PanelAction {
        self.analyzed_text = content.clone();
        PanelAction::AnalyzeContent(content)
    }

    fn sentiment_span(score: f64) -> Span<'static> {
        let sentiment = Sentiment::from_score(score);
        let color = match sentiment {
            Sentiment::Positive => Color::Green,
            Sentiment::Neutral => Color::Gray,
            Sentiment::Negative => Color::Red,
        };
        Span::styled(
            format!("{} {:+.2}", sentiment.label(), score),
            Style::default().fg(color),
        )
    }

    fn tweet_item(tweet: &Tweet) -> ListItem<'_> {
        let mut header = vec![Span::styled(
            format!("@{}", tweet.author),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(created) = &tweet.created_at {
            header.push(Span::styled(
                format!("  {}", format_timestamp(created)),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let metrics = Line::from(vec![
            Span::raw("   "),
            Self::sentiment_span(tweet.sentiment_score),
            Span::raw(" | viral "),
            Span::styled(
                format!("{:.0}%", tweet.viral_score * 100.0),
                score_style(tweet.viral_score),
            ),
            Span::styled(
                if tweet.keywords.is_empty() {
                    String::new()
                } else {
                    format!(" | #{}", tweet.keywords.join(" #"))
                },
                Style::default().fg(Color::Magenta),
            ),
        ]);

        ListItem::new(vec![
            Line::from(header),
            Line::from(Span::raw(format!("   {}", tweet.content))),
            metrics,
        ])
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let modal_area = center_rect(60, 30, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Analyze Content");

        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let text = vec![
            Line::from(""),
            Line::from(self.content_input.as_str()),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to analyze | Esc to cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn render_analysis(&self, frame: &mut Frame, area: Rect, analysis: &Remote<ContentAnalysis>) {
        let modal_area = center_rect(75, 70, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Content Analysis");

        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let lines = match analysis {
            Remote::Idle | Remote::Loading => vec![Line::from("Analyzing content...")],
            Remote::Failed(error) => vec![
                Line::from(Span::styled(
                    format!("Error: {}", error),
                    Style::default().fg(Color::Red),
                )),
                Line::from(""),
                Line::from(Span::styled("Esc to close", Style::default().fg(Color::DarkGray))),
            ],
            Remote::Ready(result) => {
                let mut lines = vec![
                    Line::from(vec![Span::raw("Sentiment: "), Self::sentiment_span(result.sentiment_score)]),
                    Line::from(vec![
                        Span::raw("Viral potential: "),
                        Span::styled(
                            format!("{:.0}%", result.viral_score * 100.0),
                            score_style(result.viral_score),
                        ),
                    ]),
                    Line::from(if result.keywords.is_empty() {
                        "No keywords extracted.".to_string()
                    } else {
                        format!("Keywords: {}", result.keywords.join(", "))
                    }),
                    Line::from(""),
                ];

                if result.potential_matches.is_empty() {
                    lines.push(Line::from("No potential coin matches found."));
                } else {
                    lines.push(Line::from("Potential matches:"));
                    for candidate in &result.potential_matches {
                        lines.push(Self::match_line(candidate));
                    }
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "t create token | Esc close",
                    Style::default().fg(Color::DarkGray),
                )));
                lines
            }
        };

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn match_line(candidate: &Value) -> Line<'static> {
        let field = |key: &str| {
            candidate
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string()
        };
        let score = candidate
            .get("match_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        Line::from(vec![
            Span::raw(format!("  {} ({}) ", field("name"), field("symbol"))),
            Span::styled(format!("{:.0}%", score * 100.0), score_style(score)),
            Span::styled(
                format!(" via \"{}\" on {}", field("match_keyword"), field("blockchain")),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    }
}

impl Panel for TweetsPanel {
    fn id(&self) -> String {
        format!(
            "tweets-{}-{}",
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
            .title(format!(" {} ", self.config.title))
            .borders(Borders::ALL)
            .border_style(border_style(selected));

        let view = &state.tweets;
        if view.is_loading() {
            let loading_text = List::new(vec![ListItem::new("Loading...")]).block(block);
            frame.render_widget(loading_text, area);
        } else if view.items.is_empty() {
            let message = match &view.error {
                Some(error) => format!("Failed to load tweets: {}", error),
                None => "No influential tweets have been detected yet.".to_string(),
            };
            frame.render_widget(List::new(vec![ListItem::new(message)]).block(block), area);
        } else {
            let items: Vec<ListItem> = view.items.iter().map(Self::tweet_item).collect();
            let list = List::new(items).block(block).highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );

            let mut scroll = self.scroll_state.clone();
            frame.render_stateful_widget(list, area, &mut scroll);
        }

        if self.mode == TweetsMode::Analyze {
            self.render_input(frame, area);
        }
        if !matches!(state.content_analysis, Remote::Idle) {
            self.render_analysis(frame, area, &state.content_analysis);
        }
    }

    fn scroll_up(&mut self) {
        let next = step_up(self.scroll_state.selected());
        self.scroll_state.select(next);
    }

    fn scroll_down(&mut self, state: &DashboardState) {
        let next = step_down(self.scroll_state.selected(), state.tweets.items.len());
        self.scroll_state.select(next);
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn handle_key(&mut self, key: KeyCode, state: &DashboardState) -> Option<PanelAction> {
        if !matches!(state.content_analysis, Remote::Idle) {
            return match key {
                KeyCode::Esc => Some(PanelAction::CloseContentAnalysis),
                KeyCode::Char('t') => state.content_analysis.ready().map(|analysis| {
                    PanelAction::DraftToken(tokens::suggest(&analysis.keywords, &self.analyzed_text))
                }),
                _ => None,
            };
        }

        if self.mode == TweetsMode::Analyze {
            return match key {
                KeyCode::Esc => {
                    self.mode = TweetsMode::Normal;
                    self.content_input.clear();
                    None
                }
                KeyCode::Enter => {
                    self.mode = TweetsMode::Normal;
                    let content = std::mem::take(&mut self.content_input);
                    Some(self.analyze(content))
                }
                KeyCode::Backspace => {
                    self.content_input.pop();
                    None
                }
                KeyCode::Char(c) => {
                    self.content_input.push(c);
                    None
                }
                _ => None,
            };
        }

        match key {
            KeyCode::Char('a') => {
                let content = self.selected_tweet(state)?.content.clone();
                Some(self.analyze(content))
            }
            KeyCode::Char('i') => {
                self.mode = TweetsMode::Analyze;
                self.content_input.clear();
                None
            }
            KeyCode::Char('t') => self
                .selected_tweet(state)
                .map(|tweet| PanelAction::DraftToken(tokens::suggest(&[], &tweet.content))),
            KeyCode::Char('r') => Some(PanelAction::Refresh(ListKind::Tweets)),
            _ => None,
        }
    }

    fn is_modal_open(&self, state: &DashboardState) -> bool {
        self.mode != TweetsMode::Normal || !matches!(state.content_analysis, Remote::Idle)
    }

    fn sync(&mut self, state: &DashboardState) -> Option<PanelAction> {
        let len = state.tweets.items.len();
        if let Some(idx) = self.scroll_state.selected() {
            if idx >= len {
                self.scroll_state.select(Some(len.saturating_sub(1)));
            }
        }
        None
    }

    fn selected_url(&self, state: &DashboardState) -> Option<String> {
        self.selected_tweet(state)
            .filter(|tweet| !tweet.author.is_empty())
            .map(|tweet| format!("https://twitter.com/{}", tweet.author))
    }

    fn help(&self) -> &'static str {
        "a analyze tweet | i analyze text | t create token | o open profile"
    }
}
