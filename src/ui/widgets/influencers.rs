use super::{border_style, step_down, step_up, Panel};
use crate::app::{DashboardState, Remote};
use crate::config::InfluencersConfig;
use crate::feeds::Influencer;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

pub struct InfluencersPanel {
    config: InfluencersConfig,
    scroll_state: ListState,
    selected: bool,
}

impl InfluencersPanel {
    pub fn new(config: InfluencersConfig) -> Self {
        let mut scroll_state = ListState::default();
        scroll_state.select(Some(0));

        Self {
            config,
            scroll_state,
            selected: false,
        }
    }

    fn influencers(state: &DashboardState) -> &[Influencer] {
        state.influencers.ready().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Panel for InfluencersPanel {
    fn id(&self) -> String {
        format!(
            "influencers-{}-{}",
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

        let items: Vec<ListItem> = match &state.influencers {
            Remote::Idle | Remote::Loading => vec![ListItem::new("Loading...")],
            Remote::Failed(error) => {
                vec![ListItem::new(format!("Failed to load influencers: {}", error))]
            }
            Remote::Ready(list) if list.is_empty() => {
                vec![ListItem::new("No influencers are being tracked.")]
            }
            Remote::Ready(list) => list
                .iter()
                .map(|influencer| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            &influencer.name,
                            Style::default()
                                .fg(Color::White)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("  @{}", influencer.twitter_handle),
                            Style::default().fg(Color::Cyan),
                        ),
                    ]))
                })
                .collect(),
        };

        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

        if state.influencers.ready().is_some() {
            let mut scroll = self.scroll_state.clone();
            frame.render_stateful_widget(list, area, &mut scroll);
        } else {
            frame.render_widget(list, area);
        }
    }

    fn scroll_up(&mut self) {
        let next = step_up(self.scroll_state.selected());
        self.scroll_state.select(next);
    }

    fn scroll_down(&mut self, state: &DashboardState) {
        let next = step_down(self.scroll_state.selected(), Self::influencers(state).len());
        self.scroll_state.select(next);
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn selected_url(&self, state: &DashboardState) -> Option<String> {
        let idx = self.scroll_state.selected()?;
        Self::influencers(state)
            .get(idx)
            .map(|influencer| format!("https://twitter.com/{}", influencer.twitter_handle))
    }

    fn help(&self) -> &'static str {
        "o open profile"
    }
}
