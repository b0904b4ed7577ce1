//! HistoryPanel component — recently played tracks, newest first.
//!
//! Enter opens a Spotify search for the selected track; `y` copies the link.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use reqwest::Url;

use phc_core::history::HistoryEntry;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    widgets::pane_chrome::{fit_width, pane_chrome},
};

const SPOTIFY_SEARCH: &str = "https://open.spotify.com/search/";

/// Spotify web search for `"title artist"`, percent-encoded as one path
/// segment.
pub fn spotify_search_url(title: &str, artist: &str) -> String {
    let query = format!("{} {}", title, artist);
    match Url::parse(SPOTIFY_SEARCH) {
        Ok(mut url) => {
            if let Ok(mut segs) = url.path_segments_mut() {
                segs.pop_if_empty().push(&query);
            }
            url.to_string()
        }
        Err(_) => format!("{}{}", SPOTIFY_SEARCH, query),
    }
}

#[derive(Default)]
pub struct HistoryPanel {
    pub visible: bool,
    selected: usize,
}

impl HistoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        self.selected = 0;
    }

    fn selected_entry<'a>(&self, state: &'a AppState) -> Option<&'a HistoryEntry> {
        state.pipeline.history().entries().get(self.selected)
    }

    fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

fn entry_lines<'a>(entry: &HistoryEntry, state: &AppState, width: usize) -> Vec<Line<'a>> {
    let palette = &state.palette;
    let time = entry
        .timestamp
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default();
    let time_w = if time.is_empty() { 0 } else { time.len() + 1 };
    let title = fit_width(&entry.title, width.saturating_sub(time_w + 1));

    let mut first = vec![Span::styled(title, palette.style_title())];
    if !time.is_empty() {
        first.push(Span::styled(format!(" {}", time), palette.style_secondary()));
    }

    let mut second = entry.artist.clone();
    let extras: Vec<String> = [
        entry.album_name.clone(),
        entry.genre.clone(),
        entry.release_year.map(|y| y.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !extras.is_empty() {
        second = format!("{} · {}", second, extras.join(" · "));
    }

    vec![
        Line::from(first),
        Line::from(Span::styled(
            fit_width(&second, width.saturating_sub(1)),
            palette.style_secondary(),
        )),
    ]
}

impl Component for HistoryPanel {
    fn id(&self) -> ComponentId {
        ComponentId::HistoryPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let len = state.pipeline.history().len();
        self.clamp(len);
        match key.code {
            KeyCode::Esc | KeyCode::Char('h') => vec![Action::ToggleHistory],
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                vec![]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(len.saturating_sub(1));
                vec![]
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.selected = 0;
                vec![]
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = len.saturating_sub(1);
                vec![]
            }
            KeyCode::Enter => self
                .selected_entry(state)
                .map(|e| vec![Action::OpenLink(spotify_search_url(&e.title, &e.artist))])
                .unwrap_or_default(),
            KeyCode::Char('y') => self
                .selected_entry(state)
                .map(|e| vec![Action::CopyToClipboard(spotify_search_url(&e.title, &e.artist))])
                .unwrap_or_default(),
            // Playback keys still work with the panel open.
            KeyCode::Char(' ') => vec![Action::TogglePlay],
            KeyCode::Char('q') => vec![Action::Quit],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        if !self.visible {
            return;
        }
        let palette = &state.palette;
        let history = state.pipeline.history();
        self.clamp(history.len());

        let title = format!("History ({})", history.len());
        let block = pane_chrome(&title, palette, None);
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);

        if history.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    " No songs played yet. Start listening to build your history!",
                    palette.style_secondary(),
                ))
                .wrap(ratatui::widgets::Wrap { trim: true }),
                inner,
            );
            return;
        }

        let width = inner.width as usize;
        let items: Vec<ListItem> = history
            .entries()
            .iter()
            .map(|e| ListItem::new(entry_lines(e, state, width)))
            .collect();
        let mut list_state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(
            List::new(items).highlight_style(palette.style_selected()),
            inner,
            &mut list_state,
        );
    }
}
