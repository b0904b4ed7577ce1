//! NowPlaying component — the player bar, and the full-height expanded view.
//!
//! The bar is always on screen and owns the base key map: whatever no overlay
//! consumes lands here.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use phc_core::history::HistoryEntry;
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, FeedStatus},
    component::Component,
    theme::{Palette, C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS},
    widgets::pane_chrome::{fit_width, pane_chrome, Badge, SPINNER_FRAMES},
};

const GAUGE_CELLS: usize = 10;

#[derive(Default)]
pub struct NowPlayingBar;

impl NowPlayingBar {
    pub fn new() -> Self {
        Self
    }
}

/// `▮▮▮▮▮▮▯▯▯▯ 60%`
pub fn volume_gauge(volume: f32) -> String {
    let filled = (volume.clamp(0.0, 1.0) * GAUGE_CELLS as f32).round() as usize;
    format!(
        "{}{} {:>3}%",
        "▮".repeat(filled),
        "▯".repeat(GAUGE_CELLS - filled),
        (volume * 100.0).round() as u32
    )
}

fn play_glyph(state: &AppState) -> &'static str {
    if state.player.is_loading() {
        SPINNER_FRAMES[state.spinner_frame % SPINNER_FRAMES.len()]
    } else if state.player.is_playing() {
        "▶"
    } else {
        "❚❚"
    }
}

fn feed_badge(status: FeedStatus) -> Option<Badge<'static>> {
    let color = match status {
        FeedStatus::Closed => return None,
        FeedStatus::Open => C_TOAST_SUCCESS,
        FeedStatus::Connecting => C_TOAST_INFO,
        FeedStatus::Reconnecting => C_TOAST_ERROR,
    };
    Some(Badge {
        text: status.label(),
        color,
    })
}

/// History head, when it describes what is playing now.
fn current_details(state: &AppState) -> Option<&HistoryEntry> {
    let np = state.pipeline.now_playing();
    state
        .pipeline
        .history()
        .head()
        .filter(|e| e.matches(&np.title, &np.artist))
}

fn details_line(entry: &HistoryEntry) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(album) = &entry.album_name {
        parts.push(album.clone());
    }
    if let Some(genre) = &entry.genre {
        parts.push(genre.clone());
    }
    if let Some(year) = entry.release_year {
        parts.push(year.to_string());
    }
    (!parts.is_empty()).then(|| parts.join(" · "))
}

impl Component for NowPlayingBar {
    fn id(&self) -> ComponentId {
        ComponentId::NowPlaying
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let action = match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') => Action::TogglePlay,
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
            KeyCode::Left | KeyCode::Char('-') => Action::VolumeDown,
            KeyCode::Char('h') => Action::ToggleHistory,
            KeyCode::Char('c') => Action::ToggleThemePanel,
            KeyCode::Char('t') => Action::ToggleThemeMode,
            KeyCode::Char('e') | KeyCode::Enter => Action::ToggleExpanded,
            KeyCode::Char('?') => Action::ToggleHelp,
            KeyCode::Char('q') => Action::Quit,
            _ => Action::Noop,
        };
        vec![action]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        if state.expanded {
            draw_expanded(frame, area, state);
        } else {
            draw_bar(frame, area, state);
        }
    }
}

fn track_spans<'a>(state: &'a AppState, palette: &Palette, max: usize) -> Vec<Span<'a>> {
    let np = state.pipeline.now_playing();
    if np.is_blank() {
        return vec![];
    }
    let title = fit_width(&np.title, max * 2 / 3);
    let artist = fit_width(&np.artist, max.saturating_sub(title.width() + 3));
    vec![
        Span::styled(title, palette.style_title()),
        Span::styled(" — ", palette.style_secondary()),
        Span::styled(artist, palette.style_secondary()),
    ]
}

fn draw_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let palette = &state.palette;
    let block = pane_chrome("PHC Radio", palette, feed_badge(state.feed_status));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(GAUGE_CELLS as u16 + 6),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(Span::styled(format!(" {}", play_glyph(state)), palette.style_accent())),
        cols[0],
    );

    let mut lines = vec![Line::from(track_spans(state, palette, cols[1].width as usize))];
    if inner.height > 1 {
        lines.push(Line::from(Span::styled(
            "space play · h history · c colours · ? help",
            palette.style_secondary(),
        )));
    }
    frame.render_widget(Paragraph::new(lines), cols[1]);

    frame.render_widget(
        Paragraph::new(Span::styled(
            volume_gauge(state.player.volume()),
            palette.style_secondary(),
        )),
        cols[2],
    );
}

fn draw_expanded(frame: &mut Frame, area: Rect, state: &AppState) {
    let palette = &state.palette;
    let block = pane_chrome("Now playing", palette, feed_badge(state.feed_status));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let np = state.pipeline.now_playing();
    let width = inner.width.saturating_sub(4) as usize;
    let mut lines: Vec<Line> = Vec::new();

    let pad = inner.height.saturating_sub(8) / 2;
    lines.extend((0..pad).map(|_| Line::from("")));

    if np.is_blank() {
        lines.push(Line::from(Span::styled(
            "press space to tune in",
            palette.style_secondary(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            fit_width(&np.title.to_uppercase(), width),
            palette.style_title().add_modifier(Modifier::UNDERLINED),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            fit_width(&np.artist, width),
            palette.style_accent(),
        )));
        if let Some(details) = current_details(state).and_then(details_line) {
            lines.push(Line::from(Span::styled(
                fit_width(&details, width),
                palette.style_secondary(),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            fit_width(&np.album_art_url, width),
            Style::default().fg(palette.border),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(format!("{}  ", play_glyph(state)), palette.style_accent()),
        Span::styled(volume_gauge(state.player.volume()), palette.style_secondary()),
    ]));

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(ratatui::layout::Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    #[test]
    fn test_volume_gauge() {
        assert_eq!(volume_gauge(0.6), "▮▮▮▮▮▮▯▯▯▯  60%");
        assert_eq!(volume_gauge(0.0), "▯▯▯▯▯▯▯▯▯▯   0%");
        assert_eq!(volume_gauge(1.0), "▮▮▮▮▮▮▮▮▮▮ 100%");
    }

    #[test]
    fn test_details_line() {
        let mut state = AppState::for_tests();
        state
            .pipeline
            .handle_message(r#"{"streamTitle":"Artist - Song"}"#)
            .unwrap();
        let entry = current_details(&state).unwrap();
        assert_eq!(details_line(entry), None);

        let mut e = entry.clone();
        e.genre = Some("Jazz".into());
        e.release_year = Some(1959);
        assert_eq!(details_line(&e).as_deref(), Some("Jazz · 1959"));
    }

    #[test]
    fn test_key_map() {
        let state = AppState::for_tests();
        let mut bar = NowPlayingBar::new();
        let key = |c| KeyEvent::new(c, KeyModifiers::NONE);
        assert_eq!(bar.handle_key(key(KeyCode::Char(' ')), &state), vec![Action::TogglePlay]);
        assert_eq!(bar.handle_key(key(KeyCode::Right), &state), vec![Action::VolumeUp]);
        assert_eq!(bar.handle_key(key(KeyCode::Char('h')), &state), vec![Action::ToggleHistory]);
        assert_eq!(bar.handle_key(key(KeyCode::Char('x')), &state), vec![Action::Noop]);
    }
}
