//! HelpOverlay component — centered popup with keyboard shortcut reference.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::Palette,
    widgets::pane_chrome::pane_chrome,
};

#[derive(Default)]
pub struct HelpOverlay {
    pub visible: bool,
}

impl HelpOverlay {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

impl Component for HelpOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::HelpOverlay
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.visible {
            return vec![];
        }
        // Any key closes the overlay; q still quits.
        match key.code {
            KeyCode::Char('q') => vec![Action::Quit],
            _ => vec![Action::ToggleHelp],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        if !self.visible {
            return;
        }
        let palette = &state.palette;
        let popup = centered_rect(60, 20, area);

        let section = |s: &'static str| {
            Line::from(Span::styled(
                s,
                palette.style_secondary().add_modifier(Modifier::BOLD),
            ))
        };
        let help_lines: Vec<Line> = vec![
            section(" playback"),
            help_row(palette, "space / p", "play / pause"),
            help_row(palette, "← / →  or  - / +", "volume down / up"),
            help_row(palette, "e / enter", "expand / minimize player"),
            Line::from(""),
            section(" panels"),
            help_row(palette, "h", "recently played"),
            help_row(palette, "  ↑ / ↓", "select track"),
            help_row(palette, "  enter", "search on Spotify"),
            help_row(palette, "  y", "copy Spotify link"),
            help_row(palette, "c", "colour schemes (1-6 pick)"),
            help_row(palette, "t", "toggle dark / light"),
            Line::from(""),
            help_row(palette, "?", "toggle this help"),
            help_row(palette, "q / Ctrl+C", "quit"),
            Line::from(""),
            Line::from(Span::styled(" press any key to close", palette.style_secondary())),
        ];

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(help_lines)
                .block(pane_chrome("Keys", palette, None))
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

fn help_row<'a>(palette: &Palette, key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(format!("{:<18}", key), palette.style_accent()),
        Span::styled(desc, palette.style_panel()),
    ])
}

pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}
