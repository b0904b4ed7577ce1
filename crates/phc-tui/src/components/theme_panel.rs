//! ThemePanel component — colour scheme picker with swatches.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use phc_core::theme::{ColorScheme, Theme};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::Palette,
    widgets::pane_chrome::pane_chrome,
};

#[derive(Default)]
pub struct ThemePanel {
    pub visible: bool,
    cursor: usize,
}

impl ThemePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open with the cursor on the active scheme.
    pub fn toggle(&mut self, current: ColorScheme) {
        self.visible = !self.visible;
        self.cursor = current.index();
    }

    /// Panel size needed to show every scheme.
    pub fn height() -> u16 {
        ColorScheme::ALL.len() as u16 + 4
    }
}

impl Component for ThemePanel {
    fn id(&self) -> ComponentId {
        ComponentId::ThemePanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let last = ColorScheme::ALL.len() - 1;
        let pick = |i: usize| {
            ColorScheme::from_index(i)
                .map(|s| vec![Action::SetColorScheme(s)])
                .unwrap_or_default()
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('c') => vec![Action::ToggleThemePanel],
            KeyCode::Char('t') => vec![Action::ToggleThemeMode],
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                pick(self.cursor)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = (self.cursor + 1).min(last);
                pick(self.cursor)
            }
            KeyCode::Char(d @ '1'..='9') => {
                let i = d as usize - '1' as usize;
                if i <= last {
                    self.cursor = i;
                }
                pick(i)
            }
            KeyCode::Enter => vec![Action::ToggleThemePanel],
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
        let block = pane_chrome("Colours", palette, None);
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line> = ColorScheme::ALL
            .iter()
            .enumerate()
            .map(|(i, &scheme)| {
                let swatch = Palette::from(Theme {
                    mode: state.theme.mode,
                    color_scheme: scheme,
                });
                let active = scheme == state.theme.color_scheme;
                let label_style = if i == self.cursor {
                    palette.style_selected()
                } else {
                    palette.style_panel()
                };
                Line::from(vec![
                    Span::styled(format!(" {} ", i + 1), palette.style_secondary()),
                    Span::styled("██", Style::default().fg(swatch.accent)),
                    Span::styled("▌", Style::default().fg(swatch.bg_secondary)),
                    Span::styled(format!(" {:<8}", scheme.label()), label_style),
                    Span::styled(if active { " ●" } else { "" }, palette.style_accent()),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(" t ", palette.style_secondary()),
            Span::styled(
                format!("{} mode", state.theme.mode.label()),
                palette.style_title(),
            ),
        ]));
        frame.render_widget(Paragraph::new(lines), inner);
    }
}
