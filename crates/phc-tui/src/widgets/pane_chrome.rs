//! PaneChrome — themed bordered pane with an optional badge, plus text fitting.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::Palette;

pub const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// A badge shown in the top-right of the pane header (e.g. "LIVE").
pub struct Badge<'a> {
    pub text: &'a str,
    pub color: Color,
}

/// Bordered pane in the current palette.
pub fn pane_chrome<'a>(title: &'a str, palette: &Palette, badge: Option<Badge<'a>>) -> Block<'a> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.style_border())
        .style(palette.style_panel())
        .title(Line::from(vec![
            Span::raw(" "),
            Span::styled(title, palette.style_title()),
            Span::raw(" "),
        ]));

    if let Some(b) = badge {
        block.title_top(
            Line::from(Span::styled(
                format!(" {} ", b.text),
                Style::default().fg(b.color).add_modifier(Modifier::BOLD),
            ))
            .right_aligned(),
        )
    } else {
        block
    }
}

/// Cut `s` to at most `max` terminal columns, ending in `…` when cut.
pub fn fit_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("short", 10), "short");
        assert_eq!(fit_width("exactly", 7), "exactly");
        assert_eq!(fit_width("truncate me", 6), "trunc…");
        assert_eq!(fit_width("anything", 0), "");
    }

    #[test]
    fn test_fit_width_counts_columns() {
        // Each CJK char is two columns wide.
        assert_eq!(fit_width("日本語の歌", 5), "日本…");
        assert_eq!(fit_width("日本語の歌", 5).width(), 5);
    }
}
