//! Toast notifications: transient status messages, top-right corner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::Rng;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{Palette, C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);
const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToastId(String);

impl ToastId {
    fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let salt: u32 = rand::thread_rng().gen();
        Self(format!("toast-{millis}-{salt:08x}"))
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
    expires: Instant,
}

#[derive(Debug, Default)]
pub struct ToastManager {
    toasts: VecDeque<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a toast. A live toast with the same message is replaced.
    pub fn push(
        &mut self,
        message: impl Into<String>,
        kind: ToastKind,
        duration: Duration,
    ) -> ToastId {
        let message = message.into();
        self.toasts.retain(|t| t.message != message);

        let id = ToastId::generate();
        self.toasts.push_back(Toast {
            id: id.clone(),
            message,
            kind,
            duration,
            expires: Instant::now() + duration,
        });
        while self.toasts.len() > MAX_VISIBLE * 2 {
            self.toasts.pop_front();
        }
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> ToastId {
        self.push(message, ToastKind::Success, DEFAULT_DURATION)
    }

    pub fn error(&mut self, message: impl Into<String>) -> ToastId {
        self.push(message, ToastKind::Error, DEFAULT_DURATION)
    }

    pub fn info(&mut self, message: impl Into<String>) -> ToastId {
        self.push(message, ToastKind::Info, DEFAULT_DURATION)
    }

    /// Dismiss early. Returns false if it had already expired.
    pub fn remove(&mut self, id: &ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| &t.id != id);
        self.toasts.len() != before
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires > now);
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Newest first, capped to what fits on screen.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().rev().take(MAX_VISIBLE)
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(20, 60);
        let mut y = area.y + 1;

        for toast in self.visible() {
            if y >= area.y + area.height {
                break;
            }
            let (color, icon) = match toast.kind {
                ToastKind::Info => (C_TOAST_INFO, "·"),
                ToastKind::Success => (C_TOAST_SUCCESS, "✓"),
                ToastKind::Error => (C_TOAST_ERROR, "✗"),
            };
            let text = format!(" {} {} ", icon, toast.message);
            let w = (text.width() as u16).min(max_width).min(area.width);
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(w + 1),
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(color)
                        .bg(palette.bg_tertiary)
                        .add_modifier(Modifier::BOLD),
                ))),
                toast_area,
            );
            y += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_remove() {
        let mut t = ToastManager::new();
        let a = t.info("one");
        let b = t.error("two");
        assert_ne!(a, b);
        assert_eq!(t.len(), 2);
        assert!(t.remove(&a));
        assert!(!t.remove(&a));
        assert_eq!(t.visible().next().map(|x| x.kind), Some(ToastKind::Error));
    }

    #[test]
    fn test_expiry() {
        let mut t = ToastManager::new();
        t.push("short", ToastKind::Info, Duration::from_millis(10));
        t.push("long", ToastKind::Success, Duration::from_secs(60));
        t.tick_at(Instant::now() + Duration::from_secs(1));
        let left: Vec<_> = t.visible().map(|x| x.message.as_str()).collect();
        assert_eq!(left, vec!["long"]);
    }

    #[test]
    fn test_default_duration() {
        let mut t = ToastManager::new();
        t.success("saved");
        assert_eq!(t.visible().next().unwrap().duration, DEFAULT_DURATION);
    }

    #[test]
    fn test_same_message_replaces() {
        let mut t = ToastManager::new();
        let first = t.info("Reconnecting…");
        let second = t.info("Reconnecting…");
        assert_eq!(t.len(), 1);
        assert!(!t.remove(&first));
        assert!(t.remove(&second));
    }

    #[test]
    fn test_visible_is_capped_newest_first() {
        let mut t = ToastManager::new();
        for i in 0..6 {
            t.info(format!("m{i}"));
        }
        let shown: Vec<_> = t.visible().map(|x| x.message.clone()).collect();
        assert_eq!(shown, vec!["m5", "m4", "m3", "m2"]);
    }
}
