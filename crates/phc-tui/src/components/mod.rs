pub mod help_overlay;
pub mod history_panel;
pub mod now_playing;
pub mod scope_panel;
pub mod theme_panel;
