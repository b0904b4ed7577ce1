//! Action enum — all user-initiated intents.

use phc_core::theme::ColorScheme;

/// Unique identifier for a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    NowPlaying,
    HistoryPanel,
    ThemePanel,
    ScopePanel,
    HelpOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePlay,
    VolumeUp,
    VolumeDown,

    // ── Panels ───────────────────────────────────────────────────────────────
    ToggleHistory,
    ToggleThemePanel,
    ToggleHelp,
    ToggleExpanded,

    // ── Theme ────────────────────────────────────────────────────────────────
    SetColorScheme(ColorScheme),
    ToggleThemeMode,

    // ── External ─────────────────────────────────────────────────────────────
    OpenLink(String),
    CopyToClipboard(String),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}
