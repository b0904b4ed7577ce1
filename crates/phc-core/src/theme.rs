//! Theme preference ({mode, color scheme}), its palette, and its persistence.

use serde::{Deserialize, Serialize};

use crate::storage::{LocalStore, StorageError};

/// Storage key holding the serialized [`Theme`].
pub const THEME_STORAGE_KEY: &str = "phc-radio-theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Default,
    Blue,
    Purple,
    Green,
    Red,
    Orange,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 6] = [
        Self::Default,
        Self::Blue,
        Self::Purple,
        Self::Green,
        Self::Red,
        Self::Orange,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Blue => "Blue",
            Self::Purple => "Purple",
            Self::Green => "Green",
            Self::Red => "Red",
            Self::Orange => "Orange",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

/// The persisted preference. Serialized as `{"mode":..,"colorScheme":..}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub mode: ThemeMode,
    #[serde(rename = "colorScheme")]
    pub color_scheme: ColorScheme,
}

/// 8-bit RGBA; alpha is applied by blending over a background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `a` in [0, 1], as in CSS `rgba()`.
    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a: (a.clamp(0.0, 1.0) * 255.0).round() as u8,
        }
    }

    pub const fn hex(v: u32) -> Self {
        Self::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    /// Flatten onto an opaque background.
    pub fn blend_over(self, bg: Rgba) -> Rgba {
        let a = self.a as u32;
        let mix = |fg: u8, bg: u8| ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        Rgba::rgb(mix(self.r, bg.r), mix(self.g, bg.g), mix(self.b, bg.b))
    }
}

/// Flat palette derived from a [`Theme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub mode: ThemeMode,
    pub background: Rgba,
    pub background_secondary: Rgba,
    pub background_tertiary: Rgba,
    pub text: Rgba,
    pub text_secondary: Rgba,
    pub border: Rgba,
    pub accent: Rgba,
    pub accent_hover: Rgba,
    pub visualizer: Rgba,
}

struct SchemeColors {
    accent: Rgba,
    accent_hover: Rgba,
    visualizer: Rgba,
}

fn scheme_colors(scheme: ColorScheme, mode: ThemeMode) -> SchemeColors {
    use ColorScheme::*;
    use ThemeMode::*;
    let (accent, hover, (r, g, b)) = match (scheme, mode) {
        (Default, Dark) => (0xffffff, 0xf0f0f0, (255, 255, 255)),
        (Default, Light) => (0x000000, 0x1a1a1a, (0, 0, 0)),
        (Blue, Dark) => (0x3b82f6, 0x2563eb, (59, 130, 246)),
        (Blue, Light) => (0x1e40af, 0x1e3a8a, (30, 64, 175)),
        (Purple, Dark) => (0xa855f7, 0x9333ea, (168, 85, 247)),
        (Purple, Light) => (0x7c3aed, 0x6d28d9, (124, 58, 237)),
        (Green, Dark) => (0x10b981, 0x059669, (16, 185, 129)),
        (Green, Light) => (0x047857, 0x065f46, (4, 120, 87)),
        (Red, Dark) => (0xef4444, 0xdc2626, (239, 68, 68)),
        (Red, Light) => (0xb91c1c, 0x991b1b, (185, 28, 28)),
        (Orange, Dark) => (0xf97316, 0xea580c, (249, 115, 22)),
        (Orange, Light) => (0xc2410c, 0x9a3412, (194, 65, 12)),
    };
    SchemeColors {
        accent: Rgba::hex(accent),
        accent_hover: Rgba::hex(hover),
        visualizer: Rgba::rgba(r, g, b, 0.6),
    }
}

impl Theme {
    pub fn colors(&self) -> ThemeColors {
        let s = scheme_colors(self.color_scheme, self.mode);
        match self.mode {
            ThemeMode::Dark => ThemeColors {
                mode: self.mode,
                background: Rgba::hex(0x0a0a0a),
                background_secondary: Rgba::hex(0x0f0f0f),
                background_tertiary: Rgba::hex(0x1a1a1a),
                text: Rgba::hex(0xffffff),
                text_secondary: Rgba::hex(0x9ca3af),
                border: Rgba::rgba(255, 255, 255, 0.05),
                accent: s.accent,
                accent_hover: s.accent_hover,
                visualizer: s.visualizer,
            },
            ThemeMode::Light => ThemeColors {
                mode: self.mode,
                background: Rgba::hex(0xffffff),
                background_secondary: Rgba::hex(0xf9fafb),
                background_tertiary: Rgba::hex(0xf3f4f6),
                text: Rgba::hex(0x111827),
                text_secondary: Rgba::hex(0x6b7280),
                border: Rgba::rgba(0, 0, 0, 0.05),
                accent: s.accent,
                accent_hover: s.accent_hover,
                visualizer: s.visualizer,
            },
        }
    }
}

/// Current theme plus the store it is persisted to. Every change is written
/// through immediately.
#[derive(Debug)]
pub struct ThemeStore {
    store: LocalStore,
    theme: Theme,
}

impl ThemeStore {
    /// Read the saved theme. Anything unreadable falls back to the default.
    pub fn load(store: LocalStore) -> Self {
        let theme = match store.get_json::<Theme>(THEME_STORAGE_KEY) {
            Some(Ok(theme)) => theme,
            Some(Err(e)) => {
                tracing::warn!("ignoring saved theme: {}", e);
                Theme::default()
            }
            None => Theme::default(),
        };
        Self { store, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn colors(&self) -> ThemeColors {
        self.theme.colors()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StorageError> {
        self.theme = theme;
        self.store.set_json(THEME_STORAGE_KEY, &self.theme)
    }

    pub fn set_mode(&mut self, mode: ThemeMode) -> Result<(), StorageError> {
        self.set_theme(Theme { mode, ..self.theme })
    }

    pub fn set_color_scheme(&mut self, color_scheme: ColorScheme) -> Result<(), StorageError> {
        self.set_theme(Theme {
            color_scheme,
            ..self.theme
        })
    }

    pub fn toggle_mode(&mut self) -> Result<(), StorageError> {
        self.set_mode(self.theme.mode.toggled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let t = Theme {
            mode: ThemeMode::Light,
            color_scheme: ColorScheme::Purple,
        };
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            r#"{"mode":"light","colorScheme":"purple"}"#
        );
    }

    #[test]
    fn test_palette() {
        let c = Theme {
            mode: ThemeMode::Dark,
            color_scheme: ColorScheme::Blue,
        }
        .colors();
        assert_eq!(c.background, Rgba::hex(0x0a0a0a));
        assert_eq!(c.accent, Rgba::rgb(0x3b, 0x82, 0xf6));
        assert_eq!(c.visualizer.a, 153);

        let c = Theme::default().colors();
        assert_eq!(c.accent, Rgba::hex(0xffffff));
        assert_eq!(c.text_secondary, Rgba::hex(0x9ca3af));
    }

    #[test]
    fn test_blend() {
        let black = Rgba::hex(0x000000);
        assert_eq!(Rgba::rgba(255, 255, 255, 1.0).blend_over(black), Rgba::hex(0xffffff));
        assert_eq!(Rgba::rgba(255, 255, 255, 0.0).blend_over(black), black);
        let half = Rgba::rgba(200, 100, 0, 0.5).blend_over(black);
        assert!(half.r > 95 && half.r < 105);
    }

    #[test]
    fn test_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut themes = ThemeStore::load(LocalStore::open(&path).unwrap());
        assert_eq!(themes.theme(), Theme::default());
        themes.set_color_scheme(ColorScheme::Green).unwrap();
        themes.toggle_mode().unwrap();
        let written = themes.theme();
        drop(themes);

        let reloaded = ThemeStore::load(LocalStore::open(&path).unwrap());
        assert_eq!(reloaded.theme(), written);
        assert_eq!(
            written,
            Theme {
                mode: ThemeMode::Light,
                color_scheme: ColorScheme::Green
            }
        );
    }

    #[test]
    fn test_bad_saved_value_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = LocalStore::open(&path).unwrap();
        store.set(THEME_STORAGE_KEY, r#"{"mode":"sepia"}"#).unwrap();

        let themes = ThemeStore::load(LocalStore::open(&path).unwrap());
        assert_eq!(themes.theme(), Theme::default());
    }
}
