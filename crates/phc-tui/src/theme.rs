//! Terminal palette derived from the persisted theme.

use ratatui::style::{Color, Modifier, Style};

use phc_core::theme::{Rgba, Theme, ThemeColors};

// Toast accents are fixed across themes.
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);

fn color(c: Rgba) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub bg_secondary: Color,
    pub bg_tertiary: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub border: Color,
    pub accent: Color,
    pub accent_hover: Color,
    pub visualizer: Color,
}

impl Palette {
    pub fn from_colors(c: &ThemeColors) -> Self {
        // A 5% border vanishes in a terminal; lift it so panels stay visible.
        let border = Rgba { a: c.border.a.saturating_mul(4), ..c.border };
        Self {
            bg: color(c.background),
            bg_secondary: color(c.background_secondary),
            bg_tertiary: color(c.background_tertiary),
            text: color(c.text),
            text_secondary: color(c.text_secondary),
            border: color(border.blend_over(c.background)),
            accent: color(c.accent),
            accent_hover: color(c.accent_hover),
            visualizer: color(c.visualizer.blend_over(c.background)),
        }
    }

    pub fn style_base(&self) -> Style {
        Style::default().fg(self.text).bg(self.bg)
    }

    pub fn style_panel(&self) -> Style {
        Style::default().fg(self.text).bg(self.bg_secondary)
    }

    pub fn style_secondary(&self) -> Style {
        Style::default().fg(self.text_secondary)
    }

    pub fn style_border(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn style_accent(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn style_selected(&self) -> Style {
        Style::default()
            .fg(self.accent_hover)
            .bg(self.bg_tertiary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn style_title(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }
}

impl From<Theme> for Palette {
    fn from(theme: Theme) -> Self {
        Self::from_colors(&theme.colors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phc_core::theme::{ColorScheme, ThemeMode};

    #[test]
    fn test_dark_default_palette() {
        let p = Palette::from(Theme::default());
        assert_eq!(p.bg, Color::Rgb(0x0a, 0x0a, 0x0a));
        assert_eq!(p.accent, Color::Rgb(0xff, 0xff, 0xff));
        // 60% white over near-black.
        match p.visualizer {
            Color::Rgb(r, g, b) => {
                assert!(r > 150 && r < 160);
                assert_eq!((r, g), (g, b));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_light_scheme_accent() {
        let p = Palette::from(Theme {
            mode: ThemeMode::Light,
            color_scheme: ColorScheme::Orange,
        });
        assert_eq!(p.accent, Color::Rgb(0xc2, 0x41, 0x0c));
        assert_eq!(p.text, Color::Rgb(0x11, 0x18, 0x27));
    }
}
