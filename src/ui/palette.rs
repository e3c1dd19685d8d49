use crate::core::config::ColorScheme;
use ratatui::crossterm::style::{style, Color, Stylize};

const fn rgb(hex: u32) -> Color {
    Color::Rgb {
        r: ((hex >> 16) & 0xff) as u8,
        g: ((hex >> 8) & 0xff) as u8,
        b: (hex & 0xff) as u8,
    }
}

/// Foreground colors for one color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub scheme: ColorScheme,
    pub text: Color,
    pub text_secondary: Color,
    pub primary: Color,
    pub accent: Color,
    pub error: Color,
    /// When false every helper returns its input unstyled.
    pub styled: bool,
}

impl Palette {
    pub fn for_scheme(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Light => Palette {
                scheme,
                text: rgb(0x1A202C),
                text_secondary: rgb(0x4A5568),
                primary: rgb(0x6B46C1),
                accent: rgb(0xDB2777),
                error: rgb(0xEF4444),
                styled: true,
            },
            ColorScheme::Dark => Palette {
                scheme,
                text: rgb(0xF7FAFC),
                text_secondary: rgb(0xA0AEC0),
                primary: rgb(0x9F7AEA),
                accent: rgb(0xF472B6),
                error: rgb(0xF87171),
                styled: true,
            },
        }
    }

    pub fn plain(scheme: ColorScheme) -> Self {
        Palette {
            styled: false,
            ..Self::for_scheme(scheme)
        }
    }

    fn paint(&self, text: &str, color: Color, bold: bool) -> String {
        if !self.styled {
            return text.to_string();
        }
        let styled = style(text).with(color);
        if bold {
            styled.bold().to_string()
        } else {
            styled.to_string()
        }
    }

    pub fn text(&self, text: &str) -> String {
        self.paint(text, self.text, false)
    }

    pub fn secondary(&self, text: &str) -> String {
        self.paint(text, self.text_secondary, false)
    }

    pub fn primary(&self, text: &str) -> String {
        self.paint(text, self.primary, false)
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(text, self.text, true)
    }

    pub fn user_prefix(&self, text: &str) -> String {
        self.paint(text, self.primary, true)
    }

    pub fn assistant_prefix(&self, text: &str) -> String {
        self.paint(text, self.accent, true)
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, self.error, false)
    }
}
