//! Color theme and glyphs for the mapscout TUI.
//!
//! Kanagawa Wave palette; ASCII glyph set for terminals without Unicode fonts.

use ratatui::style::{Color, Modifier, Style};

mod colors {
    use super::Color;

    pub const BG_DARK: Color = Color::Rgb(22, 22, 29); // sumiInk0
    pub const BG_BORDER: Color = Color::Rgb(84, 84, 109); // sumiInk6

    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 215, 186); // fujiWhite
    pub const TEXT_SECONDARY: Color = Color::Rgb(200, 192, 147); // oldWhite
    pub const TEXT_MUTED: Color = Color::Rgb(114, 113, 105); // fujiGray

    pub const PRIMARY: Color = Color::Rgb(149, 127, 184); // oniViolet
    pub const BLUE: Color = Color::Rgb(126, 156, 216); // crystalBlue
    pub const GREEN: Color = Color::Rgb(152, 187, 108); // springGreen
    pub const YELLOW: Color = Color::Rgb(230, 195, 132); // carpYellow
    pub const RED: Color = Color::Rgb(255, 93, 98); // peachRed
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color,
    pub border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub primary: Color,
    pub link: Color,
    pub success: Color,
    pub quote: Color,
    pub error: Color,
}

impl Palette {
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            bg_dark: colors::BG_DARK,
            border: colors::BG_BORDER,
            text_primary: colors::TEXT_PRIMARY,
            text_secondary: colors::TEXT_SECONDARY,
            text_muted: colors::TEXT_MUTED,
            primary: colors::PRIMARY,
            link: colors::BLUE,
            success: colors::GREEN,
            quote: colors::YELLOW,
            error: colors::RED,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub pin: &'static str,
    pub bullet: &'static str,
    pub quote_open: &'static str,
    pub quote_close: &'static str,
    pub status_ready: &'static str,
    pub status_error: &'static str,
    pub spinner_frames: &'static [&'static str],
}

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_FRAMES_ASCII: &[&str] = &["|", "/", "-", "\\"];

#[must_use]
pub const fn glyphs(ascii_only: bool) -> Glyphs {
    if ascii_only {
        Glyphs {
            pin: "*",
            bullet: "-",
            quote_open: "\"",
            quote_close: "\"",
            status_ready: "*",
            status_error: "x",
            spinner_frames: SPINNER_FRAMES_ASCII,
        }
    } else {
        Glyphs {
            pin: "◆",
            bullet: "•",
            quote_open: "“",
            quote_close: "”",
            status_ready: "●",
            status_error: "✗",
            spinner_frames: SPINNER_FRAMES,
        }
    }
}

#[must_use]
pub fn spinner_frame(tick: usize, ascii_only: bool) -> &'static str {
    let frames = glyphs(ascii_only).spinner_frames;
    frames[tick % frames.len()]
}

pub mod styles {
    use super::{Modifier, Palette, Style};

    #[must_use]
    pub fn title(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn place_name(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.text_primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn link(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.link)
            .add_modifier(Modifier::UNDERLINED)
    }

    #[must_use]
    pub fn quote(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.quote)
            .add_modifier(Modifier::ITALIC)
    }

    #[must_use]
    pub fn key_highlight(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_hint(palette: &Palette) -> Style {
        Style::default().fg(palette.text_muted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_wraps_around() {
        let frames = glyphs(false).spinner_frames;
        assert_eq!(spinner_frame(0, false), frames[0]);
        assert_eq!(spinner_frame(frames.len(), false), frames[0]);
        assert_eq!(spinner_frame(5, true), "/");
    }

    #[test]
    fn ascii_glyphs_are_ascii() {
        let g = glyphs(true);
        for glyph in [g.pin, g.bullet, g.quote_open, g.quote_close, g.status_ready, g.status_error]
        {
            assert!(glyph.is_ascii(), "{glyph} is not ASCII");
        }
    }
}
