//! Terminal text sanitization for model-provided strings.
//!
//! Place titles, summaries, reviews and analysis text all originate from the
//! remote model and are rendered straight into the terminal. Escape sequences
//! in that text could move the cursor, rewrite the screen, set the clipboard
//! (OSC 52) or plant deceptive hyperlinks (OSC 8), so they are stripped before
//! display.

use std::borrow::Cow;
use std::iter::Peekable;

const ESC: char = '\x1b';
const BEL: char = '\x07';
const C1_CSI: char = '\u{009b}';

/// Strip ANSI escape sequences and control characters, keeping `\n` and `\t`.
///
/// Returns `Cow::Borrowed` when the input is already clean.
///
/// ```
/// use mapscout_types::sanitize_terminal_text;
///
/// assert_eq!(sanitize_terminal_text("Joe's Cafe"), "Joe's Cafe");
/// assert_eq!(sanitize_terminal_text("Joe\x1b[2J's"), "Joe's");
/// ```
#[must_use]
pub fn sanitize_terminal_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_unsafe) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ESC => skip_escape(&mut chars),
            C1_CSI => skip_csi(&mut chars),
            '\n' | '\t' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Sanitize and fold all whitespace runs (including newlines) into single spaces.
///
/// Used for list rows where a stray newline would break the layout.
#[must_use]
pub fn sanitize_single_line(input: &str) -> String {
    sanitize_terminal_text(input)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_unsafe(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\t'
}

fn skip_escape<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    match chars.peek().copied() {
        Some('[') => {
            chars.next();
            skip_csi(chars);
        }
        Some(']' | 'P' | '^' | '_') => {
            chars.next();
            skip_string_sequence(chars);
        }
        Some('(' | ')' | '*' | '+' | '#' | ' ') => {
            chars.next();
            chars.next();
        }
        Some(c) if c.is_ascii_alphanumeric() || matches!(c, '=' | '>' | '<') => {
            chars.next();
        }
        _ => {}
    }
}

// Parameter/intermediate bytes are 0x20-0x3F; the final byte is 0x40-0x7E.
fn skip_csi<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(&c) = chars.peek() {
        if ('\x40'..='\x7e').contains(&c) {
            chars.next();
            return;
        }
        if !('\x20'..='\x3f').contains(&c) {
            return;
        }
        chars.next();
    }
}

// OSC/DCS/PM/APC run until BEL or ST (ESC \).
fn skip_string_sequence<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == BEL {
            return;
        }
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_is_borrowed() {
        let text = "Tacos El Güero\n4.8 stars";
        assert!(matches!(sanitize_terminal_text(text), Cow::Borrowed(_)));
    }

    #[test]
    fn strips_csi_sequences() {
        assert_eq!(sanitize_terminal_text("a\x1b[31mred\x1b[0m b"), "ared b");
    }

    #[test]
    fn strips_osc_hyperlinks_and_clipboard() {
        let link = "\x1b]8;;https://evil\x07click\x1b]8;;\x07";
        assert_eq!(sanitize_terminal_text(link), "click");
        let clip = "x\x1b]52;c;ZXZpbA==\x1b\\y";
        assert_eq!(sanitize_terminal_text(clip), "xy");
    }

    #[test]
    fn strips_c1_csi_and_other_controls() {
        assert_eq!(sanitize_terminal_text("a\u{009b}2Jb\x7f\rc"), "abc");
    }

    #[test]
    fn single_line_collapses_whitespace() {
        assert_eq!(sanitize_single_line("  Joe's\n\tCafe  "), "Joe's Cafe");
    }
}
