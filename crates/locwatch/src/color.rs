//! Terminal colors for CLI output.
//!
//! `owo-colors` handles `NO_COLOR`, `FORCE_COLOR`, and TTY detection through
//! `if_supports_color()`. The `--no-color` flag flips an in-process switch that
//! bypasses it entirely.

use std::sync::atomic::{AtomicBool, Ordering};

use locwatch_protocol::{LoadStatus, StatusIndicator};
use owo_colors::{OwoColorize, Stream};

static NO_COLOR_FLAG: AtomicBool = AtomicBool::new(false);

/// Call once from main.rs when `--no-color` is passed.
pub fn set_no_color() {
    NO_COLOR_FLAG.store(true, Ordering::Relaxed);
}

fn no_color() -> bool {
    NO_COLOR_FLAG.load(Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb {
    const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }
}

const ACCENT: Rgb = Rgb::from_hex(0x7CB4C8); // location and repository names
const LOADED: Rgb = Rgb::from_hex(0x6B8F5E);
const LOADING: Rgb = Rgb::from_hex(0xC49A5C);
const FAILED: Rgb = Rgb::from_hex(0xB87060);
const MUTED: Rgb = Rgb::from_hex(0x5C6370);

fn paint(text: &str, stream: Stream, rgb: Rgb) -> String {
    if no_color() {
        return text.to_string();
    }
    text.if_supports_color(stream, |t| t.truecolor(rgb.r, rgb.g, rgb.b))
        .to_string()
}

pub fn accent(text: &str) -> String {
    paint(text, Stream::Stdout, ACCENT)
}

pub fn success(text: &str) -> String {
    paint(text, Stream::Stdout, LOADED)
}

pub fn pending(text: &str) -> String {
    paint(text, Stream::Stdout, LOADING)
}

pub fn failure(text: &str) -> String {
    paint(text, Stream::Stdout, FAILED)
}

pub fn muted(text: &str) -> String {
    paint(text, Stream::Stdout, MUTED)
}

pub fn bold(text: &str) -> String {
    if no_color() {
        return text.to_string();
    }
    text.if_supports_color(Stream::Stdout, |t| t.bold())
        .to_string()
}

/// Error styling for stderr messages.
pub fn error(text: &str) -> String {
    paint(text, Stream::Stderr, FAILED)
}

/// Hint styling for secondary info on stderr.
pub fn hint(text: &str) -> String {
    paint(text, Stream::Stderr, MUTED)
}

pub fn load_status(status: LoadStatus) -> String {
    let text = status.to_string();
    match status {
        LoadStatus::Loaded => success(&text),
        LoadStatus::Loading => pending(&text),
        LoadStatus::Failed => failure(&text),
    }
}

/// One line describing the navigation indicator.
pub fn indicator(indicator: Option<&StatusIndicator>) -> String {
    match indicator {
        Some(StatusIndicator::Spinner { content }) => pending(&format!("… {}", content)),
        Some(StatusIndicator::Warning { content }) => failure(&format!("! {}", content)),
        None => success("✓ All code locations loaded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_hex() {
        let c = Rgb::from_hex(0x7CB4C8);
        assert_eq!(c.r, 124);
        assert_eq!(c.g, 180);
        assert_eq!(c.b, 200);
    }

    #[test]
    fn test_no_color_returns_plain_text() {
        set_no_color();
        assert_eq!(accent("etl"), "etl");
        assert_eq!(load_status(LoadStatus::Loading), "loading");
        assert_eq!(
            indicator(Some(&StatusIndicator::Warning {
                content: "1 code location failed to load".to_string()
            })),
            "! 1 code location failed to load"
        );
        assert_eq!(indicator(None), "✓ All code locations loaded");
    }
}
