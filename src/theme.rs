pub use colored::Color;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const UNDERLINE: &str = "\x1b[4m";

/// Text decoration used by every formatter in the crate.
///
/// Formatting code only ever asks for "color", "bold" or "underline"; the
/// styler decides what that means on the target surface (terminal escapes,
/// nothing at all, or HTML tags for a web view).
///
/// The decorating methods take text that is already in the output format,
/// so they nest freely. Raw text (trace lines, completions, diagnostics)
/// goes through [`Styler::escape`] exactly once before it is decorated.
pub trait Styler: Send + Sync {
    /// Make raw text safe for the output format.
    fn escape(&self, text: &str) -> String {
        text.to_string()
    }

    fn color(&self, text: &str) -> String;
    fn bold(&self, text: &str) -> String;
    fn underline(&self, text: &str) -> String;

    /// Bold + underline, used for the line a student should read first.
    fn emphasize(&self, text: &str) -> String {
        self.bold(&self.underline(text))
    }
}

/// Raw ANSI escape sequences, one foreground color for the whole block.
#[derive(Debug, Clone)]
pub struct AnsiStyler {
    foreground: Color,
}

impl AnsiStyler {
    pub fn new(foreground: Color) -> Self {
        Self { foreground }
    }
}

impl Default for AnsiStyler {
    fn default() -> Self {
        Self::new(Color::Yellow)
    }
}

impl Styler for AnsiStyler {
    fn color(&self, text: &str) -> String {
        format!("\x1b[{}m{}{}", self.foreground.to_fg_str(), text, RESET)
    }

    fn bold(&self, text: &str) -> String {
        format!("{}{}{}", BOLD, text, RESET)
    }

    fn underline(&self, text: &str) -> String {
        format!("{}{}{}", UNDERLINE, text, RESET)
    }
}

/// No decoration at all, for surfaces that cannot render escapes.
#[derive(Debug, Clone, Default)]
pub struct PlainStyler;

impl Styler for PlainStyler {
    fn color(&self, text: &str) -> String {
        text.to_string()
    }

    fn bold(&self, text: &str) -> String {
        text.to_string()
    }

    fn underline(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Inline HTML for the web IDE.
#[derive(Debug, Clone)]
pub struct HtmlStyler {
    foreground: Color,
}

impl HtmlStyler {
    pub fn new(foreground: Color) -> Self {
        Self { foreground }
    }
}

impl Default for HtmlStyler {
    fn default() -> Self {
        Self::new(Color::Yellow)
    }
}

impl Styler for HtmlStyler {
    fn escape(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                c => escaped.push(c),
            }
        }
        escaped
    }

    fn color(&self, text: &str) -> String {
        format!(
            "<span style=\"color: {}\">{}</span>",
            css_color(self.foreground),
            text
        )
    }

    fn bold(&self, text: &str) -> String {
        format!("<b>{}</b>", text)
    }

    fn underline(&self, text: &str) -> String {
        format!("<u>{}</u>", text)
    }
}

fn css_color(color: Color) -> String {
    match color {
        Color::Black | Color::BrightBlack => "black".to_string(),
        Color::Red | Color::BrightRed => "red".to_string(),
        Color::Green | Color::BrightGreen => "green".to_string(),
        Color::Yellow | Color::BrightYellow => "goldenrod".to_string(),
        Color::Blue | Color::BrightBlue => "blue".to_string(),
        Color::Magenta | Color::BrightMagenta => "magenta".to_string(),
        Color::Cyan | Color::BrightCyan => "darkcyan".to_string(),
        Color::White | Color::BrightWhite => "white".to_string(),
        Color::TrueColor { r, g, b } => format!("#{:02x}{:02x}{:02x}", r, g, b),
    }
}

// Wrapper type for Color that implements Serialize/Deserialize
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ColorWrapper(pub Color);

// Names `Color::from_str` accepts, so the config file round-trips.
fn color_name(color: Color) -> String {
    match color {
        Color::Black => "black".to_string(),
        Color::Red => "red".to_string(),
        Color::Green => "green".to_string(),
        Color::Yellow => "yellow".to_string(),
        Color::Blue => "blue".to_string(),
        Color::Magenta => "magenta".to_string(),
        Color::Cyan => "cyan".to_string(),
        Color::White => "white".to_string(),
        Color::BrightBlack => "bright black".to_string(),
        Color::BrightRed => "bright red".to_string(),
        Color::BrightGreen => "bright green".to_string(),
        Color::BrightYellow => "bright yellow".to_string(),
        Color::BrightBlue => "bright blue".to_string(),
        Color::BrightMagenta => "bright magenta".to_string(),
        Color::BrightCyan => "bright cyan".to_string(),
        Color::BrightWhite => "bright white".to_string(),
        Color::TrueColor { r, g, b } => format!("#{:02x}{:02x}{:02x}", r, g, b),
    }
}

fn parse_hex(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::TrueColor {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

impl From<ColorWrapper> for String {
    fn from(wrapper: ColorWrapper) -> Self {
        color_name(wrapper.0)
    }
}

impl From<String> for ColorWrapper {
    fn from(s: String) -> Self {
        let color = parse_hex(s.trim())
            .or_else(|| Color::from_str(&s).ok())
            .unwrap_or(Color::Yellow);
        ColorWrapper(color)
    }
}

impl From<Color> for ColorWrapper {
    fn from(color: Color) -> Self {
        ColorWrapper(color)
    }
}

/// Which [`Styler`] the binary hands to the formatters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    #[default]
    Ansi,
    Plain,
    Html,
}

impl StyleKind {
    pub fn styler(self, foreground: Color) -> Box<dyn Styler> {
        match self {
            StyleKind::Ansi => Box::new(AnsiStyler::new(foreground)),
            StyleKind::Plain => Box::new(PlainStyler),
            StyleKind::Html => Box::new(HtmlStyler::new(foreground)),
        }
    }
}
