//! Trace trimming and line-number correction.
//!
//! Student programs run inside a hidden `mainApp` wrapper preceded by a
//! few injected lines, so every line number the interpreter reports is off
//! by [`LINE_OFFSET`] and the trace starts with frames the student never
//! wrote. This module classifies a trace, drops those frames and renumbers
//! what is left.

use crate::normalize::last_line_of_error;
use crate::theme::Styler;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Lines injected in front of the student's program.
pub const LINE_OFFSET: i64 = 5;

static RUNTIME_FRAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"File "<exec>", line \d+, in mainApp"#).unwrap());
static SYNTAX_FRAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#"File "<exec>", line \d+"#).unwrap());
static NUMBERED_FRAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"File "<exec>", line (\d+)"#).unwrap());
static LINE_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"line (\d+)").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceShape {
    /// Raised while running; the call chain goes through `mainApp`.
    Runtime,
    /// Raised while compiling the student's file.
    Syntax,
    /// Anything else, e.g. output from tooling that does not use the
    /// standard traceback format.
    Unknown,
}

impl TraceShape {
    pub fn classify(stderr: &str) -> Self {
        if RUNTIME_FRAME.is_match(stderr) {
            TraceShape::Runtime
        } else if SYNTAX_FRAME.is_match(stderr) {
            TraceShape::Syntax
        } else {
            TraceShape::Unknown
        }
    }

    /// The frame at which the student's part of the trace begins.
    fn first_relevant_frame(self) -> Option<&'static Regex> {
        match self {
            TraceShape::Runtime => Some(&*RUNTIME_FRAME),
            TraceShape::Syntax => Some(&*SYNTAX_FRAME),
            TraceShape::Unknown => None,
        }
    }
}

/// The standard presentation: the trimmed, renumbered trace with the last
/// line emphasized, all in one color.
pub fn extract_relevant_trace(stderr: &str, styler: &dyn Styler) -> String {
    match TraceShape::classify(stderr).first_relevant_frame() {
        Some(frame) => format_frames(stderr, frame, styler),
        None => format_unknown(stderr, styler),
    }
}

fn format_frames(stderr: &str, frame: &Regex, styler: &dyn Styler) -> String {
    let mut old_lines = stderr.trim().split('\n');

    // "Traceback (most recent call last):"
    let mut lines = vec![old_lines.next().unwrap_or_default().trim().to_string()];

    let mut relevant = false;
    for line in old_lines {
        if frame.is_match(line) {
            relevant = true;
        }
        if relevant {
            lines.push(shift_line_numbers(line));
        }
    }

    render(lines, styler)
}

fn format_unknown(stderr: &str, styler: &dyn Styler) -> String {
    let lines: Vec<String> = stderr
        .trim()
        .split('\n')
        .map(|line| {
            let mut tokens: Vec<&str> = WHITESPACE.split(line).collect();
            if tokens.first() == Some(&"") {
                tokens.remove(0);
            }
            tokens.join(" ")
        })
        .collect();

    render(lines, styler)
}

fn render(lines: Vec<String>, styler: &dyn Styler) -> String {
    let mut lines: Vec<String> = lines.iter().map(|line| styler.escape(line)).collect();
    if let Some(last) = lines.last_mut() {
        *last = styler.emphasize(last);
    }
    styler.color(&lines.join("\r\n"))
}

/// Rewrite every `line N` to `line N - LINE_OFFSET`. Small numbers go to
/// zero or below; they are not clamped.
pub fn shift_line_numbers(line: &str) -> String {
    LINE_REFERENCE
        .replace_all(line, |caps: &Captures| match caps[1].parse::<i64>() {
            Ok(number) => format!("line {}", number - LINE_OFFSET),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

/// Line of the innermost `<exec>` frame in the student's numbering.
pub fn line_number(stderr: &str) -> Option<i64> {
    stderr.split('\n').rev().find_map(|line| {
        NUMBERED_FRAME
            .captures(line)
            .and_then(|caps| caps[1].parse::<i64>().ok())
            .map(|number| number - LINE_OFFSET)
    })
}

/// Compact form used next to explanations: `(Line N) <last line>`, or just
/// the last line when the trace carries no usable line number.
pub fn trim_error(stderr: &str, styler: &dyn Styler) -> String {
    let error = last_line_of_error(stderr);
    match line_number(stderr) {
        Some(number) if number >= 0 => styler.color(&styler.bold(&styler.underline(
            &styler.escape(&format!("(Line {}) {}", number, error)),
        ))),
        _ => styler.color(&styler.bold(&styler.escape(error))),
    }
}
