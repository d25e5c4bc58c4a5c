//! Canonical error signatures.
//!
//! A signature is the last line of a trace with everything a student typed
//! (names, literals, numbers) replaced by placeholders, so that the same
//! mistake made in two different programs produces the same key.

use once_cell::sync::Lazy;
use regex::Regex;

static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r" '.*'( |$)").unwrap());
static DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"".*""#).unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\(\)").unwrap());
static UNSUPPORTED_OPERAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TypeError: unsupported operand type\(s\)(.*)").unwrap());

// A compact "(Line N) message" line that was logged with its escape byte.
static LEAKED_COMPACT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(Line \d+\) (.+)\x1b$").unwrap());

const UNSUPPORTED_OPERAND_PREFIX: &str = "TypeError: unsupported operand type(s)";

/// Strip variable content from an error line. Idempotent.
pub fn normalize(error: &str) -> String {
    let error = SINGLE_QUOTED.replace_all(error, " '' ");
    let error = DOUBLE_QUOTED.replace_all(&error, "\"\"");
    let error = DIGITS.replace_all(&error, "0");
    let error = CALL.replace_all(&error, "func()");
    // The operand types explode the key space without telling a beginner
    // anything new.
    let error = UNSUPPORTED_OPERAND.replace(&error, UNSUPPORTED_OPERAND_PREFIX);
    error.into_owned()
}

/// Last line of a trace, ignoring surrounding whitespace.
pub fn last_line_of_error(stderr: &str) -> &str {
    stderr.trim().rsplit('\n').next().unwrap_or_default()
}

/// Like [`last_line_of_error`], but recovers the bare message from a
/// compact `(Line N) message` line that leaked a trailing escape byte.
pub fn clean_last_line(stderr: &str) -> &str {
    let last = last_line_of_error(stderr);
    LEAKED_COMPACT_LINE
        .captures(last)
        .and_then(|caps| caps.get(1))
        .map_or(last, |m| m.as_str())
}

/// The lookup key for a whole trace.
pub fn signature(stderr: &str) -> String {
    normalize(clean_last_line(stderr))
}
