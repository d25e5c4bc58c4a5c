use crate::theme::Styler;
use crate::trace::extract_relevant_trace;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static KAREL_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Line (\d+):").unwrap());
static KAREL_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Line (\d+)").unwrap());

/// Karel reports 0-based lines as `Line N:`; shift them to what the
/// student sees. Anything else came from the interpreter itself and gets
/// the standard treatment.
pub fn karel_error(stderr: &str, styler: &dyn Styler) -> String {
    if !KAREL_MARKER.is_match(stderr) {
        return extract_relevant_trace(stderr, styler);
    }

    let renumbered = KAREL_LINE.replace_all(stderr, |caps: &Captures| {
        match caps[1].parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
            Some(number) => format!("Line {}", number),
            None => caps[0].to_string(),
        }
    });
    styler.color(&styler.escape(&renumbered))
}
