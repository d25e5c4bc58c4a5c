//! The fixed library of common interpreter errors.
//!
//! These are the only errors the forum-link index keeps posts for. The list
//! is ordered; matching walks it front to back so index updates are
//! reproducible.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

const COMMON_ERRORS: &[&str] = &[
    r"NameError: (global )?name '(.*)' is not defined",
    r"SyntaxError: invalid syntax",
    r"EOFError: EOF when reading a line",
    r"TypeError: unsupported operand type\(s\) .*",
    r"SyntaxError: unexpected EOF while parsing",
    r"IndentationError: unindent does not match any outer indentation level",
    r"SyntaxError: EOL while scanning string literal",
    r"IndentationError: unexpected indent",
    r"TabError: inconsistent use of tabs and spaces in indentation",
    r"IndentationError: expected an indented block",
    r"ValueError: invalid literal for (\w+)\(\) with base \d+.*",
    r"TypeError: '(.+)' object is not iterable",
    r"TypeError: '(.+)' object is not callable",
    r"TypeError: can't multiply sequence by non-int of type '(.+)'",
    r"IndexError: (string|list) index out of range",
    r"SyntaxError: unexpected character after line continuation character",
    r"TypeError: Can't convert '(.+)' object to str implicitly",
    r"AttributeError: '(.+)' object has no attribute '(.+)'",
    r"TypeError: '(.+)' object is not subscriptable",
    r"TypeError: string indices must be integers",
    r"SyntaxError: cannot assign to (function call|literal)",
    r"UnboundLocalError: local variable '(.+)' referenced before assignment",
    r"SyntaxError: cannot assign to operator",
    r"ValueError: could not convert string to float:(.*)",
    r"TypeError: unorderable types: (.*)",
    r"TypeError: not all arguments converted during string formatting",
    r"TypeError: (object of type '.*' has no .*\(.*\)|bad operand type for .*|.* argument must be a .*)",
    r"TypeError: '.*' object cannot be interpreted as an integer",
    r"TypeError: an integer is required \(got type .*\)",
    r"RuntimeError: maximum recursion depth exceeded.*",
    r"IndexError: list assignment index out of range",
    r"TypeError: slice indices must be integers or None or have an __index__ method",
    r"TypeError: ord\(\) expected .*?, but .*? found",
    r"SyntaxError: '(.*?)' .*(outside|not.*in).*loop",
    r"SyntaxError: 'return' outside function",
    r"TypeError: can only concatenate list \(not .*\) to list",
];

/// One recognizable error shape. Two patterns are the same pattern when
/// their source text is the same.
#[derive(Debug, Clone)]
pub struct ErrorPattern {
    regex: Regex,
}

impl ErrorPattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Key of this pattern's document in the `forumLinks` collection:
    /// the source wrapped in slashes, the way stored keys have always
    /// been written.
    pub fn document_key(&self) -> String {
        format!("/{}/", self.as_str())
    }

    /// Rebuild a pattern from a stored document key.
    pub fn from_document_key(key: &str) -> Result<Self, regex::Error> {
        Self::new(key_source(key))
    }
}

impl PartialEq for ErrorPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ErrorPattern {}

impl fmt::Display for ErrorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.document_key())
    }
}

/// Strip the `/…/` delimiters from a document key, if present.
pub fn key_source(key: &str) -> &str {
    key.strip_prefix('/')
        .and_then(|rest| rest.strip_suffix('/'))
        .unwrap_or(key)
}

pub static ERROR_PATTERNS: Lazy<Vec<ErrorPattern>> = Lazy::new(|| {
    COMMON_ERRORS
        .iter()
        .map(|source| ErrorPattern::new(source).expect("built-in error pattern must compile"))
        .collect()
});

/// Every library pattern matching the text or the title, in library order.
pub fn match_all(text: &str, title: &str) -> Vec<&'static ErrorPattern> {
    ERROR_PATTERNS
        .iter()
        .filter(|pattern| pattern.is_match(text) || pattern.is_match(title))
        .collect()
}
