//! Third-party syntax checking.
//!
//! The analyzer is an external process that reads the student's program on
//! stdin and prints one `file:line[:col]: message` diagnostic per line.

use crate::config::AnalyzerConfig;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

static DIAGNOSTIC_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^:\n]*:(\d+):(?:(\d+):)?\s*(.+)$").unwrap());

// Reported for every f-string by checkers that predate them.
const NOISY_FALSE_POSITIVE: &str = "invalid string prefix: 'f'";

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("failed to run syntax checker `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax checker I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            column: None,
            message: message.into(),
        }
    }

    /// Whether this is the f-string false positive, in either the bare or
    /// the sentence form ("This is an invalid string prefix: 'f'.").
    pub fn is_noisy(&self) -> bool {
        let message = self.message.trim();
        let message = message.strip_prefix("This is an ").unwrap_or(message);
        let message = message.strip_suffix('.').unwrap_or(message);
        message == NOISY_FALSE_POSITIVE
    }
}

#[async_trait]
pub trait SyntaxAnalyzer: Send + Sync {
    async fn find_all_errors(&self, code: &str) -> Result<Vec<Diagnostic>, AnalyzerError>;
}

/// First diagnostic worth showing a student.
pub fn first_useful(diagnostics: &[Diagnostic]) -> Option<&Diagnostic> {
    diagnostics.iter().find(|d| !d.is_noisy())
}

pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl SyntaxAnalyzer for CommandAnalyzer {
    async fn find_all_errors(&self, code: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AnalyzerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await?;
        }

        // Checkers exit non-zero when they find something; that is not a
        // failure here.
        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let diagnostics = parse_diagnostics(&format!("{}\n{}", stdout, stderr));
        debug!(
            program = %self.program,
            count = diagnostics.len(),
            "syntax checker finished"
        );
        Ok(diagnostics)
    }
}

/// Parse checker output, skipping lines that are not diagnostics.
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    output
        .lines()
        .filter_map(|line| DIAGNOSTIC_LINE.captures(line.trim_end()))
        .map(|caps| Diagnostic {
            line: caps.get(1).and_then(|m| m.as_str().parse().ok()),
            column: caps.get(2).and_then(|m| m.as_str().parse().ok()),
            message: caps[3].trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_pyflakes_style_output() {
        let output = "<stdin>:3:7: undefined name 'x'\n\
                      <stdin>:5: invalid syntax\n\
                      print(\"hi\"\n\
                      \n";
        let diagnostics = parse_diagnostics(output);
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic {
                    line: Some(3),
                    column: Some(7),
                    message: "undefined name 'x'".to_string(),
                },
                Diagnostic {
                    line: Some(5),
                    column: None,
                    message: "invalid syntax".to_string(),
                },
            ]
        );
    }

    #[test]
    fn recognizes_the_f_string_false_positive() {
        assert!(Diagnostic::new("This is an invalid string prefix: 'f'.").is_noisy());
        assert!(Diagnostic::new("invalid string prefix: 'f'").is_noisy());
        assert!(!Diagnostic::new("invalid string prefix: 'q'").is_noisy());
    }

    #[test]
    fn first_useful_skips_noise() {
        let diagnostics = vec![
            Diagnostic::new("This is an invalid string prefix: 'f'."),
            Diagnostic::new("missing closing parenthesis"),
        ];
        assert_eq!(
            first_useful(&diagnostics).map(|d| d.message.as_str()),
            Some("missing closing parenthesis")
        );
        assert_eq!(first_useful(&diagnostics[..1]), None);
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let analyzer = CommandAnalyzer::new(&AnalyzerConfig {
            program: "definitely-not-a-real-checker-binary".to_string(),
            args: vec![],
        });
        let result = analyzer.find_all_errors("print(1)").await;
        assert!(matches!(result, Err(AnalyzerError::Spawn { .. })));
    }
}
