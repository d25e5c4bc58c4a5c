use super::ExplainError;
use crate::analyzer::{first_useful, SyntaxAnalyzer};
use crate::theme::Styler;
use crate::trace::{extract_relevant_trace, trim_error};
use tracing::debug;

/// Compact trace plus the analyzer's first useful diagnostic, or the
/// standard trace when the analyzer has nothing to add.
pub async fn syntax_hint_error(
    analyzer: &dyn SyntaxAnalyzer,
    code: &str,
    stderr: &str,
    styler: &dyn Styler,
) -> Result<String, ExplainError> {
    let diagnostics = analyzer.find_all_errors(code).await?;

    match first_useful(&diagnostics) {
        Some(diagnostic) => {
            debug!(line = ?diagnostic.line, "using syntax checker hint");
            Ok(format!(
                "{}\r\n{}",
                trim_error(stderr, styler),
                styler.color(&styler.escape(&diagnostic.message))
            ))
        }
        None => Ok(extract_relevant_trace(stderr, styler)),
    }
}
