//! Explanation strategies and dispatch.
//!
//! A strategy turns `(code, stderr, context)` into the text shown in the
//! IDE console. Which one runs is decided per student (their stored
//! preference) except for Karel programs, which always get the Karel
//! renumbering.

use crate::ai::{AIError, CompletionClient, HttpCompletionClient};
use crate::analyzer::{AnalyzerError, CommandAnalyzer, SyntaxAnalyzer};
use crate::config::{Config, ForumConfig};
use crate::store::ForumLinks;
use crate::theme::Styler;
use crate::trace::extract_relevant_trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub mod gpt;
pub mod karel;
pub mod message_board;
pub mod syntax_hint;

use gpt::{Explanation, Voice};

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("completion service failed: {0}")]
    Completion(#[from] AIError),
    #[error("syntax checker failed: {0}")]
    Analyzer(#[from] AnalyzerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Trimmed, renumbered trace only.
    #[default]
    Standard,
    /// Trace plus the first useful third-party syntax diagnostic.
    SyntaxHint,
    /// Trace plus a paragraph from the completion service.
    LongExplanation,
    /// Trace plus one sentence from the completion service.
    ShortExplanation,
    /// Trace plus a link to a forum post about the same error.
    MessageBoard,
    /// Trace plus a completion that also sees the student's code.
    CodeExplanation,
    /// [`StrategyKind::CodeExplanation`] in a superhero's voice.
    Superhero,
}

impl StrategyKind {
    /// Strategies a new student may be randomly assigned.
    pub const ASSIGNABLE: [StrategyKind; 6] = [
        StrategyKind::Standard,
        StrategyKind::LongExplanation,
        StrategyKind::MessageBoard,
        StrategyKind::SyntaxHint,
        StrategyKind::Superhero,
        StrategyKind::CodeExplanation,
    ];

    /// Unknown ids select the standard strategy.
    pub fn from_id(id: &str) -> Self {
        match id {
            "tigerpython" => StrategyKind::SyntaxHint,
            "explain" => StrategyKind::LongExplanation,
            "short" => StrategyKind::ShortExplanation,
            "messageboard" => StrategyKind::MessageBoard,
            "gpt" => StrategyKind::CodeExplanation,
            "superhero" => StrategyKind::Superhero,
            _ => StrategyKind::Standard,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            StrategyKind::Standard => "default",
            StrategyKind::SyntaxHint => "tigerpython",
            StrategyKind::LongExplanation => "explain",
            StrategyKind::ShortExplanation => "short",
            StrategyKind::MessageBoard => "messageboard",
            StrategyKind::CodeExplanation => "gpt",
            StrategyKind::Superhero => "superhero",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::Standard => "Standard",
            StrategyKind::SyntaxHint => "Simple Explanation",
            StrategyKind::LongExplanation => "Long Explanation",
            StrategyKind::ShortExplanation => "Short Explanation",
            StrategyKind::MessageBoard => "Forum",
            StrategyKind::CodeExplanation => "GPT - Default",
            StrategyKind::Superhero => "GPT - Superhero",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// What the IDE knows about the run that failed.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// The program targets the Karel teaching runtime.
    pub is_karel: bool,
    /// Short program title.
    pub title: String,
}

/// The live console. Networked strategies write a "working on it" line
/// here before they wait.
pub trait OutputSink: Send {
    fn write_and_scroll(&mut self, text: &str);
}

impl OutputSink for Vec<String> {
    fn write_and_scroll(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

pub struct Explainer {
    completion: Arc<dyn CompletionClient>,
    analyzer: Arc<dyn SyntaxAnalyzer>,
    styler: Box<dyn Styler>,
    forum: ForumConfig,
}

impl Explainer {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        analyzer: Arc<dyn SyntaxAnalyzer>,
        styler: Box<dyn Styler>,
        forum: ForumConfig,
    ) -> Self {
        Self {
            completion,
            analyzer,
            styler,
            forum,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HttpCompletionClient::new(config.ai.clone())),
            Arc::new(CommandAnalyzer::new(&config.analyzer)),
            config.display.styler(),
            config.forum.clone(),
        )
    }

    pub fn styler(&self) -> &dyn Styler {
        self.styler.as_ref()
    }

    /// Format `stderr` for display with the strategy named by
    /// `strategy_id`.
    pub async fn get_error_message(
        &self,
        code: &str,
        stderr: &str,
        strategy_id: &str,
        context: &ExecutionContext,
        sink: &mut dyn OutputSink,
        links: Option<&ForumLinks>,
    ) -> Result<String, ExplainError> {
        if context.is_karel {
            debug!(title = %context.title, "formatting karel error");
            return Ok(karel::karel_error(stderr, self.styler()));
        }

        let kind = StrategyKind::from_id(strategy_id);
        debug!(strategy = %kind, title = %context.title, "formatting error");
        self.explain(kind, code, stderr, sink, links).await
    }

    pub async fn explain(
        &self,
        kind: StrategyKind,
        code: &str,
        stderr: &str,
        sink: &mut dyn OutputSink,
        links: Option<&ForumLinks>,
    ) -> Result<String, ExplainError> {
        let styler = self.styler();
        let completion = self.completion.as_ref();

        let message = match kind {
            StrategyKind::Standard => extract_relevant_trace(stderr, styler),
            StrategyKind::SyntaxHint => {
                syntax_hint::syntax_hint_error(self.analyzer.as_ref(), code, stderr, styler).await?
            }
            StrategyKind::LongExplanation => {
                gpt::explanation_error(completion, Explanation::Long, stderr, sink, styler).await?
            }
            StrategyKind::ShortExplanation => {
                gpt::explanation_error(completion, Explanation::Short, stderr, sink, styler).await?
            }
            StrategyKind::MessageBoard => {
                let mut rng = rand::thread_rng();
                message_board::message_board_error(stderr, links, &self.forum, styler, &mut rng)
            }
            StrategyKind::CodeExplanation => {
                gpt::code_explanation_error(completion, Voice::Tutor, code, stderr, sink, styler)
                    .await?
            }
            StrategyKind::Superhero => {
                gpt::code_explanation_error(completion, Voice::Superhero, code, stderr, sink, styler)
                    .await?
            }
        };
        Ok(message)
    }
}
