use crate::ai::{AIError, CompletionClient, CompletionRequest};
use crate::analyzer::{AnalyzerError, Diagnostic, SyntaxAnalyzer};
use crate::config::ForumConfig;
use crate::store::{ForumLinks, LinkEntry};
use crate::strategy::Explainer;
use crate::theme::PlainStyler;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

mod explain;
mod forum_links;

pub(crate) const NAME_ERROR: &str = "Traceback (most recent call last):\n  \
                                     File \"<exec>\", line 12, in mainApp\n\
                                     NameError: name 'x' is not defined";

/// Completion service that answers every prompt with the same text and
/// remembers what it was asked.
pub(crate) struct FakeCompletion {
    answer: Result<String, String>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompletion {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(answer.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        self.requests.lock().unwrap().push(request.clone());
        self.answer.clone().map_err(AIError::NetworkError)
    }
}

pub(crate) struct FakeAnalyzer {
    diagnostics: Vec<Diagnostic>,
}

impl FakeAnalyzer {
    pub fn reporting(messages: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            diagnostics: messages.iter().map(|m| Diagnostic::new(*m)).collect(),
        })
    }
}

#[async_trait]
impl SyntaxAnalyzer for FakeAnalyzer {
    async fn find_all_errors(&self, _code: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
        Ok(self.diagnostics.clone())
    }
}

// Test utilities and helpers
pub(crate) struct TestUtils;

impl TestUtils {
    pub fn explainer(completion: Arc<FakeCompletion>, analyzer: Arc<FakeAnalyzer>) -> Explainer {
        Explainer::new(
            completion,
            analyzer,
            Box::new(PlainStyler),
            ForumConfig::default(),
        )
    }

    pub fn plain_explainer() -> Explainer {
        Self::explainer(FakeCompletion::answering("unused"), FakeAnalyzer::reporting(&[]))
    }

    pub fn links(entries: &[(&str, Vec<&str>)]) -> ForumLinks {
        entries
            .iter()
            .map(|(key, ids)| {
                (
                    key.to_string(),
                    LinkEntry {
                        post_ids: ids.iter().map(|id| id.to_string()).collect(),
                    },
                )
            })
            .collect()
    }
}
