use super::{FakeAnalyzer, FakeCompletion, TestUtils, NAME_ERROR};
use crate::ai::AIError;
use crate::strategy::{ExecutionContext, ExplainError, StrategyKind};
use crate::theme::PlainStyler;
use crate::trace::extract_relevant_trace;
use pretty_assertions::assert_eq;

const TRIMMED: &str = "(Line 7) NameError: name 'x' is not defined";

fn plain_context() -> ExecutionContext {
    ExecutionContext {
        is_karel: false,
        title: "Hello World".to_string(),
    }
}

#[tokio::test]
async fn standard_strategy_prints_the_relevant_trace() {
    let explainer = TestUtils::plain_explainer();
    let mut sink: Vec<String> = Vec::new();

    for id in ["default", "", "no-such-strategy"] {
        let message = explainer
            .get_error_message("print(x)", NAME_ERROR, id, &plain_context(), &mut sink, None)
            .await
            .unwrap();
        assert_eq!(message, extract_relevant_trace(NAME_ERROR, &PlainStyler));
    }
    assert!(sink.is_empty());
}

#[tokio::test]
async fn karel_programs_ignore_the_selected_strategy() {
    let completion = FakeCompletion::answering("should not be asked");
    let explainer = TestUtils::explainer(completion.clone(), FakeAnalyzer::reporting(&[]));
    let context = ExecutionContext {
        is_karel: true,
        title: "StoneMason".to_string(),
    };
    let mut sink: Vec<String> = Vec::new();

    let message = explainer
        .get_error_message("move()", "Line 3: wall ahead", "gpt", &context, &mut sink, None)
        .await
        .unwrap();

    assert_eq!(message, "Line 4: wall ahead");
    assert!(completion.calls().is_empty());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn long_explanation_announces_then_explains() {
    let completion = FakeCompletion::answering("The name x was never assigned a value.");
    let explainer = TestUtils::explainer(completion.clone(), FakeAnalyzer::reporting(&[]));
    let mut sink: Vec<String> = Vec::new();

    let message = explainer
        .get_error_message("print(x)", NAME_ERROR, "explain", &plain_context(), &mut sink, None)
        .await
        .unwrap();

    assert_eq!(
        message,
        format!(
            "{}\r\nThis happened because the name x was never assigned a value.",
            TRIMMED
        )
    );
    assert_eq!(sink, vec!["\r\nThe AI is thinking...".to_string()]);

    let calls = completion.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].max_tokens, 1000);
    assert!(calls[0].prompt.contains("NameError: name 'x' is not defined"));
    assert!(!calls[0].prompt.contains("Traceback"));
}

#[tokio::test]
async fn short_explanation_asks_for_fewer_tokens() {
    let completion = FakeCompletion::answering("X is undefined.");
    let explainer = TestUtils::explainer(completion.clone(), FakeAnalyzer::reporting(&[]));
    let mut sink: Vec<String> = Vec::new();

    let message = explainer
        .explain(StrategyKind::ShortExplanation, "", NAME_ERROR, &mut sink, None)
        .await
        .unwrap();

    assert!(message.ends_with("This happened because x is undefined."));
    assert_eq!(completion.calls()[0].max_tokens, 200);
}

#[tokio::test]
async fn code_explanation_sends_the_program() {
    let completion = FakeCompletion::answering("  You used x before giving it a value.\n");
    let explainer = TestUtils::explainer(completion.clone(), FakeAnalyzer::reporting(&[]));
    let mut sink: Vec<String> = Vec::new();

    let message = explainer
        .get_error_message("print(x)", NAME_ERROR, "gpt", &plain_context(), &mut sink, None)
        .await
        .unwrap();

    assert_eq!(
        message,
        format!("{}\r\nYou used x before giving it a value.", TRIMMED)
    );
    assert_eq!(sink.len(), 1);
    assert!(sink[0].contains("GPT"));

    let calls = completion.calls();
    assert!(calls[0].prompt.contains("print(x)"));
    assert_eq!(calls[0].temperature, Some(0.1));
    assert_eq!(calls[0].max_tokens, 1000);
}

#[tokio::test]
async fn superhero_uses_its_own_voice() {
    let completion = FakeCompletion::answering("Fear not, citizen!");
    let explainer = TestUtils::explainer(completion.clone(), FakeAnalyzer::reporting(&[]));
    let mut sink: Vec<String> = Vec::new();

    explainer
        .get_error_message("print(x)", NAME_ERROR, "superhero", &plain_context(), &mut sink, None)
        .await
        .unwrap();

    assert!(sink[0].contains("superhero"));
    assert!(completion.calls()[0].prompt.contains("superhero's voice"));
}

#[tokio::test]
async fn completion_failures_reach_the_caller() {
    let explainer =
        TestUtils::explainer(FakeCompletion::failing("offline"), FakeAnalyzer::reporting(&[]));
    let mut sink: Vec<String> = Vec::new();

    let result = explainer
        .get_error_message("print(x)", NAME_ERROR, "explain", &plain_context(), &mut sink, None)
        .await;

    assert!(matches!(
        result,
        Err(ExplainError::Completion(AIError::NetworkError(_)))
    ));
    // The interim message was already shown.
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn syntax_hint_skips_the_f_string_false_positive() {
    let analyzer = FakeAnalyzer::reporting(&[
        "This is an invalid string prefix: 'f'.",
        "unexpected indent",
    ]);
    let explainer = TestUtils::explainer(FakeCompletion::answering("unused"), analyzer);
    let mut sink: Vec<String> = Vec::new();

    let message = explainer
        .get_error_message("print(x)", NAME_ERROR, "tigerpython", &plain_context(), &mut sink, None)
        .await
        .unwrap();

    assert_eq!(message, format!("{}\r\nunexpected indent", TRIMMED));
}

#[tokio::test]
async fn syntax_hint_without_findings_prints_the_trace() {
    let analyzer = FakeAnalyzer::reporting(&["invalid string prefix: 'f'"]);
    let explainer = TestUtils::explainer(FakeCompletion::answering("unused"), analyzer);
    let mut sink: Vec<String> = Vec::new();

    let message = explainer
        .explain(StrategyKind::SyntaxHint, "print(x)", NAME_ERROR, &mut sink, None)
        .await
        .unwrap();

    assert_eq!(message, extract_relevant_trace(NAME_ERROR, &PlainStyler));
}

#[tokio::test]
async fn message_board_links_a_matching_post() {
    let explainer = TestUtils::plain_explainer();
    let links = TestUtils::links(&[("/NameError: (global )?name '(.*)' is not defined/", vec!["abc"])]);
    let mut sink: Vec<String> = Vec::new();

    let message = explainer
        .get_error_message(
            "print(x)",
            NAME_ERROR,
            "messageboard",
            &plain_context(),
            &mut sink,
            Some(&links),
        )
        .await
        .unwrap();

    assert!(message.starts_with(TRIMMED));
    assert!(message.ends_with("http://localhost:3000/cip3/forum?post=abc"));
}
