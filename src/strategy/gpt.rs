//! Explanations written by the completion service.

use super::OutputSink;
use crate::ai::{AIError, CompletionClient, CompletionRequest};
use crate::normalize::last_line_of_error;
use crate::theme::Styler;
use crate::trace::trim_error;
use tracing::debug;

const CODE_EXPLANATION_TOKENS: u32 = 1000;
const CODE_EXPLANATION_TEMPERATURE: f64 = 0.1;

/// How much the error-only explanation may say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Explanation {
    Short,
    Long,
}

impl Explanation {
    fn max_tokens(self) -> u32 {
        match self {
            Explanation::Short => 200,
            Explanation::Long => 1000,
        }
    }

    fn prompt(self, error: &str) -> String {
        let ask = match self {
            Explanation::Short => "In one sentence, this happened because ",
            Explanation::Long => "This happened because ",
        };
        format!(
            "I ran my Python code and received this error: {}\n{}",
            error, ask
        )
    }
}

/// Who explains a code-aware error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    Tutor,
    Superhero,
}

impl Voice {
    fn waiting_message(self) -> &'static str {
        match self {
            Voice::Tutor => {
                "Your code had an error so we are getting a message from a service called GPT. \
                 It might take a second, thank you for being patient!\r\n"
            }
            Voice::Superhero => {
                "It looks like you have an error, one minute while we ask a superhero \
                 what is going on...\r\n"
            }
        }
    }

    fn request(self) -> &'static str {
        match self {
            Voice::Tutor => {
                "Text explanation of all the most likely reasons that could have caused this error: "
            }
            Voice::Superhero => {
                "Superhero text explanation of all the most likely reasons that could have \
                 caused this error (in a superhero's voice): "
            }
        }
    }
}

fn announce(sink: &mut dyn OutputSink, styler: &dyn Styler, message: &str) {
    sink.write_and_scroll(&format!("\r\n{}", styler.color(&styler.escape(message))));
}

/// `This happened because <completion>`, with the completion's first
/// letter lowercased so the sentence reads on.
pub fn because(completion: &str) -> String {
    let completion = completion.trim();
    let mut chars = completion.chars();
    match chars.next() {
        Some(first) => format!(
            "This happened because {}{}",
            first.to_lowercase(),
            chars.as_str()
        ),
        None => "This happened because".to_string(),
    }
}

/// Ask for an explanation of the error line alone.
pub async fn explanation(
    client: &dyn CompletionClient,
    length: Explanation,
    stderr: &str,
    sink: &mut dyn OutputSink,
    styler: &dyn Styler,
) -> Result<String, AIError> {
    announce(sink, styler, "The AI is thinking...");

    let request = CompletionRequest::new(
        length.prompt(last_line_of_error(stderr)),
        length.max_tokens(),
    );
    debug!(?length, "requesting error explanation");
    let response = client.complete(&request).await?;
    Ok(because(&response))
}

/// Compact trace followed by an error-only explanation.
pub async fn explanation_error(
    client: &dyn CompletionClient,
    length: Explanation,
    stderr: &str,
    sink: &mut dyn OutputSink,
    styler: &dyn Styler,
) -> Result<String, AIError> {
    let text = explanation(client, length, stderr, sink, styler).await?;
    Ok(format!("{}\r\n{}", trim_error(stderr, styler), styler.color(&styler.escape(&text))))
}

/// Compact trace followed by an explanation that also looked at the code.
pub async fn code_explanation_error(
    client: &dyn CompletionClient,
    voice: Voice,
    code: &str,
    stderr: &str,
    sink: &mut dyn OutputSink,
    styler: &dyn Styler,
) -> Result<String, AIError> {
    announce(sink, styler, voice.waiting_message());

    let prompt = format!(
        "Python code: \n{}\nError message: \n{}\n{}\n",
        code,
        last_line_of_error(stderr),
        voice.request()
    );
    let request = CompletionRequest::new(prompt, CODE_EXPLANATION_TOKENS)
        .with_temperature(CODE_EXPLANATION_TEMPERATURE);
    debug!(?voice, "requesting code explanation");
    let response = client.complete(&request).await?;

    Ok(format!(
        "{}\r\n{}",
        trim_error(stderr, styler),
        styler.color(&styler.escape(response.trim()))
    ))
}
