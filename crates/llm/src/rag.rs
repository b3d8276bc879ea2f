//! "Stuff" question answering: every retrieved chunk goes verbatim into a
//! single prompt, in retriever order, and the model answers in one call.

use tracing::{debug, info};

use crate::provider::{LlmError, LlmProvider, Message};

const SYSTEM_PREAMBLE: &str = "Use the following pieces of context to answer the user's question. \n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n";

const DOCUMENT_SEPARATOR: &str = "\n\n";

pub struct StuffQaChain {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl StuffQaChain {
    pub fn new(provider: Box<dyn LlmProvider>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    /// Build from config, creating the Gemini provider.
    pub fn from_config(
        gemini: &pdfqa_core::config::GeminiConfig,
        http: &pdfqa_core::config::HttpConfig,
    ) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(gemini, http)?;
        Ok(Self::new(provider, gemini.temperature, gemini.max_tokens))
    }

    /// Answer `question` grounded on `context`.
    pub async fn answer(&self, question: &str, context: &[String]) -> Result<String, LlmError> {
        let messages = build_messages(question, context);
        info!(context_chunks = context.len(), "running stuff QA chain");

        let answer = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;

        debug!(answer_chars = answer.len(), "QA chain answered");
        Ok(answer)
    }
}

fn build_messages(question: &str, context: &[String]) -> Vec<Message> {
    let mut system = String::from(SYSTEM_PREAMBLE);
    system.push_str(&context.join(DOCUMENT_SEPARATOR));
    vec![Message::system(system), Message::user(question)]
}
