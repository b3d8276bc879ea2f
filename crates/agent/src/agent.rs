use std::sync::Arc;
use std::time::Instant;

use pdfqa_core::FailureKind;
use pdfqa_llm::StuffQaChain;
use pdfqa_vector::Retriever;
use tracing::{error, info};

use crate::action::{decide_action, Action};
use crate::calc;

pub const SUMMARY_PLACEHOLDER: &str = "Here's a brief summary of the PDF content.";

const CALCULATE_KEYWORD: &str = "calculate";

/// User-facing text for a failed retrieval or generation step.
pub fn failure_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Internal => "An internal error occurred while processing your request.",
        FailureKind::Api => "An error occurred with the Google API.",
        FailureKind::Unexpected => "An unexpected error occurred.",
    }
}

/// Answers one chat question against one document index.
pub struct QueryAgent {
    retriever: Retriever,
    chain: Arc<StuffQaChain>,
}

impl QueryAgent {
    pub fn new(retriever: Retriever, chain: Arc<StuffQaChain>) -> Self {
        Self { retriever, chain }
    }

    /// Dispatch `query` and always produce an answer string.
    pub async fn handle_query(&self, query: &str) -> String {
        let start = Instant::now();
        let action = decide_action(query);
        info!(component = "query_agent", action = action.as_str(), "handling query");

        let answer = match action {
            Action::Summarize => SUMMARY_PLACEHOLDER.to_string(),
            Action::Calculate => calculate(query),
            Action::Retrieve => self.answer_from_documents(query).await,
        };

        info!(
            component = "query_agent",
            action = action.as_str(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "query handled"
        );
        answer
    }

    async fn answer_from_documents(&self, query: &str) -> String {
        let context = match self.retriever.retrieve(query).await {
            Ok(context) => context,
            Err(e) => {
                let kind = e.kind();
                error!(
                    component = "query_agent",
                    error_kind = %kind,
                    index = self.retriever.index_name(),
                    error = %e,
                    "retrieval failed"
                );
                return failure_message(kind).to_string();
            }
        };

        match self.chain.answer(query, &context).await {
            Ok(answer) => answer,
            Err(e) => {
                let kind = e.kind();
                error!(component = "query_agent", error_kind = %kind, error = %e, "generation failed");
                failure_message(kind).to_string()
            }
        }
    }
}

/// Evaluate whatever follows the first "calculate" in `query`.
fn calculate(query: &str) -> String {
    let expression = query
        .to_ascii_lowercase()
        .find(CALCULATE_KEYWORD)
        .map(|at| &query[at + CALCULATE_KEYWORD.len()..])
        .unwrap_or_default()
        .trim();

    match calc::evaluate(expression) {
        Ok(value) => value.to_string(),
        Err(e) => format!("Error in calculation: {e}"),
    }
}
