use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use pdfqa_agent::{failure_message, should_call_external_search, QueryAgent};
use pdfqa_vector::IndexName;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::render_page;
use crate::state::AppState;

pub const NO_SEARCH_NEEDED: &str = "No need to call the VectorDB for this query.";

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub user_question: Option<String>,
}

pub async fn chat_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if bound_index(&state, &headers).await.is_none() {
        return Redirect::to("/").into_response();
    }
    render_page(StatusCode::OK, state.templates.chat(None))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    form: Result<Form<ChatForm>, FormRejection>,
) -> Response {
    // A missing session wins over an unreadable form.
    let Some(index) = bound_index(&state, &headers).await else {
        return Redirect::to("/").into_response();
    };

    let question = match form {
        Ok(Form(form)) => form.user_question.unwrap_or_default(),
        Err(rejection) => {
            debug!(component = "chat", error = %rejection, "unreadable chat form");
            String::new()
        }
    };
    if question.is_empty() {
        return render_page(StatusCode::OK, state.templates.chat(None));
    }

    let answer = answer(&state, &index, &question).await;
    render_page(StatusCode::OK, state.templates.chat(Some(&answer)))
}

async fn bound_index(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let session_id = state.sessions.session_id(headers)?;
    state.sessions.index_name(&session_id).await
}

async fn answer(state: &AppState, index: &str, question: &str) -> String {
    if !should_call_external_search(question) {
        info!(component = "chat", "trivial query, skipping retrieval");
        return NO_SEARCH_NEEDED.to_string();
    }

    let retriever = match IndexName::parse(index) {
        Ok(name) => state.gateway.resolve(&name).await,
        Err(e) => Err(e),
    };
    match retriever {
        Ok(retriever) => {
            QueryAgent::new(retriever, state.qa_chain.clone())
                .handle_query(question)
                .await
        }
        Err(e) => {
            let kind = e.kind();
            error!(component = "chat", error_kind = %kind, index, error = %e, "could not resolve index");
            failure_message(kind).to_string()
        }
    }
}
