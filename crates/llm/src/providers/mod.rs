pub mod gemini;

use pdfqa_core::config::{GeminiConfig, HttpConfig};

use crate::provider::{LlmError, LlmProvider};

/// Create the generation provider from config.
pub fn create_provider(
    gemini: &GeminiConfig,
    http: &HttpConfig,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    let api_key = gemini
        .api_key
        .as_ref()
        .ok_or_else(|| LlmError::NotConfigured("GOOGLE_API_KEY not set".into()))?;
    Ok(Box::new(gemini::GeminiProvider::new(
        api_key.clone(),
        gemini.chat_model.clone(),
        &gemini.base_url,
        http.timeout(),
    )))
}
