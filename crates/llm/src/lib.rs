pub mod provider;
pub mod providers;
pub mod rag;

pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::gemini::GeminiProvider;
pub use rag::StuffQaChain;
