//! Web session layer: upload form, chat page and health probe.

pub mod api;
pub mod pipeline;
pub mod router;
pub mod session;
pub mod startup;
pub mod state;
pub mod templates;

pub use router::build_router;
pub use state::AppState;
