pub mod action;
pub mod agent;
pub mod calc;

pub use action::{decide_action, should_call_external_search, Action};
pub use agent::{failure_message, QueryAgent, SUMMARY_PLACEHOLDER};
pub use calc::{evaluate, CalcError, Number};
