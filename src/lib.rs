//! revu: streaming AI code review service and client (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod client;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod env;
pub mod github;
pub mod intake;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod session;
