//! Launches a constant-product liquidity pool for a freshly deployed token.
//!
//! The [`Orchestrator`] reads the ledger, plans the next missing step (approve the router, create
//! the pair, add the first liquidity), submits it through a [`TransactionExecutor`] and only moves
//! on once a fresh read shows the step's effect.
pub mod cli;
pub mod config;
pub mod executor;
pub mod orchestrator;

pub use config::OrchestratorConfig;
pub use executor::TransactionExecutor;
pub use orchestrator::{Orchestrator, RunReport, RunState};
