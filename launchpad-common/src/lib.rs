//! Models, collaborator traits and the step planner shared by the launchpad crates.

pub mod errors;
pub mod models;
pub mod planner;
pub mod snapshot;
pub mod traits;

pub use alloy_primitives::{Address, Bytes, TxHash, U256};
