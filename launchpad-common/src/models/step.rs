use std::fmt;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// One on-chain operation of a launch. Steps are data; the orchestrator interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Let the router spend `amount` of the token on behalf of the owner.
    ApproveSpending { amount: U256 },
    /// Deploy the token / pair asset pair through the factory.
    CreatePair,
    /// Deposit both assets through the router.
    AddLiquidity {
        token_amount: U256,
        pair_asset_amount: U256,
        min_token_amount: U256,
        min_pair_asset_amount: U256,
        /// Unix timestamp after which the router rejects the deposit.
        deadline: u64,
    },
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepKind {
    ApproveSpending,
    CreatePair,
    AddLiquidity,
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::ApproveSpending { .. } => StepKind::ApproveSpending,
            Step::CreatePair => StepKind::CreatePair,
            Step::AddLiquidity { .. } => StepKind::AddLiquidity,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::ApproveSpending { amount } => write!(f, "ApproveSpending({amount})"),
            Step::CreatePair => write!(f, "CreatePair"),
            Step::AddLiquidity {
                token_amount,
                pair_asset_amount,
                min_token_amount,
                min_pair_asset_amount,
                deadline,
            } => write!(
                f,
                "AddLiquidity(token: {token_amount} min {min_token_amount}, pair asset: \
                 {pair_asset_amount} min {min_pair_asset_amount}, deadline {deadline})"
            ),
        }
    }
}

/// An unsigned operation handed to the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub to: Address,
    pub data: Bytes,
    /// Native value attached to the call.
    pub value: U256,
}

/// Reference to a submitted transaction.
pub type TxHandle = TxHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TxOutcome {
    Pending,
    Confirmed,
    Reverted,
    TimedOut,
}

/// Bookkeeping for one submitted step. Used for reporting only; whether the step took effect is
/// always decided by reading the ledger again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub step: Step,
    pub handle: TxHandle,
    pub submitted_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub outcome: TxOutcome,
    /// Revert reason reported by the ledger, if any.
    pub revert_reason: Option<String>,
}

impl TransactionRecord {
    pub fn pending(step: Step, handle: TxHandle, submitted_at: DateTime<Utc>) -> Self {
        Self {
            step,
            handle,
            submitted_at,
            confirmed_at: None,
            outcome: TxOutcome::Pending,
            revert_reason: None,
        }
    }

    pub fn confirm(&mut self, at: DateTime<Utc>) {
        self.outcome = TxOutcome::Confirmed;
        self.confirmed_at = Some(at);
    }

    pub fn revert(&mut self, reason: String) {
        self.outcome = TxOutcome::Reverted;
        self.revert_reason = Some(reason);
    }

    pub fn time_out(&mut self) {
        self.outcome = TxOutcome::TimedOut;
    }
}
