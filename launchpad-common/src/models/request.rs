use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::errors::LaunchError;

/// Basis points denominator, 100%.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// What the token creator asked for. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCreationRequest {
    /// The freshly deployed token.
    pub token: Address,
    /// The asset to pair against, the wrapped native asset of the chain.
    pub pair_asset: Address,
    /// Token amount to deposit, in the token's smallest unit.
    pub desired_token_amount: U256,
    /// Pair asset amount to deposit, attached as native value.
    pub desired_pair_asset_amount: U256,
    /// Pool fee in hundredths of a basis point. Constant-product factories only know one tier.
    pub fee_tier: u32,
    /// Tolerated price movement, in basis points, applied to both minimum amounts.
    pub slippage_bps: u16,
    /// Seconds added to the latest block timestamp to form the liquidity deadline.
    pub deadline_offset_secs: u64,
}

impl PoolCreationRequest {
    pub fn new(
        token: Address,
        pair_asset: Address,
        desired_token_amount: U256,
        desired_pair_asset_amount: U256,
    ) -> Self {
        Self {
            token,
            pair_asset,
            desired_token_amount,
            desired_pair_asset_amount,
            fee_tier: 3000,
            slippage_bps: 500,
            deadline_offset_secs: 1200,
        }
    }

    pub fn with_fee_tier(mut self, fee_tier: u32) -> Self {
        self.fee_tier = fee_tier;
        self
    }

    pub fn with_slippage_bps(mut self, slippage_bps: u16) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    pub fn with_deadline_offset_secs(mut self, deadline_offset_secs: u64) -> Self {
        self.deadline_offset_secs = deadline_offset_secs;
        self
    }

    /// Rejects malformed requests before any chain interaction.
    pub fn validate(&self) -> Result<(), LaunchError> {
        if self.token.is_zero() {
            return Err(LaunchError::InvalidRequest("token address is missing".to_string()));
        }
        if self.pair_asset.is_zero() {
            return Err(LaunchError::InvalidRequest("pair asset address is missing".to_string()));
        }
        if self.token == self.pair_asset {
            return Err(LaunchError::InvalidRequest(
                "token and pair asset must be different".to_string(),
            ));
        }
        if self.desired_token_amount.is_zero() && self.desired_pair_asset_amount.is_zero() {
            return Err(LaunchError::InvalidRequest("both desired amounts are zero".to_string()));
        }
        if self.desired_pair_asset_amount.is_zero() {
            return Err(LaunchError::InvalidRequest(
                "pair asset amount must be positive".to_string(),
            ));
        }
        if u64::from(self.slippage_bps) > BPS_DENOMINATOR {
            return Err(LaunchError::InvalidRequest(format!(
                "slippage of {} bps exceeds {BPS_DENOMINATOR} bps",
                self.slippage_bps
            )));
        }
        if self.deadline_offset_secs == 0 {
            return Err(LaunchError::InvalidRequest("deadline offset must be positive".to_string()));
        }
        Ok(())
    }
}
