use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{errors::ReadError, models::PoolCreationRequest};

/// Reserves of a pair exactly as the pair contract reports them, in canonical token order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairReserves {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
}

/// Pair reserves mapped onto the assets of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reserves {
    pub token_reserve: U256,
    pub pair_asset_reserve: U256,
}

impl Reserves {
    /// Maps `reserve0`/`reserve1` to token and pair asset using the pair's own `token0`.
    ///
    /// The factory sorts the two tokens when creating the pair, so which side the launched
    /// token ends up on depends on the addresses. The pair is asked rather than guessed.
    pub fn from_pair(
        request: &PoolCreationRequest,
        raw: &PairReserves,
    ) -> Result<Self, ReadError> {
        if raw.token0 == request.token && raw.token1 == request.pair_asset {
            Ok(Self { token_reserve: raw.reserve0, pair_asset_reserve: raw.reserve1 })
        } else if raw.token0 == request.pair_asset && raw.token1 == request.token {
            Ok(Self { token_reserve: raw.reserve1, pair_asset_reserve: raw.reserve0 })
        } else {
            Err(ReadError::Inconsistent(format!(
                "pair holds {} and {}, expected {} and {}",
                raw.token0, raw.token1, request.token, request.pair_asset
            )))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token_reserve.is_zero() && self.pair_asset_reserve.is_zero()
    }
}

/// One read of the ledger. Taken fresh before every planning and verification decision and
/// never carried across steps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainState {
    /// Token allowance granted by the owner to the router.
    pub allowance: U256,
    /// Pair address, `None` when the factory reports none.
    pub pair: Option<Address>,
    pub reserves: Option<Reserves>,
    /// LP tokens of the pair held by the run's recipient.
    pub provided_liquidity: U256,
    /// Timestamp of the latest block at read time.
    pub block_timestamp: u64,
}

impl ChainState {
    /// Builds a snapshot, normalizing the zero address the factory uses for "no pair".
    pub fn new(
        allowance: U256,
        pair: Address,
        reserves: Option<Reserves>,
        provided_liquidity: U256,
        block_timestamp: u64,
    ) -> Self {
        let pair = if pair.is_zero() { None } else { Some(pair) };
        Self {
            allowance,
            reserves: pair.and(reserves),
            provided_liquidity: if pair.is_some() { provided_liquidity } else { U256::ZERO },
            pair,
            block_timestamp,
        }
    }

    pub fn pair_exists(&self) -> bool {
        self.pair.is_some()
    }
}
