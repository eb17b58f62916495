pub mod request;
pub mod state;
pub mod step;

use std::str::FromStr;

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub use request::PoolCreationRequest;
pub use state::{ChainState, PairReserves, Reserves};
pub use step::{Step, StepKind, TransactionIntent, TransactionRecord, TxHandle, TxOutcome};

/// Networks with a known constant-product factory/router deployment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Chain {
    #[default]
    Ethereum,
    Arbitrum,
    Base,
    Bsc,
}

impl Chain {
    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Arbitrum => 42161,
            Chain::Base => 8453,
            Chain::Bsc => 56,
        }
    }

    /// Maps the identifier returned by `eth_chainId` to a supported chain.
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Chain::Ethereum),
            42161 => Some(Chain::Arbitrum),
            8453 => Some(Chain::Base),
            56 => Some(Chain::Bsc),
            _ => None,
        }
    }
}

/// The contracts a launch interacts with on one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Pair factory exposing `getPair` / `createPair`.
    pub factory: Address,
    /// Router exposing `addLiquidityETH`; this is the spender that gets approved.
    pub router: Address,
    /// Wrapped native asset the router pairs against.
    pub wrapped_native: Address,
}

impl ContractAddresses {
    pub fn new(factory: Address, router: Address, wrapped_native: Address) -> Self {
        Self { factory, router, wrapped_native }
    }

    /// Canonical V2 deployments. Uniswap V2 on Ethereum, Arbitrum and Base, PancakeSwap V2 on
    /// BSC.
    pub fn for_chain(chain: Chain) -> Self {
        match chain {
            Chain::Ethereum => Self::new(
                address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f"),
                address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
                address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            ),
            Chain::Arbitrum => Self::new(
                address!("f1D7CC64Fb4452F05c498126312eBE29f30Fbcf9"),
                address!("4752ba5DBc23f44D87826276BF6Fd6b1C372aD24"),
                address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
            ),
            Chain::Base => Self::new(
                address!("8909Dc15e40173Ff4699343b6eB8132c65e18eC6"),
                address!("4752ba5DBc23f44D87826276BF6Fd6b1C372aD24"),
                address!("4200000000000000000000000000000000000006"),
            ),
            Chain::Bsc => Self::new(
                address!("cA143Ce32Fe78f1f7019d7d551a6402fC5350c73"),
                address!("10ED43C718714eb63d5aA57B78B54704E256024E"),
                address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
            ),
        }
    }

    pub fn with_factory(mut self, factory: Address) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_router(mut self, router: Address) -> Self {
        self.router = router;
        self
    }

    pub fn with_wrapped_native(mut self, wrapped_native: Address) -> Self {
        self.wrapped_native = wrapped_native;
        self
    }
}

/// Who is launching and against which contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// The account that signs every step and owns the token balance.
    pub owner: Address,
    /// Receiver of the LP tokens minted by `AddLiquidity`.
    pub recipient: Address,
    pub addresses: ContractAddresses,
}

impl RunContext {
    pub fn new(owner: Address, addresses: ContractAddresses) -> Self {
        Self { owner, recipient: owner, addresses }
    }

    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = recipient;
        self
    }
}

/// Parses a hex address, accepting it with or without the `0x` prefix.
pub fn parse_address(value: &str) -> Result<Address, String> {
    let trimmed = value.trim();
    let prefixed = if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        trimmed.to_string()
    } else {
        format!("0x{trimmed}")
    };
    Address::from_str(&prefixed).map_err(|e| format!("Invalid address {value}: {e}"))
}
