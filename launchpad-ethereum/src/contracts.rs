//! Solidity interfaces of the contracts a launch talks to, and the calldata encoding of each
//! [`Step`].

use alloy::{
    core::sol,
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use launchpad_common::{
    errors::ReadError,
    models::{PoolCreationRequest, RunContext, Step, TransactionIntent},
};

// ERC20 interface subset, see EIP-20: https://eips.ethereum.org/EIPS/eip-20
// Factory, router and pair interfaces follow the Uniswap V2 periphery and core contracts.
sol! {
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }

    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
        function createPair(address tokenA, address tokenB) external returns (address pair);
    }

    interface IUniswapV2Router02 {
        function addLiquidityETH(
            address token,
            uint256 amountTokenDesired,
            uint256 amountTokenMin,
            uint256 amountETHMin,
            address to,
            uint256 deadline
        ) external payable returns (uint256 amountToken, uint256 amountETH, uint256 liquidity);
    }

    interface IUniswapV2Pair {
        function getReserves()
            external
            view
            returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }
}

/// Encode allowance(address,address) call
pub fn encode_allowance(owner: Address, spender: Address) -> Bytes {
    IERC20::allowanceCall { owner, spender }
        .abi_encode()
        .into()
}

/// Encode balanceOf(address) call, valid for ERC20 tokens and LP tokens alike
pub fn encode_balance_of(owner: Address) -> Bytes {
    IERC20::balanceOfCall { owner }
        .abi_encode()
        .into()
}

/// Encode getPair(address,address) call
pub fn encode_get_pair(token_a: Address, token_b: Address) -> Bytes {
    IUniswapV2Factory::getPairCall { tokenA: token_a, tokenB: token_b }
        .abi_encode()
        .into()
}

pub fn encode_get_reserves() -> Bytes {
    IUniswapV2Pair::getReservesCall {}
        .abi_encode()
        .into()
}

pub fn encode_token0() -> Bytes {
    IUniswapV2Pair::token0Call {}
        .abi_encode()
        .into()
}

pub fn encode_token1() -> Bytes {
    IUniswapV2Pair::token1Call {}
        .abi_encode()
        .into()
}

fn decode_error(call: &str, err: impl std::fmt::Display) -> ReadError {
    ReadError::Decode { call: call.to_string(), reason: err.to_string() }
}

/// Decode a uint256 returned by allowance() or balanceOf()
pub(crate) fn decode_uint(call: &str, data: &[u8]) -> Result<U256, ReadError> {
    IERC20::allowanceCall::abi_decode_returns(data).map_err(|e| decode_error(call, e))
}

/// Decode an address returned by getPair(), token0() or token1()
pub(crate) fn decode_address(call: &str, data: &[u8]) -> Result<Address, ReadError> {
    IUniswapV2Pair::token0Call::abi_decode_returns(data).map_err(|e| decode_error(call, e))
}

/// Decode getReserves() return value into (reserve0, reserve1)
pub(crate) fn decode_reserves(data: &[u8]) -> Result<(U256, U256), ReadError> {
    let reserves = IUniswapV2Pair::getReservesCall::abi_decode_returns(data)
        .map_err(|e| decode_error("getReserves", e))?;

    Ok((U256::from(reserves.reserve0), U256::from(reserves.reserve1)))
}

/// Translates a step into the contract call that performs it.
///
/// Approval goes to the token with the router as spender, pair creation to the factory and the
/// deposit to the router's `addLiquidityETH`, with the pair asset amount attached as value.
pub fn encode_step(
    step: &Step,
    request: &PoolCreationRequest,
    ctx: &RunContext,
) -> TransactionIntent {
    match step {
        Step::ApproveSpending { amount } => TransactionIntent {
            to: request.token,
            data: IERC20::approveCall { spender: ctx.addresses.router, value: *amount }
                .abi_encode()
                .into(),
            value: U256::ZERO,
        },
        Step::CreatePair => TransactionIntent {
            to: ctx.addresses.factory,
            data: IUniswapV2Factory::createPairCall {
                tokenA: request.token,
                tokenB: request.pair_asset,
            }
            .abi_encode()
            .into(),
            value: U256::ZERO,
        },
        Step::AddLiquidity {
            token_amount,
            pair_asset_amount,
            min_token_amount,
            min_pair_asset_amount,
            deadline,
        } => TransactionIntent {
            to: ctx.addresses.router,
            data: IUniswapV2Router02::addLiquidityETHCall {
                token: request.token,
                amountTokenDesired: *token_amount,
                amountTokenMin: *min_token_amount,
                amountETHMin: *min_pair_asset_amount,
                to: ctx.recipient,
                deadline: U256::from(*deadline),
            }
            .abi_encode()
            .into(),
            value: *pair_asset_amount,
        },
    }
}
