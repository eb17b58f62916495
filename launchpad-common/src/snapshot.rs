use alloy_primitives::U256;
use tracing::{debug, instrument};

use crate::{
    errors::ReadError,
    models::{ChainState, PoolCreationRequest, Reserves, RunContext},
    traits::ChainStateReader,
};

/// Reads everything planning and verification need into one [`ChainState`].
///
/// Pair level reads are skipped while the factory reports no pair.
#[instrument(level = "debug", skip_all, fields(token = %request.token))]
pub async fn read_chain_state<R>(
    reader: &R,
    request: &PoolCreationRequest,
    ctx: &RunContext,
) -> Result<ChainState, ReadError>
where
    R: ChainStateReader + ?Sized,
{
    let allowance = reader
        .allowance(request.token, ctx.owner, ctx.addresses.router)
        .await?;
    let pair = reader
        .get_pair(ctx.addresses.factory, request.token, request.pair_asset)
        .await?;
    let block_timestamp = reader.block_timestamp().await?;

    let (reserves, provided_liquidity) = if pair.is_zero() {
        (None, U256::ZERO)
    } else {
        let raw = reader.reserves(pair).await?;
        let reserves = Reserves::from_pair(request, &raw)?;
        let liquidity = reader
            .liquidity_balance(pair, ctx.recipient)
            .await?;
        (Some(reserves), liquidity)
    };

    let state = ChainState::new(allowance, pair, reserves, provided_liquidity, block_timestamp);
    debug!(?state, "Read chain state");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Address};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        models::{ContractAddresses, PairReserves},
        traits::MockChainStateReader,
    };

    const OWNER: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const TOKEN: Address = address!("ffffffffffffffffffffffffffffffffffffffff");
    const WETH: Address = address!("0000000000000000000000000000000000000001");
    const PAIR: Address = address!("3333333333333333333333333333333333333333");

    fn ctx() -> RunContext {
        RunContext::new(
            OWNER,
            ContractAddresses::new(
                address!("00000000000000000000000000000000000000fa"),
                address!("00000000000000000000000000000000000000fb"),
                WETH,
            ),
        )
    }

    fn request() -> PoolCreationRequest {
        PoolCreationRequest::new(TOKEN, WETH, U256::from(1000), U256::from(10))
    }

    #[tokio::test]
    async fn test_snapshot_without_pair_skips_pair_reads() {
        let mut reader = MockChainStateReader::new();
        reader
            .expect_allowance()
            .with(eq(TOKEN), eq(OWNER), eq(ctx().addresses.router))
            .returning(|_, _, _| Ok(U256::from(7)));
        reader
            .expect_get_pair()
            .returning(|_, _, _| Ok(Address::ZERO));
        reader
            .expect_block_timestamp()
            .returning(|| Ok(1000));
        reader.expect_reserves().never();
        reader
            .expect_liquidity_balance()
            .never();

        let state = read_chain_state(&reader, &request(), &ctx())
            .await
            .unwrap();

        assert_eq!(state, ChainState::new(U256::from(7), Address::ZERO, None, U256::ZERO, 1000));
    }

    #[tokio::test]
    async fn test_snapshot_maps_reserves_by_token0() {
        let mut reader = MockChainStateReader::new();
        reader
            .expect_allowance()
            .returning(|_, _, _| Ok(U256::from(1000)));
        reader
            .expect_get_pair()
            .returning(|_, _, _| Ok(PAIR));
        reader
            .expect_block_timestamp()
            .returning(|| Ok(1000));
        // WETH sorts before the token, so the token is token1.
        reader
            .expect_reserves()
            .with(eq(PAIR))
            .returning(|_| {
                Ok(PairReserves {
                    token0: WETH,
                    token1: TOKEN,
                    reserve0: U256::from(10),
                    reserve1: U256::from(1000),
                })
            });
        reader
            .expect_liquidity_balance()
            .with(eq(PAIR), eq(OWNER))
            .returning(|_, _| Ok(U256::from(90)));

        let state = read_chain_state(&reader, &request(), &ctx())
            .await
            .unwrap();

        assert_eq!(
            state.reserves,
            Some(Reserves { token_reserve: U256::from(1000), pair_asset_reserve: U256::from(10) })
        );
        assert_eq!(state.provided_liquidity, U256::from(90));
    }

    #[tokio::test]
    async fn test_failed_read_is_not_zero() {
        let mut reader = MockChainStateReader::new();
        reader
            .expect_allowance()
            .returning(|_, _, _| Err(ReadError::Rpc("connection refused".to_string())));

        let res = read_chain_state(&reader, &request(), &ctx()).await;

        assert_eq!(res, Err(ReadError::Rpc("connection refused".to_string())));
    }
}
