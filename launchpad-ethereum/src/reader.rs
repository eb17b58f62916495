use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use launchpad_common::{errors::ReadError, models::PairReserves, traits::ChainStateReader};
use tracing::{instrument, trace};

use crate::{
    classifier::classify_read_error,
    contracts::{
        decode_address, decode_reserves, decode_uint, encode_allowance, encode_balance_of,
        encode_get_pair, encode_get_reserves, encode_token0, encode_token1,
    },
    rpc::EthereumRpcClient,
};

/// [`ChainStateReader`] backed by `eth_call`s against the latest block.
#[derive(Clone, Debug)]
pub struct RpcChainStateReader {
    client: EthereumRpcClient,
}

impl RpcChainStateReader {
    pub fn new(client: EthereumRpcClient) -> Self {
        Self { client }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ReadError> {
        let output = self
            .client
            .eth_call(to, data)
            .await
            .map_err(|e| classify_read_error(&e))?;
        trace!(%to, %output, "eth_call returned");
        Ok(output)
    }
}

#[async_trait]
impl ChainStateReader for RpcChainStateReader {
    #[instrument(level = "debug", skip(self))]
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ReadError> {
        let output = self
            .call(token, encode_allowance(owner, spender))
            .await?;
        decode_uint("allowance", &output)
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ReadError> {
        let output = self
            .call(factory, encode_get_pair(token_a, token_b))
            .await?;
        decode_address("getPair", &output)
    }

    #[instrument(level = "debug", skip(self))]
    async fn reserves(&self, pair: Address) -> Result<PairReserves, ReadError> {
        let (reserve0, reserve1) = decode_reserves(
            &self
                .call(pair, encode_get_reserves())
                .await?,
        )?;
        let token0 = decode_address("token0", &self.call(pair, encode_token0()).await?)?;
        let token1 = decode_address("token1", &self.call(pair, encode_token1()).await?)?;

        Ok(PairReserves { token0, token1, reserve0, reserve1 })
    }

    #[instrument(level = "debug", skip(self))]
    async fn liquidity_balance(&self, pair: Address, holder: Address) -> Result<U256, ReadError> {
        let output = self
            .call(pair, encode_balance_of(holder))
            .await?;
        decode_uint("balanceOf", &output)
    }

    #[instrument(level = "debug", skip(self))]
    async fn block_timestamp(&self) -> Result<u64, ReadError> {
        let (_, timestamp) = self
            .client
            .get_latest_block()
            .await
            .map_err(|e| classify_read_error(&e))?;
        Ok(timestamp)
    }
}
