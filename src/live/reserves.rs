use alloy::primitives::{Address, U256};
use alloy::sol;
use eyre::Result;
use log::debug;

use crate::arb::types::{AssetPair, ReserveSnapshot};
use crate::error::ExecutionError;
use crate::utils::app_context::AppContext;

sol! {
    #[sol(rpc)]
    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }
}

/// Reads the reserves of the Uniswap V2 pair for `pair` from a live node.
///
/// # Arguments
/// * `ctx` - Application context
/// * `factory` - Uniswap V2 factory address
/// * `pair` - Assets to look up
///
/// # Returns
/// * Reserves oriented to the pair's (A, B) order
///
/// # Errors
/// * `SourceUnavailable` if the factory has no pair or a reserve is zero
/// * If any contract call fails
pub async fn fetch_reserves(
    ctx: &AppContext,
    factory: Address,
    pair: &AssetPair,
) -> Result<ReserveSnapshot> {
    let factory = IUniswapV2Factory::new(factory, &ctx.provider);
    let pool = factory.getPair(pair.a, pair.b).call().await?._0;
    if pool.is_zero() {
        return Err(ExecutionError::SourceUnavailable { pair: *pair }.into());
    }
    debug!("live::reserves: {pair} trades in {pool}");

    let contract = IUniswapV2Pair::new(pool, &ctx.provider);
    let (token0, reserves) = futures::try_join!(
        async { contract.token0().call().await },
        async { contract.getReserves().call().await },
    )?;

    Ok(orient(
        pair,
        token0._0,
        U256::from(reserves.reserve0),
        U256::from(reserves.reserve1),
        u64::from(reserves.blockTimestampLast),
    )?)
}

/// Maps the pool's (token0, token1) reserves onto (A, B)
pub(crate) fn orient(
    pair: &AssetPair,
    token0: Address,
    reserve0: U256,
    reserve1: U256,
    timestamp: u64,
) -> Result<ReserveSnapshot, ExecutionError> {
    let (reserve_a, reserve_b) = if token0 == pair.a {
        (reserve0, reserve1)
    } else if token0 == pair.b {
        (reserve1, reserve0)
    } else {
        return Err(ExecutionError::SourceUnavailable { pair: *pair });
    };
    ReserveSnapshot::new(reserve_a, reserve_b, timestamp)
        .ok_or(ExecutionError::SourceUnavailable { pair: *pair })
}
