use alloy::primitives::{Address, I256, U256};
use alloy::sol;
use eyre::Result;
use log::debug;

use crate::arb::types::{OracleQuote, QuoteDirection};
use crate::error::ExecutionError;
use crate::utils::app_context::AppContext;

sol! {
    #[sol(rpc)]
    interface AggregatorV3Interface {
        function decimals() external view returns (uint8);
        function latestRoundData() external view returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound);
    }
}

/// Reads the latest round of a Chainlink aggregator.
///
/// # Arguments
/// * `ctx` - Application context
/// * `aggregator` - Aggregator (or proxy) address
/// * `direction` - Which way the feed quotes the pair, for error reporting
///
/// # Errors
/// * `StalePrice` if the answer is not positive
/// * If any contract call fails
pub async fn fetch_quote(
    ctx: &AppContext,
    aggregator: Address,
    direction: QuoteDirection,
) -> Result<OracleQuote> {
    let feed = AggregatorV3Interface::new(aggregator, &ctx.provider);
    let (decimals, round) = futures::try_join!(
        async { feed.decimals().call().await },
        async { feed.latestRoundData().call().await },
    )?;

    let quote = to_quote(
        direction,
        round.answer,
        decimals._0,
        round.roundId.to::<u128>(),
        round.updatedAt,
    )?;
    debug!(
        "live::feeds: {direction} {aggregator} answered {} in round {}",
        quote.price, quote.round_id
    );
    Ok(quote)
}

/// Validates a raw round and converts it
pub(crate) fn to_quote(
    direction: QuoteDirection,
    answer: I256,
    decimals: u8,
    round_id: u128,
    updated_at: U256,
) -> Result<OracleQuote, ExecutionError> {
    let quote = OracleQuote {
        price: answer,
        decimals,
        round_id,
        updated_at: updated_at.saturating_to::<u64>(),
    };
    if !quote.is_valid() {
        return Err(ExecutionError::StalePrice {
            direction,
            price: answer,
        });
    }
    Ok(quote)
}
