use log::debug;

use super::types::{AssetPair, OracleQuote, QuoteDirection, ReserveSnapshot};
use crate::chain::Ledger;
use crate::error::ExecutionError;
use crate::venues::{LiquidityVenue, PriceOracle};

/// Reads the current reserves of the pool for `pair`, oriented to (A, B).
///
/// Always a fresh read: snapshots are never cached between invocations.
///
/// # Errors
/// * `SourceUnavailable` if the venue has no pool for the pair or one side is empty
pub fn read_reserves(
    venue: &dyn LiquidityVenue,
    ledger: &Ledger,
    pair: &AssetPair,
) -> Result<ReserveSnapshot, ExecutionError> {
    let snapshot = venue.reserves(ledger, pair)?;
    debug!(
        "arb::readers: reserves {pair} = ({}, {}) at {}",
        snapshot.reserve_a, snapshot.reserve_b, snapshot.timestamp
    );
    Ok(snapshot)
}

/// Reads the latest round of the feed quoting `direction`.
///
/// Only the sign of the answer is checked; the round's age is not.
///
/// # Errors
/// * `StalePrice` if the answer is zero or negative
/// * whatever the feed itself returns
pub fn read_quote(
    oracle: &dyn PriceOracle,
    direction: QuoteDirection,
) -> Result<OracleQuote, ExecutionError> {
    let quote = oracle.latest_quote()?;
    if !quote.is_valid() {
        return Err(ExecutionError::StalePrice {
            direction,
            price: quote.price,
        });
    }
    debug!(
        "arb::readers: oracle {direction} = {} ({} decimals, round {})",
        quote.price, quote.decimals, quote.round_id
    );
    Ok(quote)
}
