use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use log::debug;

use super::{LiquidityVenue, SwapVenue};
use crate::arb::types::{AssetPair, ReserveSnapshot};
use crate::chain::{Asset, Ledger};
use crate::error::ExecutionError;
use crate::utils::constants::{BPS_DENOMINATOR, UNISWAP_V2_FEE_BPS};

/// Uniswap V2 style venue: a set of constant-product pools, one per token pair.
///
/// Pool reserves are the pool account's token balances in the ledger, so swaps are
/// journaled and roll back with the invocation.
#[derive(Debug, Clone)]
pub struct ConstantProductVenue {
    /// Venue (factory) address
    address: Address,
    /// Pool account per token pair, keyed in ascending token order
    pools: HashMap<(Address, Address), Address>,
    /// Swap fee in basis points
    fee_bps: u64,
}

impl ConstantProductVenue {
    /// Creates an empty venue charging the Uniswap V2 fee of 30 bps.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self::with_fee(address, UNISWAP_V2_FEE_BPS)
    }

    /// Creates an empty venue with a custom swap fee.
    #[must_use]
    pub fn with_fee(address: Address, fee_bps: u64) -> Self {
        Self {
            address,
            pools: HashMap::new(),
            fee_bps: fee_bps.min(BPS_DENOMINATOR),
        }
    }

    /// Venue address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Registers `pool` as the pool account for `token0`/`token1`.
    pub fn add_pool(&mut self, token0: Address, token1: Address, pool: Address) {
        self.pools.insert(Self::key(token0, token1), pool);
    }

    /// Pool account for the two tokens, in either order.
    #[must_use]
    pub fn pool(&self, token0: Address, token1: Address) -> Option<Address> {
        self.pools.get(&Self::key(token0, token1)).copied()
    }

    /// Constant-product output for `amount_in`, fee included.
    ///
    /// `amount_in * (10000 - fee) * reserve_out / (reserve_in * 10000 + amount_in * (10000 - fee))`
    ///
    /// # Errors
    /// * `MathOverflow` if an intermediate product overflows
    pub fn amount_out(
        &self,
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> Result<U256, ExecutionError> {
        if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
            return Ok(U256::ZERO);
        }
        let overflow = || ExecutionError::MathOverflow {
            context: "constant product amount out",
        };

        let denominator_bps = U256::from(BPS_DENOMINATOR);
        let amount_in_with_fee = amount_in
            .checked_mul(U256::from(BPS_DENOMINATOR - self.fee_bps))
            .ok_or_else(overflow)?;
        let numerator = amount_in_with_fee
            .checked_mul(reserve_out)
            .ok_or_else(overflow)?;
        let denominator = reserve_in
            .checked_mul(denominator_bps)
            .and_then(|r| r.checked_add(amount_in_with_fee))
            .ok_or_else(overflow)?;

        Ok(numerator / denominator)
    }

    /// Pools are stored under the ascending token order, like Uniswap's `token0`/`token1`
    fn key(token0: Address, token1: Address) -> (Address, Address) {
        if token0 < token1 {
            (token0, token1)
        } else {
            (token1, token0)
        }
    }
}

impl SwapVenue for ConstantProductVenue {
    fn swap(
        &self,
        ledger: &mut Ledger,
        trader: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, ExecutionError> {
        let pair = AssetPair::new(token_in, token_out);
        let snapshot = self.reserves(ledger, &pair)?;
        let pool = self
            .pool(token_in, token_out)
            .ok_or(ExecutionError::SourceUnavailable { pair })?;

        let amount_out = self.amount_out(amount_in, snapshot.reserve_a, snapshot.reserve_b)?;

        let trade_failed = |source| ExecutionError::TradeFailed {
            venue: self.address,
            source,
        };
        ledger
            .transfer(trader, pool, Asset::Token(token_in), amount_in)
            .map_err(trade_failed)?;
        ledger
            .transfer(pool, trader, Asset::Token(token_out), amount_out)
            .map_err(trade_failed)?;

        debug!(
            "venues::constant_product: {trader} swapped {amount_in} {token_in} for {amount_out} {token_out} in {pool}"
        );
        Ok(amount_out)
    }
}

impl LiquidityVenue for ConstantProductVenue {
    fn reserves(&self, ledger: &Ledger, pair: &AssetPair) -> Result<ReserveSnapshot, ExecutionError> {
        let pool = self
            .pool(pair.a, pair.b)
            .ok_or(ExecutionError::SourceUnavailable { pair: *pair })?;

        ReserveSnapshot::new(
            ledger.balance(pool, Asset::Token(pair.a)),
            ledger.balance(pool, Asset::Token(pair.b)),
            ledger.timestamp(),
        )
        .ok_or(ExecutionError::SourceUnavailable { pair: *pair })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::address;

    fn venue_with_pool(reserve_a: u64, reserve_b: u64) -> (ConstantProductVenue, Ledger, AssetPair) {
        let pair = AssetPair::new(address("A"), address("B"));
        let pool = address("pool");
        let mut venue = ConstantProductVenue::new(address("factory"));
        venue.add_pool(pair.b, pair.a, pool);

        let mut ledger = Ledger::new(42);
        ledger.mint(pool, Asset::Token(pair.a), U256::from(reserve_a)).unwrap();
        ledger.mint(pool, Asset::Token(pair.b), U256::from(reserve_b)).unwrap();
        (venue, ledger, pair)
    }

    #[test]
    fn test_reserves_oriented_to_pair() {
        let (venue, ledger, pair) = venue_with_pool(1_000_000, 2_000_000);

        let snapshot = venue.reserves(&ledger, &pair).unwrap();
        assert_eq!(snapshot.reserve_a, U256::from(1_000_000));
        assert_eq!(snapshot.reserve_b, U256::from(2_000_000));
        assert_eq!(snapshot.timestamp, 42);

        let reversed = venue.reserves(&ledger, &pair.reversed()).unwrap();
        assert_eq!(reversed.reserve_a, U256::from(2_000_000));
        assert_eq!(reversed.reserve_b, U256::from(1_000_000));
    }

    #[test]
    fn test_reserves_missing_pool() {
        let (venue, ledger, pair) = venue_with_pool(1, 1);
        let other = AssetPair::new(pair.a, address("C"));
        assert_eq!(
            venue.reserves(&ledger, &other),
            Err(ExecutionError::SourceUnavailable { pair: other })
        );
    }

    #[test]
    fn test_reserves_empty_side_is_unusable() {
        let (venue, ledger, pair) = venue_with_pool(1_000, 0);
        assert_eq!(
            venue.reserves(&ledger, &pair),
            Err(ExecutionError::SourceUnavailable { pair })
        );
    }

    #[test]
    fn test_amount_out() {
        let venue = ConstantProductVenue::new(address("factory"));
        for (amount_in, reserve_in, reserve_out, expected) in &[
            // in,    reserve in, reserve out, out
            (10, 100, 200, 18),
            (20, 100, 200, 33),
            (10_000, 1_000_000, 2_000_000, 19_743),
            (0, 1_000_000, 2_000_000, 0),
        ] {
            assert_eq!(
                venue
                    .amount_out(
                        U256::from(*amount_in),
                        U256::from(*reserve_in),
                        U256::from(*reserve_out)
                    )
                    .unwrap(),
                U256::from(*expected)
            );
        }
    }

    #[test]
    fn test_swap_moves_reserves() {
        let (venue, mut ledger, pair) = venue_with_pool(1_000_000, 2_000_000);
        let trader = address("trader");
        ledger.mint(trader, Asset::Token(pair.a), U256::from(10_000)).unwrap();

        let out = venue
            .swap(&mut ledger, trader, pair.a, pair.b, U256::from(10_000))
            .unwrap();

        assert_eq!(out, U256::from(19_743));
        assert_eq!(ledger.balance(trader, Asset::Token(pair.a)), U256::ZERO);
        assert_eq!(ledger.balance(trader, Asset::Token(pair.b)), U256::from(19_743));
        let snapshot = venue.reserves(&ledger, &pair).unwrap();
        assert_eq!(snapshot.reserve_a, U256::from(1_010_000));
        assert_eq!(snapshot.reserve_b, U256::from(2_000_000 - 19_743));
    }

    #[test]
    fn test_swap_without_funds_fails() {
        let (venue, mut ledger, pair) = venue_with_pool(1_000_000, 2_000_000);
        let trader = address("trader");

        let err = venue
            .swap(&mut ledger, trader, pair.a, pair.b, U256::from(1))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::TradeFailed { .. }));
    }
}
