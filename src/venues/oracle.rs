use alloy::primitives::{Address, I256};
use parking_lot::RwLock;

use super::PriceOracle;
use crate::arb::types::OracleQuote;
use crate::error::ExecutionError;

/// In-memory aggregator returning whatever round was last pushed to it.
///
/// Pushing a new price opens a new round, like a Chainlink aggregator receiving a
/// report. Rounds are not journaled: oracle answers are external facts, not state the
/// engine can roll back.
#[derive(Debug)]
pub struct FixedOracle {
    /// Aggregator address
    address: Address,
    /// Latest round
    quote: RwLock<OracleQuote>,
}

impl FixedOracle {
    /// Creates an aggregator whose first round answers `price` with `decimals`.
    #[must_use]
    pub fn new(address: Address, price: I256, decimals: u8, updated_at: u64) -> Self {
        Self {
            address,
            quote: RwLock::new(OracleQuote {
                price,
                decimals,
                round_id: 1,
                updated_at,
            }),
        }
    }

    /// Aggregator address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Publishes a new round with `price`.
    pub fn set_price(&self, price: I256, updated_at: u64) {
        let mut quote = self.quote.write();
        quote.price = price;
        quote.round_id += 1;
        quote.updated_at = updated_at;
    }
}

impl PriceOracle for FixedOracle {
    fn latest_quote(&self) -> Result<OracleQuote, ExecutionError> {
        Ok(self.quote.read().clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::address;

    #[test]
    fn test_set_price_opens_new_round() {
        let oracle = FixedOracle::new(address("feed"), I256::try_from(190_000_000).unwrap(), 8, 10);
        assert_eq!(oracle.latest_quote().unwrap().round_id, 1);

        oracle.set_price(I256::try_from(210_000_000).unwrap(), 20);

        let quote = oracle.latest_quote().unwrap();
        assert_eq!(quote.round_id, 2);
        assert_eq!(quote.price, I256::try_from(210_000_000).unwrap());
        assert_eq!(quote.decimals, 8);
        assert_eq!(quote.updated_at, 20);
    }
}
