use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use log::debug;

use super::{PriceOracle, SwapVenue};
use crate::arb::types::{AssetPair, QuoteDirection};
use crate::chain::{Asset, Ledger};
use crate::error::ExecutionError;
use crate::utils::constants::SCALE;

/// Route on the desk: the feed pricing `token_in` in units of `token_out`
#[derive(Clone)]
struct Route {
    /// Feed used for this route
    oracle: Arc<dyn PriceOracle>,
    /// Direction the feed quotes, for error reporting
    direction: QuoteDirection,
}

/// Exit venue that fills at the oracle price out of its own inventory.
///
/// `amount_out = amount_in * price / 1e18`, where `price` is the route's oracle answer
/// cast to 18 decimals. Inventory is the desk account's ledger balance.
#[derive(Clone)]
pub struct OracleDesk {
    /// Venue address
    address: Address,
    /// Account holding the desk inventory
    account: Address,
    /// Routes keyed by (`token_in`, `token_out`)
    routes: HashMap<(Address, Address), Route>,
}

impl OracleDesk {
    /// Creates a desk with no routes.
    #[must_use]
    pub fn new(address: Address, account: Address) -> Self {
        Self {
            address,
            account,
            routes: HashMap::new(),
        }
    }

    /// Venue address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Account holding the inventory.
    #[must_use]
    pub const fn account(&self) -> Address {
        self.account
    }

    /// Prices both directions of `pair` with the given feeds.
    pub fn add_pair(
        &mut self,
        pair: &AssetPair,
        a_to_b: Arc<dyn PriceOracle>,
        b_to_a: Arc<dyn PriceOracle>,
    ) {
        self.routes.insert(
            (pair.a, pair.b),
            Route {
                oracle: a_to_b,
                direction: QuoteDirection::AToB,
            },
        );
        self.routes.insert(
            (pair.b, pair.a),
            Route {
                oracle: b_to_a,
                direction: QuoteDirection::BToA,
            },
        );
    }

    /// Quote for selling `amount_in` of `token_in` for `token_out`.
    ///
    /// # Errors
    /// * `SourceUnavailable` if the desk has no route for the tokens
    /// * `StalePrice` if the route's feed answers a non-positive price
    /// * `MathOverflow` if the product overflows
    pub fn amount_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, ExecutionError> {
        let route = self
            .routes
            .get(&(token_in, token_out))
            .ok_or(ExecutionError::SourceUnavailable {
                pair: AssetPair::new(token_in, token_out),
            })?;
        let price = route
            .oracle
            .latest_quote()?
            .scaled_price(route.direction)?;

        amount_in
            .checked_mul(price)
            .map(|product| product / SCALE)
            .ok_or(ExecutionError::MathOverflow {
                context: "desk fill",
            })
    }
}

impl Debug for OracleDesk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleDesk")
            .field("address", &self.address)
            .field("account", &self.account)
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SwapVenue for OracleDesk {
    fn swap(
        &self,
        ledger: &mut Ledger,
        trader: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, ExecutionError> {
        let amount_out = self.amount_out(token_in, token_out, amount_in)?;

        let trade_failed = |source| ExecutionError::TradeFailed {
            venue: self.address,
            source,
        };
        ledger
            .transfer(trader, self.account, Asset::Token(token_in), amount_in)
            .map_err(trade_failed)?;
        ledger
            .transfer(self.account, trader, Asset::Token(token_out), amount_out)
            .map_err(trade_failed)?;

        debug!("venues::desk: filled {amount_in} {token_in} for {amount_out} {token_out}");
        Ok(amount_out)
    }
}
