use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use alloy::primitives::Address;

use super::{LendingVenue, LiquidityVenue, PriceOracle, SwapVenue, VenueKind};
use crate::error::ExecutionError;

/// Resolves configured venue addresses to their implementations.
///
/// The engine looks venues up on every invocation, so pointing the configuration at
/// another registered address takes effect on the next call.
#[derive(Clone, Default)]
pub struct VenueRegistry {
    /// Liquidity venues by address
    liquidity: HashMap<Address, Arc<dyn LiquidityVenue>>,
    /// Price feeds by address
    oracles: HashMap<Address, Arc<dyn PriceOracle>>,
    /// Lending venues by address
    lenders: HashMap<Address, Arc<dyn LendingVenue>>,
    /// Exit venues by address
    exits: HashMap<Address, Arc<dyn SwapVenue>>,
}

impl VenueRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a liquidity venue, replacing any venue at the same address.
    pub fn add_liquidity(&mut self, address: Address, venue: Arc<dyn LiquidityVenue>) {
        self.liquidity.insert(address, venue);
    }

    /// Registers a price feed.
    pub fn add_oracle(&mut self, address: Address, oracle: Arc<dyn PriceOracle>) {
        self.oracles.insert(address, oracle);
    }

    /// Registers a lending venue.
    pub fn add_lender(&mut self, address: Address, lender: Arc<dyn LendingVenue>) {
        self.lenders.insert(address, lender);
    }

    /// Registers an exit venue.
    pub fn add_exit(&mut self, address: Address, venue: Arc<dyn SwapVenue>) {
        self.exits.insert(address, venue);
    }

    /// Whether a venue of `kind` is registered at `address`.
    #[must_use]
    pub fn contains(&self, kind: VenueKind, address: Address) -> bool {
        match kind {
            VenueKind::Liquidity => self.liquidity.contains_key(&address),
            VenueKind::Oracle => self.oracles.contains_key(&address),
            VenueKind::Lending => self.lenders.contains_key(&address),
            VenueKind::Exit => self.exits.contains_key(&address),
        }
    }

    /// Liquidity venue at `address`.
    ///
    /// # Errors
    /// * `UnknownVenue` if none is registered
    pub fn liquidity(&self, address: Address) -> Result<Arc<dyn LiquidityVenue>, ExecutionError> {
        lookup(&self.liquidity, VenueKind::Liquidity, address)
    }

    /// Price feed at `address`.
    ///
    /// # Errors
    /// * `UnknownVenue` if none is registered
    pub fn oracle(&self, address: Address) -> Result<Arc<dyn PriceOracle>, ExecutionError> {
        lookup(&self.oracles, VenueKind::Oracle, address)
    }

    /// Lending venue at `address`.
    ///
    /// # Errors
    /// * `UnknownVenue` if none is registered
    pub fn lender(&self, address: Address) -> Result<Arc<dyn LendingVenue>, ExecutionError> {
        lookup(&self.lenders, VenueKind::Lending, address)
    }

    /// Exit venue at `address`.
    ///
    /// # Errors
    /// * `UnknownVenue` if none is registered
    pub fn exit(&self, address: Address) -> Result<Arc<dyn SwapVenue>, ExecutionError> {
        lookup(&self.exits, VenueKind::Exit, address)
    }
}

/// Cloned handle for `address`, or `UnknownVenue`
fn lookup<T: ?Sized>(
    venues: &HashMap<Address, Arc<T>>,
    kind: VenueKind,
    address: Address,
) -> Result<Arc<T>, ExecutionError> {
    venues
        .get(&address)
        .cloned()
        .ok_or(ExecutionError::UnknownVenue { kind, address })
}

impl Debug for VenueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueRegistry")
            .field("liquidity", &self.liquidity.keys().collect::<Vec<_>>())
            .field("oracles", &self.oracles.keys().collect::<Vec<_>>())
            .field("lenders", &self.lenders.keys().collect::<Vec<_>>())
            .field("exits", &self.exits.keys().collect::<Vec<_>>())
            .finish()
    }
}
