//! JSON world descriptions for the `simulate` command.
//!
//! A scenario lists the venues, the balances and the engine configuration. Building it
//! yields a seeded [`Ledger`] and an [`ArbEngine`] wired to the described venues.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use alloy::primitives::{Address, I256, U256};
use eyre::{eyre, Result, WrapErr};
use log::info;
use serde::Deserialize;

use crate::arb::engine::ArbEngine;
use crate::arb::types::AssetPair;
use crate::chain::{Asset, Ledger};
use crate::config::EngineConfig;
use crate::utils::constants::{AAVE_V2_FLASH_PREMIUM_BPS, UNISWAP_V2_FEE_BPS};
use crate::venues::{
    ConstantProductVenue, FixedOracle, FlashLender, OracleDesk, PriceOracle, VenueRegistry,
};

/// A pool inside a constant-product venue
#[derive(Clone, Debug, Deserialize)]
pub struct PoolSpec {
    /// Venue the pool belongs to
    pub venue: Address,
    /// Venue swap fee; the first pool listed for a venue sets it
    #[serde(default)]
    pub fee_bps: Option<u64>,
    /// First token
    pub token0: Address,
    /// Second token
    pub token1: Address,
    /// Pool account holding the reserves
    pub pool: Address,
}

/// A fixed price feed
#[derive(Clone, Debug, Deserialize)]
pub struct OracleSpec {
    /// Aggregator address
    pub address: Address,
    /// Answer of the first round
    pub price: I256,
    /// Decimals of the answer
    pub decimals: u8,
    /// Round timestamp; defaults to the scenario timestamp
    #[serde(default)]
    pub updated_at: Option<u64>,
}

/// A flash lender
#[derive(Clone, Debug, Deserialize)]
pub struct LenderSpec {
    /// Lender address and liquidity account
    pub address: Address,
    /// Premium in basis points
    #[serde(default)]
    pub premium_bps: Option<u64>,
}

/// An oracle-priced exit desk
#[derive(Clone, Debug, Deserialize)]
pub struct DeskSpec {
    /// Desk address
    pub address: Address,
    /// Inventory account
    pub account: Address,
    /// Pair the desk quotes
    pub pair: AssetPair,
    /// Feed for one A in B, listed under `oracles`
    pub a_to_b: Address,
    /// Feed for one B in A, listed under `oracles`
    pub b_to_a: Address,
}

/// An initial balance
#[derive(Clone, Debug, Deserialize)]
pub struct BalanceSpec {
    /// Holder
    pub account: Address,
    /// Asset held
    pub asset: Asset,
    /// Amount held
    pub amount: U256,
}

/// A complete world.
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    /// Block timestamp
    pub timestamp: u64,
    /// Engine account
    pub engine: Address,
    /// Engine configuration
    pub config: EngineConfig,
    /// Constant-product pools
    #[serde(default)]
    pub pools: Vec<PoolSpec>,
    /// Price feeds
    #[serde(default)]
    pub oracles: Vec<OracleSpec>,
    /// Flash lenders
    #[serde(default)]
    pub lenders: Vec<LenderSpec>,
    /// Exit desks
    #[serde(default)]
    pub desks: Vec<DeskSpec>,
    /// Initial balances
    #[serde(default)]
    pub balances: Vec<BalanceSpec>,
    /// Accounts refusing incoming transfers
    #[serde(default)]
    pub rejecting: Vec<Address>,
}

/// A built scenario.
#[derive(Debug)]
pub struct World {
    /// Seeded ledger
    pub ledger: Ledger,
    /// Engine over the scenario venues
    pub engine: ArbEngine,
    /// Feeds by address, for moving prices between invocations
    pub oracles: HashMap<Address, Arc<FixedOracle>>,
}

impl Scenario {
    /// Reads a scenario file.
    ///
    /// # Errors
    /// * If the file cannot be read or is not a valid scenario
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read scenario {}", path.display()))?;
        Self::parse(&raw).wrap_err_with(|| format!("invalid scenario {}", path.display()))
    }

    /// Parses a scenario from JSON.
    ///
    /// # Errors
    /// * If the JSON does not describe a scenario
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Builds the ledger and the engine.
    ///
    /// # Errors
    /// * If a desk references an unlisted feed
    /// * If a balance overflows
    /// * If the engine configuration is invalid
    pub fn build(&self) -> Result<World> {
        let oracles: HashMap<Address, Arc<FixedOracle>> = self
            .oracles
            .iter()
            .map(|spec| {
                let updated_at = spec.updated_at.unwrap_or(self.timestamp);
                let oracle = FixedOracle::new(spec.address, spec.price, spec.decimals, updated_at);
                (spec.address, Arc::new(oracle))
            })
            .collect();

        let mut registry = VenueRegistry::new();
        for oracle in oracles.values() {
            registry.add_oracle(oracle.address(), oracle.clone());
        }

        let mut venues: HashMap<Address, ConstantProductVenue> = HashMap::new();
        for spec in &self.pools {
            venues
                .entry(spec.venue)
                .or_insert_with(|| {
                    ConstantProductVenue::with_fee(
                        spec.venue,
                        spec.fee_bps.unwrap_or(UNISWAP_V2_FEE_BPS),
                    )
                })
                .add_pool(spec.token0, spec.token1, spec.pool);
        }
        for (address, venue) in venues {
            registry.add_liquidity(address, Arc::new(venue));
        }

        for spec in &self.lenders {
            let premium = spec.premium_bps.unwrap_or(AAVE_V2_FLASH_PREMIUM_BPS);
            registry.add_lender(
                spec.address,
                Arc::new(FlashLender::with_premium(spec.address, premium)),
            );
        }

        for spec in &self.desks {
            let feed = |address: Address| -> Result<Arc<dyn PriceOracle>> {
                oracles
                    .get(&address)
                    .map(|oracle| Arc::clone(oracle) as Arc<dyn PriceOracle>)
                    .ok_or_else(|| eyre!("desk {} uses unknown feed {address}", spec.address))
            };
            let mut desk = OracleDesk::new(spec.address, spec.account);
            desk.add_pair(&spec.pair, feed(spec.a_to_b)?, feed(spec.b_to_a)?);
            registry.add_exit(spec.address, Arc::new(desk));
        }

        let mut ledger = Ledger::new(self.timestamp);
        for spec in &self.balances {
            ledger.mint(spec.account, spec.asset, spec.amount)?;
        }
        for account in &self.rejecting {
            ledger.set_rejecting(*account, true);
        }

        let engine = ArbEngine::new(self.engine, self.config.clone(), registry)?;
        info!(
            "scenario: built world with {} pools, {} feeds, {} lenders, {} desks",
            self.pools.len(),
            oracles.len(),
            self.lenders.len(),
            self.desks.len()
        );

        Ok(World {
            ledger,
            engine,
            oracles,
        })
    }
}
