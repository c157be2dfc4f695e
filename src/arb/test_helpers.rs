use std::sync::Arc;

use alloy::primitives::{keccak256, Address, I256, U256};

use super::engine::ArbEngine;
use super::types::{AssetPair, OracleQuote, ReserveSnapshot};
use crate::chain::{Asset, Ledger};
use crate::config::EngineConfig;
use crate::venues::{ConstantProductVenue, FixedOracle, FlashLender, OracleDesk, VenueRegistry};

/// Deterministic address derived from a label
pub fn address(label: &str) -> Address {
    Address::from_word(keccak256(label.as_bytes()))
}

/// Token asset derived from a label
pub fn token(label: &str) -> Asset {
    Asset::Token(address(label))
}

/// 18-decimal quote with the given raw price
pub fn quote(price: u128) -> OracleQuote {
    OracleQuote::scaled(I256::try_from(price).unwrap(), 1, 0)
}

/// Reserve snapshot; both sides must be non-zero
pub fn snapshot(reserve_a: u64, reserve_b: u64) -> ReserveSnapshot {
    ReserveSnapshot::new(U256::from(reserve_a), U256::from(reserve_b), 0).unwrap()
}

/// Valid configuration over [`Fixture`] addresses
pub fn engine_config() -> EngineConfig {
    Fixture::new().config()
}

/// A complete world: pool 1,000,000 A / 2,000,000 B, oracles at 1.9 B per A and
/// 0.52 A per B (8 decimals), a 9 bps lender and a well stocked exit desk.
///
/// Executing `SellAForB` with a 10,000 A notional yields 19,743 B on the pool,
/// 10,266 A on the desk, 10,009 A owed to the lender and 257 A of profit.
pub struct Fixture {
    /// Controller identity
    pub controller: Address,
    /// Fee and profit recipient
    pub recipient: Address,
    /// Engine ledger account
    pub engine_account: Address,
    /// Traded pair
    pub pair: AssetPair,
    /// Liquidity venue
    pub pool: Arc<ConstantProductVenue>,
    /// Pool account of the pair
    pub pool_account: Address,
    /// Exit venue
    pub desk: Arc<OracleDesk>,
    /// Flash lender
    pub lender: Arc<FlashLender>,
    /// A→B feed
    pub a_to_b: Arc<FixedOracle>,
    /// B→A feed
    pub b_to_a: Arc<FixedOracle>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Builds the venues; balances live in [`Fixture::ledger`]
    pub fn new() -> Self {
        let pair = AssetPair::new(address("A"), address("B"));
        let pool_account = address("pool A/B");
        let mut pool = ConstantProductVenue::new(address("uniswap v2"));
        pool.add_pool(pair.a, pair.b, pool_account);

        let a_to_b = Arc::new(FixedOracle::new(
            address("feed a>b"),
            I256::try_from(190_000_000).unwrap(),
            8,
            0,
        ));
        let b_to_a = Arc::new(FixedOracle::new(
            address("feed b>a"),
            I256::try_from(52_000_000).unwrap(),
            8,
            0,
        ));
        let mut desk = OracleDesk::new(address("desk"), address("desk inventory"));
        desk.add_pair(&pair, a_to_b.clone(), b_to_a.clone());

        Self {
            controller: address("controller"),
            recipient: address("recipient"),
            engine_account: address("engine"),
            pair,
            pool: Arc::new(pool),
            pool_account,
            desk: Arc::new(desk),
            lender: Arc::new(FlashLender::new(address("lender"))),
            a_to_b,
            b_to_a,
        }
    }

    /// Engine configuration pointing at every fixture venue
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            controller: self.controller,
            recipient: self.recipient,
            pair: self.pair,
            liquidity_venue: self.pool.address(),
            oracle_a_to_b: self.a_to_b.address(),
            oracle_b_to_a: self.b_to_a.address(),
            lending_venue: self.lender.address(),
            exit_venue: self.desk.address(),
            liquidity_threshold: U256::from(500_000),
            loan_notional: U256::from(10_000),
            fee_amount: U256::from(5),
        }
    }

    /// Registry holding every fixture venue
    pub fn registry(&self) -> VenueRegistry {
        let mut registry = VenueRegistry::new();
        registry.add_liquidity(self.pool.address(), self.pool.clone());
        registry.add_oracle(self.a_to_b.address(), self.a_to_b.clone());
        registry.add_oracle(self.b_to_a.address(), self.b_to_a.clone());
        registry.add_lender(self.lender.address(), self.lender.clone());
        registry.add_exit(self.desk.address(), self.desk.clone());
        registry
    }

    /// Engine over [`Fixture::config`] and [`Fixture::registry`]
    pub fn engine(&self) -> ArbEngine {
        ArbEngine::new(self.engine_account, self.config(), self.registry()).unwrap()
    }

    /// Seeded ledger: reserves, lender liquidity, desk inventory, fee float
    pub fn ledger(&self) -> Ledger {
        let (a, b) = (Asset::Token(self.pair.a), Asset::Token(self.pair.b));
        let mut ledger = Ledger::new(1_700_000_000);
        for (account, asset, amount) in [
            (self.pool_account, a, 1_000_000_u64),
            (self.pool_account, b, 2_000_000),
            (self.lender.address(), a, 1_000_000),
            (self.lender.address(), b, 1_000_000),
            (self.desk.account(), a, 1_000_000),
            (self.desk.account(), b, 1_000_000),
            (self.engine_account, Asset::Native, 100),
            (self.controller, Asset::Native, 1_000),
        ] {
            ledger.mint(account, asset, U256::from(amount)).unwrap();
        }
        ledger
    }
}
