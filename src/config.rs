//! Engine and application configuration.
//!
//! [`EngineConfig`] is the only state an engine keeps between invocations. It is
//! validated when the engine is built and changed only through [`ConfigUpdate`]s.
//! [`LiveConfig`] holds the read-only RPC setup used by the `detect` command.

use std::env;
use std::fmt::{self, Display};
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::arb::types::AssetPair;
use crate::error::ExecutionError;

/// Everything an invocation needs to know about its surroundings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The single identity allowed to run privileged operations
    pub controller: Address,
    /// Receives fees, profits and forwarded assets; fixed at construction
    pub recipient: Address,
    /// Assets being arbitraged
    pub pair: AssetPair,
    /// Primary liquidity venue
    pub liquidity_venue: Address,
    /// Feed quoting one A in B
    pub oracle_a_to_b: Address,
    /// Feed quoting one B in A
    pub oracle_b_to_a: Address,
    /// Flash lender
    pub lending_venue: Address,
    /// Venue for the return leg of the trade
    pub exit_venue: Address,
    /// Minimum reserve of asset A required to act
    pub liquidity_threshold: U256,
    /// Amount borrowed per execution, in units of the borrowed asset
    pub loan_notional: U256,
    /// Native currency paid to the recipient per execution
    pub fee_amount: U256,
}

impl EngineConfig {
    /// Checks the configuration for values no invocation could work with.
    ///
    /// # Errors
    /// * `InvalidConfig` naming the first problem found
    pub fn validate(&self) -> Result<(), ExecutionError> {
        let invalid = |reason: &str| -> Result<(), ExecutionError> {
            Err(ExecutionError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.pair.a == self.pair.b {
            return invalid("pair assets must differ");
        }
        if self.pair.a.is_zero() || self.pair.b.is_zero() {
            return invalid("pair assets must be non-zero addresses");
        }
        if self.controller.is_zero() {
            return invalid("controller must be set");
        }
        if self.recipient.is_zero() {
            return invalid("recipient must be set");
        }
        if self.loan_notional.is_zero() {
            return invalid("loan notional must be positive");
        }
        Ok(())
    }

    /// Returns a copy with `update` applied, validated.
    ///
    /// # Errors
    /// * `InvalidConfig` if the result does not validate
    pub fn apply(&self, update: &ConfigUpdate) -> Result<Self, ExecutionError> {
        let mut next = self.clone();
        match *update {
            ConfigUpdate::Controller(address) => next.controller = address,
            ConfigUpdate::LiquidityVenue(address) => next.liquidity_venue = address,
            ConfigUpdate::OracleAToB(address) => next.oracle_a_to_b = address,
            ConfigUpdate::OracleBToA(address) => next.oracle_b_to_a = address,
            ConfigUpdate::LendingVenue(address) => next.lending_venue = address,
            ConfigUpdate::ExitVenue(address) => next.exit_venue = address,
            ConfigUpdate::LiquidityThreshold(value) => next.liquidity_threshold = value,
            ConfigUpdate::LoanNotional(value) => next.loan_notional = value,
            ConfigUpdate::FeeAmount(value) => next.fee_amount = value,
        }
        next.validate()?;
        Ok(next)
    }
}

/// One change to the engine configuration.
///
/// The recipient and the pair have no variant: they are fixed for the life of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ConfigUpdate {
    /// Hand control to another identity
    Controller(Address),
    /// Point at another liquidity venue
    LiquidityVenue(Address),
    /// Point at another A→B feed
    OracleAToB(Address),
    /// Point at another B→A feed
    OracleBToA(Address),
    /// Point at another lender
    LendingVenue(Address),
    /// Point at another exit venue
    ExitVenue(Address),
    /// Change the minimum reserve of A
    LiquidityThreshold(U256),
    /// Change the amount borrowed per execution
    LoanNotional(U256),
    /// Change the fee paid per execution
    FeeAmount(U256),
}

impl Display for ConfigUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Controller(address) => write!(f, "controller = {address}"),
            Self::LiquidityVenue(address) => write!(f, "liquidity venue = {address}"),
            Self::OracleAToB(address) => write!(f, "oracle A>B = {address}"),
            Self::OracleBToA(address) => write!(f, "oracle B>A = {address}"),
            Self::LendingVenue(address) => write!(f, "lending venue = {address}"),
            Self::ExitVenue(address) => write!(f, "exit venue = {address}"),
            Self::LiquidityThreshold(value) => write!(f, "liquidity threshold = {value}"),
            Self::LoanNotional(value) => write!(f, "loan notional = {value}"),
            Self::FeeAmount(value) => write!(f, "fee amount = {value}"),
        }
    }
}

/// Read-only RPC setup for live detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveConfig {
    /// HTTP endpoint of the node
    pub rpc_url: Url,
    /// Uniswap V2 factory used to find the pair
    pub factory: Address,
    /// Assets being watched
    pub pair: AssetPair,
    /// Chainlink aggregator quoting one A in B
    pub oracle_a_to_b: Address,
    /// Chainlink aggregator quoting one B in A
    pub oracle_b_to_a: Address,
    /// Minimum reserve of A required to report an opportunity
    pub liquidity_threshold: U256,
}

impl LiveConfig {
    /// Loads the configuration from the environment, after reading `.env` if present.
    ///
    /// # Environment Variables
    /// * `ARB_RPC_URL` - HTTP endpoint
    /// * `ARB_FACTORY` - Uniswap V2 factory address
    /// * `ARB_TOKEN_A`, `ARB_TOKEN_B` - the pair
    /// * `ARB_ORACLE_A_TO_B`, `ARB_ORACLE_B_TO_A` - aggregator addresses
    /// * `ARB_LIQUIDITY_THRESHOLD` - optional, defaults to 0
    ///
    /// # Errors
    /// * If a required variable is missing or does not parse
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any name → value lookup.
    ///
    /// # Errors
    /// * If a required variable is missing or does not parse
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| lookup(name).ok_or_else(|| eyre!("{name} must be set"));

        let rpc_url = Url::parse(&required("ARB_RPC_URL")?).wrap_err("ARB_RPC_URL is not a URL")?;
        let liquidity_threshold = match lookup("ARB_LIQUIDITY_THRESHOLD") {
            Some(value) => parse("ARB_LIQUIDITY_THRESHOLD", &value)?,
            None => U256::ZERO,
        };

        Ok(Self {
            rpc_url,
            factory: parse("ARB_FACTORY", &required("ARB_FACTORY")?)?,
            pair: AssetPair::new(
                parse("ARB_TOKEN_A", &required("ARB_TOKEN_A")?)?,
                parse("ARB_TOKEN_B", &required("ARB_TOKEN_B")?)?,
            ),
            oracle_a_to_b: parse("ARB_ORACLE_A_TO_B", &required("ARB_ORACLE_A_TO_B")?)?,
            oracle_b_to_a: parse("ARB_ORACLE_B_TO_A", &required("ARB_ORACLE_B_TO_A")?)?,
            liquidity_threshold,
        })
    }
}

/// Parses one variable, naming it in the error
fn parse<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| eyre!("{name}: cannot parse {value:?}: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::arb::test_helpers::{address, engine_config};

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let config = engine_config();
        assert!(config.validate().is_ok());

        let mut same_assets = config.clone();
        same_assets.pair.b = same_assets.pair.a;
        assert!(matches!(
            same_assets.validate(),
            Err(ExecutionError::InvalidConfig { .. })
        ));

        let mut no_notional = config.clone();
        no_notional.loan_notional = U256::ZERO;
        assert!(no_notional.validate().is_err());

        let mut no_recipient = config;
        no_recipient.recipient = Address::ZERO;
        assert!(no_recipient.validate().is_err());
    }

    #[test]
    fn test_apply_updates_one_field() {
        let config = engine_config();

        let next = config
            .apply(&ConfigUpdate::LiquidityThreshold(U256::from(7)))
            .unwrap();
        assert_eq!(next.liquidity_threshold, U256::from(7));
        assert_eq!(
            EngineConfig {
                liquidity_threshold: config.liquidity_threshold,
                ..next
            },
            config
        );

        let next = config
            .apply(&ConfigUpdate::Controller(address("new controller")))
            .unwrap();
        assert_eq!(next.controller, address("new controller"));
    }

    #[test]
    fn test_apply_rejects_invalid_result() {
        let config = engine_config();
        assert!(config
            .apply(&ConfigUpdate::LoanNotional(U256::ZERO))
            .is_err());
    }

    #[test]
    fn test_update_wire_format() {
        let update: ConfigUpdate =
            serde_json::from_str(r#"{"field":"fee_amount","value":"0x2a"}"#).unwrap();
        assert_eq!(update, ConfigUpdate::FeeAmount(U256::from(42)));
    }

    #[test]
    fn test_live_config_from_lookup() {
        let vars: HashMap<&str, String> = [
            ("ARB_RPC_URL", "http://localhost:8545".to_string()),
            ("ARB_FACTORY", address("factory").to_string()),
            ("ARB_TOKEN_A", address("A").to_string()),
            ("ARB_TOKEN_B", address("B").to_string()),
            ("ARB_ORACLE_A_TO_B", address("feed a>b").to_string()),
            ("ARB_ORACLE_B_TO_A", address("feed b>a").to_string()),
        ]
        .into_iter()
        .collect();

        let config = LiveConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(config.pair, AssetPair::new(address("A"), address("B")));
        assert_eq!(config.factory, address("factory"));
        assert_eq!(config.liquidity_threshold, U256::ZERO);

        let missing = LiveConfig::from_lookup(|_| None).unwrap_err();
        assert!(missing.to_string().contains("ARB_RPC_URL"));
    }
}
