//! The arbitrage engine: the single entry point tying the gate, the readers, the
//! detector and the orchestrator together.
//!
//! An invocation is all-or-nothing. It runs inside one ledger checkpoint, holds the
//! busy flag for its whole duration, and works on a configuration snapshot taken at
//! entry.

use std::fmt::{self, Display};
use std::sync::atomic::{AtomicBool, Ordering};

use alloy::primitives::{Address, U256};
use log::{debug, info, warn};
use parking_lot::RwLock;

use super::detector::PriceComparison;
use super::orchestrator::{ExecutionPlan, ExecutionReport, LoanOrchestrator};
use super::readers::{read_quote, read_reserves};
use super::sweep;
use super::types::QuoteDirection;
use crate::auth::{AuthorizationGate, Authorized};
use crate::chain::{Asset, Ledger};
use crate::config::{ConfigUpdate, EngineConfig};
use crate::error::ExecutionError;
use crate::venues::VenueRegistry;

/// Outcome of a successful invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Prices agree closely enough: nothing was borrowed, nothing changed
    NoOpportunity(PriceComparison),
    /// An opportunity was found and executed
    Executed {
        /// Prices the decision was made on
        comparison: PriceComparison,
        /// What the execution did
        report: ExecutionReport,
    },
}

impl Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOpportunity(comparison) => write!(f, "{comparison}"),
            Self::Executed { report, .. } => write!(f, "executed {report}"),
        }
    }
}

/// Holds the busy flag until dropped
struct BusyGuard<'a> {
    /// Flag owned by the engine
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    /// Raises the flag, or fails if it is already up
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ExecutionError> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| {
                warn!("arb::engine: rejected re-entrant call");
                ExecutionError::Reentrancy
            })?;
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Single-shot oracle vs pool arbitrage engine.
#[derive(Debug)]
pub struct ArbEngine {
    /// Ledger account holding the engine's funds
    account: Address,
    /// The only state carried between invocations
    config: RwLock<EngineConfig>,
    /// Venue implementations by configured address
    registry: VenueRegistry,
    /// Raised while an invocation is running
    busy: AtomicBool,
}

impl ArbEngine {
    /// Creates an engine.
    ///
    /// # Arguments
    /// * `account` - Ledger account the engine trades from
    /// * `config` - Initial configuration
    /// * `registry` - Venues the configuration may point at
    ///
    /// # Errors
    /// * `InvalidConfig` if the configuration does not validate
    pub fn new(
        account: Address,
        config: EngineConfig,
        registry: VenueRegistry,
    ) -> Result<Self, ExecutionError> {
        config.validate()?;
        Ok(Self {
            account,
            config: RwLock::new(config),
            registry,
            busy: AtomicBool::new(false),
        })
    }

    /// Ledger account the engine trades from.
    #[must_use]
    pub const fn account(&self) -> Address {
        self.account
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Registered venues.
    #[must_use]
    pub const fn registry(&self) -> &VenueRegistry {
        &self.registry
    }

    /// Whether an invocation is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Reads both sources, decides, and executes if there is an opportunity.
    ///
    /// # Arguments
    /// * `ledger` - World state the invocation runs against
    /// * `caller` - Identity making the call
    ///
    /// # Returns
    /// * `NoOpportunity` with the prices compared, ledger untouched
    /// * `Executed` with the comparison and the execution report
    ///
    /// # Errors
    /// * `Unauthorized` if `caller` is not the controller
    /// * `Reentrancy` if an invocation is already running
    /// * any reader, detector or orchestrator error; the ledger is then exactly as it
    ///   was before the call
    pub fn execute(&self, ledger: &mut Ledger, caller: Address) -> Result<Invocation, ExecutionError> {
        let config = self.config();
        let authorized = AuthorizationGate::new(config.controller).require_caller(caller)?;
        let _guard = BusyGuard::acquire(&self.busy)?;

        let result = ledger.atomically(|ledger| self.run(ledger, &config, &authorized));
        match &result {
            Ok(invocation) => info!("arb::engine: {invocation}"),
            Err(e) => warn!("arb::engine: invocation reverted: {e}"),
        }
        result
    }

    /// Changes one configuration field.
    ///
    /// # Errors
    /// * `Unauthorized` if `caller` is not the controller
    /// * `Reentrancy` if called while an invocation is running
    /// * `InvalidConfig` if the result does not validate; nothing changes then
    pub fn update_config(&self, caller: Address, update: ConfigUpdate) -> Result<(), ExecutionError> {
        let mut config = self.config.write();
        AuthorizationGate::new(config.controller).require_caller(caller)?;
        let _guard = BusyGuard::acquire(&self.busy)?;

        *config = config.apply(&update)?;
        info!("arb::engine: config updated, {update}");
        Ok(())
    }

    /// Moves the engine's whole native balance to the recipient.
    ///
    /// # Errors
    /// * `Unauthorized` if `caller` is not the controller
    /// * `Reentrancy` if called while an invocation is running
    /// * `Ledger` if the recipient refuses the transfer
    pub fn withdraw_native(&self, ledger: &mut Ledger, caller: Address) -> Result<U256, ExecutionError> {
        let config = self.config();
        let authorized = AuthorizationGate::new(config.controller).require_caller(caller)?;
        let _guard = BusyGuard::acquire(&self.busy)?;

        ledger.atomically(|ledger| {
            sweep::withdraw_native(ledger, &authorized, self.account, config.recipient)
        })
    }

    /// Moves `amount` of native currency from the controller into the engine.
    ///
    /// # Errors
    /// * `Unauthorized` if `caller` is not the controller
    /// * `Reentrancy` if called while an invocation is running
    /// * `Ledger` if the controller cannot cover `amount`
    pub fn fund_native(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        let config = self.config();
        let authorized = AuthorizationGate::new(config.controller).require_caller(caller)?;
        let _guard = BusyGuard::acquire(&self.busy)?;

        ledger.atomically(|ledger| sweep::fund_native(ledger, &authorized, self.account, amount))
    }

    /// Accepts assets sent to the engine outside an invocation and forwards them in full
    /// to the recipient. Open to any sender except the engine itself.
    ///
    /// # Errors
    /// * `SelfDeposit` if `from` is the engine account
    /// * `Reentrancy` if called while an invocation is running
    /// * `Ledger` if `from` cannot cover `amount` or the recipient refuses it
    pub fn receive_unsolicited(
        &self,
        ledger: &mut Ledger,
        from: Address,
        asset: Asset,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        let recipient = self.config.read().recipient;
        let _guard = BusyGuard::acquire(&self.busy)?;
        sweep::forward_unsolicited(ledger, from, self.account, recipient, asset, amount)
    }

    /// Body of an invocation, run inside the ledger checkpoint
    fn run(
        &self,
        ledger: &mut Ledger,
        config: &EngineConfig,
        authorized: &Authorized,
    ) -> Result<Invocation, ExecutionError> {
        let liquidity = self.registry.liquidity(config.liquidity_venue)?;
        let oracle_a_to_b = self.registry.oracle(config.oracle_a_to_b)?;
        let oracle_b_to_a = self.registry.oracle(config.oracle_b_to_a)?;

        let snapshot = read_reserves(liquidity.as_ref(), ledger, &config.pair)?;
        let a_to_b = read_quote(oracle_a_to_b.as_ref(), QuoteDirection::AToB)?;
        let b_to_a = read_quote(oracle_b_to_a.as_ref(), QuoteDirection::BToA)?;

        let comparison =
            PriceComparison::compute(&snapshot, &a_to_b, &b_to_a, config.liquidity_threshold)?;
        let Some(direction) = comparison.direction else {
            debug!("arb::engine: no opportunity, {comparison}");
            return Ok(Invocation::NoOpportunity(comparison));
        };

        let lender = self.registry.lender(config.lending_venue)?;
        let exit = self.registry.exit(config.exit_venue)?;
        let plan = ExecutionPlan {
            account: self.account,
            recipient: config.recipient,
            pair: config.pair,
            direction,
            notional: config.loan_notional,
            fee_amount: config.fee_amount,
            liquidity: liquidity.as_ref(),
            exit: exit.as_ref(),
            lender: lender.as_ref(),
        };

        info!("arb::engine: {direction} on {}", config.pair);
        let report = LoanOrchestrator::new(plan, authorized).run(ledger)?;
        Ok(Invocation::Executed { comparison, report })
    }
}
