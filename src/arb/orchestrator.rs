//! Loan-funded execution of a detected opportunity.
//!
//! The orchestrator walks a fixed sequence of states. Everything up to `LoanRepaid`
//! happens inside the lender's callback; profits are distributed once the loan call has
//! returned. Atomicity is the caller's business: the engine runs the orchestrator inside
//! a ledger checkpoint, so any error here discards every effect.

use std::fmt::{self, Display};

use alloy::primitives::{Address, U256};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::settlement::{distribute_profits, pay_fee};
use super::types::{AssetPair, OpportunityDirection};
use crate::auth::Authorized;
use crate::chain::{Asset, Ledger};
use crate::error::ExecutionError;
use crate::venues::{FlashLoanReceiver, LendingVenue, SwapVenue};

/// Where an execution is in the borrow → trade → repay → distribute sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanState {
    /// Nothing in flight
    Idle,
    /// Loan asked for, funds not yet delivered
    LoanRequested,
    /// Lender callback running with the funds in hand
    LoanReceived,
    /// Both legs of the trade done
    Traded,
    /// Fixed fee paid to the recipient
    FeesPaid,
    /// Notional and premium returned to the lender
    LoanRepaid,
    /// Residual proceeds forwarded to the recipient
    ProfitsDistributed,
}

impl LoanState {
    /// The only state that may follow this one on the success path.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::LoanRequested,
            Self::LoanRequested => Self::LoanReceived,
            Self::LoanReceived => Self::Traded,
            Self::Traded => Self::FeesPaid,
            Self::FeesPaid => Self::LoanRepaid,
            Self::LoanRepaid => Self::ProfitsDistributed,
            Self::ProfitsDistributed => Self::Idle,
        }
    }
}

impl Display for LoanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::LoanRequested => "LoanRequested",
            Self::LoanReceived => "LoanReceived",
            Self::Traded => "Traded",
            Self::FeesPaid => "FeesPaid",
            Self::LoanRepaid => "LoanRepaid",
            Self::ProfitsDistributed => "ProfitsDistributed",
        };
        write!(f, "{name}")
    }
}

/// What a successful execution did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Trade direction
    pub direction: OpportunityDirection,
    /// Token borrowed and sold on the pool
    pub borrowed: Address,
    /// Token bought on the pool and sold on the exit venue
    pub counter: Address,
    /// Amount borrowed
    pub notional: U256,
    /// Lender premium paid on top of the notional
    pub premium: U256,
    /// Counter asset obtained on the pool
    pub counter_amount: U256,
    /// Borrowed asset reacquired on the exit venue
    pub reacquired: U256,
    /// Native fee paid to the recipient
    pub fee_paid: U256,
    /// Borrowed asset forwarded to the recipient after repayment
    pub profit: U256,
    /// States visited, in order
    pub trace: Vec<LoanState>,
}

impl Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: borrowed {} {} (premium {}), pool gave {} {}, exit gave {}, fee {}, profit {}",
            self.direction,
            self.notional,
            self.borrowed,
            self.premium,
            self.counter_amount,
            self.counter,
            self.reacquired,
            self.fee_paid,
            self.profit
        )
    }
}

/// Everything one execution needs, resolved by the engine from its configuration.
#[derive(Clone, Copy)]
pub struct ExecutionPlan<'a> {
    /// Engine account: borrower, trader and fee payer
    pub account: Address,
    /// Receives the fee and the profit
    pub recipient: Address,
    /// Assets being arbitraged
    pub pair: AssetPair,
    /// Trade direction
    pub direction: OpportunityDirection,
    /// Amount to borrow
    pub notional: U256,
    /// Native fee to pay
    pub fee_amount: U256,
    /// First leg venue
    pub liquidity: &'a dyn SwapVenue,
    /// Second leg venue
    pub exit: &'a dyn SwapVenue,
    /// Flash lender
    pub lender: &'a dyn LendingVenue,
}

/// Drives one plan through the state machine.
pub struct LoanOrchestrator<'a> {
    /// What to do
    plan: ExecutionPlan<'a>,
    /// Current state
    state: LoanState,
    /// Report under construction
    report: ExecutionReport,
}

impl<'a> LoanOrchestrator<'a> {
    /// Creates an idle orchestrator for `plan`.
    ///
    /// Requires an [`Authorized`] token: only the controller's invocation can move funds.
    #[must_use]
    pub fn new(plan: ExecutionPlan<'a>, authorized: &Authorized) -> Self {
        debug!(
            "arb::orchestrator: {} on {} authorized by {}",
            plan.direction,
            plan.pair,
            authorized.caller()
        );
        let report = ExecutionReport {
            direction: plan.direction,
            borrowed: plan.direction.borrowed(&plan.pair),
            counter: plan.direction.counter(&plan.pair),
            notional: plan.notional,
            premium: U256::ZERO,
            counter_amount: U256::ZERO,
            reacquired: U256::ZERO,
            fee_paid: U256::ZERO,
            profit: U256::ZERO,
            trace: vec![LoanState::Idle],
        };
        Self {
            plan,
            state: LoanState::Idle,
            report,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LoanState {
        self.state
    }

    /// Runs the whole sequence against `ledger`.
    ///
    /// # Errors
    /// * `LoanUnavailable` if the lender will not lend, or returns without calling back
    /// * `TradeFailed`, `FeeTransferFailed`, `RepaymentShortfall` from inside the loan
    /// * `DistributionFailed` if the profit cannot be forwarded
    /// * anything the lender itself raises
    ///
    /// On error the ledger is left mid-sequence; the caller must revert it.
    pub fn run(mut self, ledger: &mut Ledger) -> Result<ExecutionReport, ExecutionError> {
        let ExecutionPlan {
            account,
            recipient,
            notional,
            lender,
            ..
        } = self.plan;
        let borrowed = self.report.borrowed;

        self.advance(LoanState::LoanRequested);
        info!("arb::orchestrator: requesting loan of {notional} {borrowed}");
        if let Err(e) = lender.flash_loan(ledger, account, &mut self, borrowed, notional) {
            warn!("arb::orchestrator: loan failed in state {}: {e}", self.state);
            return Err(e);
        }

        if self.state != LoanState::LoanRepaid {
            warn!(
                "arb::orchestrator: lender returned with the sequence in state {}",
                self.state
            );
            return Err(ExecutionError::LoanUnavailable {
                token: borrowed,
                amount: notional,
            });
        }

        self.report.profit = distribute_profits(ledger, account, recipient, borrowed)?;
        self.advance(LoanState::ProfitsDistributed);

        self.advance(LoanState::Idle);
        info!("arb::orchestrator: {}", self.report);
        Ok(self.report)
    }

    /// Records a transition along the success path
    fn advance(&mut self, to: LoanState) {
        debug_assert_eq!(self.state.next(), to, "out of order transition");
        debug!("arb::orchestrator: {} -> {to}", self.state);
        self.state = to;
        self.report.trace.push(to);
    }

    /// Sells the notional on the pool, then the proceeds on the exit venue
    fn trade(&mut self, ledger: &mut Ledger, amount: U256) -> Result<(), ExecutionError> {
        let ExecutionPlan {
            account,
            liquidity,
            exit,
            ..
        } = self.plan;
        let (borrowed, counter) = (self.report.borrowed, self.report.counter);

        let counter_amount = liquidity.swap(ledger, account, borrowed, counter, amount)?;
        let reacquired = exit.swap(ledger, account, counter, borrowed, counter_amount)?;

        self.report.counter_amount = counter_amount;
        self.report.reacquired = reacquired;
        Ok(())
    }

    /// Returns notional and premium to the lender
    fn repay(
        &self,
        ledger: &mut Ledger,
        lender: Address,
        amount: U256,
        premium: U256,
    ) -> Result<(), ExecutionError> {
        let asset = Asset::Token(self.report.borrowed);
        let available = ledger.balance(self.plan.account, asset);
        let owed = amount
            .checked_add(premium)
            .ok_or(ExecutionError::MathOverflow {
                context: "loan repayment",
            })?;
        let shortfall = ExecutionError::RepaymentShortfall { owed, available };

        if available < owed {
            warn!("arb::orchestrator: cannot repay {owed}, holding {available}");
            return Err(shortfall);
        }
        ledger
            .transfer(self.plan.account, lender, asset, owed)
            .map_err(|_| shortfall)
    }
}

impl FlashLoanReceiver for LoanOrchestrator<'_> {
    fn on_flash_loan(
        &mut self,
        ledger: &mut Ledger,
        lender: Address,
        token: Address,
        amount: U256,
        premium: U256,
    ) -> Result<(), ExecutionError> {
        if self.state != LoanState::LoanRequested
            || token != self.report.borrowed
            || amount != self.plan.notional
        {
            warn!("arb::orchestrator: unexpected callback for {amount} {token} in state {}", self.state);
            return Err(ExecutionError::LoanUnavailable {
                token: self.report.borrowed,
                amount: self.plan.notional,
            });
        }
        self.report.premium = premium;
        self.advance(LoanState::LoanReceived);

        self.trade(ledger, amount)?;
        self.advance(LoanState::Traded);

        self.report.fee_paid = pay_fee(
            ledger,
            self.plan.account,
            self.plan.recipient,
            self.plan.fee_amount,
        )?;
        self.advance(LoanState::FeesPaid);

        self.repay(ledger, lender, amount, premium)?;
        self.advance(LoanState::LoanRepaid);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::{address, Fixture};
    use crate::auth::AuthorizationGate;
    use crate::chain::Notification;

    fn run(fixture: &Fixture, ledger: &mut Ledger) -> Result<ExecutionReport, ExecutionError> {
        let authorized = AuthorizationGate::new(fixture.controller)
            .require_caller(fixture.controller)
            .unwrap();
        let plan = ExecutionPlan {
            account: fixture.engine_account,
            recipient: fixture.recipient,
            pair: fixture.pair,
            direction: OpportunityDirection::SellAForB,
            notional: U256::from(10_000),
            fee_amount: U256::from(5),
            liquidity: fixture.pool.as_ref(),
            exit: fixture.desk.as_ref(),
            lender: fixture.lender.as_ref(),
        };
        LoanOrchestrator::new(plan, &authorized).run(ledger)
    }

    #[test]
    fn test_state_sequence() {
        let mut state = LoanState::Idle;
        let mut visited = vec![state];
        for _ in 0..7 {
            state = state.next();
            visited.push(state);
        }
        assert_eq!(
            visited,
            vec![
                LoanState::Idle,
                LoanState::LoanRequested,
                LoanState::LoanReceived,
                LoanState::Traded,
                LoanState::FeesPaid,
                LoanState::LoanRepaid,
                LoanState::ProfitsDistributed,
                LoanState::Idle,
            ]
        );
    }

    #[test]
    fn test_full_sequence() {
        let fixture = Fixture::new();
        let mut ledger = fixture.ledger();

        let report = run(&fixture, &mut ledger).unwrap();

        assert_eq!(report.premium, U256::from(9));
        assert_eq!(report.counter_amount, U256::from(19_743));
        assert_eq!(report.reacquired, U256::from(10_266));
        assert_eq!(report.fee_paid, U256::from(5));
        assert_eq!(report.profit, U256::from(257));
        assert_eq!(report.trace.len(), 8);
        assert_eq!(report.trace.last(), Some(&LoanState::Idle));

        let a = Asset::Token(fixture.pair.a);
        assert_eq!(ledger.balance(fixture.recipient, a), U256::from(257));
        assert_eq!(ledger.balance(fixture.engine_account, a), U256::ZERO);
        assert_eq!(
            ledger.notifications(),
            &[
                Notification::FeesPaid {
                    recipient: fixture.recipient,
                    amount: U256::from(5)
                },
                Notification::ProfitsTransferred {
                    recipient: fixture.recipient,
                    token: fixture.pair.a,
                    amount: U256::from(257)
                },
            ]
        );
    }

    #[test]
    fn test_unprofitable_trade_cannot_repay() {
        let fixture = Fixture::new();
        let mut ledger = fixture.ledger();
        // desk pays 0.50 A per B: 19_743 B buys back only 9_871 A
        fixture
            .b_to_a
            .set_price(alloy::primitives::I256::try_from(50_000_000).unwrap(), 1);

        let err = run(&fixture, &mut ledger).unwrap_err();

        assert_eq!(
            err,
            ExecutionError::RepaymentShortfall {
                owed: U256::from(10_009),
                available: U256::from(9_871),
            }
        );
    }

    #[test]
    fn test_fee_refused_aborts() {
        let fixture = Fixture::new();
        let mut ledger = fixture.ledger();
        ledger.set_rejecting(fixture.recipient, true);

        assert!(matches!(
            run(&fixture, &mut ledger),
            Err(ExecutionError::FeeTransferFailed { recipient, .. }) if recipient == fixture.recipient
        ));
    }

    #[test]
    fn test_lender_without_liquidity() {
        let fixture = Fixture::new();
        let mut ledger = fixture.ledger();
        let drained = address("drained lender");
        let lender = crate::venues::FlashLender::new(drained);
        let authorized = AuthorizationGate::new(fixture.controller)
            .require_caller(fixture.controller)
            .unwrap();
        let plan = ExecutionPlan {
            account: fixture.engine_account,
            recipient: fixture.recipient,
            pair: fixture.pair,
            direction: OpportunityDirection::SellAForB,
            notional: U256::from(10_000),
            fee_amount: U256::ZERO,
            liquidity: fixture.pool.as_ref(),
            exit: fixture.desk.as_ref(),
            lender: &lender,
        };

        assert_eq!(
            LoanOrchestrator::new(plan, &authorized).run(&mut ledger),
            Err(ExecutionError::LoanUnavailable {
                token: fixture.pair.a,
                amount: U256::from(10_000)
            })
        );
    }
}
