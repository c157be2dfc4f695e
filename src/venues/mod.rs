//! # Venues Module
//!
//! Interfaces to the collaborators the engine consumes (liquidity venue, price
//! oracles, lending venue, exit venue) together with in-memory implementations
//! that keep their mutable state in the [`Ledger`].

/// Constant-product (Uniswap V2 style) liquidity venue
pub mod constant_product;
/// Oracle-priced exit desk
pub mod desk;
/// Flash lender with a basis-point premium
pub mod lender;
/// Chainlink style fixed aggregator
pub mod oracle;
/// Address to implementation lookup
pub mod registry;

use std::fmt::{self, Display};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::arb::types::{AssetPair, OracleQuote, ReserveSnapshot};
use crate::chain::Ledger;
use crate::error::ExecutionError;

pub use constant_product::ConstantProductVenue;
pub use desk::OracleDesk;
pub use lender::FlashLender;
pub use oracle::FixedOracle;
pub use registry::VenueRegistry;

/// Role a venue plays for the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VenueKind {
    /// Pool whose reserves are read and traded against
    Liquidity,
    /// Price feed
    Oracle,
    /// Flash lender
    Lending,
    /// Venue for the return leg of the trade
    Exit,
}

impl Display for VenueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Liquidity => write!(f, "liquidity"),
            Self::Oracle => write!(f, "oracle"),
            Self::Lending => write!(f, "lending"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

/// A venue that exchanges one token for another.
pub trait SwapVenue: Send + Sync {
    /// Sells `amount_in` of `token_in` held by `trader` for `token_out`.
    ///
    /// Returns the amount of `token_out` credited to `trader`.
    ///
    /// # Errors
    /// * `TradeFailed` if either leg of the transfer fails
    /// * `SourceUnavailable` if the venue does not trade this pair
    fn swap(
        &self,
        ledger: &mut Ledger,
        trader: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, ExecutionError>;
}

/// A venue with readable pool reserves.
pub trait LiquidityVenue: SwapVenue {
    /// Current reserves of the pool for `pair`, oriented to (A, B).
    ///
    /// # Errors
    /// * `SourceUnavailable` if no pool exists or a reserve is zero
    fn reserves(&self, ledger: &Ledger, pair: &AssetPair) -> Result<ReserveSnapshot, ExecutionError>;
}

/// A price feed for one direction of the pair.
pub trait PriceOracle: Send + Sync {
    /// Latest reported round.
    ///
    /// # Errors
    /// Implementation specific; the in-memory oracle never fails
    fn latest_quote(&self) -> Result<OracleQuote, ExecutionError>;
}

/// Borrower side of a flash loan.
pub trait FlashLoanReceiver {
    /// Called by the lender once `amount` of `token` has been delivered.
    ///
    /// The receiver must return `amount + premium` to the lender before returning.
    ///
    /// # Errors
    /// Any error aborts the loan, and with it the whole invocation
    fn on_flash_loan(
        &mut self,
        ledger: &mut Ledger,
        lender: Address,
        token: Address,
        amount: U256,
        premium: U256,
    ) -> Result<(), ExecutionError>;
}

/// A venue lending tokens that must be repaid inside the same invocation.
pub trait LendingVenue: Send + Sync {
    /// Lends `amount` of `token` to `borrower`, runs `receiver`, and checks repayment.
    ///
    /// # Errors
    /// * `LoanUnavailable` if the venue cannot or will not supply `amount`
    /// * `RepaymentShortfall` if the loan was not returned with its premium
    /// * whatever `receiver` returns
    fn flash_loan(
        &self,
        ledger: &mut Ledger,
        borrower: Address,
        receiver: &mut dyn FlashLoanReceiver,
        token: Address,
        amount: U256,
    ) -> Result<(), ExecutionError>;
}
