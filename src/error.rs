//! Error types for the engine core and the ledger it runs against.
//!
//! Every variant of [`ExecutionError`] is fatal to the invocation that raised it.
//! Nothing in the core retries: the caller has to start a new invocation with
//! fresh readings.

use alloy::primitives::{Address, I256, U256};
use thiserror::Error;

use crate::arb::types::{AssetPair, QuoteDirection};
use crate::chain::Asset;
use crate::venues::VenueKind;

/// Errors raised by [`crate::chain::Ledger`] balance operations.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LedgerError {
    /// The sender does not hold enough of the asset
    #[error("{account} holds {available} of {asset}, needs {needed}")]
    InsufficientBalance {
        /// Account being debited
        account: Address,
        /// Asset being moved
        asset: Asset,
        /// Amount requested
        needed: U256,
        /// Amount held
        available: U256,
    },

    /// The recipient refuses incoming transfers
    #[error("{recipient} rejected the transfer")]
    TransferRejected {
        /// Account that refused the transfer
        recipient: Address,
    },

    /// A credit would overflow the recipient balance
    #[error("balance overflow crediting {account}")]
    Overflow {
        /// Account being credited
        account: Address,
    },
}

/// Errors surfaced by an engine invocation.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ExecutionError {
    /// Caller is not the configured controller
    #[error("caller {caller} is not the controller")]
    Unauthorized {
        /// Identity that attempted the call
        caller: Address,
    },

    /// An invocation is already running
    #[error("invocation already in progress")]
    Reentrancy,

    /// The liquidity venue has no usable pool for the pair
    #[error("no usable pool for {pair}")]
    SourceUnavailable {
        /// Pair that was looked up
        pair: AssetPair,
    },

    /// An oracle reported a non-positive price
    #[error("oracle {direction} reported non-positive price {price}")]
    StalePrice {
        /// Feed direction that failed
        direction: QuoteDirection,
        /// Raw reported price
        price: I256,
    },

    /// Pool depth on asset A is below the configured threshold
    #[error("reserve {reserve} is below the liquidity threshold {threshold}")]
    InsufficientLiquidity {
        /// Observed reserve of asset A
        reserve: U256,
        /// Configured threshold
        threshold: U256,
    },

    /// The lending venue cannot supply the notional
    #[error("lender cannot supply {amount} of {token}")]
    LoanUnavailable {
        /// Token requested
        token: Address,
        /// Amount requested
        amount: U256,
    },

    /// A swap on the liquidity or exit venue failed
    #[error("trade on {venue} failed: {source}")]
    TradeFailed {
        /// Venue the swap was sent to
        venue: Address,
        /// Underlying ledger failure
        #[source]
        source: LedgerError,
    },

    /// The fixed fee could not be paid to the recipient
    #[error("fee transfer to {recipient} failed: {source}")]
    FeeTransferFailed {
        /// Fee recipient
        recipient: Address,
        /// Underlying ledger failure
        #[source]
        source: LedgerError,
    },

    /// The loan plus premium could not be returned in full
    #[error("repayment shortfall: owed {owed}, available {available}")]
    RepaymentShortfall {
        /// Notional plus premium
        owed: U256,
        /// Amount the borrower could return (or did return)
        available: U256,
    },

    /// Residual profit could not be forwarded to the recipient
    #[error("profit distribution to {recipient} failed: {source}")]
    DistributionFailed {
        /// Profit recipient
        recipient: Address,
        /// Underlying ledger failure
        #[source]
        source: LedgerError,
    },

    /// A configured venue address has no registered implementation
    #[error("no {kind} venue registered at {address}")]
    UnknownVenue {
        /// Which role the venue was expected to fill
        kind: VenueKind,
        /// Configured address
        address: Address,
    },

    /// Fixed-point arithmetic overflowed
    #[error("arithmetic overflow in {context}")]
    MathOverflow {
        /// Computation that overflowed
        context: &'static str,
    },

    /// Configuration failed validation
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it
        reason: String,
    },

    /// An unsolicited deposit named the engine itself as the sender
    #[error("engine account {account} cannot deposit into itself")]
    SelfDeposit {
        /// Engine account
        account: Address,
    },

    /// A boundary transfer failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
