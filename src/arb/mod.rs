//! # Arbitrage Module
//!
//! Opportunity detection between pool reserves and oracle prices, and the
//! loan-funded, all-or-nothing execution of whatever is detected.

/// Opportunity detection
pub mod detector;
/// The engine entry point
pub mod engine;
/// Loan orchestration state machine
pub mod orchestrator;
/// Liquidity and price feed readers
pub mod readers;
/// Fee payment and profit distribution
pub mod settlement;
/// Native withdrawals, funding and unsolicited asset forwarding
pub mod sweep;
/// Test helpers and utilities
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_helpers;
/// Common type definitions
pub mod types;

pub use detector::{detect, PriceComparison};
pub use engine::{ArbEngine, Invocation};
pub use orchestrator::{ExecutionReport, LoanState};
