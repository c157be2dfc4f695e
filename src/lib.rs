/*!
 * # Oracle Arb - Single-Shot Oracle vs Pool Arbitrage
 *
 * Oracle Arb compares the exchange rate implied by a constant-product pool against
 * the rate reported by price oracles and, when the pool misprices an asset, runs a
 * flash-loan funded borrow, trade, repay and distribute sequence that either
 * completes entirely or leaves every balance untouched.
 *
 * ## Core Features
 *
 * - **Opportunity Detection**: Fixed-point comparison of pool and oracle prices in both directions
 * - **Atomic Execution**: Every invocation runs inside one ledger checkpoint
 * - **Access Control**: A single controller gates execution and configuration
 * - **Live Detection**: The same detector fed from a Uniswap V2 pair and Chainlink feeds
 *
 * ## Module Structure
 *
 * - `arb`: Detection, orchestration, settlement and the engine
 * - `auth`: Controller gate
 * - `chain`: Journaled ledger and notifications
 * - `config`: Engine and live configuration
 * - `error`: Error types
 * - `live`: Read-only RPC readers
 * - `notify`: Slack publishing
 * - `scenario`: JSON world descriptions
 * - `utils`: Utility functions and helpers
 * - `venues`: Liquidity, oracle, lending and exit venues
 */

/// Arbitrage detection and execution logic
pub mod arb;
/// Single-controller authorization
pub mod auth;
/// In-process ledger the engine runs against
pub mod chain;
/// Configuration management for the system
pub mod config;
/// Error types
pub mod error;
/// Live chain readers
pub mod live;
/// Outbound notifications
pub mod notify;
/// Scenario files
pub mod scenario;
/// Utility functions and helpers
pub mod utils;
/// Venue interfaces and in-memory implementations
pub mod venues;
