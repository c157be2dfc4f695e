//! # Live Module
//!
//! Read-only detection against a node: the same reserves, quotes and detector the
//! engine uses, fed from a Uniswap V2 pair and two Chainlink aggregators. Nothing in
//! this module borrows, trades or signs.

/// Chainlink aggregator reads
pub mod feeds;
/// Uniswap V2 factory and pair reads
pub mod reserves;

use eyre::Result;
use log::info;

pub use feeds::fetch_quote;
pub use reserves::fetch_reserves;

use crate::arb::detector::PriceComparison;
use crate::arb::types::QuoteDirection;
use crate::config::LiveConfig;
use crate::utils::app_context::AppContext;

/// One-shot detection over live chain data.
#[derive(Debug)]
pub struct LiveDetection<'a> {
    /// Provider to read from
    ctx: &'a AppContext,
    /// Factory, pair and feeds to read
    config: &'a LiveConfig,
}

impl<'a> LiveDetection<'a> {
    /// Creates a detection over `config`.
    #[must_use]
    pub const fn new(ctx: &'a AppContext, config: &'a LiveConfig) -> Self {
        Self { ctx, config }
    }

    /// Reads reserves and both quotes concurrently, then compares them.
    ///
    /// # Errors
    /// * `SourceUnavailable`, `StalePrice`, `InsufficientLiquidity`, `MathOverflow` as in
    ///   the engine
    /// * If any RPC call fails
    pub async fn run(&self) -> Result<PriceComparison> {
        let config = self.config;
        let (snapshot, a_to_b, b_to_a) = futures::try_join!(
            fetch_reserves(self.ctx, config.factory, &config.pair),
            fetch_quote(self.ctx, config.oracle_a_to_b, QuoteDirection::AToB),
            fetch_quote(self.ctx, config.oracle_b_to_a, QuoteDirection::BToA),
        )?;

        let comparison =
            PriceComparison::compute(&snapshot, &a_to_b, &b_to_a, config.liquidity_threshold)?;
        info!("live: {} {comparison}", config.pair);
        Ok(comparison)
    }
}
