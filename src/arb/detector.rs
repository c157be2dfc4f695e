//! Opportunity detection: compares the prices implied by pool reserves against the
//! oracle prices, in both directions, on a 1e18 fixed-point scale.
//!
//! Detection is a pure function of its inputs. It never reads state and never caches.

use std::fmt::{self, Display};

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use super::types::{OpportunityDirection, OracleQuote, QuoteDirection, ReserveSnapshot};
use crate::error::ExecutionError;
use crate::utils::constants::SCALE;

/// The four prices the decision was made on, and the decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceComparison {
    /// One A in B, implied by reserves
    pub implied_a_in_b: U256,
    /// One B in A, implied by reserves
    pub implied_b_in_a: U256,
    /// One A in B, per the oracle
    pub oracle_a_to_b: U256,
    /// One B in A, per the oracle
    pub oracle_b_to_a: U256,
    /// Trade to make, if any
    pub direction: Option<OpportunityDirection>,
}

impl PriceComparison {
    /// Compares reserves against both quotes.
    ///
    /// # Arguments
    /// * `snapshot` - Pool reserves, oriented to (A, B)
    /// * `a_to_b` - Oracle quote for one A in B
    /// * `b_to_a` - Oracle quote for one B in A
    /// * `threshold` - Minimum reserve of A
    ///
    /// # Returns
    /// * `SellAForB` if the pool prices A above the oracle
    /// * otherwise `SellBForA` if the pool prices B above the oracle
    /// * otherwise no direction. Equal prices are not an opportunity.
    ///
    /// # Errors
    /// * `InsufficientLiquidity` if `reserve_a < threshold`
    /// * `StalePrice` if a quote is not positive
    /// * `MathOverflow` if fixed-point scaling overflows
    pub fn compute(
        snapshot: &ReserveSnapshot,
        a_to_b: &OracleQuote,
        b_to_a: &OracleQuote,
        threshold: U256,
    ) -> Result<Self, ExecutionError> {
        if snapshot.reserve_a < threshold {
            return Err(ExecutionError::InsufficientLiquidity {
                reserve: snapshot.reserve_a,
                threshold,
            });
        }

        let implied_a_in_b = implied_price(snapshot.reserve_b, snapshot.reserve_a)?;
        let implied_b_in_a = implied_price(snapshot.reserve_a, snapshot.reserve_b)?;
        let oracle_a_to_b = a_to_b.scaled_price(QuoteDirection::AToB)?;
        let oracle_b_to_a = b_to_a.scaled_price(QuoteDirection::BToA)?;

        // A>B is checked first and wins when both sides qualify
        let direction = if implied_a_in_b > oracle_a_to_b {
            Some(OpportunityDirection::SellAForB)
        } else if implied_b_in_a > oracle_b_to_a {
            Some(OpportunityDirection::SellBForA)
        } else {
            None
        };

        Ok(Self {
            implied_a_in_b,
            implied_b_in_a,
            oracle_a_to_b,
            oracle_b_to_a,
            direction,
        })
    }
}

impl Display for PriceComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A in B: pool {} / oracle {}, B in A: pool {} / oracle {}, ",
            self.implied_a_in_b, self.oracle_a_to_b, self.implied_b_in_a, self.oracle_b_to_a
        )?;
        match self.direction {
            Some(direction) => write!(f, "{direction}"),
            None => write!(f, "no opportunity"),
        }
    }
}

/// Decides whether to trade and which way. See [`PriceComparison::compute`].
///
/// # Errors
/// Same as [`PriceComparison::compute`]
pub fn detect(
    snapshot: &ReserveSnapshot,
    a_to_b: &OracleQuote,
    b_to_a: &OracleQuote,
    threshold: U256,
) -> Result<Option<OpportunityDirection>, ExecutionError> {
    PriceComparison::compute(snapshot, a_to_b, b_to_a, threshold).map(|c| c.direction)
}

/// `numerator * 1e18 / denominator`
fn implied_price(numerator: U256, denominator: U256) -> Result<U256, ExecutionError> {
    let scaled = numerator
        .checked_mul(SCALE)
        .ok_or(ExecutionError::MathOverflow {
            context: "implied pool price",
        })?;
    scaled
        .checked_div(denominator)
        .ok_or(ExecutionError::MathOverflow {
            context: "implied pool price",
        })
}
