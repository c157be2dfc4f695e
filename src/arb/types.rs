use std::fmt::{self, Debug, Display};

use alloy::primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::utils::constants::SCALE_DECIMALS;

/// The two assets the engine arbitrates, in a fixed (A, B) order.
///
/// The order matters: reserves are always reported as (A, B), and the detector's
/// tie-break favours the A→B comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    /// Token A
    pub a: Address,
    /// Token B
    pub b: Address,
}

impl AssetPair {
    /// Creates a pair from two token addresses.
    #[must_use]
    pub const fn new(a: Address, b: Address) -> Self {
        Self { a, b }
    }

    /// Same tokens, (B, A) order.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }

    /// Whether `token` is one of the two assets.
    #[must_use]
    pub fn contains(&self, token: Address) -> bool {
        self.a == token || self.b == token
    }
}

impl Debug for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.a, self.b)
    }
}

/// Point-in-time pool reserves, oriented to the pair's (A, B) order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    /// Reserve of token A
    pub reserve_a: U256,
    /// Reserve of token B
    pub reserve_b: U256,
    /// When the reserves were observed (seconds)
    pub timestamp: u64,
}

impl ReserveSnapshot {
    /// Creates a snapshot, or `None` when either reserve is zero: an empty side means
    /// there is no usable pool.
    #[must_use]
    pub fn new(reserve_a: U256, reserve_b: U256, timestamp: u64) -> Option<Self> {
        if reserve_a.is_zero() || reserve_b.is_zero() {
            return None;
        }
        Some(Self {
            reserve_a,
            reserve_b,
            timestamp,
        })
    }
}

/// Which way an oracle feed quotes the pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteDirection {
    /// Price of one A in units of B
    AToB,
    /// Price of one B in units of A
    BToA,
}

impl Display for QuoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AToB => write!(f, "A>B"),
            Self::BToA => write!(f, "B>A"),
        }
    }
}

/// Latest answer of a price feed, Chainlink style.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleQuote {
    /// Reported price; only strictly positive values are usable
    pub price: I256,
    /// Decimals of `price`
    pub decimals: u8,
    /// Round the answer belongs to
    pub round_id: u128,
    /// When the round was last updated (seconds)
    pub updated_at: u64,
}

impl OracleQuote {
    /// Creates a quote with 18 decimals, the detector's native scale.
    #[must_use]
    pub const fn scaled(price: I256, round_id: u128, updated_at: u64) -> Self {
        Self {
            price,
            decimals: SCALE_DECIMALS,
            round_id,
            updated_at,
        }
    }

    /// Whether the price can be used at all. Age is not considered.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.price.is_positive()
    }

    /// The price cast onto the 1e18 fixed-point scale.
    ///
    /// # Errors
    /// * `StalePrice` if the price is zero or negative, or rounds to zero on the 1e18 scale
    /// * `MathOverflow` if rescaling overflows
    pub fn scaled_price(&self, direction: QuoteDirection) -> Result<U256, ExecutionError> {
        let stale = ExecutionError::StalePrice {
            direction,
            price: self.price,
        };
        if !self.is_valid() {
            return Err(stale);
        }
        let raw = self.price.into_raw();

        if self.decimals == SCALE_DECIMALS {
            return Ok(raw);
        }

        let overflow = ExecutionError::MathOverflow {
            context: "oracle price rescaling",
        };
        let diff = self.decimals.abs_diff(SCALE_DECIMALS);
        let factor = U256::from(10u8).checked_pow(U256::from(diff));

        let scaled = if self.decimals < SCALE_DECIMALS {
            factor
                .and_then(|factor| raw.checked_mul(factor))
                .ok_or(overflow)?
        } else {
            // A divisor past U256 leaves nothing of the answer
            factor.map_or(U256::ZERO, |factor| raw / factor)
        };

        if scaled.is_zero() {
            return Err(stale);
        }
        Ok(scaled)
    }
}

/// Which asset the pool overvalues relative to the oracle, and so which way to trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpportunityDirection {
    /// The pool overvalues A: borrow A, sell it for B on the pool
    SellAForB,
    /// The pool overvalues B: borrow B, sell it for A on the pool
    SellBForA,
}

impl OpportunityDirection {
    /// Token borrowed from the lender and sold on the pool.
    #[must_use]
    pub const fn borrowed(self, pair: &AssetPair) -> Address {
        match self {
            Self::SellAForB => pair.a,
            Self::SellBForA => pair.b,
        }
    }

    /// Token received from the pool and sold back on the exit venue.
    #[must_use]
    pub const fn counter(self, pair: &AssetPair) -> Address {
        match self {
            Self::SellAForB => pair.b,
            Self::SellBForA => pair.a,
        }
    }
}

impl Display for OpportunityDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SellAForB => write!(f, "sell A for B"),
            Self::SellBForA => write!(f, "sell B for A"),
        }
    }
}
