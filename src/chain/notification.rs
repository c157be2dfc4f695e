use std::fmt::{self, Display};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Notification emitted at the engine boundary for external observers.
///
/// Each one carries the recipient and the exact amount moved. Notifications are
/// part of the ledger state: a reverted invocation leaves none behind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Notification {
    /// Native currency left the engine for the recipient
    EtherWithdrawn {
        /// Receiving account
        recipient: Address,
        /// Amount moved
        amount: U256,
    },
    /// Residual arbitrage proceeds were forwarded to the recipient
    ProfitsTransferred {
        /// Receiving account
        recipient: Address,
        /// Token forwarded
        token: Address,
        /// Amount moved
        amount: U256,
    },
    /// The fixed execution fee was paid
    FeesPaid {
        /// Receiving account
        recipient: Address,
        /// Amount moved
        amount: U256,
    },
    /// An unsolicited token deposit was forwarded to the recipient
    TokensForwarded {
        /// Receiving account
        recipient: Address,
        /// Token forwarded
        token: Address,
        /// Amount moved
        amount: U256,
    },
}

impl Notification {
    /// Account that received the funds.
    #[must_use]
    pub const fn recipient(&self) -> Address {
        match self {
            Self::EtherWithdrawn { recipient, .. }
            | Self::ProfitsTransferred { recipient, .. }
            | Self::FeesPaid { recipient, .. }
            | Self::TokensForwarded { recipient, .. } => *recipient,
        }
    }

    /// Amount moved.
    #[must_use]
    pub const fn amount(&self) -> U256 {
        match self {
            Self::EtherWithdrawn { amount, .. }
            | Self::ProfitsTransferred { amount, .. }
            | Self::FeesPaid { amount, .. }
            | Self::TokensForwarded { amount, .. } => *amount,
        }
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EtherWithdrawn { recipient, amount } => {
                write!(f, "EtherWithdrawn({recipient}, {amount})")
            }
            Self::ProfitsTransferred {
                recipient,
                token,
                amount,
            } => write!(f, "ProfitsTransferred({recipient}, {amount} {token})"),
            Self::FeesPaid { recipient, amount } => write!(f, "FeesPaid({recipient}, {amount})"),
            Self::TokensForwarded {
                recipient,
                token,
                amount,
            } => write!(f, "TokensForwarded({recipient}, {amount} {token})"),
        }
    }
}
