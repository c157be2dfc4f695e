use alloy::primitives::{Address, U256};
use log::{debug, warn};

use super::{FlashLoanReceiver, LendingVenue};
use crate::chain::{Asset, Ledger};
use crate::error::ExecutionError;
use crate::utils::constants::{AAVE_V2_FLASH_PREMIUM_BPS, BPS_DENOMINATOR};

/// Flash lender lending out of its own ledger balance for a basis-point premium.
///
/// The loan is delivered before the receiver is called, and the lender's balance is
/// checked afterwards: it must have grown by at least the premium.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlashLender {
    /// Venue address, also the account holding the lendable liquidity
    address: Address,
    /// Premium in basis points of the loan amount
    premium_bps: u64,
}

impl FlashLender {
    /// Creates a lender charging the Aave V2 premium of 9 bps.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self::with_premium(address, AAVE_V2_FLASH_PREMIUM_BPS)
    }

    /// Creates a lender with a custom premium.
    #[must_use]
    pub const fn with_premium(address: Address, premium_bps: u64) -> Self {
        Self {
            address,
            premium_bps,
        }
    }

    /// Venue address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Premium charged on a loan of `amount`, rounded down.
    ///
    /// # Errors
    /// * `MathOverflow` if `amount * premium_bps` overflows
    pub fn premium(&self, amount: U256) -> Result<U256, ExecutionError> {
        amount
            .checked_mul(U256::from(self.premium_bps))
            .map(|product| product / U256::from(BPS_DENOMINATOR))
            .ok_or(ExecutionError::MathOverflow {
                context: "flash loan premium",
            })
    }
}

impl LendingVenue for FlashLender {
    fn flash_loan(
        &self,
        ledger: &mut Ledger,
        borrower: Address,
        receiver: &mut dyn FlashLoanReceiver,
        token: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        let asset = Asset::Token(token);
        let unavailable = ExecutionError::LoanUnavailable { token, amount };

        let balance_before = ledger.balance(self.address, asset);
        if amount.is_zero() || balance_before < amount {
            warn!(
                "venues::lender: cannot lend {amount} of {token}, liquidity is {balance_before}"
            );
            return Err(unavailable);
        }

        let premium = self.premium(amount)?;
        let owed = balance_before
            .checked_add(premium)
            .ok_or(ExecutionError::MathOverflow {
                context: "flash loan repayment target",
            })?;

        ledger
            .transfer(self.address, borrower, asset, amount)
            .map_err(|_| unavailable)?;
        debug!("venues::lender: lent {amount} of {token} to {borrower}, premium {premium}");

        receiver.on_flash_loan(ledger, self.address, token, amount, premium)?;

        let balance_after = ledger.balance(self.address, asset);
        if balance_after < owed {
            warn!("venues::lender: loan to {borrower} not repaid, balance {balance_after} < {owed}");
            return Err(ExecutionError::RepaymentShortfall {
                owed: amount.saturating_add(premium),
                available: balance_after.saturating_sub(balance_before.saturating_sub(amount)),
            });
        }

        Ok(())
    }
}
