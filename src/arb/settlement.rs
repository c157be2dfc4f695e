use alloy::primitives::{Address, U256};
use log::info;

use crate::chain::{Asset, Ledger, Notification};
use crate::error::ExecutionError;

/// Pays the fixed native fee from `payer` to `recipient` and emits `FeesPaid`.
///
/// A zero fee still goes through the recipient check and is still reported.
///
/// # Errors
/// * `FeeTransferFailed` if `payer` cannot cover it or `recipient` refuses it
pub fn pay_fee(
    ledger: &mut Ledger,
    payer: Address,
    recipient: Address,
    amount: U256,
) -> Result<U256, ExecutionError> {
    ledger
        .transfer(payer, recipient, Asset::Native, amount)
        .map_err(|source| ExecutionError::FeeTransferFailed { recipient, source })?;
    ledger.emit(Notification::FeesPaid { recipient, amount });

    info!("arb::settlement: paid fee {amount} to {recipient}");
    Ok(amount)
}

/// Forwards `holder`'s whole balance of `token` to `recipient`.
///
/// Emits `ProfitsTransferred` only when something was moved.
///
/// # Returns
/// * The amount forwarded, zero when there was nothing left
///
/// # Errors
/// * `DistributionFailed` if the recipient refuses the transfer
pub fn distribute_profits(
    ledger: &mut Ledger,
    holder: Address,
    recipient: Address,
    token: Address,
) -> Result<U256, ExecutionError> {
    let asset = Asset::Token(token);
    let amount = ledger.balance(holder, asset);
    if amount.is_zero() {
        info!("arb::settlement: no residual {token} to distribute");
        return Ok(U256::ZERO);
    }

    ledger
        .transfer(holder, recipient, asset, amount)
        .map_err(|source| ExecutionError::DistributionFailed { recipient, source })?;
    ledger.emit(Notification::ProfitsTransferred {
        recipient,
        token,
        amount,
    });

    info!("arb::settlement: distributed {amount} of {token} to {recipient}");
    Ok(amount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::address;
    use crate::error::LedgerError;

    #[test]
    fn test_pay_fee_emits_exact_amount() {
        let (engine, recipient) = (address("engine"), address("recipient"));
        let mut ledger = Ledger::new(0);
        ledger.mint(engine, Asset::Native, U256::from(50)).unwrap();

        pay_fee(&mut ledger, engine, recipient, U256::from(20)).unwrap();

        assert_eq!(ledger.balance(recipient, Asset::Native), U256::from(20));
        assert_eq!(
            ledger.notifications(),
            &[Notification::FeesPaid {
                recipient,
                amount: U256::from(20)
            }]
        );
    }

    #[test]
    fn test_pay_fee_refused() {
        let (engine, recipient) = (address("engine"), address("recipient"));
        let mut ledger = Ledger::new(0);
        ledger.mint(engine, Asset::Native, U256::from(50)).unwrap();
        ledger.set_rejecting(recipient, true);

        assert_eq!(
            pay_fee(&mut ledger, engine, recipient, U256::from(20)),
            Err(ExecutionError::FeeTransferFailed {
                recipient,
                source: LedgerError::TransferRejected { recipient }
            })
        );
        assert!(ledger.notifications().is_empty());
    }

    #[test]
    fn test_distribute_nothing() {
        let (engine, recipient, token) = (address("engine"), address("recipient"), address("A"));
        let mut ledger = Ledger::new(0);

        let amount = distribute_profits(&mut ledger, engine, recipient, token).unwrap();

        assert_eq!(amount, U256::ZERO);
        assert!(ledger.notifications().is_empty());
    }

    #[test]
    fn test_distribute_whole_balance() {
        let (engine, recipient, token) = (address("engine"), address("recipient"), address("A"));
        let mut ledger = Ledger::new(0);
        ledger.mint(engine, Asset::Token(token), U256::from(257)).unwrap();

        let amount = distribute_profits(&mut ledger, engine, recipient, token).unwrap();

        assert_eq!(amount, U256::from(257));
        assert_eq!(ledger.balance(engine, Asset::Token(token)), U256::ZERO);
        assert_eq!(ledger.notifications()[0].amount(), U256::from(257));
    }
}
