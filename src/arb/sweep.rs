use alloy::primitives::{Address, U256};
use log::{debug, info, warn};

use crate::auth::Authorized;
use crate::chain::{Asset, Ledger, Notification};
use crate::error::ExecutionError;

/// Moves the engine's whole native balance to the recipient and emits `EtherWithdrawn`.
/// An empty balance moves nothing and emits nothing.
///
/// # Errors
/// * `Ledger` if the recipient refuses the transfer
pub fn withdraw_native(
    ledger: &mut Ledger,
    authorized: &Authorized,
    engine: Address,
    recipient: Address,
) -> Result<U256, ExecutionError> {
    let amount = ledger.balance(engine, Asset::Native);
    if amount.is_zero() {
        debug!("arb::sweep: nothing to withdraw for {}", authorized.caller());
        return Ok(amount);
    }
    ledger.transfer(engine, recipient, Asset::Native, amount)?;
    ledger.emit(Notification::EtherWithdrawn { recipient, amount });
    info!(
        "arb::sweep: {} withdrew {amount} native to {recipient}",
        authorized.caller()
    );
    Ok(amount)
}

/// Tops up the engine's native balance from the controller, to cover fees.
///
/// # Errors
/// * `Ledger` if the controller cannot cover `amount`
pub fn fund_native(
    ledger: &mut Ledger,
    authorized: &Authorized,
    engine: Address,
    amount: U256,
) -> Result<(), ExecutionError> {
    ledger.transfer(authorized.caller(), engine, Asset::Native, amount)?;
    info!("arb::sweep: engine funded with {amount} native");
    Ok(())
}

/// Accepts an unsolicited deposit and passes it straight on to the recipient.
///
/// Credit and forward happen in one checkpoint: either both land or neither does.
///
/// # Errors
/// * `SelfDeposit` if `from` is the engine account
/// * `Ledger` if the sender cannot cover `amount` or the recipient refuses it
pub fn forward_unsolicited(
    ledger: &mut Ledger,
    from: Address,
    engine: Address,
    recipient: Address,
    asset: Asset,
    amount: U256,
) -> Result<(), ExecutionError> {
    if from == engine {
        warn!("arb::sweep: rejected deposit of {amount} {asset} sent by the engine itself");
        return Err(ExecutionError::SelfDeposit { account: engine });
    }
    ledger.atomically(|ledger| -> Result<(), ExecutionError> {
        ledger.transfer(from, engine, asset, amount)?;
        ledger.transfer(engine, recipient, asset, amount)?;
        ledger.emit(match asset {
            Asset::Native => Notification::EtherWithdrawn { recipient, amount },
            Asset::Token(token) => Notification::TokensForwarded {
                recipient,
                token,
                amount,
            },
        });
        info!("arb::sweep: forwarded unsolicited {amount} {asset} from {from} to {recipient}");
        Ok(())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::{address, token};
    use crate::auth::AuthorizationGate;
    use crate::error::LedgerError;

    #[test]
    fn test_withdraw_whole_balance() {
        let (engine, recipient, controller) =
            (address("engine"), address("recipient"), address("controller"));
        let authorized = AuthorizationGate::new(controller)
            .require_caller(controller)
            .unwrap();
        let mut ledger = Ledger::new(0);
        ledger.mint(engine, Asset::Native, U256::from(77)).unwrap();

        let amount = withdraw_native(&mut ledger, &authorized, engine, recipient).unwrap();

        assert_eq!(amount, U256::from(77));
        assert_eq!(ledger.balance(recipient, Asset::Native), U256::from(77));
        assert_eq!(
            ledger.notifications(),
            &[Notification::EtherWithdrawn {
                recipient,
                amount: U256::from(77)
            }]
        );
    }

    #[test]
    fn test_withdraw_empty_balance_is_silent() {
        let (engine, recipient, controller) =
            (address("engine"), address("recipient"), address("controller"));
        let authorized = AuthorizationGate::new(controller)
            .require_caller(controller)
            .unwrap();
        let mut ledger = Ledger::new(0);

        let amount = withdraw_native(&mut ledger, &authorized, engine, recipient).unwrap();

        assert_eq!(amount, U256::ZERO);
        assert!(ledger.notifications().is_empty());
    }

    #[test]
    fn test_fund_from_controller() {
        let (engine, controller) = (address("engine"), address("controller"));
        let authorized = AuthorizationGate::new(controller)
            .require_caller(controller)
            .unwrap();
        let mut ledger = Ledger::new(0);
        ledger.mint(controller, Asset::Native, U256::from(10)).unwrap();

        fund_native(&mut ledger, &authorized, engine, U256::from(4)).unwrap();

        assert_eq!(ledger.balance(engine, Asset::Native), U256::from(4));
        assert!(ledger.notifications().is_empty());
    }

    #[test]
    fn test_forward_token_deposit() {
        let (engine, recipient, donor) = (address("engine"), address("recipient"), address("donor"));
        let dai = token("DAI");
        let mut ledger = Ledger::new(0);
        ledger.mint(donor, dai, U256::from(500)).unwrap();

        forward_unsolicited(&mut ledger, donor, engine, recipient, dai, U256::from(500)).unwrap();

        assert_eq!(ledger.balance(engine, dai), U256::ZERO);
        assert_eq!(ledger.balance(recipient, dai), U256::from(500));
        assert_eq!(
            ledger.notifications(),
            &[Notification::TokensForwarded {
                recipient,
                token: address("DAI"),
                amount: U256::from(500)
            }]
        );
    }

    #[test]
    fn test_engine_cannot_send_itself_a_deposit() {
        let (engine, recipient) = (address("engine"), address("recipient"));
        let mut ledger = Ledger::new(0);
        ledger.mint(engine, Asset::Native, U256::from(100)).unwrap();
        let before = ledger.clone();

        let err = forward_unsolicited(
            &mut ledger,
            engine,
            engine,
            recipient,
            Asset::Native,
            U256::from(100),
        )
        .unwrap_err();

        assert_eq!(err, ExecutionError::SelfDeposit { account: engine });
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_forward_refused_leaves_nothing_behind() {
        let (engine, recipient, donor) = (address("engine"), address("recipient"), address("donor"));
        let mut ledger = Ledger::new(0);
        ledger.mint(donor, Asset::Native, U256::from(500)).unwrap();
        ledger.set_rejecting(recipient, true);
        let before = ledger.clone();

        let err = forward_unsolicited(
            &mut ledger,
            donor,
            engine,
            recipient,
            Asset::Native,
            U256::from(500),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ExecutionError::Ledger(LedgerError::TransferRejected { recipient })
        );
        assert_eq!(ledger, before);
    }
}
