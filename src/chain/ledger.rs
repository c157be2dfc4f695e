//! The ledger holds every piece of mutable state an invocation can touch: account balances
//! per asset and the notification log. Each mutation pushes an undo entry onto a journal,
//! and checkpoints mark journal positions that can later be reverted or committed.
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};

use alloy::primitives::{Address, U256};
use log::debug;
use serde::{Deserialize, Serialize};

use super::notification::Notification;
use crate::error::LedgerError;

/// An asset that can be held by an account: the native currency or a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Asset {
    /// The chain's native currency (ether on mainnet)
    Native,
    /// An ERC-20 style token identified by its contract address
    Token(Address),
}

impl Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Token(address) => write!(f, "{address}"),
        }
    }
}

impl From<Address> for Asset {
    fn from(token: Address) -> Self {
        Self::Token(token)
    }
}

/// Undo record for a single mutation
#[derive(Clone, Debug, PartialEq, Eq)]
enum JournalEntry {
    /// A balance changed; `previous` is what it was before
    Balance {
        /// Account whose balance changed
        account: Address,
        /// Asset whose balance changed
        asset: Asset,
        /// Balance before the change
        previous: U256,
    },
    /// A notification was appended to the log
    Notification,
}

/// Opaque marker of a journal position returned by [`Ledger::checkpoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Checkpoint {
    /// Journal length when the checkpoint was taken
    journal_len: usize,
    /// Nesting depth, used to catch out-of-order commits
    depth: usize,
}

/// Journaled balance store.
///
/// Two ledgers compare equal when their balances, notifications, rejection flags and
/// timestamp are equal and neither has an open checkpoint. Zero balances are never
/// stored, so a credit followed by a revert leaves no trace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    /// Non-zero balances keyed by (account, asset)
    balances: HashMap<(Address, Asset), U256>,
    /// Accounts that refuse every incoming transfer
    rejecting: HashSet<Address>,
    /// Committed and pending notifications, in emission order
    notifications: Vec<Notification>,
    /// Undo log for everything since the outermost open checkpoint
    journal: Vec<JournalEntry>,
    /// Open checkpoints (journal lengths), innermost last
    checkpoints: Vec<usize>,
    /// Current block timestamp in seconds
    timestamp: u64,
}

impl Ledger {
    /// Creates an empty ledger at the given block timestamp.
    #[must_use]
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Current block timestamp in seconds.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Moves the block timestamp. Not journaled: time does not roll back.
    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Balance of `asset` held by `account`.
    #[must_use]
    pub fn balance(&self, account: Address, asset: Asset) -> U256 {
        self.balances
            .get(&(account, asset))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Marks `account` as refusing (or accepting again) every incoming transfer.
    ///
    /// Models contracts without a payable fallback, or blacklisted token holders.
    pub fn set_rejecting(&mut self, account: Address, rejecting: bool) {
        if rejecting {
            self.rejecting.insert(account);
        } else {
            self.rejecting.remove(&account);
        }
    }

    /// Creates `amount` of `asset` out of thin air in `account`.
    ///
    /// Used to seed worlds; it is journaled like any other mutation.
    ///
    /// # Errors
    /// * `LedgerError::Overflow` if the balance would exceed `U256::MAX`
    pub fn mint(&mut self, account: Address, asset: Asset, amount: U256) -> Result<(), LedgerError> {
        let balance = self
            .balance(account, asset)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account })?;
        self.set_balance(account, asset, balance);
        Ok(())
    }

    /// Moves `amount` of `asset` from `from` to `to`.
    ///
    /// A zero-amount transfer still checks that the recipient accepts transfers.
    ///
    /// # Errors
    /// * `LedgerError::TransferRejected` if `to` refuses transfers
    /// * `LedgerError::InsufficientBalance` if `from` holds less than `amount`
    /// * `LedgerError::Overflow` if the credit would overflow
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        asset: Asset,
        amount: U256,
    ) -> Result<(), LedgerError> {
        if self.rejecting.contains(&to) {
            return Err(LedgerError::TransferRejected { recipient: to });
        }

        let available = self.balance(from, asset);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from,
                asset,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance(to, asset)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: to })?;

        self.set_balance(from, asset, available - amount);
        self.set_balance(to, asset, credited);
        Ok(())
    }

    /// Appends a notification to the log.
    pub fn emit(&mut self, notification: Notification) {
        debug!("chain::ledger: emit {notification}");
        self.notifications.push(notification);
        self.record(JournalEntry::Notification);
    }

    /// All notifications emitted so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Notifications emitted after the first `since` entries.
    #[must_use]
    pub fn notifications_since(&self, since: usize) -> &[Notification] {
        self.notifications.get(since..).unwrap_or(&[])
    }

    /// Opens a checkpoint. Every mutation after it can be undone with [`Ledger::revert`].
    pub fn checkpoint(&mut self) -> Checkpoint {
        let journal_len = self.journal.len();
        self.checkpoints.push(journal_len);
        Checkpoint {
            journal_len,
            depth: self.checkpoints.len(),
        }
    }

    /// Undoes every mutation made since `checkpoint` and closes it.
    ///
    /// Checkpoints opened after `checkpoint` are closed as well.
    pub fn revert(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.journal_len {
            match self.journal.pop() {
                Some(JournalEntry::Balance {
                    account,
                    asset,
                    previous,
                }) => self.write_balance(account, asset, previous),
                Some(JournalEntry::Notification) => {
                    self.notifications.pop();
                }
                None => break,
            }
        }
        self.checkpoints.truncate(checkpoint.depth.saturating_sub(1));
        self.trim_journal();
    }

    /// Keeps every mutation made since `checkpoint` and closes it.
    ///
    /// The mutations stay revertible by any enclosing checkpoint.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        debug_assert_eq!(
            self.checkpoints.len(),
            checkpoint.depth,
            "checkpoints must be closed innermost first"
        );
        self.checkpoints.truncate(checkpoint.depth.saturating_sub(1));
        self.trim_journal();
    }

    /// Runs `f` inside a checkpoint: its effects are kept if it returns `Ok` and
    /// discarded if it returns `Err`.
    ///
    /// # Errors
    /// Returns whatever error `f` returns, after reverting its effects.
    pub fn atomically<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let checkpoint = self.checkpoint();
        match f(self) {
            Ok(value) => {
                self.commit(checkpoint);
                Ok(value)
            }
            Err(e) => {
                self.revert(checkpoint);
                Err(e)
            }
        }
    }

    /// Whether a checkpoint is currently open.
    #[must_use]
    pub fn in_checkpoint(&self) -> bool {
        !self.checkpoints.is_empty()
    }

    /// Journaled balance write
    fn set_balance(&mut self, account: Address, asset: Asset, value: U256) {
        let previous = self.balance(account, asset);
        if previous == value {
            return;
        }
        self.record(JournalEntry::Balance {
            account,
            asset,
            previous,
        });
        self.write_balance(account, asset, value);
    }

    /// Only mutations under an open checkpoint can be undone, so only those are journaled
    fn record(&mut self, entry: JournalEntry) {
        if self.in_checkpoint() {
            self.journal.push(entry);
        }
    }

    /// Raw balance write, keeping zero balances out of the map
    fn write_balance(&mut self, account: Address, asset: Asset, value: U256) {
        if value.is_zero() {
            self.balances.remove(&(account, asset));
        } else {
            self.balances.insert((account, asset), value);
        }
    }

    /// Nothing can be reverted once the outermost checkpoint is closed
    fn trim_journal(&mut self) {
        if self.checkpoints.is_empty() {
            self.journal.clear();
        }
    }
}
