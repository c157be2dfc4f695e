//! # Chain Module
//!
//! In-process stand-in for the execution environment the engine runs against.
//! Balances, notifications and the block timestamp live in a [`Ledger`] whose
//! mutations are journaled, so an invocation can be rolled back as a unit.

/// Journaled balance store with checkpoints
pub mod ledger;
/// Notifications emitted at the engine boundary
pub mod notification;

pub use ledger::{Asset, Checkpoint, Ledger};
pub use notification::Notification;
