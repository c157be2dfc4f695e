//! Single-controller access control.
//!
//! Privileged engine operations take an [`Authorized`] token, which can only be obtained
//! from [`AuthorizationGate::require_caller`].

use alloy::primitives::Address;
use log::warn;

use crate::error::ExecutionError;

/// Proof that the caller of the current operation is the controller.
///
/// Only [`AuthorizationGate::require_caller`] can build one, so a function taking
/// `&Authorized` cannot be reached without passing the gate. The token also carries the
/// admitted identity, which the fund-moving steps log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Authorized {
    /// Identity that passed the gate
    caller: Address,
}

impl Authorized {
    /// Identity that passed the gate.
    #[must_use]
    pub const fn caller(&self) -> Address {
        self.caller
    }
}

/// Admits only the configured controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorizationGate {
    /// The one identity allowed through
    controller: Address,
}

impl AuthorizationGate {
    /// Creates a gate for `controller`.
    #[must_use]
    pub const fn new(controller: Address) -> Self {
        Self { controller }
    }

    /// Checks that `caller` is the controller.
    ///
    /// # Errors
    /// * `Unauthorized` for any other identity
    pub fn require_caller(&self, caller: Address) -> Result<Authorized, ExecutionError> {
        if caller != self.controller {
            warn!("auth: rejected caller {caller}");
            return Err(ExecutionError::Unauthorized { caller });
        }
        Ok(Authorized { caller })
    }
}
