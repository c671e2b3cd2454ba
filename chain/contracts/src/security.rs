//! Shared security primitives for contract modules
//!
//! Capability checks and the pause switch, composed into the ledger as
//! independent state structs rather than layered behaviors.

use ledger_types::ids::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::errors::LedgerError;

/// Capability sets recognised by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Administrative control: registration, awards, flags, withdrawals
    Admin,
    /// Eligible to receive awards and to exit
    Builder,
}

/// Role registry: one membership set per role.
///
/// Membership is plain set membership; the registry itself never decides who
/// may grant. Callers check [`RoleRegistry::ensure`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    admins: BTreeSet<Address>,
    builders: BTreeSet<Address>,
}

impl RoleRegistry {
    /// Create a registry whose only member is `admin`.
    pub fn new(admin: Address) -> Self {
        let mut admins = BTreeSet::new();
        admins.insert(admin);
        Self {
            admins,
            builders: BTreeSet::new(),
        }
    }

    fn set(&self, role: Role) -> &BTreeSet<Address> {
        match role {
            Role::Admin => &self.admins,
            Role::Builder => &self.builders,
        }
    }

    fn set_mut(&mut self, role: Role) -> &mut BTreeSet<Address> {
        match role {
            Role::Admin => &mut self.admins,
            Role::Builder => &mut self.builders,
        }
    }

    /// Check if an account holds a role.
    pub fn has_role(&self, account: &Address, role: Role) -> bool {
        self.set(role).contains(account)
    }

    /// Fail with `Unauthorized` naming the caller and the missing role.
    pub fn ensure(&self, caller: &Address, role: Role) -> Result<(), LedgerError> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            warn!(%caller, ?role, "Unauthorized access attempt");
            Err(LedgerError::Unauthorized {
                caller: *caller,
                role,
            })
        }
    }

    /// Add `account` to `role`. Returns `false` if it was already a member.
    pub fn grant(&mut self, role: Role, account: Address) -> bool {
        self.set_mut(role).insert(account)
    }

    /// Remove `account` from `role`. Returns `false` if it was not a member.
    pub fn revoke(&mut self, role: Role, account: &Address) -> bool {
        self.set_mut(role).remove(account)
    }

    /// Number of members holding `role`.
    pub fn member_count(&self, role: Role) -> usize {
        self.set(role).len()
    }

    /// Members of `role` in address order.
    pub fn members(&self, role: Role) -> impl Iterator<Item = &Address> {
        self.set(role).iter()
    }
}

/// Composable pause modifier.
///
/// When paused, protected operations must be rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    /// Create a new unpaused guard.
    pub fn new() -> Self {
        Self { paused: false }
    }

    /// Pause operations.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Unpause operations.
    pub fn unpause(&mut self) {
        self.paused = false;
    }

    /// Check if currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fail with `EnforcedPause` while paused.
    pub fn when_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::EnforcedPause);
        }
        Ok(())
    }

    /// Fail with `ExpectedPause` while running.
    pub fn when_paused(&self) -> Result<(), LedgerError> {
        if !self.paused {
            return Err(LedgerError::ExpectedPause);
        }
        Ok(())
    }
}
