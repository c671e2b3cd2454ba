//! Contract events
//!
//! Events are immutable records emitted by successful mutating operations.
//! They form the audit log that tooling and tests observe.

use ledger_types::ids::{Address, SeriesId};
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};

use crate::security::Role;

/// Builder registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderAdded {
    pub builder: Address,
}

/// Builder unregistered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderRemoved {
    pub builder: Address,
}

/// Credits awarded to a builder within a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAwarded {
    pub user: Address,
    pub amount: Amount,
    pub serie: SeriesId,
}

/// Series credits redeemed for reserve funds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub user: Address,
    pub quote: Amount,
    pub serie: SeriesId,
}

/// Ledger-held credits destroyed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditsBurnt {
    pub amount: Amount,
    pub serie: SeriesId,
}

/// Vault bound to a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerieVaultSet {
    pub serie: SeriesId,
    pub vault: Address,
}

/// Series vault binding activated or deactivated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerieVaultStatusUpdated {
    pub serie: SeriesId,
    pub active: bool,
}

/// Exits globally enabled or disabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStateUpdated {
    pub enabled: bool,
}

/// Reserve asset reference replaced (ledger or vault)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTokenUpdated {
    pub old: Address,
    pub new: Address,
}

/// Pause state changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseStateUpdated {
    pub account: Address,
    pub paused: bool,
}

/// Role membership granted or revoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleUpdated {
    pub role: Role,
    pub account: Address,
    pub granted: bool,
}

/// Full reserve balance swept to the treasury.
///
/// `serie` is `None` for the ledger-scoped reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveWithdrawn {
    pub serie: Option<SeriesId>,
    pub to: Address,
    pub amount: Amount,
}

/// Vault paid out a redemption quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveReleased {
    pub to: Address,
    pub amount: Amount,
}

/// Factory instantiated a vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultCreated {
    pub vault: Address,
    pub value_token: Address,
    pub serie: SeriesId,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    BuilderAdded(BuilderAdded),
    BuilderRemoved(BuilderRemoved),
    UserAwarded(UserAwarded),
    Exit(Exit),
    CreditsBurnt(CreditsBurnt),
    SerieVaultSet(SerieVaultSet),
    SerieVaultStatusUpdated(SerieVaultStatusUpdated),
    ExitStateUpdated(ExitStateUpdated),
    ValueTokenUpdated(ValueTokenUpdated),
    PauseStateUpdated(PauseStateUpdated),
    RoleUpdated(RoleUpdated),
    ReserveWithdrawn(ReserveWithdrawn),
    ReserveReleased(ReserveReleased),
    VaultCreated(VaultCreated),
}

impl ContractEvent {
    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            ContractEvent::BuilderAdded(_) => "BuilderAdded",
            ContractEvent::BuilderRemoved(_) => "BuilderRemoved",
            ContractEvent::UserAwarded(_) => "UserAwarded",
            ContractEvent::Exit(_) => "Exit",
            ContractEvent::CreditsBurnt(_) => "CreditsBurnt",
            ContractEvent::SerieVaultSet(_) => "SerieVaultSet",
            ContractEvent::SerieVaultStatusUpdated(_) => "SerieVaultStatusUpdated",
            ContractEvent::ExitStateUpdated(_) => "ExitStateUpdated",
            ContractEvent::ValueTokenUpdated(_) => "ValueTokenUpdated",
            ContractEvent::PauseStateUpdated(_) => "PauseStateUpdated",
            ContractEvent::RoleUpdated(_) => "RoleUpdated",
            ContractEvent::ReserveWithdrawn(_) => "ReserveWithdrawn",
            ContractEvent::ReserveReleased(_) => "ReserveReleased",
            ContractEvent::VaultCreated(_) => "VaultCreated",
        }
    }
}
