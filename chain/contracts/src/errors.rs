//! Contract-specific error types
//!
//! One error enum per component. Every variant is a distinct, inspectable
//! cause so that calling tooling can branch on it:
//! authorization, validation, state precondition, or settlement.

use ledger_types::ids::{Address, SeriesId};
use ledger_types::numeric::Amount;
use thiserror::Error;

use crate::security::Role;

/// Reserve-asset book errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("Insufficient {asset} balance for {holder}: required {required}, available {available}")]
    InsufficientBalance {
        asset: Address,
        holder: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Invalid address: {0}")]
    InvalidAddress(Address),

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// Reserve vault errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VaultError {
    #[error("ReserveVault: only ledger")]
    OnlyLedger,

    #[error("Unauthorized: {caller} is not the vault owner")]
    Unauthorized { caller: Address },

    #[error("Invalid address: {0}")]
    InvalidAddress(Address),

    #[error("Arithmetic overflow in quote calculation")]
    Overflow,

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Vault factory errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactoryError {
    #[error("Unauthorized: {caller} is not the factory owner")]
    Unauthorized { caller: Address },

    #[error("Invalid address: {0}")]
    InvalidAddress(Address),

    #[error("Invalid serie: {0}")]
    InvalidSerie(SeriesId),
}

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    // ── authorization ──
    #[error("Unauthorized: {caller} is missing role {role:?}")]
    Unauthorized { caller: Address, role: Role },

    // ── validation ──
    #[error("Invalid address: {0}")]
    InvalidAddress(Address),

    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),

    #[error("Invalid serie: {0}")]
    InvalidSerie(SeriesId),

    #[error("Invalid builder: {0}")]
    InvalidBuilder(Address),

    #[error("Already builder: {0}")]
    AlreadyBuilder(Address),

    #[error("Users and amounts length mismatch: {users} users, {amounts} amounts")]
    LengthMismatch { users: usize, amounts: usize },

    // ── state preconditions ──
    #[error("Exits disabled")]
    ExitsDisabled,

    #[error("Ledger is paused")]
    EnforcedPause,

    #[error("Ledger is not paused")]
    ExpectedPause,

    #[error("Invalid serie vault for serie {serie}: {vault}")]
    InvalidSerieVault { serie: SeriesId, vault: Address },

    #[error("Serie {0} has no minted supply")]
    SerieWithNoMintedSupply(SeriesId),

    #[error("Invalid user serie balance: {0}")]
    InvalidUserSerieBalance(Amount),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Unknown vault: {0}")]
    UnknownVault(Address),

    // ── settlement ──
    #[error("Invalid quote: {quote}")]
    InvalidQuote { quote: Amount },

    // ── non-transferability ──
    #[error("Transfer forbidden: {0}")]
    TransferForbidden(&'static str),

    #[error("Transfer from forbidden: {0}")]
    TransferFromForbidden(&'static str),

    #[error("Burn forbidden")]
    BurnForbidden,

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Snapshot load errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("Unsupported snapshot format version: {0}")]
    UnsupportedVersion(u32),

    #[error("Snapshot invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Snapshot digest mismatch: expected {expected}, computed {computed}")]
    DigestMismatch { expected: String, computed: String },

    #[error("Snapshot encoding error: {0}")]
    Encoding(String),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid initial builder: {0}")]
    InvalidBuilder(Address),

    #[error("Invalid token metadata: {0}")]
    InvalidMetadata(&'static str),
}
