//! Reward-credit ledger with per-series reserve vaults
//!
//! Non-transferable reward credits are awarded to registered builders in
//! numbered series. Each series is backed by a reserve vault; a builder exits
//! by surrendering their whole series balance for a pro-rata share of that
//! vault's reserve.
//!
//! # Modules
//! - `ledger`: Credit balances, series supplies, roles, flags, redemption
//! - `vault`: Per-series reserve custody and exit quotes
//! - `factory`: Vault creation bound to one ledger
//! - `assets`: Balances of the external reserve assets
//! - `balances`: Series/total/supply bookkeeping with invariant checks
//! - `security`: Role registry and pause switch
//! - `config`: Ledger initialization parameters
//! - `snapshot`: Versioned, checksummed ledger state
//! - `deployment`: Lock-guarded host for a full deployment
//! - `events`: Contract events
//! - `errors`: Contract-specific error types

pub mod assets;
pub mod balances;
pub mod config;
pub mod deployment;
pub mod errors;
pub mod events;
pub mod factory;
pub mod ledger;
pub mod security;
pub mod snapshot;
pub mod vault;

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";

pub use config::{LedgerConfig, RedemptionMode};
pub use deployment::{Contracts, Deployment};
pub use ledger::{Ledger, SerieVault};
pub use vault::{ReserveVault, VaultRegistry};
