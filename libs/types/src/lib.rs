//! Types library for the reward-credit ledger
//!
//! Primitive identities and amounts shared by the ledger, reserve vaults and
//! the vault factory.
//!
//! # Modules
//! - `ids`: Identities (`Address`) and award-series identifiers (`SeriesId`)
//! - `numeric`: Integer amounts and floor-division pro-rata math

pub mod ids;
pub mod numeric;
