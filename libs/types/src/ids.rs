//! Identity types for ledger participants, vaults, and reserve assets
//!
//! Every actor the ledger talks about (treasury, builders, the ledger itself,
//! vaults, reserve assets) is named by an [`Address`]. Fresh addresses use
//! UUID v7 so that registries iterate in creation order; the nil UUID is the
//! null identity that validation rejects.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identity of a participant, component, or reserve asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Uuid);

impl Address {
    /// The null identity. Never a valid builder, asset, or recipient.
    pub const NULL: Address = Address(Uuid::nil());

    /// Create a fresh, time-ordered address.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Whether this is the null identity.
    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Award-series identifier.
///
/// Series `0` is reserved as "unset" and rejected by every operation that
/// takes a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(u64);

impl SeriesId {
    /// The reserved, invalid series.
    pub const UNSET: SeriesId = SeriesId(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Whether this is the reserved series `0`.
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for SeriesId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
