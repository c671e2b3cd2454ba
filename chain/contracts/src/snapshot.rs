//! Ledger snapshots — versioned, checksummed state for upgrade continuity
//!
//! A snapshot captures the full [`LedgerState`] (roles, balances, series
//! bindings, flags, metadata). The event log is not part of it; a restored
//! ledger starts with an empty log.
//!
//! State is held in `BTreeMap`/`BTreeSet` collections, so the JSON encoding
//! and therefore the SHA-256 checksum are deterministic.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::errors::SnapshotError;
use crate::ledger::{Ledger, LedgerState, LEDGER_VERSION};
use crate::security::Role;

/// Current snapshot format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A complete, self-verifying copy of a ledger's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Snapshot format version for forward compatibility.
    pub format_version: u32,
    /// Version of the ledger that produced the snapshot.
    pub ledger_version: String,
    pub(crate) state: LedgerState,
    /// Hex SHA-256 of the canonical state encoding.
    pub checksum: String,
}

impl LedgerSnapshot {
    pub(crate) fn new(state: LedgerState) -> Result<Self, SnapshotError> {
        let checksum = compute_digest(&state)?;
        Ok(Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            ledger_version: LEDGER_VERSION.to_string(),
            state,
            checksum,
        })
    }

    /// Digest of the state as it is now.
    pub fn digest(&self) -> Result<String, SnapshotError> {
        compute_digest(&self.state)
    }

    /// Whether the state still matches the recorded checksum.
    pub fn verify_integrity(&self) -> Result<(), SnapshotError> {
        self.verify_digest(&self.checksum)
    }

    /// Compare against a previously published digest.
    pub fn verify_digest(&self, expected: &str) -> Result<(), SnapshotError> {
        let computed = self.digest()?;
        if computed == expected {
            Ok(())
        } else {
            Err(SnapshotError::DigestMismatch {
                expected: expected.to_string(),
                computed,
            })
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Encoding(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Encoding(e.to_string()))
    }
}

/// Hex-encoded SHA-256 over the JSON encoding of `state`.
pub fn compute_digest(state: &LedgerState) -> Result<String, SnapshotError> {
    let bytes = serde_json::to_vec(state).map_err(|e| SnapshotError::Encoding(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

impl Ledger {
    /// Capture the current state.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, SnapshotError> {
        let snapshot = LedgerSnapshot::new(self.state.clone())?;
        info!(
            ledger = %self.address(),
            checksum = %snapshot.checksum,
            "Ledger snapshot taken"
        );
        Ok(snapshot)
    }

    /// Rebuild a ledger from a snapshot.
    ///
    /// Rejects snapshots from a newer format, snapshots whose checksum does
    /// not match, and states that break the balance or role invariants.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Ledger, SnapshotError> {
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.format_version));
        }
        snapshot.verify_integrity()?;

        let state = snapshot.state;
        state.balances.verify().map_err(|reason| {
            warn!(%reason, "Snapshot failed balance check");
            SnapshotError::InvariantViolation(reason)
        })?;
        if state.address.is_null() || state.treasury.is_null() {
            return Err(SnapshotError::InvariantViolation(
                "null ledger or treasury address".to_string(),
            ));
        }
        if !state.roles.has_role(&state.treasury, Role::Admin) {
            return Err(SnapshotError::InvariantViolation(
                "treasury is not an admin".to_string(),
            ));
        }
        if state.roles.has_role(&state.address, Role::Builder) {
            return Err(SnapshotError::InvariantViolation(
                "ledger custody account registered as builder".to_string(),
            ));
        }

        info!(
            ledger = %state.address,
            from_version = %snapshot.ledger_version,
            "Ledger restored from snapshot"
        );
        Ok(Ledger::from_state(state))
    }
}
