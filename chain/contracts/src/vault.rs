//! Reserve vault — custody of one series' reserve asset
//!
//! A vault holds its reserve in the [`AssetBook`] under its own address and
//! pays out only when its bound ledger asks:
//! - Pure pro-rata exit quotes with floor division
//! - Ledger-only `release` and `withdraw_to_treasury`
//! - Owner-only replacement of the reserve asset reference

use ledger_types::ids::{Address, SeriesId};
use ledger_types::numeric::{pro_rata, Amount};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::assets::AssetBook;
use crate::errors::VaultError;
use crate::events::{ContractEvent, ReserveReleased, ReserveWithdrawn, ValueTokenUpdated};

/// Vault implementation version
pub const VAULT_VERSION: &str = "1.0.0";

/// Custody contract for exactly one series.
#[derive(Debug, Clone)]
pub struct ReserveVault {
    address: Address,
    owner: Address,
    ledger: Address,
    value_token: Address,
    serie_id: SeriesId,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl ReserveVault {
    /// Create a vault with a fresh address.
    ///
    /// Construction does not validate; the factory does that.
    pub fn new(owner: Address, ledger: Address, value_token: Address, serie_id: SeriesId) -> Self {
        Self {
            address: Address::new(),
            owner,
            ledger,
            value_token,
            serie_id,
            events: Vec::new(),
        }
    }

    // ───────────────────────── Quotes ─────────────────────────

    /// Reserve owed for `user_serie_balance` out of `serie_supply`.
    ///
    /// `floor(balance * reserve / supply)`, or `0` when the supply is zero.
    pub fn get_exit_quote(
        &self,
        user_serie_balance: Amount,
        serie_supply: Amount,
        assets: &AssetBook,
    ) -> Result<Amount, VaultError> {
        let reserve = self.get_stable_token_balance(assets);
        let quote =
            pro_rata(user_serie_balance, reserve, serie_supply).ok_or(VaultError::Overflow)?;
        debug!(
            vault = %self.address,
            user_serie_balance,
            serie_supply,
            reserve,
            quote,
            "Exit quote computed"
        );
        Ok(quote)
    }

    /// Current reserve held by this vault.
    pub fn get_stable_token_balance(&self, assets: &AssetBook) -> Amount {
        assets.balance_of(&self.value_token, &self.address)
    }

    // ───────────────────────── Ledger-only ─────────────────────────

    /// Pay the exit quote for `user_serie_balance` to `to`.
    ///
    /// Returns the amount transferred.
    pub fn release(
        &mut self,
        caller: &Address,
        to: &Address,
        user_serie_balance: Amount,
        serie_supply: Amount,
        assets: &mut AssetBook,
    ) -> Result<Amount, VaultError> {
        self.only_ledger(caller)?;

        let quote = self.get_exit_quote(user_serie_balance, serie_supply, assets)?;
        assets.transfer(&self.value_token, &self.address, to, quote)?;

        self.events.push(ContractEvent::ReserveReleased(ReserveReleased {
            to: *to,
            amount: quote,
        }));
        info!(vault = %self.address, serie = %self.serie_id, %to, quote, "Reserve released");
        Ok(quote)
    }

    /// Sweep the whole reserve to `to`.
    ///
    /// Returns the amount transferred.
    pub fn withdraw_to_treasury(
        &mut self,
        caller: &Address,
        to: &Address,
        assets: &mut AssetBook,
    ) -> Result<Amount, VaultError> {
        self.only_ledger(caller)?;

        let amount = self.get_stable_token_balance(assets);
        assets.transfer(&self.value_token, &self.address, to, amount)?;

        self.events.push(ContractEvent::ReserveWithdrawn(ReserveWithdrawn {
            serie: Some(self.serie_id),
            to: *to,
            amount,
        }));
        info!(vault = %self.address, serie = %self.serie_id, %to, amount, "Reserve withdrawn");
        Ok(amount)
    }

    // ───────────────────────── Owner-only ─────────────────────────

    /// Point the vault at a different reserve asset.
    ///
    /// No funds move; the new asset must be funded separately.
    pub fn set_value_token(
        &mut self,
        caller: &Address,
        new_token: Address,
    ) -> Result<ContractEvent, VaultError> {
        self.only_owner(caller)?;
        if new_token.is_null() {
            return Err(VaultError::InvalidAddress(new_token));
        }

        let old = std::mem::replace(&mut self.value_token, new_token);
        let event = ContractEvent::ValueTokenUpdated(ValueTokenUpdated {
            old,
            new: new_token,
        });
        self.events.push(event.clone());
        info!(vault = %self.address, %old, new = %new_token, "Vault value token updated");
        Ok(event)
    }

    /// Hand ownership to `new_owner`.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), VaultError> {
        self.only_owner(caller)?;
        if new_owner.is_null() {
            return Err(VaultError::InvalidAddress(new_owner));
        }
        self.owner = new_owner;
        Ok(())
    }

    // ───────────────────────── Accessors ─────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The ledger allowed to release and withdraw.
    pub fn ledger(&self) -> Address {
        self.ledger
    }

    /// The reserve asset currently counted as this vault's reserve.
    pub fn value_token(&self) -> Address {
        self.value_token
    }

    pub fn serie_id(&self) -> SeriesId {
        self.serie_id
    }

    pub fn version(&self) -> &'static str {
        VAULT_VERSION
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal Guards ─────────────────────────

    fn only_ledger(&self, caller: &Address) -> Result<(), VaultError> {
        if *caller != self.ledger {
            warn!(vault = %self.address, %caller, "Rejected non-ledger caller");
            return Err(VaultError::OnlyLedger);
        }
        Ok(())
    }

    fn only_owner(&self, caller: &Address) -> Result<(), VaultError> {
        if *caller != self.owner {
            warn!(vault = %self.address, %caller, "Rejected non-owner caller");
            return Err(VaultError::Unauthorized { caller: *caller });
        }
        Ok(())
    }
}

/// Host-side directory of instantiated vaults, keyed by vault address.
#[derive(Debug, Clone, Default)]
pub struct VaultRegistry {
    vaults: HashMap<Address, ReserveVault>,
}

impl VaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `vault`. Returns its address.
    pub fn insert(&mut self, vault: ReserveVault) -> Address {
        let address = vault.address();
        self.vaults.insert(address, vault);
        address
    }

    pub fn get(&self, address: &Address) -> Option<&ReserveVault> {
        self.vaults.get(address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut ReserveVault> {
        self.vaults.get_mut(address)
    }

    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }
}
