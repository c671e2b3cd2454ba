//! Ledger — the reward-credit accounting engine
//!
//! Owns every credit balance, per-series supply, the builder and admin
//! registries, the series→vault bindings and the global flags, and drives
//! redemption through the bound [`ReserveVault`](crate::vault::ReserveVault).
//!
//! All state-changing operations check, in order:
//! 1. Caller capability (admin, or builder for `exit`)
//! 2. Pause state where applicable
//! 3. Input validation
//! 4. State preconditions
//!
//! Single operations validate fully before writing. Batches and `exit` run
//! against a staged copy of the state that is committed only on success, so
//! a failed call leaves the ledger exactly as it was.

use ledger_types::ids::{Address, SeriesId};
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::assets::AssetBook;
use crate::balances::BalanceLedger;
use crate::config::{LedgerConfig, RedemptionMode};
use crate::errors::{LedgerError, VaultError};
use crate::events::{
    BuilderAdded, BuilderRemoved, ContractEvent, CreditsBurnt, Exit, ExitStateUpdated,
    PauseStateUpdated, ReserveWithdrawn, RoleUpdated, SerieVaultSet, SerieVaultStatusUpdated,
    UserAwarded, ValueTokenUpdated,
};
use crate::security::{PauseGuard, Role, RoleRegistry};
use crate::vault::VaultRegistry;

/// Ledger implementation version
pub const LEDGER_VERSION: &str = "1.0.0";

const NO_TRANSFER: &str = "credits are not transferable";
const NO_TRANSFER_FROM: &str = "credits are not transferable on behalf of others";

/// Binding of a series to the vault that backs its redemptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerieVault {
    pub vault: Address,
    pub active: bool,
}

/// Everything the ledger persists. Cloned to stage atomic operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub(crate) address: Address,
    pub(crate) treasury: Address,
    pub(crate) name: String,
    pub(crate) symbol: String,
    pub(crate) decimals: u8,
    pub(crate) value_token: Address,
    pub(crate) redemption: RedemptionMode,
    pub(crate) roles: RoleRegistry,
    pub(crate) balances: BalanceLedger,
    pub(crate) serie_vaults: BTreeMap<SeriesId, SerieVault>,
    pub(crate) exits_enabled: bool,
    pub(crate) pause: PauseGuard,
}

/// The reward-credit ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) state: LedgerState,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl Ledger {
    /// Create a ledger administered solely by `treasury`.
    ///
    /// The ledger gets a fresh address of its own, which is the identity
    /// vaults accept `release` calls from.
    pub fn new(treasury: Address, config: LedgerConfig) -> Result<Self, LedgerError> {
        if treasury.is_null() {
            return Err(LedgerError::InvalidAddress(treasury));
        }
        config.validate()?;

        let state = LedgerState {
            address: Address::new(),
            treasury,
            name: config.name,
            symbol: config.symbol,
            decimals: config.decimals,
            value_token: config.value_token,
            redemption: config.redemption,
            roles: RoleRegistry::new(treasury),
            balances: BalanceLedger::new(),
            serie_vaults: BTreeMap::new(),
            exits_enabled: false,
            pause: PauseGuard::new(),
        };
        let mut ledger = Self {
            state,
            events: Vec::new(),
        };

        let builders = config.initial_builders;
        ledger.transact(|state, events| {
            for builder in builders {
                state.add_builder(builder, events)?;
            }
            Ok(())
        })?;

        info!(
            ledger = %ledger.state.address,
            %treasury,
            symbol = %ledger.state.symbol,
            redemption = ?ledger.state.redemption,
            "Ledger initialized"
        );
        Ok(ledger)
    }

    pub(crate) fn from_state(state: LedgerState) -> Self {
        Self {
            state,
            events: Vec::new(),
        }
    }

    // ───────────────────────── Builders ─────────────────────────

    /// Register a builder. Admin-only.
    pub fn add_builder(&mut self, caller: &Address, builder: Address) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        self.state.add_builder(builder, &mut self.events)
    }

    /// Register several builders, all or none. Admin-only.
    pub fn add_builders_batch(
        &mut self,
        caller: &Address,
        builders: &[Address],
    ) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        self.transact(|state, events| {
            for builder in builders {
                state.add_builder(*builder, events)?;
            }
            Ok(())
        })
    }

    /// Unregister a builder. Admin-only. Existing balances are kept.
    pub fn remove_builder(&mut self, caller: &Address, builder: Address) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        if builder.is_null() {
            return Err(LedgerError::InvalidAddress(builder));
        }
        if !self.state.roles.revoke(Role::Builder, &builder) {
            return Err(LedgerError::InvalidBuilder(builder));
        }
        self.events
            .push(ContractEvent::BuilderRemoved(BuilderRemoved { builder }));
        info!(%builder, "Builder removed");
        Ok(())
    }

    // ───────────────────────── Admin roles ─────────────────────────

    /// Grant the admin role. Admin-only.
    pub fn grant_admin(&mut self, caller: &Address, account: Address) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        if account.is_null() {
            return Err(LedgerError::InvalidAddress(account));
        }
        if self.state.roles.grant(Role::Admin, account) {
            self.events.push(ContractEvent::RoleUpdated(RoleUpdated {
                role: Role::Admin,
                account,
                granted: true,
            }));
            info!(%account, "Admin granted");
        }
        Ok(())
    }

    /// Revoke the admin role. Admin-only. The treasury cannot be revoked.
    pub fn revoke_admin(&mut self, caller: &Address, account: Address) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        if account.is_null() || account == self.state.treasury {
            return Err(LedgerError::InvalidAddress(account));
        }
        if self.state.roles.revoke(Role::Admin, &account) {
            self.events.push(ContractEvent::RoleUpdated(RoleUpdated {
                role: Role::Admin,
                account,
                granted: false,
            }));
            info!(%account, "Admin revoked");
        }
        Ok(())
    }

    // ───────────────────────── Awards ─────────────────────────

    /// Issue `amount` credits of `serie` to a registered builder. Admin-only.
    pub fn award(
        &mut self,
        caller: &Address,
        user: Address,
        amount: Amount,
        serie: SeriesId,
    ) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        self.state.award(user, amount, serie, &mut self.events)
    }

    /// Award each `users[i]` `amounts[i]` credits of `serie`, all or none.
    /// Admin-only.
    pub fn award_batch(
        &mut self,
        caller: &Address,
        users: &[Address],
        amounts: &[Amount],
        serie: SeriesId,
    ) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        if users.len() != amounts.len() {
            return Err(LedgerError::LengthMismatch {
                users: users.len(),
                amounts: amounts.len(),
            });
        }
        self.transact(|state, events| {
            for (user, amount) in users.iter().zip(amounts) {
                state.award(*user, *amount, serie, events)?;
            }
            Ok(())
        })
    }

    /// Destroy `amount` of the ledger's own credits in `serie`. Admin-only.
    ///
    /// Only credits in the ledger's custody can be burnt; participant
    /// balances are never touched.
    pub fn burn(
        &mut self,
        caller: &Address,
        amount: Amount,
        serie: SeriesId,
    ) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        if serie.is_unset() {
            return Err(LedgerError::InvalidSerie(serie));
        }
        let custody = self.state.address;
        self.state.balances.burn(serie, custody, amount)?;

        self.events
            .push(ContractEvent::CreditsBurnt(CreditsBurnt { amount, serie }));
        info!(%serie, amount, "Custody credits burnt");
        Ok(())
    }

    // ───────────────────────── Series vaults ─────────────────────────

    /// Bind `vault` to `serie` and mark the binding active. Admin-only.
    ///
    /// Rebinding is allowed and does not migrate the previous vault's
    /// reserve.
    pub fn set_serie_vault(
        &mut self,
        caller: &Address,
        vault: Address,
        serie: SeriesId,
    ) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        let previous = self
            .state
            .serie_vaults
            .insert(serie, SerieVault { vault, active: true });
        if let Some(previous) = previous.filter(|p| p.vault != vault) {
            warn!(%serie, old = %previous.vault, new = %vault, "Serie vault rebound");
        }
        self.events
            .push(ContractEvent::SerieVaultSet(SerieVaultSet { serie, vault }));
        info!(%serie, %vault, "Serie vault set");
        Ok(())
    }

    /// Activate or deactivate a series binding. Admin-only.
    pub fn update_serie_vault_status(
        &mut self,
        caller: &Address,
        serie: SeriesId,
        active: bool,
    ) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        if serie.is_unset() {
            return Err(LedgerError::InvalidSerie(serie));
        }
        let entry = self
            .state
            .serie_vaults
            .entry(serie)
            .or_insert(SerieVault {
                vault: Address::NULL,
                active,
            });
        entry.active = active;

        self.events
            .push(ContractEvent::SerieVaultStatusUpdated(SerieVaultStatusUpdated {
                serie,
                active,
            }));
        info!(%serie, active, "Serie vault status updated");
        Ok(())
    }

    // ───────────────────────── Flags ─────────────────────────

    pub fn enable_exits(&mut self, caller: &Address) -> Result<(), LedgerError> {
        self.set_exits(caller, true)
    }

    pub fn disable_exits(&mut self, caller: &Address) -> Result<(), LedgerError> {
        self.set_exits(caller, false)
    }

    fn set_exits(&mut self, caller: &Address, enabled: bool) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        self.state.exits_enabled = enabled;
        self.events
            .push(ContractEvent::ExitStateUpdated(ExitStateUpdated { enabled }));
        info!(enabled, "Exit state updated");
        Ok(())
    }

    /// Halt non-administrative operations. Admin-only.
    pub fn pause(&mut self, caller: &Address) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        self.state.pause.when_not_paused()?;
        self.state.pause.pause();
        self.events
            .push(ContractEvent::PauseStateUpdated(PauseStateUpdated {
                account: *caller,
                paused: true,
            }));
        info!(%caller, "Ledger paused");
        Ok(())
    }

    /// Resume non-administrative operations. Admin-only.
    pub fn unpause(&mut self, caller: &Address) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        self.state.pause.when_paused()?;
        self.state.pause.unpause();
        self.events
            .push(ContractEvent::PauseStateUpdated(PauseStateUpdated {
                account: *caller,
                paused: false,
            }));
        info!(%caller, "Ledger unpaused");
        Ok(())
    }

    // ───────────────────────── Reserve ─────────────────────────

    /// Replace the ledger-level reserve asset. Admin-only.
    pub fn set_value_token(&mut self, caller: &Address, new_token: Address) -> Result<(), LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        if new_token.is_null() {
            return Err(LedgerError::InvalidAddress(new_token));
        }
        let old = std::mem::replace(&mut self.state.value_token, new_token);
        self.events
            .push(ContractEvent::ValueTokenUpdated(ValueTokenUpdated {
                old,
                new: new_token,
            }));
        info!(%old, new = %new_token, "Ledger value token updated");
        Ok(())
    }

    /// Sweep the whole reserve of the vault bound to `serie` to the
    /// treasury. Admin-only, paused-only.
    ///
    /// Returns the amount moved.
    pub fn withdraw_serie_vault_token(
        &mut self,
        caller: &Address,
        serie: SeriesId,
        vaults: &mut VaultRegistry,
        assets: &mut AssetBook,
    ) -> Result<Amount, LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        self.state.pause.when_paused()?;

        let binding = self.state.bound_vault(serie)?;
        let vault = vaults
            .get_mut(&binding)
            .ok_or(LedgerError::UnknownVault(binding))?;
        let treasury = self.state.treasury;
        let amount = vault.withdraw_to_treasury(&self.state.address, &treasury, assets)?;

        self.events
            .push(ContractEvent::ReserveWithdrawn(ReserveWithdrawn {
                serie: Some(serie),
                to: treasury,
                amount,
            }));
        info!(%serie, vault = %binding, amount, "Serie vault reserve withdrawn");
        Ok(amount)
    }

    /// Sweep the ledger's own reserve balance to the treasury. Admin-only,
    /// paused-only.
    ///
    /// Returns the amount moved.
    pub fn withdraw_value_token(
        &mut self,
        caller: &Address,
        assets: &mut AssetBook,
    ) -> Result<Amount, LedgerError> {
        self.state.roles.ensure(caller, Role::Admin)?;
        self.state.pause.when_paused()?;

        let token = self.state.value_token;
        if token.is_null() {
            return Err(LedgerError::InvalidAddress(token));
        }
        let treasury = self.state.treasury;
        let amount = assets.balance_of(&token, &self.state.address);
        assets.transfer(&token, &self.state.address, &treasury, amount)?;

        self.events
            .push(ContractEvent::ReserveWithdrawn(ReserveWithdrawn {
                serie: None,
                to: treasury,
                amount,
            }));
        info!(%token, amount, "Ledger reserve withdrawn");
        Ok(amount)
    }

    // ───────────────────────── Redemption ─────────────────────────

    /// Redeem all of the caller's `serie` credits for a pro-rata share of
    /// the bound vault's reserve.
    ///
    /// Returns the quote paid out.
    pub fn exit(
        &mut self,
        caller: &Address,
        serie: SeriesId,
        vaults: &mut VaultRegistry,
        assets: &mut AssetBook,
    ) -> Result<Amount, LedgerError> {
        let result = self.transact(|state, events| state.exit(*caller, serie, vaults, assets, events));
        if let Err(err) = &result {
            warn!(%caller, %serie, error = %err, "Exit rejected");
        }
        result
    }

    // ───────────────────────── Non-transferability ─────────────────────────

    pub fn transfer(&self, _caller: &Address, _to: &Address, _amount: Amount) -> Result<(), LedgerError> {
        Err(LedgerError::TransferForbidden(NO_TRANSFER))
    }

    pub fn transfer_from(
        &self,
        _caller: &Address,
        _from: &Address,
        _to: &Address,
        _amount: Amount,
    ) -> Result<(), LedgerError> {
        Err(LedgerError::TransferFromForbidden(NO_TRANSFER_FROM))
    }

    /// Holders cannot destroy their own credits.
    pub fn burn_own(&self, _caller: &Address, _amount: Amount) -> Result<(), LedgerError> {
        Err(LedgerError::BurnForbidden)
    }

    pub fn burn_from(&self, _caller: &Address, _from: &Address, _amount: Amount) -> Result<(), LedgerError> {
        Err(LedgerError::BurnForbidden)
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn version(&self) -> &'static str {
        LEDGER_VERSION
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn symbol(&self) -> &str {
        &self.state.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.state.decimals
    }

    /// The ledger's own identity; also its custody account.
    pub fn address(&self) -> Address {
        self.state.address
    }

    pub fn treasury(&self) -> Address {
        self.state.treasury
    }

    pub fn value_token(&self) -> Address {
        self.state.value_token
    }

    pub fn redemption_mode(&self) -> RedemptionMode {
        self.state.redemption
    }

    pub fn is_paused(&self) -> bool {
        self.state.pause.is_paused()
    }

    pub fn exits_enabled(&self) -> bool {
        self.state.exits_enabled
    }

    pub fn is_builder(&self, account: &Address) -> bool {
        self.state.roles.has_role(account, Role::Builder)
    }

    pub fn is_admin(&self, account: &Address) -> bool {
        self.state.roles.has_role(account, Role::Admin)
    }

    pub fn role_member_count(&self, role: Role) -> usize {
        self.state.roles.member_count(role)
    }

    /// Holders of `role`, in address order.
    pub fn role_members(&self, role: Role) -> Vec<Address> {
        self.state.roles.members(role).copied().collect()
    }

    pub fn serie_supply(&self, serie: SeriesId) -> Amount {
        self.state.balances.serie_supply(&serie)
    }

    pub fn user_serie_balance(&self, serie: SeriesId, user: &Address) -> Amount {
        self.state.balances.serie_balance(&serie, user)
    }

    /// Total credits across all series.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.state.balances.total_balance(account)
    }

    pub fn serie_vault(&self, serie: SeriesId) -> Option<SerieVault> {
        self.state.serie_vaults.get(&serie).copied()
    }

    /// Recompute the balance invariants from scratch.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.state.balances.verify()
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal ─────────────────────────

    /// Run `op` on a staged copy of the state; commit state and events only
    /// if it succeeds.
    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut LedgerState, &mut Vec<ContractEvent>) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut staged = self.state.clone();
        let mut events = Vec::new();
        let out = op(&mut staged, &mut events)?;
        self.state = staged;
        self.events.extend(events);
        Ok(out)
    }
}

impl LedgerState {
    fn add_builder(
        &mut self,
        builder: Address,
        events: &mut Vec<ContractEvent>,
    ) -> Result<(), LedgerError> {
        // The ledger's own address is its custody account and never a participant.
        if builder.is_null() || builder == self.address {
            return Err(LedgerError::InvalidAddress(builder));
        }
        if !self.roles.grant(Role::Builder, builder) {
            return Err(LedgerError::AlreadyBuilder(builder));
        }
        events.push(ContractEvent::BuilderAdded(BuilderAdded { builder }));
        info!(%builder, "Builder added");
        Ok(())
    }

    fn award(
        &mut self,
        user: Address,
        amount: Amount,
        serie: SeriesId,
        events: &mut Vec<ContractEvent>,
    ) -> Result<(), LedgerError> {
        if serie.is_unset() {
            return Err(LedgerError::InvalidSerie(serie));
        }
        if user.is_null() || user == self.address {
            return Err(LedgerError::InvalidAddress(user));
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if !self.roles.has_role(&user, Role::Builder) {
            return Err(LedgerError::InvalidBuilder(user));
        }
        self.balances.mint(serie, user, amount)?;

        events.push(ContractEvent::UserAwarded(UserAwarded {
            user,
            amount,
            serie,
        }));
        info!(%user, amount, %serie, "User awarded");
        Ok(())
    }

    /// Vault bound to `serie`, if the binding exists and is active.
    fn active_vault(&self, serie: SeriesId) -> Result<Address, LedgerError> {
        match self.serie_vaults.get(&serie) {
            Some(binding) if binding.active && !binding.vault.is_null() => Ok(binding.vault),
            Some(binding) => Err(LedgerError::InvalidSerieVault {
                serie,
                vault: binding.vault,
            }),
            None => Err(LedgerError::InvalidSerieVault {
                serie,
                vault: Address::NULL,
            }),
        }
    }

    /// Vault bound to `serie`, active or not.
    fn bound_vault(&self, serie: SeriesId) -> Result<Address, LedgerError> {
        match self.serie_vaults.get(&serie) {
            Some(binding) if !binding.vault.is_null() => Ok(binding.vault),
            _ => Err(LedgerError::InvalidSerieVault {
                serie,
                vault: Address::NULL,
            }),
        }
    }

    fn exit(
        &mut self,
        caller: Address,
        serie: SeriesId,
        vaults: &mut VaultRegistry,
        assets: &mut AssetBook,
        events: &mut Vec<ContractEvent>,
    ) -> Result<Amount, LedgerError> {
        self.pause.when_not_paused()?;
        if !self.exits_enabled {
            return Err(LedgerError::ExitsDisabled);
        }
        if caller == self.treasury || caller == self.address {
            return Err(LedgerError::InvalidAddress(caller));
        }
        if !self.roles.has_role(&caller, Role::Builder) {
            return Err(LedgerError::InvalidBuilder(caller));
        }
        let vault_address = self.active_vault(serie)?;
        // A vault paying itself would see no balance change.
        if caller == vault_address {
            return Err(LedgerError::InvalidAddress(caller));
        }

        let supply = self.balances.serie_supply(&serie);
        if supply == 0 {
            return Err(LedgerError::SerieWithNoMintedSupply(serie));
        }
        let balance = self.balances.serie_balance(&serie, &caller);
        if balance == 0 {
            return Err(LedgerError::InvalidUserSerieBalance(balance));
        }

        let vault = vaults
            .get_mut(&vault_address)
            .ok_or(LedgerError::UnknownVault(vault_address))?;
        let quote = vault.get_exit_quote(balance, supply, assets)?;
        if quote == 0 {
            return Err(LedgerError::InvalidQuote { quote });
        }
        debug!(%caller, %serie, balance, supply, quote, "Exit quoted");

        // Credits leave the caller before funds move; the staged state is
        // discarded if the payout fails.
        match self.redemption {
            RedemptionMode::Custody => {
                self.balances.reassign(serie, caller, self.address, balance)?
            }
            RedemptionMode::Retire => self.balances.burn(serie, caller, balance)?,
        }

        let token = vault.value_token();
        let before = assets.balance_of(&token, &caller);
        let released = vault
            .release(&self.address, &caller, balance, supply, assets)
            .map_err(|err| match err {
                VaultError::Asset(_) => LedgerError::InvalidQuote { quote },
                other => LedgerError::Vault(other),
            })?;
        let received = assets.balance_of(&token, &caller).saturating_sub(before);
        if released != quote || received != quote {
            // Hand back whatever arrived so the payout is all-or-nothing.
            assets.transfer(&token, &caller, &vault_address, received)?;
            return Err(LedgerError::InvalidQuote { quote });
        }

        events.push(ContractEvent::Exit(Exit {
            user: caller,
            quote,
            serie,
        }));
        info!(%caller, %serie, balance, quote, "Exit executed");
        Ok(quote)
    }
}
