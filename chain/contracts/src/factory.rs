//! Vault factory — stands up one reserve vault per series

use ledger_types::ids::{Address, SeriesId};
use tracing::{info, warn};

use crate::errors::FactoryError;
use crate::events::{ContractEvent, VaultCreated};
use crate::vault::{ReserveVault, VaultRegistry};

/// Creates reserve vaults bound to a fixed ledger and records them in
/// creation order.
#[derive(Debug, Clone)]
pub struct VaultFactory {
    owner: Address,
    ledger: Address,
    vaults: Vec<Address>,
    events: Vec<ContractEvent>,
}

impl VaultFactory {
    pub fn new(owner: Address, ledger: Address) -> Self {
        Self {
            owner,
            ledger,
            vaults: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Instantiate a vault for `serie` holding `value_token`, owned by the
    /// factory owner. Owner-only.
    ///
    /// The vault is handed to `registry`; the ledger learns about it
    /// separately through `set_serie_vault`.
    pub fn create_vault(
        &mut self,
        caller: &Address,
        value_token: Address,
        serie: SeriesId,
        registry: &mut VaultRegistry,
    ) -> Result<Address, FactoryError> {
        if *caller != self.owner {
            warn!(%caller, "Rejected vault creation by non-owner");
            return Err(FactoryError::Unauthorized { caller: *caller });
        }
        if value_token.is_null() {
            return Err(FactoryError::InvalidAddress(value_token));
        }
        if serie.is_unset() {
            return Err(FactoryError::InvalidSerie(serie));
        }

        let vault = ReserveVault::new(self.owner, self.ledger, value_token, serie);
        let address = registry.insert(vault);
        self.vaults.push(address);

        self.events.push(ContractEvent::VaultCreated(VaultCreated {
            vault: address,
            value_token,
            serie,
        }));
        info!(vault = %address, %serie, %value_token, "Reserve vault created");
        Ok(address)
    }

    /// Vaults created so far, in creation order.
    pub fn get_vaults(&self) -> Vec<Address> {
        self.vaults.clone()
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Ledger every created vault is bound to.
    pub fn ledger(&self) -> Address {
        self.ledger
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }
}
