//! Deployment host — one ledger, its factory, the vaults and the asset book
//!
//! Every component lives behind a single `parking_lot::RwLock`. Mutating
//! entry points take the write lock for the whole operation; queries take the
//! read lock and observe the last committed state.

use ledger_types::ids::{Address, SeriesId};
use ledger_types::numeric::Amount;
use parking_lot::RwLock;
use tracing::debug;

use crate::assets::AssetBook;
use crate::config::LedgerConfig;
use crate::errors::{FactoryError, LedgerError};
use crate::factory::VaultFactory;
use crate::ledger::Ledger;
use crate::security::Role;
use crate::vault::VaultRegistry;

/// The full set of components one deployment owns.
#[derive(Debug)]
pub struct Contracts {
    pub ledger: Ledger,
    pub factory: VaultFactory,
    pub vaults: VaultRegistry,
    pub assets: AssetBook,
}

impl Contracts {
    /// Redeem `caller`'s credits in `serie` against its bound vault.
    pub fn exit(&mut self, caller: &Address, serie: SeriesId) -> Result<Amount, LedgerError> {
        self.ledger
            .exit(caller, serie, &mut self.vaults, &mut self.assets)
    }

    /// Create a vault for `serie` and bind it on the ledger in one step.
    ///
    /// `caller` must be both the factory owner and a ledger admin.
    pub fn create_and_bind_vault(
        &mut self,
        caller: &Address,
        value_token: Address,
        serie: SeriesId,
    ) -> Result<Address, LedgerError> {
        let vault = self
            .factory
            .create_vault(caller, value_token, serie, &mut self.vaults)
            .map_err(|err| match err {
                FactoryError::Unauthorized { caller } => LedgerError::Unauthorized {
                    caller,
                    role: Role::Admin,
                },
                FactoryError::InvalidAddress(address) => LedgerError::InvalidAddress(address),
                FactoryError::InvalidSerie(serie) => LedgerError::InvalidSerie(serie),
            })?;
        self.ledger.set_serie_vault(caller, vault, serie)?;
        Ok(vault)
    }

    /// Sweep a series vault's reserve to the treasury. Requires a paused ledger.
    pub fn withdraw_serie_vault_token(
        &mut self,
        caller: &Address,
        serie: SeriesId,
    ) -> Result<Amount, LedgerError> {
        self.ledger
            .withdraw_serie_vault_token(caller, serie, &mut self.vaults, &mut self.assets)
    }

    /// Reserve currently held by `vault`, or `0` if no such vault exists.
    pub fn vault_reserve(&self, vault: &Address) -> Amount {
        self.vaults
            .get(vault)
            .map(|v| v.get_stable_token_balance(&self.assets))
            .unwrap_or(0)
    }
}

/// Shared, lock-guarded deployment.
#[derive(Debug)]
pub struct Deployment {
    inner: RwLock<Contracts>,
}

impl Deployment {
    /// Stand up a ledger administered by `treasury` plus a factory owned by
    /// the treasury and bound to that ledger.
    pub fn new(treasury: Address, config: LedgerConfig) -> Result<Self, LedgerError> {
        let ledger = Ledger::new(treasury, config)?;
        let factory = VaultFactory::new(treasury, ledger.address());
        Ok(Self {
            inner: RwLock::new(Contracts {
                ledger,
                factory,
                vaults: VaultRegistry::new(),
                assets: AssetBook::new(),
            }),
        })
    }

    /// Run a mutating operation with exclusive access.
    pub fn write<T>(&self, op: impl FnOnce(&mut Contracts) -> T) -> T {
        let mut guard = self.inner.write();
        op(&mut guard)
    }

    /// Run a query against the last committed state.
    pub fn read<T>(&self, op: impl FnOnce(&Contracts) -> T) -> T {
        let guard = self.inner.read();
        op(&guard)
    }

    pub fn exit(&self, caller: &Address, serie: SeriesId) -> Result<Amount, LedgerError> {
        debug!(%caller, %serie, "Exit requested");
        self.write(|c| c.exit(caller, serie))
    }

    pub fn ledger_address(&self) -> Address {
        self.read(|c| c.ledger.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const S1: SeriesId = SeriesId::new(1);

    #[test]
    fn test_factory_bound_to_ledger() {
        let treasury = Address::new();
        let deployment = Deployment::new(treasury, LedgerConfig::default()).unwrap();
        let ledger = deployment.ledger_address();
        deployment.read(|c| {
            assert_eq!(c.factory.ledger(), ledger);
            assert_eq!(c.factory.owner(), treasury);
        });
    }

    #[test]
    fn test_create_and_bind_vault() {
        let treasury = Address::new();
        let deployment = Deployment::new(treasury, LedgerConfig::default()).unwrap();
        let token = Address::new();
        let vault = deployment
            .write(|c| c.create_and_bind_vault(&treasury, token, S1))
            .unwrap();
        deployment.read(|c| {
            let binding = c.ledger.serie_vault(S1).unwrap();
            assert_eq!(binding.vault, vault);
            assert!(binding.active);
            assert_eq!(c.vaults.get(&vault).unwrap().ledger(), c.ledger.address());
        });
    }

    #[test]
    fn test_create_and_bind_rejects_stranger() {
        let treasury = Address::new();
        let deployment = Deployment::new(treasury, LedgerConfig::default()).unwrap();
        let eve = Address::new();
        let result = deployment.write(|c| c.create_and_bind_vault(&eve, Address::new(), S1));
        assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));
        deployment.read(|c| assert!(c.vaults.is_empty()));
    }

    #[test]
    fn test_concurrent_exits_conserve_reserve() {
        let treasury = Address::new();
        let deployment = Arc::new(Deployment::new(treasury, LedgerConfig::default()).unwrap());
        let token = Address::new();
        let builders: Vec<Address> = (0..8).map(|_| Address::new()).collect();

        let vault = deployment.write(|c| {
            let vault = c.create_and_bind_vault(&treasury, token, S1).unwrap();
            c.assets.mint_to(token, vault, 1_000_000).unwrap();
            c.ledger.add_builders_batch(&treasury, &builders).unwrap();
            c.ledger
                .award_batch(&treasury, &builders, &[1; 8], S1)
                .unwrap();
            c.ledger.enable_exits(&treasury).unwrap();
            vault
        });

        let handles: Vec<_> = builders
            .iter()
            .map(|builder| {
                let deployment = Arc::clone(&deployment);
                let builder = *builder;
                thread::spawn(move || deployment.exit(&builder, S1).unwrap())
            })
            .collect();
        let paid: Amount = handles.into_iter().map(|h| h.join().unwrap()).sum();

        deployment.read(|c| {
            assert_eq!(paid + c.vault_reserve(&vault), 1_000_000);
            assert!(c.ledger.check_invariants().is_ok());
            assert_eq!(c.ledger.serie_supply(S1), 8);
        });
    }
}
