//! Asset book — balances of the external reserve assets
//!
//! Reserve assets (the stable tokens vaults pay out) live outside the
//! ledger. The book tracks them by `(asset, holder)` so vaults, the ledger,
//! the treasury and participants can hold and move them:
//! - Minting models external funding
//! - Transfers are all-or-nothing with overflow and underflow protection

use ledger_types::ids::Address;
use ledger_types::numeric::Amount;
use std::collections::HashMap;
use tracing::debug;

use crate::errors::AssetError;

/// Balances: asset -> (holder -> amount)
#[derive(Debug, Clone, Default)]
pub struct AssetBook {
    balances: HashMap<Address, HashMap<Address, Amount>>,
}

impl AssetBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `holder` out of thin air.
    ///
    /// Stands in for funding that happens outside the ledger's control.
    pub fn mint_to(
        &mut self,
        asset: Address,
        holder: Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        if asset.is_null() {
            return Err(AssetError::InvalidAddress(asset));
        }
        if holder.is_null() {
            return Err(AssetError::InvalidAddress(holder));
        }
        let current = self.balance_of(&asset, &holder);
        let new_balance = current.checked_add(amount).ok_or(AssetError::Overflow)?;
        self.balances
            .entry(asset)
            .or_default()
            .insert(holder, new_balance);
        debug!(%asset, %holder, amount, "Reserve asset minted");
        Ok(())
    }

    /// Get the balance of `holder` in `asset`.
    pub fn balance_of(&self, asset: &Address, holder: &Address) -> Amount {
        self.balances
            .get(asset)
            .and_then(|holders| holders.get(holder))
            .copied()
            .unwrap_or(0)
    }

    /// Move `amount` of `asset` from `from` to `to`.
    ///
    /// Both sides are computed before either is written, so a failed transfer
    /// leaves the book untouched.
    pub fn transfer(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        if to.is_null() {
            return Err(AssetError::InvalidAddress(*to));
        }

        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                asset: *asset,
                holder: *from,
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }

        let new_from = available - amount;
        let new_to = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or(AssetError::Overflow)?;

        let holders = self.balances.entry(*asset).or_default();
        holders.insert(*from, new_from);
        holders.insert(*to, new_to);
        Ok(())
    }
}
