//! Balance ledger — per-series credit balances, account totals, and supplies
//!
//! Every mutation updates the series balance, the holder's total, and the
//! series supply together, so the two accounting invariants hold
//! structurally:
//! - `total(holder) == Σ serie_balance(*, holder)`
//! - `supply(serie) == Σ serie_balance(serie, *)`
//!
//! Records come into existence on first credit and are dropped when they
//! reach zero.

use ledger_types::ids::{Address, SeriesId};
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::LedgerError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLedger {
    /// serie -> (holder -> amount)
    serie_balances: BTreeMap<SeriesId, BTreeMap<Address, Amount>>,
    /// holder -> Σ over series
    totals: BTreeMap<Address, Amount>,
    /// serie -> net supply
    supplies: BTreeMap<SeriesId, Amount>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Credits `holder` holds in `serie`.
    pub fn serie_balance(&self, serie: &SeriesId, holder: &Address) -> Amount {
        self.serie_balances
            .get(serie)
            .and_then(|holders| holders.get(holder))
            .copied()
            .unwrap_or(0)
    }

    /// Credits `holder` holds across all series.
    pub fn total_balance(&self, holder: &Address) -> Amount {
        self.totals.get(holder).copied().unwrap_or(0)
    }

    /// Net supply of `serie`.
    pub fn serie_supply(&self, serie: &SeriesId) -> Amount {
        self.supplies.get(serie).copied().unwrap_or(0)
    }

    /// Holders with a nonzero balance in `serie`.
    pub fn holders(&self, serie: &SeriesId) -> Vec<(Address, Amount)> {
        self.serie_balances
            .get(serie)
            .map(|holders| holders.iter().map(|(a, b)| (*a, *b)).collect())
            .unwrap_or_default()
    }

    /// Series with a nonzero supply, ascending.
    pub fn series(&self) -> Vec<SeriesId> {
        self.supplies.keys().copied().collect()
    }

    // ───────────────────────── Mutations ─────────────────────────

    /// Issue `amount` new credits to `holder` in `serie`.
    pub fn mint(
        &mut self,
        serie: SeriesId,
        holder: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let balance = self
            .serie_balance(&serie, &holder)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let total = self
            .total_balance(&holder)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let supply = self
            .serie_supply(&serie)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.write_balance(serie, holder, balance);
        self.write_total(holder, total);
        self.write_supply(serie, supply);
        Ok(())
    }

    /// Destroy `amount` of `holder`'s credits in `serie`.
    pub fn burn(
        &mut self,
        serie: SeriesId,
        holder: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.serie_balance(&serie, &holder);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        // Both follow from the invariants once the series balance covers it.
        let total = self.total_balance(&holder) - amount;
        let supply = self.serie_supply(&serie) - amount;

        self.write_balance(serie, holder, available - amount);
        self.write_total(holder, total);
        self.write_supply(serie, supply);
        Ok(())
    }

    /// Move `amount` credits between holders inside one series.
    ///
    /// Supply is unchanged. Only the ledger's own custody path uses this;
    /// participants can never move credits.
    pub(crate) fn reassign(
        &mut self,
        serie: SeriesId,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.serie_balance(&serie, &from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .serie_balance(&serie, &to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let to_total = self
            .total_balance(&to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let from_total = self.total_balance(&from) - amount;

        self.write_balance(serie, from, available - amount);
        self.write_total(from, from_total);
        self.write_balance(serie, to, to_balance);
        self.write_total(to, to_total);
        Ok(())
    }

    /// Recompute both invariants from scratch.
    pub fn verify(&self) -> Result<(), String> {
        let mut totals: BTreeMap<Address, Amount> = BTreeMap::new();
        for serie in self.serie_balances.keys() {
            let mut sum: Amount = 0;
            for (holder, amount) in self.holders(serie) {
                sum = sum
                    .checked_add(amount)
                    .ok_or_else(|| format!("serie {serie} balances overflow"))?;
                let entry = totals.entry(holder).or_insert(0);
                *entry = entry
                    .checked_add(amount)
                    .ok_or_else(|| format!("total of {holder} overflows"))?;
            }
            let supply = self.serie_supply(serie);
            if sum != supply {
                return Err(format!(
                    "serie {serie}: supply {supply} != sum of balances {sum}"
                ));
            }
        }
        for serie in self.series() {
            if self.holders(&serie).is_empty() {
                return Err(format!(
                    "serie {serie}: supply {} with no holders",
                    self.serie_supply(&serie)
                ));
            }
        }
        if totals != self.totals {
            return Err("account totals do not match series balances".to_string());
        }
        Ok(())
    }

    // ───────────────────────── Internal ─────────────────────────

    fn write_balance(&mut self, serie: SeriesId, holder: Address, amount: Amount) {
        if amount == 0 {
            if let Some(holders) = self.serie_balances.get_mut(&serie) {
                holders.remove(&holder);
                if holders.is_empty() {
                    self.serie_balances.remove(&serie);
                }
            }
        } else {
            self.serie_balances
                .entry(serie)
                .or_default()
                .insert(holder, amount);
        }
    }

    fn write_total(&mut self, holder: Address, amount: Amount) {
        if amount == 0 {
            self.totals.remove(&holder);
        } else {
            self.totals.insert(holder, amount);
        }
    }

    fn write_supply(&mut self, serie: SeriesId, amount: Amount) {
        if amount == 0 {
            self.supplies.remove(&serie);
        } else {
            self.supplies.insert(serie, amount);
        }
    }
}
