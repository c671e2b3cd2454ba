//! Access Hardening Tests
//!
//! Adversarial testing of the public surface:
//! - Permission escalation
//! - Vault caller binding
//! - Non-transferability
//! - Pause and emergency withdrawal
//! - Atomic batches and arithmetic overflow
//! - Fuzz testing (proptest)
//! - Upgrade path (ABI freeze, snapshots)

use ledger_types::ids::{Address, SeriesId};
use ledger_types::numeric::Amount;
use proptest::prelude::*;
use reward_ledger::assets::AssetBook;
use reward_ledger::errors::{FactoryError, LedgerError, VaultError};
use reward_ledger::factory::VaultFactory;
use reward_ledger::security::Role;
use reward_ledger::snapshot::LedgerSnapshot;
use reward_ledger::{Ledger, LedgerConfig, ReserveVault, VaultRegistry, CONTRACT_ABI_VERSION};

const S1: SeriesId = SeriesId::new(1);

fn setup() -> (Ledger, Address) {
    let treasury = Address::new();
    (Ledger::new(treasury, LedgerConfig::default()).unwrap(), treasury)
}

fn is_unauthorized<T>(result: Result<T, LedgerError>) -> bool {
    matches!(result, Err(LedgerError::Unauthorized { role: Role::Admin, .. }))
}

// ═══════════════════════════════════════════════════════════════════
// Permission Escalation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_non_admin_cannot_manage_builders() {
    let (mut ledger, _) = setup();
    let eve = Address::new();
    assert!(is_unauthorized(ledger.add_builder(&eve, eve)));
    assert!(is_unauthorized(ledger.add_builders_batch(&eve, &[eve])));
    assert!(is_unauthorized(ledger.remove_builder(&eve, eve)));
    assert!(!ledger.is_builder(&eve));
}

#[test]
fn test_builder_cannot_award_itself() {
    let (mut ledger, treasury) = setup();
    let builder = Address::new();
    ledger.add_builder(&treasury, builder).unwrap();
    assert!(is_unauthorized(ledger.award(&builder, builder, 100, S1)));
    assert!(is_unauthorized(ledger.award_batch(&builder, &[builder], &[100], S1)));
    assert_eq!(ledger.balance_of(&builder), 0);
}

#[test]
fn test_non_admin_cannot_toggle_flags() {
    let (mut ledger, _) = setup();
    let eve = Address::new();
    assert!(is_unauthorized(ledger.enable_exits(&eve)));
    assert!(is_unauthorized(ledger.disable_exits(&eve)));
    assert!(is_unauthorized(ledger.pause(&eve)));
    assert!(is_unauthorized(ledger.unpause(&eve)));
    assert!(!ledger.exits_enabled());
    assert!(!ledger.is_paused());
}

#[test]
fn test_non_admin_cannot_touch_reserve() {
    let (mut ledger, treasury) = setup();
    let eve = Address::new();
    let mut vaults = VaultRegistry::new();
    let mut assets = AssetBook::new();
    ledger.pause(&treasury).unwrap();

    assert!(is_unauthorized(ledger.set_serie_vault(&eve, eve, S1)));
    assert!(is_unauthorized(ledger.update_serie_vault_status(&eve, S1, true)));
    assert!(is_unauthorized(ledger.set_value_token(&eve, eve)));
    assert!(is_unauthorized(ledger.withdraw_value_token(&eve, &mut assets)));
    assert!(is_unauthorized(
        ledger.withdraw_serie_vault_token(&eve, S1, &mut vaults, &mut assets)
    ));
    assert!(is_unauthorized(ledger.burn(&eve, 0, S1)));
    assert!(ledger.serie_vault(S1).is_none());
}

#[test]
fn test_non_admin_cannot_grant_itself_admin() {
    let (mut ledger, _) = setup();
    let eve = Address::new();
    assert!(is_unauthorized(ledger.grant_admin(&eve, eve)));
    assert!(!ledger.is_admin(&eve));
    assert_eq!(ledger.role_member_count(Role::Admin), 1);
}

#[test]
fn test_custody_account_cannot_join_or_redeem() {
    let (mut ledger, treasury) = setup();
    let custody = ledger.address();
    let token = Address::new();
    let mut vaults = VaultRegistry::new();
    let vault = vaults.insert(ReserveVault::new(treasury, custody, token, S1));
    let mut assets = AssetBook::new();
    assets.mint_to(token, vault, 1_000).unwrap();
    ledger.set_serie_vault(&treasury, vault, S1).unwrap();
    ledger.enable_exits(&treasury).unwrap();

    assert_eq!(
        ledger.add_builder(&treasury, custody),
        Err(LedgerError::InvalidAddress(custody))
    );
    assert_eq!(
        ledger.award(&treasury, custody, 1, S1),
        Err(LedgerError::InvalidAddress(custody))
    );
    for _ in 0..3 {
        assert_eq!(
            ledger.exit(&custody, S1, &mut vaults, &mut assets),
            Err(LedgerError::InvalidAddress(custody))
        );
    }
    assert_eq!(assets.balance_of(&token, &vault), 1_000);
}

#[test]
fn test_revoked_admin_loses_access() {
    let (mut ledger, treasury) = setup();
    let ops = Address::new();
    ledger.grant_admin(&treasury, ops).unwrap();
    ledger.enable_exits(&ops).unwrap();
    ledger.revoke_admin(&treasury, ops).unwrap();
    assert!(is_unauthorized(ledger.disable_exits(&ops)));
    assert!(ledger.exits_enabled());
}

// ═══════════════════════════════════════════════════════════════════
// Vault Caller Binding
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_vault_refuses_direct_release() {
    let treasury = Address::new();
    let ledger = Address::new();
    let token = Address::new();
    let mut vault = ReserveVault::new(treasury, ledger, token, S1);
    let mut assets = AssetBook::new();
    assets.mint_to(token, vault.address(), 1_000).unwrap();

    for caller in [treasury, Address::new()] {
        assert_eq!(
            vault.release(&caller, &caller, 1, 1, &mut assets),
            Err(VaultError::OnlyLedger)
        );
        assert_eq!(
            vault.withdraw_to_treasury(&caller, &caller, &mut assets),
            Err(VaultError::OnlyLedger)
        );
    }
    assert_eq!(vault.get_stable_token_balance(&assets), 1_000);
}

#[test]
fn test_vault_value_token_owner_only() {
    let treasury = Address::new();
    let mut vault = ReserveVault::new(treasury, Address::new(), Address::new(), S1);
    let eve = Address::new();
    assert_eq!(
        vault.set_value_token(&eve, Address::new()),
        Err(VaultError::Unauthorized { caller: eve })
    );
    assert_eq!(
        vault.set_value_token(&treasury, Address::NULL),
        Err(VaultError::InvalidAddress(Address::NULL))
    );
}

#[test]
fn test_factory_owner_only() {
    let treasury = Address::new();
    let mut factory = VaultFactory::new(treasury, Address::new());
    let mut registry = VaultRegistry::new();
    let eve = Address::new();
    assert_eq!(
        factory.create_vault(&eve, Address::new(), S1, &mut registry),
        Err(FactoryError::Unauthorized { caller: eve })
    );
    assert!(factory.get_vaults().is_empty());
    assert!(registry.is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// Non-transferability
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_credits_cannot_move() {
    let (mut ledger, treasury) = setup();
    let [alice, bob] = [Address::new(), Address::new()];
    ledger.add_builders_batch(&treasury, &[alice, bob]).unwrap();
    ledger.award(&treasury, alice, 50, S1).unwrap();

    for caller in [alice, bob, treasury] {
        assert!(matches!(
            ledger.transfer(&caller, &bob, 50),
            Err(LedgerError::TransferForbidden(_))
        ));
        assert!(matches!(
            ledger.transfer_from(&caller, &alice, &bob, 50),
            Err(LedgerError::TransferFromForbidden(_))
        ));
        assert_eq!(ledger.burn_own(&caller, 50), Err(LedgerError::BurnForbidden));
        assert_eq!(
            ledger.burn_from(&caller, &alice, 50),
            Err(LedgerError::BurnForbidden)
        );
    }
    assert_eq!(ledger.balance_of(&alice), 50);
    assert_eq!(ledger.balance_of(&bob), 0);
}

#[test]
fn test_admin_burn_cannot_reach_participant_credits() {
    let (mut ledger, treasury) = setup();
    let alice = Address::new();
    ledger.add_builder(&treasury, alice).unwrap();
    ledger.award(&treasury, alice, 50, S1).unwrap();
    assert_eq!(
        ledger.burn(&treasury, 1, S1),
        Err(LedgerError::InsufficientBalance {
            required: 1,
            available: 0
        })
    );
    assert_eq!(ledger.serie_supply(S1), 50);
}

// ═══════════════════════════════════════════════════════════════════
// Pause and Emergency Withdrawal
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_pause_blocks_exit_but_not_admin() {
    let (mut ledger, treasury) = setup();
    let alice = Address::new();
    let token = Address::new();
    let mut vaults = VaultRegistry::new();
    let vault = vaults.insert(ReserveVault::new(treasury, ledger.address(), token, S1));
    let mut assets = AssetBook::new();
    assets.mint_to(token, vault, 900).unwrap();

    ledger.add_builder(&treasury, alice).unwrap();
    ledger.award(&treasury, alice, 3, S1).unwrap();
    ledger.set_serie_vault(&treasury, vault, S1).unwrap();
    ledger.enable_exits(&treasury).unwrap();
    ledger.pause(&treasury).unwrap();

    assert_eq!(
        ledger.exit(&alice, S1, &mut vaults, &mut assets),
        Err(LedgerError::EnforcedPause)
    );
    // Administration keeps working while paused
    ledger.award(&treasury, alice, 1, S1).unwrap();

    ledger.unpause(&treasury).unwrap();
    assert_eq!(ledger.exit(&alice, S1, &mut vaults, &mut assets), Ok(900));
}

#[test]
fn test_repeated_withdrawal_moves_nothing() {
    let (mut ledger, treasury) = setup();
    let token = Address::new();
    let mut vaults = VaultRegistry::new();
    let vault = vaults.insert(ReserveVault::new(treasury, ledger.address(), token, S1));
    let mut assets = AssetBook::new();
    assets.mint_to(token, vault, 400).unwrap();
    ledger.set_serie_vault(&treasury, vault, S1).unwrap();
    ledger.pause(&treasury).unwrap();

    let first = ledger.withdraw_serie_vault_token(&treasury, S1, &mut vaults, &mut assets);
    let second = ledger.withdraw_serie_vault_token(&treasury, S1, &mut vaults, &mut assets);
    assert_eq!(first, Ok(400));
    assert_eq!(second, Ok(0));
    assert_eq!(assets.balance_of(&token, &treasury), 400);
}

#[test]
fn test_withdraw_unbound_serie() {
    let (mut ledger, treasury) = setup();
    let mut vaults = VaultRegistry::new();
    let mut assets = AssetBook::new();
    ledger.pause(&treasury).unwrap();
    assert_eq!(
        ledger.withdraw_serie_vault_token(&treasury, S1, &mut vaults, &mut assets),
        Err(LedgerError::InvalidSerieVault {
            serie: S1,
            vault: Address::NULL
        })
    );
}

// ═══════════════════════════════════════════════════════════════════
// Atomicity and Overflow
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_award_overflow_is_rejected_atomically() {
    let (mut ledger, treasury) = setup();
    let [alice, bob] = [Address::new(), Address::new()];
    ledger.add_builders_batch(&treasury, &[alice, bob]).unwrap();
    ledger.award(&treasury, alice, Amount::MAX, S1).unwrap();

    let events_before = ledger.events().len();
    let result = ledger.award_batch(&treasury, &[bob, alice], &[1, 1], S1);
    assert_eq!(result, Err(LedgerError::Overflow));
    assert_eq!(ledger.balance_of(&bob), 0);
    assert_eq!(ledger.serie_supply(S1), Amount::MAX);
    assert_eq!(ledger.events().len(), events_before);
    assert!(ledger.check_invariants().is_ok());
}

#[test]
fn test_failed_batch_emits_nothing() {
    let (mut ledger, treasury) = setup();
    let fresh = Address::new();
    ledger.drain_events();
    assert!(ledger
        .add_builders_batch(&treasury, &[fresh, fresh])
        .is_err());
    assert!(ledger.events().is_empty());
    assert!(!ledger.is_builder(&fresh));
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz Testing
// ═══════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fuzz_awards_keep_invariants(
        ops in prop::collection::vec((0usize..5, 0u64..1_000, 0u64..4), 1..60),
    ) {
        let (mut ledger, treasury) = setup();
        let users: Vec<Address> = (0..5).map(|_| Address::new()).collect();
        // Only the first three are builders
        ledger.add_builders_batch(&treasury, &users[..3]).unwrap();

        for (idx, amount, serie) in ops {
            let serie = SeriesId::new(serie);
            let before = ledger.serie_supply(serie);
            let result = ledger.award(&treasury, users[idx], amount as Amount, serie);
            if serie.is_unset() || amount == 0 || idx >= 3 {
                prop_assert!(result.is_err());
                prop_assert_eq!(ledger.serie_supply(serie), before);
            } else {
                prop_assert!(result.is_ok());
                prop_assert_eq!(ledger.serie_supply(serie), before + amount as Amount);
            }
            prop_assert!(ledger.check_invariants().is_ok());
        }
        prop_assert_eq!(ledger.balance_of(&users[3]), 0);
        prop_assert_eq!(ledger.balance_of(&users[4]), 0);
    }

    #[test]
    fn fuzz_quote_never_exceeds_reserve(
        balance in 0u64..u64::MAX,
        extra in 0u64..u64::MAX,
        reserve in 0u64..u64::MAX,
    ) {
        let token = Address::new();
        let vault = ReserveVault::new(Address::new(), Address::new(), token, S1);
        let mut assets = AssetBook::new();
        if reserve > 0 {
            assets.mint_to(token, vault.address(), reserve as Amount).unwrap();
        }
        let supply = balance as Amount + extra as Amount;
        let quote = vault.get_exit_quote(balance as Amount, supply, &assets).unwrap();
        prop_assert!(quote <= reserve as Amount);
        if supply == 0 {
            prop_assert_eq!(quote, 0);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Upgrade Path
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_abi_version_frozen() {
    assert_eq!(CONTRACT_ABI_VERSION, "1.0.0");
    let (ledger, _) = setup();
    assert_eq!(ledger.version(), "1.0.0");
}

#[test]
fn test_snapshot_survives_upgrade() {
    let (mut ledger, treasury) = setup();
    let alice = Address::new();
    ledger.add_builder(&treasury, alice).unwrap();
    ledger.award(&treasury, alice, 77, S1).unwrap();

    let json = ledger.snapshot().unwrap().to_json().unwrap();
    let published = ledger.snapshot().unwrap().checksum;

    let loaded = LedgerSnapshot::from_json(&json).unwrap();
    loaded.verify_digest(&published).unwrap();
    let upgraded = Ledger::restore(loaded).unwrap();

    assert_eq!(upgraded.address(), ledger.address());
    assert_eq!(upgraded.user_serie_balance(S1, &alice), 77);
    assert!(upgraded.is_admin(&treasury));
}
