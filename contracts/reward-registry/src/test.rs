#![cfg(test)]

use super::*;
use soroban_sdk::{testutils::Address as _, Address, Env};

// -------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------

const LOCK_ITERATIONS: u32 = 3;

fn setup(env: &Env) -> (RewardRegistryClient<'_>, Address) {
    let admin = Address::generate(env);
    let contract_id = env.register(RewardRegistry, ());
    let client = RewardRegistryClient::new(env, &contract_id);

    env.mock_all_auths();
    client.init(&admin, &LOCK_ITERATIONS);

    (client, admin)
}

/// Advance the registry's iteration counter `n` times.
fn advance(client: &RewardRegistryClient, admin: &Address, n: u32) {
    for _ in 0..n {
        client.advance_iteration(admin);
    }
}

// -------------------------------------------------------------------
// 1. Initialization
// -------------------------------------------------------------------

#[test]
fn test_init_starts_at_iteration_one() {
    let env = Env::default();
    let (client, _) = setup(&env);

    assert_eq!(client.current_iteration(), 1);
}

#[test]
fn test_init_rejects_reinit() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    assert_eq!(
        client.try_init(&admin, &LOCK_ITERATIONS),
        Err(Ok(Error::AlreadyInitialized))
    );
}

#[test]
fn test_uninitialized_operations_rejected() {
    let env = Env::default();
    let contract_id = env.register(RewardRegistry, ());
    let client = RewardRegistryClient::new(&env, &contract_id);
    env.mock_all_auths();

    let caller = Address::generate(&env);
    let to = Address::generate(&env);

    assert_eq!(
        client.try_mint(&caller, &to, &RewardTier::Community),
        Err(Ok(Error::NotInitialized))
    );
    assert_eq!(
        client.try_advance_iteration(&caller),
        Err(Ok(Error::NotInitialized))
    );
}

// -------------------------------------------------------------------
// 2. Minter set
// -------------------------------------------------------------------

#[test]
fn test_mint_by_non_minter_rejected() {
    let env = Env::default();
    let (client, _) = setup(&env);
    env.mock_all_auths();

    let outsider = Address::generate(&env);
    let to = Address::generate(&env);

    assert_eq!(
        client.try_mint(&outsider, &to, &RewardTier::Community),
        Err(Ok(Error::NotAuthorized))
    );
}

#[test]
fn test_set_minter_allows_and_revokes() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let game = Address::generate(&env);
    let to = Address::generate(&env);

    client.set_minter(&admin, &game, &true);
    client.mint(&game, &to, &RewardTier::Community);

    client.set_minter(&admin, &game, &false);
    assert_eq!(
        client.try_mint(&game, &to, &RewardTier::Community),
        Err(Ok(Error::NotAuthorized))
    );
}

#[test]
fn test_set_minter_by_non_admin_rejected() {
    let env = Env::default();
    let (client, _) = setup(&env);
    env.mock_all_auths();

    let outsider = Address::generate(&env);
    assert_eq!(
        client.try_set_minter(&outsider, &outsider, &true),
        Err(Ok(Error::NotAuthorized))
    );
}

// -------------------------------------------------------------------
// 3. Minting
// -------------------------------------------------------------------

#[test]
fn test_mint_assigns_sequential_ids() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let a = Address::generate(&env);
    let b = Address::generate(&env);

    assert_eq!(client.mint(&admin, &a, &RewardTier::Community), 1);
    assert_eq!(client.mint(&admin, &b, &RewardTier::Challenger), 2);
    assert_eq!(client.mint(&admin, &a, &RewardTier::Winner), 3);
}

#[test]
fn test_mint_records_metadata() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    advance(&client, &admin, 4); // mint during iteration 5

    let id = client.mint(&admin, &holder, &RewardTier::Winner);
    let token = client.get_token(&id).unwrap();

    assert_eq!(token.owner, holder);
    assert_eq!(token.tier, RewardTier::Winner);
    assert_eq!(token.mint_iteration, 5);
}

#[test]
fn test_mint_updates_owner_index() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let id1 = client.mint(&admin, &holder, &RewardTier::Community);
    let id2 = client.mint(&admin, &holder, &RewardTier::Challenger);

    let ids = client.tokens_of(&holder);
    assert_eq!(ids.len(), 2);
    assert_eq!(ids.get_unchecked(0), id1);
    assert_eq!(ids.get_unchecked(1), id2);
}

#[test]
fn test_get_token_unknown_id_is_none() {
    let env = Env::default();
    let (client, _) = setup(&env);

    assert_eq!(client.get_token(&99u64), None);
}

// -------------------------------------------------------------------
// 4. Legacy bonus math
// -------------------------------------------------------------------

#[test]
fn test_legacy_bonus_zero_at_age_zero() {
    assert_eq!(legacy_bonus_bps(0), 0);
}

#[test]
fn test_legacy_bonus_band_values() {
    // First band: 300 bps per iteration for ages 1-3.
    assert_eq!(legacy_bonus_bps(1), 300);
    assert_eq!(legacy_bonus_bps(3), 900);
    // Second band: 150 bps for ages 4-8.
    assert_eq!(legacy_bonus_bps(4), 1_050);
    assert_eq!(legacy_bonus_bps(8), 1_650);
    // Third band: 50 bps for ages 9-18.
    assert_eq!(legacy_bonus_bps(9), 1_700);
    assert_eq!(legacy_bonus_bps(18), 2_150);
    // Trickle: 10 bps beyond.
    assert_eq!(legacy_bonus_bps(19), 2_160);
    assert_eq!(legacy_bonus_bps(118), 3_150);
}

#[test]
fn test_legacy_bonus_monotonic_with_tapering_marginals() {
    let mut prev_bonus = 0u32;
    let mut prev_step = u32::MAX;
    for age in 1..200u32 {
        let bonus = legacy_bonus_bps(age);
        assert!(bonus >= prev_bonus);
        let step = bonus - prev_bonus;
        assert!(step <= prev_step);
        prev_bonus = bonus;
        prev_step = step;
    }
}

#[test]
fn test_effective_benefits_at_age_zero_are_base() {
    let fresh = effective_benefits_at(RewardTier::Winner, 0);
    assert_eq!(fresh, tier_benefits(RewardTier::Winner));
    assert_eq!(fresh.char_bonus, 300);
    assert_eq!(fresh.fee_discount_bps, 2_000);
    assert_eq!(fresh.context_bonus, 3);
}

#[test]
fn test_effective_benefits_grow_with_age() {
    let at_zero = effective_benefits_at(RewardTier::Winner, 0);
    let at_one = effective_benefits_at(RewardTier::Winner, 1);

    // 2_000 bps scaled by (1 + 3%) = 2_060 bps: strictly greater.
    assert!(at_one.fee_discount_bps > at_zero.fee_discount_bps);
    assert_eq!(at_one.fee_discount_bps, 2_060);
    assert_eq!(at_one.char_bonus, 309);
}

#[test]
fn test_community_discount_stays_zero_at_any_age() {
    assert_eq!(effective_benefits_at(RewardTier::Community, 50).fee_discount_bps, 0);
    // The character bonus still ages.
    assert!(effective_benefits_at(RewardTier::Community, 50).char_bonus > 100);
}

// -------------------------------------------------------------------
// 5. Legacy bonus through the contract
// -------------------------------------------------------------------

#[test]
fn test_token_bonus_follows_iteration_advances() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let id = client.mint(&admin, &holder, &RewardTier::Winner);

    // Minted in the present iteration: no legacy bonus yet.
    assert_eq!(client.legacy_bonus(&id), 0);

    advance(&client, &admin, 1);
    assert_eq!(client.legacy_bonus(&id), 300);
    assert_eq!(client.fee_discount_bps(&id, &holder), 2_060);

    advance(&client, &admin, 2);
    assert_eq!(client.legacy_bonus(&id), 900);
}

#[test]
fn test_legacy_bonus_unknown_id_is_zero() {
    let env = Env::default();
    let (client, _) = setup(&env);

    assert_eq!(client.legacy_bonus(&404u64), 0);
    assert_eq!(client.effective_benefits(&404u64), None);
}

// -------------------------------------------------------------------
// 6. Transfer locks
// -------------------------------------------------------------------

#[test]
fn test_community_token_never_transferable() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let other = Address::generate(&env);
    let id = client.mint(&admin, &holder, &RewardTier::Community);

    assert_eq!(
        client.try_transfer(&holder, &other, &id),
        Err(Ok(Error::TokenSoulbound))
    );

    // Far past any temporal lock the answer is the same.
    advance(&client, &admin, 20);
    assert_eq!(
        client.try_transfer(&holder, &other, &id),
        Err(Ok(Error::TokenSoulbound))
    );
    assert!(!client.is_transferable(&id));
}

#[test]
fn test_challenger_locked_until_threshold() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let other = Address::generate(&env);
    let id = client.mint(&admin, &holder, &RewardTier::Challenger); // iteration 1

    // Iterations 1 through 3: still locked (unlock at 1 + 3 = 4).
    assert_eq!(
        client.try_transfer(&holder, &other, &id),
        Err(Ok(Error::TransferLocked))
    );
    advance(&client, &admin, 2); // now at 3
    assert_eq!(
        client.try_transfer(&holder, &other, &id),
        Err(Ok(Error::TransferLocked))
    );

    // Exactly at the unlock boundary the transfer goes through.
    advance(&client, &admin, 1); // now at 4
    assert!(client.is_transferable(&id));
    client.transfer(&holder, &other, &id);
    assert_eq!(client.get_token(&id).unwrap().owner, other);
}

#[test]
fn test_winner_stays_transferable_after_unlock() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let a = Address::generate(&env);
    let b = Address::generate(&env);
    let id = client.mint(&admin, &holder, &RewardTier::Winner);

    advance(&client, &admin, 10);
    client.transfer(&holder, &a, &id);
    client.transfer(&a, &b, &id);
    assert_eq!(client.get_token(&id).unwrap().owner, b);
}

#[test]
fn test_zero_lock_transferable_immediately() {
    let env = Env::default();
    let admin = Address::generate(&env);
    let contract_id = env.register(RewardRegistry, ());
    let client = RewardRegistryClient::new(&env, &contract_id);
    env.mock_all_auths();
    client.init(&admin, &0u32);

    let holder = Address::generate(&env);
    let other = Address::generate(&env);
    let id = client.mint(&admin, &holder, &RewardTier::Winner);

    client.transfer(&holder, &other, &id);
    assert_eq!(client.get_token(&id).unwrap().owner, other);
}

// -------------------------------------------------------------------
// 7. Transfer mechanics
// -------------------------------------------------------------------

#[test]
fn test_transfer_unknown_token_rejected() {
    let env = Env::default();
    let (client, _) = setup(&env);
    env.mock_all_auths();

    let a = Address::generate(&env);
    let b = Address::generate(&env);
    assert_eq!(
        client.try_transfer(&a, &b, &7u64),
        Err(Ok(Error::TokenNotFound))
    );
}

#[test]
fn test_transfer_by_non_owner_rejected() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let thief = Address::generate(&env);
    let id = client.mint(&admin, &holder, &RewardTier::Winner);
    advance(&client, &admin, LOCK_ITERATIONS);

    assert_eq!(
        client.try_transfer(&thief, &thief, &id),
        Err(Ok(Error::NotTokenOwner))
    );
}

#[test]
fn test_self_transfer_rejected() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let id = client.mint(&admin, &holder, &RewardTier::Winner);
    advance(&client, &admin, LOCK_ITERATIONS);

    assert_eq!(
        client.try_transfer(&holder, &holder, &id),
        Err(Ok(Error::SelfTransfer))
    );
}

#[test]
fn test_transfer_moves_owner_index() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let other = Address::generate(&env);
    let keep = client.mint(&admin, &holder, &RewardTier::Challenger);
    let send = client.mint(&admin, &holder, &RewardTier::Winner);
    advance(&client, &admin, LOCK_ITERATIONS);

    client.transfer(&holder, &other, &send);

    let holder_ids = client.tokens_of(&holder);
    assert_eq!(holder_ids.len(), 1);
    assert_eq!(holder_ids.get_unchecked(0), keep);

    let other_ids = client.tokens_of(&other);
    assert_eq!(other_ids.len(), 1);
    assert_eq!(other_ids.get_unchecked(0), send);
}

// -------------------------------------------------------------------
// 8. Owner-validated benefit queries
// -------------------------------------------------------------------

#[test]
fn test_benefit_queries_zero_for_wrong_claimant() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let pretender = Address::generate(&env);
    let id = client.mint(&admin, &holder, &RewardTier::Winner);

    assert_eq!(client.fee_discount_bps(&id, &holder), 2_000);
    assert_eq!(client.fee_discount_bps(&id, &pretender), 0);
    assert_eq!(client.char_bonus(&id, &pretender), 0);
    assert_eq!(client.context_bonus(&id, &pretender), 0);
}

#[test]
fn test_benefit_queries_zero_for_unknown_id() {
    let env = Env::default();
    let (client, _) = setup(&env);

    let anyone = Address::generate(&env);
    assert_eq!(client.fee_discount_bps(&42u64, &anyone), 0);
    assert_eq!(client.char_bonus(&42u64, &anyone), 0);
}

#[test]
fn test_char_and_context_bonuses_by_tier() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    let community = client.mint(&admin, &holder, &RewardTier::Community);
    let challenger = client.mint(&admin, &holder, &RewardTier::Challenger);
    let winner = client.mint(&admin, &holder, &RewardTier::Winner);

    assert_eq!(client.char_bonus(&community, &holder), 100);
    assert_eq!(client.char_bonus(&challenger, &holder), 200);
    assert_eq!(client.char_bonus(&winner, &holder), 300);

    assert_eq!(client.context_bonus(&community, &holder), 0);
    assert_eq!(client.context_bonus(&winner, &holder), 3);
}

// -------------------------------------------------------------------
// 9. Iteration advance
// -------------------------------------------------------------------

#[test]
fn test_advance_iteration_increments() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    assert_eq!(client.advance_iteration(&admin), 2);
    assert_eq!(client.advance_iteration(&admin), 3);
    assert_eq!(client.current_iteration(), 3);
}

#[test]
fn test_advance_iteration_by_non_minter_rejected() {
    let env = Env::default();
    let (client, _) = setup(&env);
    env.mock_all_auths();

    let outsider = Address::generate(&env);
    assert_eq!(
        client.try_advance_iteration(&outsider),
        Err(Ok(Error::NotAuthorized))
    );
}
