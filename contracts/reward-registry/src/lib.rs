//! Gauntlet Reward Registry Contract
//!
//! Tiered reward token ledger for the challenge game. The game contract
//! mints one token per rewarded address when an iteration concludes;
//! holders keep tokens across iterations and benefits grow with age.
//!
//! ## Tiers
//! - Community: +100 chars, no fee discount, no context bonus.
//! - Challenger: +200 chars, 10% fee discount, no context bonus.
//! - Winner: +300 chars, 20% fee discount, +3 context slots.
//!
//! ## Legacy bonus
//! A token's benefits scale with its age in iterations. The bonus accrues
//! per iteration of age at a decreasing marginal rate across bands, so the
//! earliest iterations of age are worth the most. The bonus is derived on
//! read from `(tier, mint_iteration, current_iteration)`; nothing per
//! token is updated when the iteration advances.
//!
//! ## Transfer locks
//! Community tokens never change hands. Challenger and Winner tokens are
//! locked until `lock_iterations` iterations have passed since mint, then
//! stay transferable forever. Mint is exempt; the lock only gates
//! owner-to-owner transfers.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, Address, Env, Vec,
};

use shared::BASIS_POINTS_DIVISOR;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PERSISTENT_BUMP_LEDGERS: u32 = 518_400;

/// Legacy-bonus bands: iterations of age per band and the accrual rate per
/// iteration within it, earliest bands first. Ages beyond the last band
/// accrue at the trickle rate.
const LEGACY_BAND_SPANS: [u32; 3] = [3, 5, 10];
const LEGACY_BAND_RATES_BPS: [u32; 3] = [300, 150, 50];
const LEGACY_TRICKLE_BPS: u32 = 10;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized     = 2,
    NotAuthorized      = 3,
    TokenNotFound      = 4,
    NotTokenOwner      = 5,
    TokenSoulbound     = 6,
    TransferLocked     = 7,
    SelfTransfer       = 8,
    Overflow           = 9,
}

// ---------------------------------------------------------------------------
// Storage types
// ---------------------------------------------------------------------------

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    // --- instance() ---
    Admin,
    LockIterations,
    Minter(Address),
    // --- persistent() ---
    CurrentIteration,
    NextTokenId,
    Token(u64),
    OwnerTokens(Address),
}

/// Reward tier, ordered by rarity.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum RewardTier {
    Community = 0,
    Challenger = 1,
    Winner = 2,
}

/// Immutable mint record plus the current owner. The legacy bonus and the
/// effective benefits are computed, never stored.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardToken {
    pub owner: Address,
    pub tier: RewardTier,
    pub mint_iteration: u32,
    pub mint_timestamp: u64,
}

/// Numeric benefits carried by a token: extra characters per attempt, fee
/// discount in basis points, and extra context slots.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TierBenefits {
    pub char_bonus: u32,
    pub fee_discount_bps: u32,
    pub context_bonus: u32,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[contractevent]
pub struct RewardMinted {
    #[topic]
    pub token_id: u64,
    #[topic]
    pub to: Address,
    pub tier: RewardTier,
    pub iteration: u32,
}

#[contractevent]
pub struct RewardTransferred {
    #[topic]
    pub token_id: u64,
    #[topic]
    pub from: Address,
    pub to: Address,
}

#[contractevent]
pub struct IterationAdvanced {
    pub iteration: u32,
}

#[contractevent]
pub struct MinterSet {
    #[topic]
    pub minter: Address,
    pub allowed: bool,
}

// ---------------------------------------------------------------------------
// Pure benefit math
// ---------------------------------------------------------------------------

/// Base benefits for a tier, before any legacy bonus.
pub fn tier_benefits(tier: RewardTier) -> TierBenefits {
    match tier {
        RewardTier::Community => TierBenefits {
            char_bonus: 100,
            fee_discount_bps: 0,
            context_bonus: 0,
        },
        RewardTier::Challenger => TierBenefits {
            char_bonus: 200,
            fee_discount_bps: 1_000,
            context_bonus: 0,
        },
        RewardTier::Winner => TierBenefits {
            char_bonus: 300,
            fee_discount_bps: 2_000,
            context_bonus: 3,
        },
    }
}

/// Accumulated legacy bonus for a token of the given age in iterations.
///
/// Zero at age 0. Each iteration of age adds the rate of the band it falls
/// in; rates taper band over band down to the trickle rate, so the bonus is
/// monotonically non-decreasing with strictly decreasing marginal gain.
pub fn legacy_bonus_bps(age: u32) -> u32 {
    let mut remaining = age;
    let mut bonus: u32 = 0;
    for (span, rate) in LEGACY_BAND_SPANS.iter().zip(LEGACY_BAND_RATES_BPS.iter()) {
        let in_band = if remaining < *span { remaining } else { *span };
        bonus = bonus.saturating_add(in_band.saturating_mul(*rate));
        remaining -= in_band;
        if remaining == 0 {
            return bonus;
        }
    }
    bonus.saturating_add(remaining.saturating_mul(LEGACY_TRICKLE_BPS))
}

/// A tier's benefits scaled by `(1 + legacy_bonus)` for the given age.
pub fn effective_benefits_at(tier: RewardTier, age: u32) -> TierBenefits {
    let base = tier_benefits(tier);
    let bonus = legacy_bonus_bps(age);
    TierBenefits {
        char_bonus: scale_by_bonus(base.char_bonus, bonus),
        fee_discount_bps: scale_by_bonus(base.fee_discount_bps, bonus),
        context_bonus: scale_by_bonus(base.context_bonus, bonus),
    }
}

/// `base * (10_000 + bonus_bps) / 10_000`, saturating at `u32::MAX`.
fn scale_by_bonus(base: u32, bonus_bps: u32) -> u32 {
    let factor = (BASIS_POINTS_DIVISOR as u64).saturating_add(bonus_bps as u64);
    let scaled = (base as u64) * factor / (BASIS_POINTS_DIVISOR as u64);
    if scaled > u32::MAX as u64 {
        u32::MAX
    } else {
        scaled as u32
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct RewardRegistry;

#[contractimpl]
impl RewardRegistry {
    // -----------------------------------------------------------------------
    // init
    // -----------------------------------------------------------------------

    /// Initialize the registry. May only be called once.
    ///
    /// `lock_iterations` is the number of iterations a Challenger or Winner
    /// token stays untransferable after mint. The admin is seeded into the
    /// minter set; the game contract is added via `set_minter` after deploy.
    pub fn init(env: Env, admin: Address, lock_iterations: u32) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::LockIterations, &lock_iterations);
        env.storage().instance().set(&DataKey::Minter(admin), &true);

        set_persistent_u32(&env, DataKey::CurrentIteration, 1);
        set_persistent_u64(&env, DataKey::NextTokenId, 1);

        Ok(())
    }

    /// Authorize or deauthorize an address (e.g., the game contract) to mint
    /// tokens and advance the iteration counter.
    pub fn set_minter(env: Env, admin: Address, minter: Address, allowed: bool) -> Result<(), Error> {
        require_admin(&env, &admin)?;

        env.storage()
            .instance()
            .set(&DataKey::Minter(minter.clone()), &allowed);
        MinterSet { minter, allowed }.publish(&env);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // mint
    // -----------------------------------------------------------------------

    /// Mint a token of `tier` to `to`. Minter-only.
    ///
    /// Ids are sequential and never reused. The mint iteration is the
    /// registry's current iteration at call time; legacy bonus and transfer
    /// locks derive from it from then on.
    pub fn mint(env: Env, caller: Address, to: Address, tier: RewardTier) -> Result<u64, Error> {
        require_initialized(&env)?;
        require_minter(&env, &caller)?;

        let token_id = get_next_token_id(&env);
        let iteration = get_current_iteration(&env);

        let token = RewardToken {
            owner: to.clone(),
            tier,
            mint_iteration: iteration,
            mint_timestamp: env.ledger().timestamp(),
        };

        let token_key = DataKey::Token(token_id);
        env.storage().persistent().set(&token_key, &token);
        extend_persistent_ttl(&env, &token_key);

        owner_index_add(&env, &to, token_id);

        let next_id = token_id.checked_add(1).ok_or(Error::Overflow)?;
        set_persistent_u64(&env, DataKey::NextTokenId, next_id);

        RewardMinted {
            token_id,
            to,
            tier,
            iteration,
        }
        .publish(&env);

        Ok(token_id)
    }

    // -----------------------------------------------------------------------
    // advance_iteration
    // -----------------------------------------------------------------------

    /// Bump the iteration counter by one. Minter-only.
    ///
    /// Called by the game contract when a winner is declared so that age
    /// and lock computations see the new iteration. The counter only ever
    /// increases, which makes unlock states monotonic.
    pub fn advance_iteration(env: Env, caller: Address) -> Result<u32, Error> {
        require_initialized(&env)?;
        require_minter(&env, &caller)?;

        let next = get_current_iteration(&env)
            .checked_add(1)
            .ok_or(Error::Overflow)?;
        set_persistent_u32(&env, DataKey::CurrentIteration, next);

        IterationAdvanced { iteration: next }.publish(&env);
        Ok(next)
    }

    // -----------------------------------------------------------------------
    // transfer
    // -----------------------------------------------------------------------

    /// Transfer `token_id` from `from` to `to`, subject to the lock rules.
    ///
    /// Community tokens are permanently locked (`TokenSoulbound`).
    /// Challenger and Winner tokens are locked until
    /// `current_iteration >= mint_iteration + lock_iterations`
    /// (`TransferLocked`); the unlock boundary is inclusive.
    pub fn transfer(env: Env, from: Address, to: Address, token_id: u64) -> Result<(), Error> {
        require_initialized(&env)?;
        from.require_auth();

        let token_key = DataKey::Token(token_id);
        let mut token: RewardToken = env
            .storage()
            .persistent()
            .get(&token_key)
            .ok_or(Error::TokenNotFound)?;

        if token.owner != from {
            return Err(Error::NotTokenOwner);
        }
        if from == to {
            return Err(Error::SelfTransfer);
        }
        check_transferable(&env, &token)?;

        token.owner = to.clone();
        env.storage().persistent().set(&token_key, &token);
        extend_persistent_ttl(&env, &token_key);

        owner_index_remove(&env, &from, token_id);
        owner_index_add(&env, &to, token_id);

        RewardTransferred { token_id, from, to }.publish(&env);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read-only queries
    // -----------------------------------------------------------------------

    /// The registry's current iteration number.
    pub fn current_iteration(env: Env) -> u32 {
        get_current_iteration(&env)
    }

    /// Full record for a token, or None if it was never minted.
    pub fn get_token(env: Env, token_id: u64) -> Option<RewardToken> {
        env.storage().persistent().get(&DataKey::Token(token_id))
    }

    /// Ids of all tokens currently owned by `owner`.
    pub fn tokens_of(env: Env, owner: Address) -> Vec<u64> {
        env.storage()
            .persistent()
            .get(&DataKey::OwnerTokens(owner))
            .unwrap_or(Vec::new(&env))
    }

    /// Accumulated legacy bonus for a token; 0 for unknown ids.
    pub fn legacy_bonus(env: Env, token_id: u64) -> u32 {
        match Self::get_token(env.clone(), token_id) {
            Some(token) => legacy_bonus_bps(token_age(&env, &token)),
            None => 0,
        }
    }

    /// A token's benefits at the current iteration, scaled by its legacy
    /// bonus. None for unknown ids.
    pub fn effective_benefits(env: Env, token_id: u64) -> Option<TierBenefits> {
        Self::get_token(env.clone(), token_id)
            .map(|token| effective_benefits_at(token.tier, token_age(&env, &token)))
    }

    /// Fee discount granted by a token to `claimed_owner`, in basis points.
    ///
    /// Returns 0 (never an error) when the token does not exist or is not
    /// owned by the claimant, so fee quoting stays total.
    pub fn fee_discount_bps(env: Env, token_id: u64, claimed_owner: Address) -> u32 {
        match owned_token(&env, token_id, &claimed_owner) {
            Some(token) => effective_benefits_at(token.tier, token_age(&env, &token)).fee_discount_bps,
            None => 0,
        }
    }

    /// Character allowance granted by a token to `claimed_owner`. Same
    /// zero-on-invalid contract as `fee_discount_bps`.
    pub fn char_bonus(env: Env, token_id: u64, claimed_owner: Address) -> u32 {
        match owned_token(&env, token_id, &claimed_owner) {
            Some(token) => effective_benefits_at(token.tier, token_age(&env, &token)).char_bonus,
            None => 0,
        }
    }

    /// Context slots granted by a token to `claimed_owner`. Same
    /// zero-on-invalid contract as `fee_discount_bps`.
    pub fn context_bonus(env: Env, token_id: u64, claimed_owner: Address) -> u32 {
        match owned_token(&env, token_id, &claimed_owner) {
            Some(token) => effective_benefits_at(token.tier, token_age(&env, &token)).context_bonus,
            None => 0,
        }
    }

    /// Whether a token could be transferred right now. False for unknown
    /// ids, Community tokens, and still-locked tokens.
    pub fn is_transferable(env: Env, token_id: u64) -> bool {
        match Self::get_token(env.clone(), token_id) {
            Some(token) => check_transferable(&env, &token).is_ok(),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn require_initialized(env: &Env) -> Result<(), Error> {
    if !env.storage().instance().has(&DataKey::Admin) {
        return Err(Error::NotInitialized);
    }
    Ok(())
}

/// Verify that `caller` is the stored admin and has signed the invocation.
fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    let admin: Address = env
        .storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)?;
    caller.require_auth();
    if caller != &admin {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

/// Verify that `caller` is in the minter set and has signed the invocation.
fn require_minter(env: &Env, caller: &Address) -> Result<(), Error> {
    caller.require_auth();
    if !env
        .storage()
        .instance()
        .get(&DataKey::Minter(caller.clone()))
        .unwrap_or(false)
    {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

/// The lock state machine: Community is terminally locked, other tiers
/// unlock once enough iterations have passed since mint.
fn check_transferable(env: &Env, token: &RewardToken) -> Result<(), Error> {
    if token.tier == RewardTier::Community {
        return Err(Error::TokenSoulbound);
    }
    let lock: u32 = env
        .storage()
        .instance()
        .get(&DataKey::LockIterations)
        .unwrap_or(0);
    let unlock_at = token.mint_iteration.saturating_add(lock);
    if get_current_iteration(env) < unlock_at {
        return Err(Error::TransferLocked);
    }
    Ok(())
}

fn token_age(env: &Env, token: &RewardToken) -> u32 {
    get_current_iteration(env).saturating_sub(token.mint_iteration)
}

fn owned_token(env: &Env, token_id: u64, claimed_owner: &Address) -> Option<RewardToken> {
    let token: RewardToken = env.storage().persistent().get(&DataKey::Token(token_id))?;
    if &token.owner == claimed_owner {
        Some(token)
    } else {
        None
    }
}

fn owner_index_add(env: &Env, owner: &Address, token_id: u64) {
    let key = DataKey::OwnerTokens(owner.clone());
    let mut ids: Vec<u64> = env.storage().persistent().get(&key).unwrap_or(Vec::new(env));
    ids.push_back(token_id);
    env.storage().persistent().set(&key, &ids);
    extend_persistent_ttl(env, &key);
}

fn owner_index_remove(env: &Env, owner: &Address, token_id: u64) {
    let key = DataKey::OwnerTokens(owner.clone());
    let mut ids: Vec<u64> = env.storage().persistent().get(&key).unwrap_or(Vec::new(env));
    for i in 0..ids.len() {
        if ids.get_unchecked(i) == token_id {
            ids.remove(i);
            break;
        }
    }
    env.storage().persistent().set(&key, &ids);
    extend_persistent_ttl(env, &key);
}

fn get_current_iteration(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::CurrentIteration)
        .unwrap_or(0)
}

fn get_next_token_id(env: &Env) -> u64 {
    env.storage()
        .persistent()
        .get(&DataKey::NextTokenId)
        .unwrap_or(1)
}

fn set_persistent_u32(env: &Env, key: DataKey, value: u32) {
    env.storage().persistent().set(&key, &value);
    extend_persistent_ttl(env, &key);
}

fn set_persistent_u64(env: &Env, key: DataKey, value: u64) {
    env.storage().persistent().set(&key, &value);
    extend_persistent_ttl(env, &key);
}

fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_BUMP_LEDGERS, PERSISTENT_BUMP_LEDGERS);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test;
