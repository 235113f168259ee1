//! Gauntlet Game Contract
//!
//! Lifecycle controller for the challenge game: participants pay an
//! escalating fee to submit attempts against the current prompt; the
//! operator declares a winner, the prize pool pays out, reward tokens are
//! minted through the Reward Registry contract, and the next iteration
//! opens.
//!
//! ## Fee Model
//! The base fee compounds by `growth_bps` on every accepted attempt and is
//! capped at `fee_cap`; it resets to `base_fee` when a new iteration opens.
//! The fee actually charged is the base fee minus a composed discount:
//! a one-time first-mover discount for addresses that have never attempted,
//! plus the effective discount of a reward token the sender holds, clamped
//! to `max_discount_bps`.
//!
//! ## Pools
//! Each collected fee splits three ways (policy default 60/20/20): the
//! current prize pool, the next iteration's seed pool, and an
//! operator-withdrawable pool. The operator share is the exact remainder,
//! so the three parts always sum back to the collected fee.
//!
//! ## Storage Strategy
//! - `instance()`: admin, token, registry address, config, pause flag.
//! - `persistent()`: pool counters, iteration counter, fee, prompt and its
//!   archive, and participant entries keyed by `(iteration, address)` so a
//!   concluded iteration's registry retires with the iteration bump rather
//!   than a storage scan.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, token::TokenClient,
    Address, Env, String, Vec,
};

use gauntlet_reward_registry::{RewardRegistryClient, RewardTier};
use shared::{grow_fee, net_after_discount, split_pool, BASIS_POINTS_DIVISOR};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PERSISTENT_BUMP_LEDGERS: u32 = 518_400;

/// Upper bound on the candidate list supplied to top-attempter ranking.
pub const MAX_RANKING_CANDIDATES: u32 = 32;
/// Upper bound on the participant list eligible for Community mints.
pub const MAX_COMMUNITY_MINTS: u32 = 128;
/// Challenger tokens go to at most this many ranked top attempters.
pub const TOP_CHALLENGER_SLOTS: u32 = 3;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized   = 1,
    NotInitialized       = 2,
    NotAuthorized        = 3,
    InvalidConfig        = 4,
    InvalidAmount        = 5,
    GamePaused           = 6,
    AlreadyPaused        = 7,
    NotPaused            = 8,
    InsufficientPayment  = 9,
    CooldownActive       = 10,
    ContentTooLong       = 11,
    WinnerNotParticipant = 12,
    TooManyCandidates    = 13,
    TooManyParticipants  = 14,
    NothingToWithdraw    = 15,
    Overflow             = 16,
}

// ---------------------------------------------------------------------------
// Storage types
// ---------------------------------------------------------------------------

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    // --- instance() ---
    Admin,
    Token,
    Rewards,
    Config,
    Paused,
    // --- persistent() ---
    CurrentIteration,
    CurrentPool,
    NextPool,
    OperatorPool,
    TotalAttempts,
    CurrentFee,
    CurrentPrompt,
    /// Concluded prompts, keyed by the iteration they closed.
    PromptHistory(u32),
    /// Per-iteration participant entry. A new iteration starts with a fresh
    /// key space, which is how the registry "clears".
    Participant(u32, Address),
    /// All-time flag backing the first-mover discount. Never cleared.
    HasAttempted(Address),
}

/// Fixed policy, set once at init.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameConfig {
    pub base_fee: i128,
    pub fee_cap: i128,
    /// Per-attempt compounding growth of the base fee, in basis points.
    pub growth_bps: u32,
    pub cooldown_secs: u64,
    pub base_char_limit: u32,
    pub first_mover_discount_bps: u32,
    /// Ceiling on the composed discount; net fee never drops below
    /// `base * (10_000 - max_discount_bps) / 10_000`.
    pub max_discount_bps: u32,
    pub current_pool_bps: u32,
    pub next_pool_bps: u32,
    pub operator_pool_bps: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParticipantData {
    pub attempt_count: u32,
    pub last_attempt_at: u64,
}

/// Snapshot returned by `get_game_state`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameState {
    pub iteration: u32,
    pub paused: bool,
    pub current_pool: i128,
    pub next_pool: i128,
    pub operator_pool: i128,
    pub total_attempts: u32,
    pub current_fee: i128,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[contractevent]
pub struct Initialized {
    pub admin: Address,
    pub token: Address,
    pub rewards: Address,
}

#[contractevent]
pub struct Funded {
    #[topic]
    pub from: Address,
    pub amount: i128,
}

#[contractevent]
pub struct AttemptSubmitted {
    #[topic]
    pub iteration: u32,
    #[topic]
    pub sender: Address,
    pub fee_paid: i128,
    /// Overpayment that never left the sender (pull-model refund).
    pub refunded: i128,
    pub attempt_count: u32,
}

#[contractevent]
pub struct WinnerDeclared {
    #[topic]
    pub iteration: u32,
    #[topic]
    pub winner: Address,
    pub prize: i128,
    pub challengers_minted: u32,
    pub community_minted: u32,
}

#[contractevent]
pub struct PromptRotated {
    #[topic]
    pub iteration: u32,
    pub carried_forward: bool,
}

#[contractevent]
pub struct OperatorWithdrawal {
    #[topic]
    pub operator: Address,
    pub amount: i128,
}

#[contractevent]
pub struct GamePauseChanged {
    pub paused: bool,
    pub admin: Address,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct GauntletGame;

#[contractimpl]
impl GauntletGame {
    // -----------------------------------------------------------------------
    // init
    // -----------------------------------------------------------------------

    /// Initialize the game. May only be called once.
    ///
    /// `token` is the SEP-41 asset all fees and prizes move in. `rewards`
    /// is the deployed Reward Registry; this contract must be registered
    /// there as a minter before the first winner declaration. Iteration
    /// numbering starts at 1 to match the registry's.
    pub fn init(
        env: Env,
        admin: Address,
        token: Address,
        rewards: Address,
        config: GameConfig,
        initial_prompt: String,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        validate_config(&config)?;

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Token, &token);
        env.storage().instance().set(&DataKey::Rewards, &rewards);
        env.storage().instance().set(&DataKey::Config, &config);
        env.storage().instance().set(&DataKey::Paused, &false);

        set_persistent_u32(&env, DataKey::CurrentIteration, 1);
        set_persistent_i128(&env, DataKey::CurrentPool, 0);
        set_persistent_i128(&env, DataKey::NextPool, 0);
        set_persistent_i128(&env, DataKey::OperatorPool, 0);
        set_persistent_u32(&env, DataKey::TotalAttempts, 0);
        set_persistent_i128(&env, DataKey::CurrentFee, config.base_fee);

        let prompt_key = DataKey::CurrentPrompt;
        env.storage().persistent().set(&prompt_key, &initial_prompt);
        extend_persistent_ttl(&env, &prompt_key);

        Initialized {
            admin,
            token,
            rewards,
        }
        .publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // fund
    // -----------------------------------------------------------------------

    /// Transfer `amount` tokens from `from` into the current prize pool.
    ///
    /// Anyone may fund: the operator seeding the opening pool, a sponsor
    /// topping up mid-iteration.
    pub fn fund(env: Env, from: Address, amount: i128) -> Result<(), Error> {
        require_initialized(&env)?;
        require_not_paused(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        from.require_auth();

        let token = get_token(&env);
        let contract_address = env.current_contract_address();
        TokenClient::new(&env, &token).transfer(&from, &contract_address, &amount);

        let new_pool = get_pool(&env, DataKey::CurrentPool)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        set_persistent_i128(&env, DataKey::CurrentPool, new_pool);

        Funded { from, amount }.publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // submit_attempt
    // -----------------------------------------------------------------------

    /// Submit a paid attempt against the current prompt.
    ///
    /// `payment` must cover the net fee (the quoted base fee minus the
    /// sender's composed discount); only the net fee is pulled from the
    /// sender, so any overpayment stays in their balance. `token_id`
    /// optionally names a reward token the sender holds; it raises the
    /// character limit and lowers the fee but is not consumed.
    ///
    /// Returns the net fee charged.
    pub fn submit_attempt(
        env: Env,
        sender: Address,
        content: String,
        token_id: Option<u64>,
        payment: i128,
    ) -> Result<i128, Error> {
        require_initialized(&env)?;
        require_not_paused(&env)?;
        sender.require_auth();

        if payment < 0 {
            return Err(Error::InvalidAmount);
        }

        let config = get_config(&env);
        let iteration = get_current_iteration(&env);
        let now = env.ledger().timestamp();

        let entry = get_participant_entry(&env, iteration, &sender);
        if let Some(ref data) = entry {
            if now.saturating_sub(data.last_attempt_at) < config.cooldown_secs {
                return Err(Error::CooldownActive);
            }
        }

        let char_limit = effective_char_limit(&env, &config, &sender, token_id);
        if content.len() > char_limit {
            return Err(Error::ContentTooLong);
        }

        let net_fee = compute_net_fee(&env, &config, &sender, token_id)?;
        if payment < net_fee {
            return Err(Error::InsufficientPayment);
        }

        // All checks passed. Pull the net fee in, then write state.
        let token = get_token(&env);
        let contract_address = env.current_contract_address();
        TokenClient::new(&env, &token).transfer(&sender, &contract_address, &net_fee);

        let (to_current, to_next, to_operator) =
            split_pool(net_fee, config.current_pool_bps, config.next_pool_bps)
                .map_err(|_| Error::Overflow)?;

        add_to_pool(&env, DataKey::CurrentPool, to_current)?;
        add_to_pool(&env, DataKey::NextPool, to_next)?;
        add_to_pool(&env, DataKey::OperatorPool, to_operator)?;

        let attempt_count = match entry {
            Some(data) => data.attempt_count.checked_add(1).ok_or(Error::Overflow)?,
            None => 1,
        };
        set_participant_entry(
            &env,
            iteration,
            &sender,
            &ParticipantData {
                attempt_count,
                last_attempt_at: now,
            },
        );

        let flag_key = DataKey::HasAttempted(sender.clone());
        env.storage().persistent().set(&flag_key, &true);
        extend_persistent_ttl(&env, &flag_key);

        let total = get_total_attempts(&env)
            .checked_add(1)
            .ok_or(Error::Overflow)?;
        set_persistent_u32(&env, DataKey::TotalAttempts, total);

        let grown = grow_fee(get_current_fee(&env), config.growth_bps, config.fee_cap)
            .map_err(|_| Error::Overflow)?;
        set_persistent_i128(&env, DataKey::CurrentFee, grown);

        AttemptSubmitted {
            iteration,
            sender,
            fee_paid: net_fee,
            refunded: payment - net_fee,
            attempt_count,
        }
        .publish(&env);

        Ok(net_fee)
    }

    // -----------------------------------------------------------------------
    // declare_winner
    // -----------------------------------------------------------------------

    /// Conclude the current iteration. Admin only.
    ///
    /// Pays the entire current pool to `winner`, mints a Winner token to
    /// them, Challenger tokens to up to three top attempters ranked from
    /// `top_candidates`, and a Community token to every address in
    /// `active_participants`; archives the prompt (a non-empty
    /// `next_prompt` replaces it, empty carries it forward) and opens the
    /// next iteration seeded with the next-pool balance.
    ///
    /// Tokens are minted after the iteration advances, so they start at
    /// age 0 in the newly opened iteration. The prize transfer is the
    /// final step, after every state write.
    pub fn declare_winner(
        env: Env,
        operator: Address,
        winner: Address,
        top_candidates: Vec<Address>,
        active_participants: Vec<Address>,
        next_prompt: String,
    ) -> Result<(), Error> {
        require_admin(&env, &operator)?;
        require_not_paused(&env)?;

        if top_candidates.len() > MAX_RANKING_CANDIDATES {
            return Err(Error::TooManyCandidates);
        }
        if active_participants.len() > MAX_COMMUNITY_MINTS {
            return Err(Error::TooManyParticipants);
        }

        let iteration = get_current_iteration(&env);
        if get_participant_entry(&env, iteration, &winner).is_none() {
            return Err(Error::WinnerNotParticipant);
        }

        let prize = get_pool(&env, DataKey::CurrentPool);
        let ranked = rank_top_attempters(&env, iteration, &top_candidates, TOP_CHALLENGER_SLOTS);

        // Archive the concluding prompt; rotate or carry forward.
        let current_prompt: String = env
            .storage()
            .persistent()
            .get(&DataKey::CurrentPrompt)
            .ok_or(Error::NotInitialized)?;
        let history_key = DataKey::PromptHistory(iteration);
        env.storage().persistent().set(&history_key, &current_prompt);
        extend_persistent_ttl(&env, &history_key);

        let carried_forward = next_prompt.len() == 0;
        if !carried_forward {
            env.storage()
                .persistent()
                .set(&DataKey::CurrentPrompt, &next_prompt);
            extend_persistent_ttl(&env, &DataKey::CurrentPrompt);
        }

        // Open the next iteration: pools roll over, counters reset, the
        // participant generation retires with the old iteration key.
        let next_iteration = iteration.checked_add(1).ok_or(Error::Overflow)?;
        let config = get_config(&env);
        set_persistent_u32(&env, DataKey::CurrentIteration, next_iteration);
        set_persistent_i128(&env, DataKey::CurrentPool, get_pool(&env, DataKey::NextPool));
        set_persistent_i128(&env, DataKey::NextPool, 0);
        set_persistent_u32(&env, DataKey::TotalAttempts, 0);
        set_persistent_i128(&env, DataKey::CurrentFee, config.base_fee);

        // Keep the registry's clock in step, then mint into the new
        // iteration so every token starts at age 0.
        let rewards = RewardRegistryClient::new(&env, &get_rewards(&env));
        let this = env.current_contract_address();
        rewards.advance_iteration(&this);

        rewards.mint(&this, &winner, &RewardTier::Winner);

        let mut challengers_minted: u32 = 0;
        for challenger in ranked.iter() {
            rewards.mint(&this, &challenger, &RewardTier::Challenger);
            challengers_minted += 1;
        }

        let mut community_minted: u32 = 0;
        for participant in active_participants.iter() {
            rewards.mint(&this, &participant, &RewardTier::Community);
            community_minted += 1;
        }

        // Prize payout is the terminal step; state above is already final.
        if prize > 0 {
            let token = get_token(&env);
            TokenClient::new(&env, &token).transfer(&this, &winner, &prize);
        }

        PromptRotated {
            iteration: next_iteration,
            carried_forward,
        }
        .publish(&env);

        WinnerDeclared {
            iteration,
            winner,
            prize,
            challengers_minted,
            community_minted,
        }
        .publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // withdraw_operator
    // -----------------------------------------------------------------------

    /// Drain the operator pool to the operator. Admin only; available even
    /// while the game is paused.
    pub fn withdraw_operator(env: Env, operator: Address) -> Result<i128, Error> {
        require_admin(&env, &operator)?;

        let amount = get_pool(&env, DataKey::OperatorPool);
        if amount <= 0 {
            return Err(Error::NothingToWithdraw);
        }

        set_persistent_i128(&env, DataKey::OperatorPool, 0);

        let token = get_token(&env);
        let contract_address = env.current_contract_address();
        TokenClient::new(&env, &token).transfer(&contract_address, &operator, &amount);

        OperatorWithdrawal {
            operator,
            amount,
        }
        .publish(&env);

        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // pause / unpause
    // -----------------------------------------------------------------------

    /// Pause the game. Admin only. Errors if already paused.
    pub fn pause(env: Env, admin: Address) -> Result<(), Error> {
        require_admin(&env, &admin)?;

        if is_paused(&env) {
            return Err(Error::AlreadyPaused);
        }

        env.storage().instance().set(&DataKey::Paused, &true);
        GamePauseChanged {
            paused: true,
            admin,
        }
        .publish(&env);
        Ok(())
    }

    /// Unpause the game. Admin only. Errors if not paused.
    pub fn unpause(env: Env, admin: Address) -> Result<(), Error> {
        require_admin(&env, &admin)?;

        if !is_paused(&env) {
            return Err(Error::NotPaused);
        }

        env.storage().instance().set(&DataKey::Paused, &false);
        GamePauseChanged {
            paused: false,
            admin,
        }
        .publish(&env);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read-only queries
    // -----------------------------------------------------------------------

    /// Net fee `sender` would pay right now, with an optional reward token.
    ///
    /// Total over its inputs: an unknown or unowned `token_id` contributes
    /// a zero discount rather than an error.
    pub fn quote_fee(env: Env, sender: Address, token_id: Option<u64>) -> Result<i128, Error> {
        require_initialized(&env)?;
        let config = get_config(&env);
        compute_net_fee(&env, &config, &sender, token_id)
    }

    /// Character limit `sender` gets with an optional reward token.
    pub fn char_limit_for(env: Env, sender: Address, token_id: Option<u64>) -> Result<u32, Error> {
        require_initialized(&env)?;
        let config = get_config(&env);
        Ok(effective_char_limit(&env, &config, &sender, token_id))
    }

    /// Point-in-time snapshot of pools, counters, and the pause flag.
    pub fn get_game_state(env: Env) -> Result<GameState, Error> {
        require_initialized(&env)?;
        Ok(GameState {
            iteration: get_current_iteration(&env),
            paused: is_paused(&env),
            current_pool: get_pool(&env, DataKey::CurrentPool),
            next_pool: get_pool(&env, DataKey::NextPool),
            operator_pool: get_pool(&env, DataKey::OperatorPool),
            total_attempts: get_total_attempts(&env),
            current_fee: get_current_fee(&env),
        })
    }

    /// The participant entry for `addr` in the current iteration.
    pub fn get_participant(env: Env, addr: Address) -> Option<ParticipantData> {
        get_participant_entry(&env, get_current_iteration(&env), &addr)
    }

    /// Whether `addr` has attempted in the current iteration.
    pub fn is_participant(env: Env, addr: Address) -> bool {
        get_participant_entry(&env, get_current_iteration(&env), &addr).is_some()
    }

    /// Rank `candidates` by current-iteration attempt count, descending,
    /// ties kept in supplied order; returns up to `k` addresses.
    /// Non-participants never qualify.
    pub fn top_attempters(env: Env, candidates: Vec<Address>, k: u32) -> Result<Vec<Address>, Error> {
        if candidates.len() > MAX_RANKING_CANDIDATES {
            return Err(Error::TooManyCandidates);
        }
        let iteration = get_current_iteration(&env);
        Ok(rank_top_attempters(&env, iteration, &candidates, k))
    }

    /// The active prompt.
    pub fn get_prompt(env: Env) -> Result<String, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::CurrentPrompt)
            .ok_or(Error::NotInitialized)
    }

    /// The archived prompt of a concluded iteration, if any.
    pub fn get_prompt_history(env: Env, iteration: u32) -> Option<String> {
        env.storage()
            .persistent()
            .get(&DataKey::PromptHistory(iteration))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_config(config: &GameConfig) -> Result<(), Error> {
    if config.base_fee <= 0 || config.fee_cap < config.base_fee {
        return Err(Error::InvalidConfig);
    }
    if config.base_char_limit == 0 {
        return Err(Error::InvalidConfig);
    }
    if config.max_discount_bps >= BASIS_POINTS_DIVISOR {
        return Err(Error::InvalidConfig);
    }
    let split_sum = config
        .current_pool_bps
        .checked_add(config.next_pool_bps)
        .and_then(|v| v.checked_add(config.operator_pool_bps))
        .ok_or(Error::InvalidConfig)?;
    if split_sum != BASIS_POINTS_DIVISOR {
        return Err(Error::InvalidConfig);
    }
    Ok(())
}

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

fn require_not_paused(env: &Env) -> Result<(), Error> {
    if is_paused(env) {
        return Err(Error::GamePaused);
    }
    Ok(())
}

fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

fn get_config(env: &Env) -> GameConfig {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("GauntletGame: config not set")
}

fn get_token(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .expect("GauntletGame: token not set")
}

fn get_rewards(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Rewards)
        .expect("GauntletGame: rewards not set")
}

/// Composed discount for `sender`: first-mover (all-time first attempt)
/// plus the token's effective discount, clamped to the config ceiling.
fn compute_discount_bps(
    env: &Env,
    config: &GameConfig,
    sender: &Address,
    token_id: Option<u64>,
) -> u32 {
    let mut discount: u32 = 0;
    let attempted: bool = env
        .storage()
        .persistent()
        .get(&DataKey::HasAttempted(sender.clone()))
        .unwrap_or(false);
    if !attempted {
        discount = config.first_mover_discount_bps;
    }
    if let Some(id) = token_id {
        let rewards = RewardRegistryClient::new(env, &get_rewards(env));
        discount = discount.saturating_add(rewards.fee_discount_bps(&id, sender));
    }
    if discount > config.max_discount_bps {
        config.max_discount_bps
    } else {
        discount
    }
}

fn compute_net_fee(
    env: &Env,
    config: &GameConfig,
    sender: &Address,
    token_id: Option<u64>,
) -> Result<i128, Error> {
    let discount = compute_discount_bps(env, config, sender, token_id);
    net_after_discount(get_current_fee(env), discount).map_err(|_| Error::Overflow)
}

fn effective_char_limit(
    env: &Env,
    config: &GameConfig,
    sender: &Address,
    token_id: Option<u64>,
) -> u32 {
    let bonus = match token_id {
        Some(id) => {
            let rewards = RewardRegistryClient::new(env, &get_rewards(env));
            rewards.char_bonus(&id, sender)
        }
        None => 0,
    };
    config.base_char_limit.saturating_add(bonus)
}

/// Stable ranking of `candidates` by attempt count, descending. Earlier
/// supplied candidates win ties; duplicates and non-participants are
/// dropped; the result is truncated to `k`.
fn rank_top_attempters(
    env: &Env,
    iteration: u32,
    candidates: &Vec<Address>,
    k: u32,
) -> Vec<Address> {
    let mut ranked: Vec<Address> = Vec::new(env);
    let mut counts: Vec<u32> = Vec::new(env);

    for candidate in candidates.iter() {
        if ranked.contains(&candidate) {
            continue;
        }
        let count = match get_participant_entry(env, iteration, &candidate) {
            Some(data) => data.attempt_count,
            None => continue,
        };

        // Insert before the first strictly smaller count, so equal counts
        // keep their supplied order.
        let mut pos = ranked.len();
        for i in 0..counts.len() {
            if counts.get_unchecked(i) < count {
                pos = i;
                break;
            }
        }
        ranked.insert(pos, candidate.clone());
        counts.insert(pos, count);
    }

    while ranked.len() > k {
        ranked.pop_back();
    }
    ranked
}

fn get_participant_entry(env: &Env, iteration: u32, addr: &Address) -> Option<ParticipantData> {
    env.storage()
        .persistent()
        .get(&DataKey::Participant(iteration, addr.clone()))
}

fn set_participant_entry(env: &Env, iteration: u32, addr: &Address, data: &ParticipantData) {
    let key = DataKey::Participant(iteration, addr.clone());
    env.storage().persistent().set(&key, data);
    extend_persistent_ttl(env, &key);
}

fn add_to_pool(env: &Env, key: DataKey, amount: i128) -> Result<(), Error> {
    let updated = get_pool(env, key.clone())
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    set_persistent_i128(env, key, updated);
    Ok(())
}

fn get_pool(env: &Env, key: DataKey) -> i128 {
    env.storage().persistent().get(&key).unwrap_or(0)
}

fn get_current_iteration(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::CurrentIteration)
        .unwrap_or(0)
}

fn get_total_attempts(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::TotalAttempts)
        .unwrap_or(0)
}

fn get_current_fee(env: &Env) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::CurrentFee)
        .unwrap_or(0)
}

fn set_persistent_i128(env: &Env, key: DataKey, value: i128) {
    env.storage().persistent().set(&key, &value);
    extend_persistent_ttl(env, &key);
}

fn set_persistent_u32(env: &Env, key: DataKey, value: u32) {
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
