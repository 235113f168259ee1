//! Shared arithmetic for the Gauntlet contracts.
//!
//! Pure basis-point math used by both the game and the reward registry:
//! compounding fee growth, discount application, and the exact three-way
//! pool split. No contract, no storage.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::contracterror;

/// Common error codes for the shared math helpers.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Error {
    InvalidAmount = 1,
    InvalidBps = 2,
    Overflow = 3,
}

/// Constant for basis points divisor.
pub const BASIS_POINTS_DIVISOR: u32 = 10_000;

/// Helper to calculate `amount * bps / 10_000` with checked arithmetic.
///
/// `bps` may exceed 10_000 (e.g. a growth factor of 10_078); only the
/// amount itself must be non-negative.
pub fn apply_bps(amount: i128, bps: u32) -> Result<i128, Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    amount
        .checked_mul(bps as i128)
        .and_then(|v| v.checked_div(BASIS_POINTS_DIVISOR as i128))
        .ok_or(Error::Overflow)
}

/// One compounding fee-growth step.
///
/// Returns `min(fee * (10_000 + growth_bps) / 10_000, cap)`. A fee at or
/// above `cap` stays exactly at `cap`, so growth is sticky at the ceiling.
pub fn grow_fee(fee: i128, growth_bps: u32, cap: i128) -> Result<i128, Error> {
    if fee < 0 || cap < 0 {
        return Err(Error::InvalidAmount);
    }
    if fee >= cap {
        return Ok(cap);
    }
    let factor = BASIS_POINTS_DIVISOR
        .checked_add(growth_bps)
        .ok_or(Error::Overflow)?;
    let grown = apply_bps(fee, factor)?;
    Ok(if grown > cap { cap } else { grown })
}

/// The base fee after `attempts` compounding steps from `base`.
///
/// Closed form of the per-attempt growth the game applies: the quote for
/// attempt `n` of an iteration. Early-exits once the cap is reached.
pub fn compound_fee(base: i128, growth_bps: u32, attempts: u32, cap: i128) -> Result<i128, Error> {
    let mut fee = base;
    for _ in 0..attempts {
        if fee >= cap {
            return Ok(cap);
        }
        fee = grow_fee(fee, growth_bps, cap)?;
    }
    Ok(if fee > cap { cap } else { fee })
}

/// Net amount payable after a discount in basis points.
///
/// `discount_bps` must not exceed 10_000; callers clamp composed discounts
/// to their own ceiling before applying.
pub fn net_after_discount(fee: i128, discount_bps: u32) -> Result<i128, Error> {
    if discount_bps > BASIS_POINTS_DIVISOR {
        return Err(Error::InvalidBps);
    }
    apply_bps(fee, BASIS_POINTS_DIVISOR - discount_bps)
}

/// Split `amount` three ways by basis points.
///
/// The first two shares are computed by `apply_bps`; the third is the exact
/// remainder, so the three parts always sum back to `amount` with no
/// rounding loss. `first_bps + second_bps` must not exceed 10_000.
pub fn split_pool(
    amount: i128,
    first_bps: u32,
    second_bps: u32,
) -> Result<(i128, i128, i128), Error> {
    let combined = first_bps.checked_add(second_bps).ok_or(Error::Overflow)?;
    if combined > BASIS_POINTS_DIVISOR {
        return Err(Error::InvalidBps);
    }
    let first = apply_bps(amount, first_bps)?;
    let second = apply_bps(amount, second_bps)?;
    let third = amount
        .checked_sub(first)
        .and_then(|v| v.checked_sub(second))
        .ok_or(Error::Overflow)?;
    Ok((first, second, third))
}
