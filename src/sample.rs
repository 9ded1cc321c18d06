// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Random draws from the integer intervals the proofs are specified over.
//!
//! The range proofs sample masks from the signed intervals of CGGMP table 2:
//! `±2^ELL` scaled by an auxiliary modulus for commitment randomness,
//! `±2^(ELL+EPSILON)` (possibly scaled) for the masking values whose range
//! check carries the soundness slack. Signed draws are taken by centering a
//! uniform draw from `[0, 2*bound]`, so every value in the closed interval
//! `[-bound, bound]` is equally likely.

use crate::{
    errors::{InternalError, Result},
    parameters::{ELL, EPSILON},
    utils::CRYPTOGRAPHIC_RETRY_MAX,
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};

/// Uniform draw from `[0, n)`.
pub(crate) fn mod_n<R: RngCore + CryptoRng>(rng: &mut R, n: &BigNumber) -> BigNumber {
    BigNumber::from_rng(n, rng)
}

/// Uniform draw from the closed interval `[-bound, bound]`.
pub(crate) fn plusminus<R: RngCore + CryptoRng>(rng: &mut R, bound: &BigNumber) -> BigNumber {
    let width = bound * &BigNumber::from(2) + 1;
    BigNumber::from_rng(&width, rng) - bound
}

/// Mask draw from `±2^(ELL + EPSILON)`.
pub(crate) fn interval_l_eps<R: RngCore + CryptoRng>(rng: &mut R) -> BigNumber {
    plusminus(rng, &(BigNumber::one() << (ELL + EPSILON)))
}

/// Commitment-randomness draw from `±2^ELL * scale`.
pub(crate) fn interval_l_scaled<R: RngCore + CryptoRng>(
    rng: &mut R,
    scale: &BigNumber,
) -> BigNumber {
    plusminus(rng, &((BigNumber::one() << ELL) * scale))
}

/// Mask-randomness draw from `±2^(ELL + EPSILON) * scale`.
pub(crate) fn interval_l_eps_scaled<R: RngCore + CryptoRng>(
    rng: &mut R,
    scale: &BigNumber,
) -> BigNumber {
    plusminus(rng, &((BigNumber::one() << (ELL + EPSILON)) * scale))
}

/// Uniform draw from the multiplicative group of integers modulo `n`.
///
/// `n` is a Paillier modulus here, so a draw sharing a factor with `n` would
/// amount to factoring it; such draws (and zero) are discarded, and both are
/// too rare to ever see in practice.
pub(crate) fn unit_mod_n<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: &BigNumber,
) -> Result<BigNumber> {
    for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
        let candidate = BigNumber::from_rng(n, rng);
        if candidate != BigNumber::zero() && candidate.gcd(n) == BigNumber::one() {
            return Ok(candidate);
        }
    }
    Err(InternalError::RetryFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    #[test]
    fn plusminus_stays_in_bounds_and_covers_both_signs() {
        let mut rng = init_testing();
        let bound = BigNumber::one() << 64;

        let mut seen_negative = false;
        let mut seen_positive = false;
        for _ in 0..200 {
            let draw = plusminus(&mut rng, &bound);
            assert!(draw >= -bound.clone() && draw <= bound);
            if draw < BigNumber::zero() {
                seen_negative = true;
            }
            if draw > BigNumber::zero() {
                seen_positive = true;
            }
        }
        assert!(seen_negative && seen_positive);
    }

    #[test]
    fn interval_draws_respect_their_scaled_bounds() {
        let mut rng = init_testing();
        let scale = BigNumber::from(1_000_003u64);

        let l_bound = (BigNumber::one() << ELL) * &scale;
        let draw = interval_l_scaled(&mut rng, &scale);
        assert!(draw >= -l_bound.clone() && draw <= l_bound);

        let l_eps_bound = (BigNumber::one() << (ELL + EPSILON)) * &scale;
        let draw = interval_l_eps_scaled(&mut rng, &scale);
        assert!(draw >= -l_eps_bound.clone() && draw <= l_eps_bound);

        let unscaled = interval_l_eps(&mut rng);
        let unscaled_bound = BigNumber::one() << (ELL + EPSILON);
        assert!(unscaled >= -unscaled_bound.clone() && unscaled <= unscaled_bound);
    }

    #[test]
    fn unit_draws_are_nonzero_and_coprime() {
        let mut rng = init_testing();
        // 3 * 5 * 7: a third of the residues share a factor, so the retry
        // path actually runs.
        let n = BigNumber::from(105u64);
        for _ in 0..50 {
            let unit = unit_mod_n(&mut rng, &n).unwrap();
            assert!(unit > BigNumber::zero() && unit < n);
            assert_eq!(unit.gcd(&n), BigNumber::one());
        }
    }

    #[test]
    fn mod_n_draws_below_the_modulus() {
        let mut rng = init_testing();
        let n = BigNumber::from(97u64);
        for _ in 0..50 {
            let draw = mod_n(&mut rng, &n);
            assert!(draw < n);
        }
    }
}
