// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Modular arithmetic on secret operands.
//!
//! Everything here delegates to [`BigNumber`]'s modular operations; callers
//! must never branch on the bit pattern of a secret beyond its sign, which is
//! public for the signed-exponent operations below.

use crate::errors::{InternalError, Result};
use libpaillier::unknown_order::BigNumber;
use num_bigint::{BigInt, Sign};

/// Compute a^e (mod n).
pub(crate) fn modpow(a: &BigNumber, e: &BigNumber, n: &BigNumber) -> BigNumber {
    a.modpow(e, n)
}

/// The canonical representative of `a` modulo `n`, in `[0, n)`; total for
/// negative `a` as well.
pub(crate) fn reduce(a: &BigNumber, n: &BigNumber) -> BigNumber {
    a.modadd(&BigNumber::zero(), n)
}

/// Compute a^e (mod n) where `e` is a signed integer.
///
/// A negative exponent requires `a` to be invertible modulo `n`; the base is
/// inverted first and the magnitude of `e` applied to the inverse.
pub(crate) fn mod_exp_signed(a: &BigNumber, e: &BigNumber, n: &BigNumber) -> Result<BigNumber> {
    if e < &BigNumber::zero() {
        let inv = a
            .invert(n)
            .ok_or(InternalError::CouldNotInvertBigNumber)?;
        Ok(inv.modpow(&-e.clone(), n))
    } else {
        Ok(a.modpow(e, n))
    }
}

/// Compute a^e (mod p*q) for signed `e`, accelerated by working modulo each
/// prime factor and recombining with [`crt_combine`].
pub(crate) fn mod_exp_signed_crt(
    a: &BigNumber,
    e: &BigNumber,
    p: &BigNumber,
    q: &BigNumber,
) -> Result<BigNumber> {
    let residue_p = mod_exp_signed_reduced(a, e, p)?;
    let residue_q = mod_exp_signed_reduced(a, e, q)?;
    crt_combine(&residue_p, &residue_q, p, q)
}

/// a^e (mod p) for prime `p`, with the exponent magnitude reduced mod p-1.
fn mod_exp_signed_reduced(a: &BigNumber, e: &BigNumber, p: &BigNumber) -> Result<BigNumber> {
    let group_order = p - 1;
    let negative = e < &BigNumber::zero();
    let magnitude = if negative { -e.clone() } else { e.clone() };
    let reduced = reduce(&magnitude, &group_order);
    let result = reduce(a, p).modpow(&reduced, p);
    if negative {
        result
            .invert(p)
            .ok_or(InternalError::CouldNotInvertBigNumber)
    } else {
        Ok(result)
    }
}

/// Recombine the residues `r_p` and `r_q` into the unique `x` in `[0, p*q)`
/// with `x = r_p (mod p)` and `x = r_q (mod q)`, by Garner's formula:
/// `x = r_p + p * ((r_q - r_p) * p^{-1} mod q)`.
pub(crate) fn crt_combine(
    r_p: &BigNumber,
    r_q: &BigNumber,
    p: &BigNumber,
    q: &BigNumber,
) -> Result<BigNumber> {
    let p_inv = p.invert(q).ok_or(InternalError::NotCoprime)?;
    let base = reduce(r_p, p);
    let spread = reduce(&(r_q - &base), q);
    let offset = spread.modmul(&p_inv, q);
    Ok(&base + &(p * &offset))
}

/// Returns true iff gcd(a, n) = 1.
pub(crate) fn is_coprime(a: &BigNumber, n: &BigNumber) -> bool {
    a.gcd(n) == BigNumber::one()
}

/// Returns true iff `a` is in the multiplicative group of integers modulo
/// `n`, i.e. `a` in `[1, n-1]` and coprime to `n`.
pub(crate) fn is_in_unit_group(a: &BigNumber, n: &BigNumber) -> bool {
    a >= &BigNumber::one() && a < n && is_coprime(a, n)
}

/// Serialize `x` as fixed-width big-endian bytes, left-padded with zeros.
///
/// `x` must be non-negative and fit in `width` bytes.
pub(crate) fn fill_bytes_be(x: &BigNumber, width: usize) -> Result<Vec<u8>> {
    if x < &BigNumber::zero() {
        return Err(InternalError::InternalInvariantFailed);
    }
    let bytes = x.to_bytes();
    if bytes.len() > width {
        return Err(InternalError::InternalInvariantFailed);
    }
    let mut out = vec![0u8; width - bytes.len()];
    out.extend(bytes);
    Ok(out)
}

/// The Jacobi symbol `(a / n)`, for odd positive `n`.
///
/// Binary algorithm: strip the factors of two from the numerator, applying
/// the second supplement `(2/n) = -1` iff `n = +-3 (mod 8)` once per stripped
/// pair's parity, then swap numerator and denominator by quadratic
/// reciprocity until the numerator is exhausted.
pub(crate) fn jacobi(a: &BigNumber, n: &BigNumber) -> i32 {
    let two = BigNumber::from(2);
    let three = BigNumber::from(3);
    let four = BigNumber::from(4);

    let mut num = reduce(a, n);
    let mut den = n.clone();
    let mut symbol = 1i32;

    while num > BigNumber::zero() {
        let mut stripped = 0usize;
        while reduce(&num, &two) == BigNumber::zero() {
            num /= 2;
            stripped += 1;
        }
        if stripped % 2 == 1 {
            let residue = reduce(&den, &BigNumber::from(8));
            if residue == three || residue == BigNumber::from(5) {
                symbol = -symbol;
            }
        }

        // Reciprocity flips the sign exactly when both sides are 3 (mod 4).
        if reduce(&num, &four) == three && reduce(&den, &four) == three {
            symbol = -symbol;
        }
        std::mem::swap(&mut num, &mut den);
        num = reduce(&num, &den);
    }

    if den == BigNumber::one() {
        symbol
    } else {
        0
    }
}

/// The integer square root of a non-negative value, rounded down.
pub(crate) fn sqrt(num: &BigNumber) -> BigNumber {
    // Detour through num-bigint, which has an integer square root.
    let num_bigint: BigInt = BigInt::from_bytes_be(Sign::Plus, &num.to_bytes());
    let sqrt = num_bigint.sqrt();
    BigNumber::from_slice(sqrt.to_bytes_be().1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paillier::prime_gen;
    use crate::utils::testing::init_testing;

    #[test]
    fn jacobi_on_known_small_values() {
        // (2/15) = (2/3)(2/5) = (-1)(-1) = 1; (7/15) = (1/3)(2/5) = -1.
        let fifteen = BigNumber::from(15);
        assert_eq!(jacobi(&BigNumber::from(2), &fifteen), 1);
        assert_eq!(jacobi(&BigNumber::from(7), &fifteen), -1);
        // Shared factors collapse the symbol to zero.
        assert_eq!(jacobi(&BigNumber::from(5), &fifteen), 0);
        assert_eq!(jacobi(&BigNumber::zero(), &fifteen), 0);
        assert_eq!(jacobi(&BigNumber::one(), &fifteen), 1);
    }

    #[test]
    fn jacobi_identities_over_blum_factors() {
        let mut rng = init_testing();
        let (p, q) = prime_gen::get_prime_pair_from_pool_insecure(&mut rng).unwrap();
        let n = &p * &q;

        // -1 is a non-residue modulo a prime that is 3 (mod 4), so its
        // Jacobi symbol modulo the Blum composite is 1.
        assert_eq!(jacobi(&(&p - 1), &p), -1);
        assert_eq!(jacobi(&(&n - 1), &n), 1);

        for _ in 0..25 {
            let x = crate::sample::unit_mod_n(&mut rng, &n).unwrap();
            // Squares have symbol 1 everywhere.
            assert_eq!(jacobi(&x.modmul(&x, &n), &n), 1);
            // The symbol is multiplicative across the factorization.
            assert_eq!(jacobi(&x, &n), jacobi(&x, &p) * jacobi(&x, &q));
        }
    }

    #[test]
    fn crt_combine_on_a_known_case() {
        // x = 2 (mod 5), x = 3 (mod 7) has the unique solution 17 in [0, 35).
        let x = crt_combine(
            &BigNumber::from(2),
            &BigNumber::from(3),
            &BigNumber::from(5),
            &BigNumber::from(7),
        )
        .unwrap();
        assert_eq!(x, BigNumber::from(17));
    }

    #[test]
    fn crt_combine_recovers_residues() {
        let mut rng = init_testing();
        let (p, q) = prime_gen::get_prime_pair_from_pool_insecure(&mut rng).unwrap();

        for _ in 0..25 {
            let r_p = crate::sample::mod_n(&mut rng, &p);
            let r_q = crate::sample::mod_n(&mut rng, &q);

            let x = crt_combine(&r_p, &r_q, &p, &q).unwrap();
            assert!(x < &p * &q);
            assert_eq!(reduce(&x, &p), r_p);
            assert_eq!(reduce(&x, &q), r_q);
        }
    }

    #[test]
    fn crt_combine_rejects_equal_moduli() {
        let p = BigNumber::from(5);
        assert_eq!(
            crt_combine(&BigNumber::one(), &BigNumber::from(2), &p, &p),
            Err(InternalError::NotCoprime)
        );
    }

    #[test]
    fn test_mod_exp_signed_negative_exponent_inverts() {
        let mut rng = init_testing();
        let (p, q) = prime_gen::get_prime_pair_from_pool_insecure(&mut rng).unwrap();
        let n = &p * &q;

        let a = BigNumber::from(17);
        let e = BigNumber::from(5);
        let pos = mod_exp_signed(&a, &e, &n).unwrap();
        let neg = mod_exp_signed(&a, &-e, &n).unwrap();

        assert_eq!(pos.modmul(&neg, &n), BigNumber::one());
    }

    #[test]
    fn test_mod_exp_signed_crt_matches_direct() {
        let mut rng = init_testing();
        let (p, q) = prime_gen::get_prime_pair_from_pool_insecure(&mut rng).unwrap();
        let n = &p * &q;

        for _ in 0..10 {
            let a = crate::sample::mod_n(&mut rng, &n);
            let e = crate::sample::mod_n(&mut rng, &n);
            assert_eq!(
                mod_exp_signed_crt(&a, &e, &p, &q).unwrap(),
                modpow(&a, &e, &n)
            );
            if is_coprime(&a, &n) {
                assert_eq!(
                    mod_exp_signed_crt(&a, &-e.clone(), &p, &q).unwrap(),
                    mod_exp_signed(&a, &-e.clone(), &n).unwrap()
                );
            }
        }
    }

    #[test]
    fn reduce_is_canonical_for_signed_input() {
        let n = BigNumber::from(13);
        assert_eq!(reduce(&BigNumber::from(40), &n), BigNumber::one());
        assert_eq!(reduce(&-BigNumber::one(), &n), BigNumber::from(12));
        assert_eq!(reduce(&BigNumber::zero(), &n), BigNumber::zero());
    }

    #[test]
    fn test_fill_bytes_be_pads_and_bounds() {
        let x = BigNumber::from(0x0102u64);
        let bytes = fill_bytes_be(&x, 4).unwrap();
        assert_eq!(bytes, vec![0, 0, 1, 2]);

        assert!(fill_bytes_be(&x, 1).is_err());
        assert!(fill_bytes_be(&-x, 4).is_err());
    }

    #[test]
    fn test_unit_group_membership() {
        let n = BigNumber::from(15);
        assert!(is_in_unit_group(&BigNumber::from(2), &n));
        assert!(is_in_unit_group(&BigNumber::one(), &n));
        assert!(!is_in_unit_group(&BigNumber::zero(), &n));
        assert!(!is_in_unit_group(&BigNumber::from(5), &n));
        assert!(!is_in_unit_group(&BigNumber::from(15), &n));
        assert!(!is_in_unit_group(&BigNumber::from(20), &n));
    }

    #[test]
    fn sqrt_rounds_down() {
        assert_eq!(sqrt(&BigNumber::from(16)), BigNumber::from(4));
        assert_eq!(sqrt(&BigNumber::from(17)), BigNumber::from(4));
        assert_eq!(sqrt(&BigNumber::from(24)), BigNumber::from(4));
        assert_eq!(sqrt(&BigNumber::from(25)), BigNumber::from(5));
    }
}
