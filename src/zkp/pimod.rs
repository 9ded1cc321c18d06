// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Implements the ZKP from Figure 16 of <https://eprint.iacr.org/2021/060.pdf>
//!
//! Proves that a modulus `N` is a Paillier-Blum modulus: a product of two
//! primes which are both 3 mod 4. The challenges `y_i` are drawn from the
//! transcript; for each the prover exhibits an `N`-th root and a fourth root
//! of `(-1)^a w^b y_i`, which is only possible with knowledge of factors of
//! the required form.

use super::Proof;
use crate::{
    arith::{jacobi, modpow, reduce},
    errors::*,
    hash::{positive_bn_from_digest, Hash},
    parameters::MOD_PROOF_ITERATIONS,
    sample,
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiModProof {
    /// A random element of Jacobi symbol -1.
    w: BigNumber,
    elements: Vec<PiModProofElements>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PiModProofElements {
    /// Fourth root of `(-1)^a w^b y`.
    x: BigNumber,
    a: bool,
    b: bool,
    /// `N`-th root of `y`.
    z: BigNumber,
}

#[derive(Clone)]
pub struct PiModInput {
    n: BigNumber,
}

impl PiModInput {
    pub fn new(n: &BigNumber) -> Self {
        Self { n: n.clone() }
    }
}

pub struct PiModSecret {
    p: BigNumber,
    q: BigNumber,
}

impl PiModSecret {
    pub fn new(p: &BigNumber, q: &BigNumber) -> Self {
        Self {
            p: p.clone(),
            q: q.clone(),
        }
    }
}

/// Compute y' = (-1)^a * w^b * y (mod N)
fn y_prime_from_y(y: &BigNumber, w: &BigNumber, a: bool, b: bool, n: &BigNumber) -> BigNumber {
    let mut y_prime = y.clone();

    if b {
        y_prime = y_prime.modmul(w, n);
    }

    if a {
        y_prime = y_prime.modneg(n);
    }

    y_prime
}

/// The exponent `((phi + 4) / 8)^2 mod phi`.
///
/// For a Blum modulus with safe-prime factors, the quadratic residues form a
/// group of odd order `phi / 4`, and raising a residue to this exponent
/// yields one of its fourth roots.
fn fourth_root_exponent(phi: &BigNumber) -> BigNumber {
    let e = &(phi + 4u32) / 8u32;
    e.modmul(&e, phi)
}

/// Find the unique `(a, b)` for which `(-1)^a w^b y` is a quadratic residue
/// modulo both prime factors, and return that residue.
///
/// `-1` is a non-residue modulo each factor (both are 3 mod 4) and `w` is a
/// non-residue modulo exactly one of them, so the four sign patterns of the
/// Legendre symbols are hit exactly once each; the search runs over symbols,
/// never over roots.
fn make_quadratic_residue(
    y: &BigNumber,
    w: &BigNumber,
    p: &BigNumber,
    q: &BigNumber,
    n: &BigNumber,
) -> Result<(bool, bool, BigNumber)> {
    let chi_p = jacobi(y, p);
    let chi_q = jacobi(y, q);
    if chi_p == 0 || chi_q == 0 {
        return Err(InternalError::CouldNotGenerateProof);
    }
    let w_p = jacobi(w, p);
    let w_q = jacobi(w, q);

    for a in [false, true] {
        for b in [false, true] {
            let negations = if a { -1 } else { 1 };
            let symbol_p = chi_p * negations * if b { w_p } else { 1 };
            let symbol_q = chi_q * negations * if b { w_q } else { 1 };
            if symbol_p == 1 && symbol_q == 1 {
                return Ok((a, b, y_prime_from_y(y, w, a, b, n)));
            }
        }
    }
    Err(InternalError::CouldNotGenerateProof)
}

impl Proof for PiModProof {
    type CommonInput = PiModInput;
    type ProverSecret = PiModSecret;

    fn prove<R: RngCore + CryptoRng>(
        input: &Self::CommonInput,
        secret: &Self::ProverSecret,
        transcript: &mut Hash,
        rng: &mut R,
    ) -> Result<Self> {
        // Step 1: Pick a random w in [1, N) that has a Jacobi symbol of -1
        let mut w = sample::mod_n(rng, &input.n);
        while jacobi(&w, &input.n) != -1 {
            w = sample::mod_n(rng, &input.n);
        }

        transcript.write_int(&input.n)?;
        transcript.write_int(&w)?;
        let mut digest = transcript.digest();

        let phi = (&secret.p - 1) * (&secret.q - 1);
        let n_th_root_exponent = input
            .n
            .invert(&phi)
            .ok_or(InternalError::CouldNotInvertBigNumber)?;
        let quartic_exponent = fourth_root_exponent(&phi);

        let mut elements = Vec::with_capacity(MOD_PROOF_ITERATIONS);
        for _ in 0..MOD_PROOF_ITERATIONS {
            let y = positive_bn_from_digest(&mut digest, &input.n);

            let (a, b, y_prime) = make_quadratic_residue(&y, &w, &secret.p, &secret.q, &input.n)?;
            let x = modpow(&y_prime, &quartic_exponent, &input.n);
            let z = modpow(&y, &n_th_root_exponent, &input.n);

            elements.push(PiModProofElements { x, a, b, z });
        }

        Ok(Self { w, elements })
    }

    fn verify(&self, input: &Self::CommonInput, transcript: &mut Hash) -> bool {
        // N must be an odd composite
        if reduce(&input.n, &BigNumber::from(2)) == BigNumber::zero() {
            error!("modulus is even");
            return false;
        }
        if input.n.is_prime() {
            error!("modulus is not composite");
            return false;
        }

        if self.w < BigNumber::one() || self.w >= input.n {
            return false;
        }
        if self.elements.len() != MOD_PROOF_ITERATIONS {
            return false;
        }

        if transcript.write_int(&input.n).is_err() || transcript.write_int(&self.w).is_err() {
            return false;
        }
        let mut digest = transcript.digest();

        for element in &self.elements {
            let y = positive_bn_from_digest(&mut digest, &input.n);

            // z^N = y (mod N)
            if modpow(&element.z, &input.n, &input.n) != y {
                error!("N-th root check failed");
                return false;
            }

            // x^4 = (-1)^a w^b y (mod N)
            let y_prime = y_prime_from_y(&y, &self.w, element.a, element.b, &input.n);
            if modpow(&element.x, &BigNumber::from(4), &input.n) != y_prime {
                error!("fourth root check failed");
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{paillier::PaillierKey, utils::testing::init_testing};

    fn random_blum_modulus_proof<R: RngCore + CryptoRng>(
        rng: &mut R,
    ) -> Result<(PiModInput, PiModProof, Hash)> {
        let key = PaillierKey::generate_for_testing(rng)?;
        let (p, q) = key.secret_primes()?;
        let input = PiModInput::new(key.modulus());

        let mut session = Hash::new();
        session.write_bytes(b"pimod test session")?;

        let proof = PiModProof::prove(
            &input,
            &PiModSecret::new(p, q),
            &mut session.fork(),
            rng,
        )?;
        Ok((input, proof, session))
    }

    #[test]
    fn quadratic_residue_selection_yields_fourth_roots() {
        let mut rng = init_testing();
        let key = PaillierKey::generate_for_testing(&mut rng).unwrap();
        let (p, q) = key.secret_primes().unwrap();
        let n = key.modulus();
        let phi = (p - 1) * (q - 1);
        let exponent = fourth_root_exponent(&phi);

        let mut w = sample::mod_n(&mut rng, n);
        while jacobi(&w, n) != -1 {
            w = sample::mod_n(&mut rng, n);
        }

        for _ in 0..10 {
            let y = sample::unit_mod_n(&mut rng, n).unwrap();
            let (_, _, y_prime) = make_quadratic_residue(&y, &w, p, q, n).unwrap();

            // The selected value really is a residue modulo both factors,
            // and the exponent extracts a genuine fourth root.
            assert_eq!(jacobi(&y_prime, p), 1);
            assert_eq!(jacobi(&y_prime, q), 1);
            let x = modpow(&y_prime, &exponent, n);
            assert_eq!(modpow(&x, &BigNumber::from(4), n), y_prime);
        }
    }

    #[test]
    fn honest_proof_verifies() {
        let mut rng = init_testing();
        let (input, proof, session) = random_blum_modulus_proof(&mut rng).unwrap();
        assert!(proof.verify(&input, &mut session.fork()));
    }

    #[test]
    fn mutated_proof_fails() {
        let mut rng = init_testing();
        let (input, proof, session) = random_blum_modulus_proof(&mut rng).unwrap();

        let mut bad = proof.clone();
        bad.w = &bad.w + 1;
        assert!(!bad.verify(&input, &mut session.fork()));

        let mut bad = proof.clone();
        bad.elements[0].z = &bad.elements[0].z + 1;
        assert!(!bad.verify(&input, &mut session.fork()));

        let mut bad = proof.clone();
        bad.elements[7].x = &bad.elements[7].x + 1;
        assert!(!bad.verify(&input, &mut session.fork()));

        let mut bad = proof.clone();
        bad.elements[3].a = !bad.elements[3].a;
        assert!(!bad.verify(&input, &mut session.fork()));

        let mut bad = proof;
        bad.elements.pop();
        assert!(!bad.verify(&input, &mut session.fork()));
    }

    #[test]
    fn mismatched_transcript_fails() {
        let mut rng = init_testing();
        let (input, proof, _) = random_blum_modulus_proof(&mut rng).unwrap();

        let mut other = Hash::new();
        other.write_bytes(b"a different session").unwrap();
        assert!(!proof.verify(&input, &mut other));
    }

    #[test]
    fn non_blum_modulus_cannot_be_proven() {
        let mut rng = init_testing();
        let key = PaillierKey::generate_for_testing(&mut rng).unwrap();
        let (p, q) = key.secret_primes().unwrap();

        let mut session = Hash::new();
        session.write_bytes(b"pimod test session").unwrap();

        // The honest proof does not verify against a prime modulus.
        let input = PiModInput::new(key.modulus());
        let proof = PiModProof::prove(
            &input,
            &PiModSecret::new(p, q),
            &mut session.fork(),
            &mut rng,
        )
        .unwrap();
        let prime_input = PiModInput::new(p);
        assert!(!proof.verify(&prime_input, &mut session.fork()));
    }
}
