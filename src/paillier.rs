// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Paillier additively-homomorphic encryption.
//!
//! The modulus is a product of two safe primes of equal bit length, both
//! congruent to 3 mod 4, which makes `N` a Blum integer and lets the same
//! factors back the Paillier-Blum and no-small-factor proofs as well as the
//! derived Pedersen parameters.

use crate::{
    arith::{is_coprime, is_in_unit_group, mod_exp_signed, mod_exp_signed_crt, modpow, reduce},
    errors::{InternalError, Result},
    hash::DomainWriter,
    keystore::Keystore,
    parameters::PRIME_BITS,
    pedersen,
    pool::Pool,
    sample,
    utils::CRYPTOGRAPHIC_RETRY_MAX,
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{error, info};
use zeroize::Zeroizing;

/// An element of the Paillier ciphertext space `(Z/N^2 Z)*`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext(pub(crate) BigNumber);

impl Default for Ciphertext {
    fn default() -> Self {
        Self(BigNumber::zero())
    }
}

impl DomainWriter for Ciphertext {
    fn domain(&self) -> &'static str {
        "Paillier Ciphertext"
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend(self.0.to_bytes());
        Ok(())
    }
}

/// The secret factors of a Paillier modulus.
#[derive(Clone)]
struct SecretPrimes {
    p: BigNumber,
    q: BigNumber,
}

impl SecretPrimes {
    fn totient(&self) -> BigNumber {
        (&self.p - 1) * (&self.q - 1)
    }
}

/// A Paillier keypair. The public part is the modulus `N`; the private part,
/// when present, is the factorization `(p, q)`.
#[derive(Clone)]
pub struct PaillierKey {
    modulus: BigNumber,
    modulus_squared: BigNumber,
    secret: Option<SecretPrimes>,
}

impl std::fmt::Debug for PaillierKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaillierKey")
            .field("modulus", &self.modulus)
            .field("private", &self.secret.is_some())
            .finish()
    }
}

impl PaillierKey {
    /// Generate a new keypair, delegating the safe-prime search to `pool`.
    ///
    /// The factors are `PRIME_BITS`-long safe primes (hence 3 mod 4) and the
    /// resulting modulus is `2 * PRIME_BITS` long. Two n/2-bit primes can
    /// occasionally produce an (n-1)-bit modulus, so the search retries a
    /// bounded number of times.
    pub fn generate<R: RngCore + CryptoRng>(pool: &Pool, rng: &mut R) -> Result<Self> {
        let generate_prime_pair = |rng: &mut R| -> Result<(BigNumber, BigNumber)> {
            #[cfg(not(test))]
            let (p, q) = {
                use rand::{rngs::StdRng, SeedableRng};
                let mut seeds = [[0u8; 32]; 2];
                for seed in seeds.iter_mut() {
                    rng.fill_bytes(seed);
                }
                let mut primes = pool.run(
                    seeds
                        .into_iter()
                        .map(|seed| {
                            move || {
                                let mut worker_rng = StdRng::from_seed(seed);
                                prime_gen::get_random_safe_prime(&mut worker_rng)
                            }
                        })
                        .collect(),
                );
                let q = primes.pop().ok_or(InternalError::InternalInvariantFailed)?;
                let p = primes.pop().ok_or(InternalError::InternalInvariantFailed)?;
                (p, q)
            };
            // As generating safe primes can be computationally expensive, we
            // read precomputed ones from a file (but only in tests!)
            #[cfg(test)]
            let (p, q) = {
                let _ = pool;
                prime_gen::get_prime_pair_from_pool_insecure(rng)?
            };

            if p != q
                && p.bit_length() == PRIME_BITS
                && q.bit_length() == PRIME_BITS
                && (&p * &q).bit_length() == 2 * PRIME_BITS
            {
                Ok((p, q))
            } else {
                Err(InternalError::RetryFailed)
            }
        };

        let (p, q) = std::iter::repeat_with(|| generate_prime_pair(rng))
            .take(CRYPTOGRAPHIC_RETRY_MAX)
            .find(|result| result.is_ok())
            .ok_or(InternalError::RetryFailed)??;

        Self::from_primes(p, q)
    }

    /// Build a keypair from its safe-prime factors.
    pub fn from_primes(p: BigNumber, q: BigNumber) -> Result<Self> {
        if reduce(&p, &BigNumber::from(4)) != BigNumber::from(3)
            || reduce(&q, &BigNumber::from(4)) != BigNumber::from(3)
            || p.bit_length() != q.bit_length()
        {
            return Err(InternalError::InternalInvariantFailed);
        }
        let modulus = &p * &q;
        if !is_coprime(&modulus, &((&p - 1) * (&q - 1))) {
            return Err(InternalError::InternalInvariantFailed);
        }
        Ok(Self {
            modulus_squared: &modulus * &modulus,
            modulus,
            secret: Some(SecretPrimes { p, q }),
        })
    }

    /// Build a public-only key from a modulus.
    pub fn from_modulus(modulus: BigNumber) -> Result<Self> {
        if modulus <= BigNumber::one() || reduce(&modulus, &BigNumber::from(2)) == BigNumber::zero()
        {
            return Err(InternalError::Serialization);
        }
        Ok(Self {
            modulus_squared: &modulus * &modulus,
            modulus,
            secret: None,
        })
    }

    /// Test-only generation straight from the pre-generated prime pool.
    #[cfg(test)]
    pub(crate) fn generate_for_testing<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let (p, q) = prime_gen::get_prime_pair_from_pool_insecure(rng)?;
        Self::from_primes(p, q)
    }

    /// The modulus `N`.
    pub fn modulus(&self) -> &BigNumber {
        &self.modulus
    }

    /// The ciphertext modulus `N^2`.
    pub(crate) fn modulus_squared(&self) -> &BigNumber {
        &self.modulus_squared
    }

    /// Returns true if the key contains the secret factors.
    pub fn is_private(&self) -> bool {
        self.secret.is_some()
    }

    /// The public part of this key.
    pub fn public_key(&self) -> PaillierKey {
        PaillierKey {
            modulus: self.modulus.clone(),
            modulus_squared: self.modulus_squared.clone(),
            secret: None,
        }
    }

    /// The Subject Key Identifier: `SHA-256` over the big-endian bytes of `N`.
    pub fn ski(&self) -> [u8; 32] {
        let digest = Sha256::digest(self.modulus.to_bytes());
        digest.into()
    }

    /// Encrypt the signed message `m` with a fresh nonce, returning the
    /// ciphertext and the nonce.
    pub fn encode<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        m: &BigNumber,
    ) -> Result<(Ciphertext, BigNumber)> {
        let nonce = sample::unit_mod_n(rng, &self.modulus)?;
        let ciphertext = self.encode_with_nonce(m, &nonce)?;
        Ok((ciphertext, nonce))
    }

    /// Encrypt the signed message `m` under a caller-supplied nonce:
    /// `c = (1 + N)^m * nonce^N (mod N^2)`.
    pub fn encode_with_nonce(&self, m: &BigNumber, nonce: &BigNumber) -> Result<Ciphertext> {
        if !is_in_unit_group(nonce, &self.modulus) {
            return Err(InternalError::NotInUnitGroup);
        }
        let base = BigNumber::one() + &self.modulus;
        let a = mod_exp_signed(&base, m, &self.modulus_squared)?;
        let b = modpow(nonce, &self.modulus, &self.modulus_squared);
        Ok(Ciphertext(a.modmul(&b, &self.modulus_squared)))
    }

    /// Returns true iff `c` is in `[1, N^2 - 1]` and coprime to `N`.
    pub fn validate_ciphertext(&self, c: &Ciphertext) -> bool {
        c.0 >= BigNumber::one() && c.0 < self.modulus_squared && is_coprime(&c.0, &self.modulus)
    }

    /// Decrypt `c` to the centered representative of the plaintext in
    /// `(-N/2, N/2]`.
    pub fn decode(&self, c: &Ciphertext) -> Result<BigNumber> {
        let secret = self.secret.as_ref().ok_or(InternalError::MissingSecretKey)?;
        if !self.validate_ciphertext(c) {
            error!("Rejecting a malformed Paillier ciphertext");
            return Err(InternalError::InvalidCiphertext);
        }

        let totient = secret.totient();
        // m = L(c^phi mod N^2) * phi^{-1} mod N, with L(u) = (u - 1) / N
        let u = modpow(&c.0, &totient, &self.modulus_squared);
        let ell = &(&u - 1) / &self.modulus;
        let totient_inv = totient
            .invert(&self.modulus)
            .ok_or(InternalError::CouldNotInvertBigNumber)?;
        let m = ell.modmul(&totient_inv, &self.modulus);

        // Lift to the centered representative.
        let half = &self.modulus / &BigNumber::from(2);
        if m > half {
            Ok(m - &self.modulus)
        } else {
            Ok(m)
        }
    }

    /// Decrypt `c` and additionally recover the nonce it was encrypted with.
    pub fn decode_with_nonce(&self, c: &Ciphertext) -> Result<(BigNumber, BigNumber)> {
        let m = self.decode(c)?;
        let secret = self.secret.as_ref().ok_or(InternalError::MissingSecretKey)?;

        // c mod N = nonce^N mod N, so raising to N^{-1} mod phi(N) recovers
        // the nonce.
        let n_inv = self
            .modulus
            .invert(&secret.totient())
            .ok_or(InternalError::CouldNotInvertBigNumber)?;
        let nonce = mod_exp_signed_crt(&reduce(&c.0, &self.modulus), &n_inv, &secret.p, &secret.q)?;
        Ok((m, nonce))
    }

    /// Homomorphic addition: a ciphertext of the sum of the two plaintexts.
    pub fn add(&self, c1: &Ciphertext, c2: &Ciphertext) -> Result<Ciphertext> {
        if !self.validate_ciphertext(c1) || !self.validate_ciphertext(c2) {
            return Err(InternalError::InvalidCiphertext);
        }
        Ok(Ciphertext(c1.0.modmul(&c2.0, &self.modulus_squared)))
    }

    /// Homomorphic scaling: a ciphertext of `k` times the plaintext.
    pub fn mul_plaintext(&self, c: &Ciphertext, k: &BigNumber) -> Result<Ciphertext> {
        if !self.validate_ciphertext(c) {
            return Err(InternalError::InvalidCiphertext);
        }
        Ok(Ciphertext(mod_exp_signed(&c.0, k, &self.modulus_squared)?))
    }

    /// Derive Pedersen parameters from the secret factors.
    ///
    /// `t` is a random quadratic residue mod `N` and `s = t^lambda mod N` for
    /// a fresh `lambda` in the unit group modulo `phi(N)`; the derived triple
    /// is re-validated before being returned.
    pub fn derive_pedersen<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<pedersen::Parameters> {
        let secret = self.secret.as_ref().ok_or(InternalError::MissingSecretKey)?;
        let totient = secret.totient();

        for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
            let tau = sample::unit_mod_n(rng, &self.modulus)?;
            let t = tau.modmul(&tau, &self.modulus);
            let lambda = sample::unit_mod_n(rng, &totient)?;
            let s = mod_exp_signed_crt(&t, &lambda, &secret.p, &secret.q)?;

            match pedersen::Parameters::new(self.modulus.clone(), s, t) {
                Ok(params) => return Ok(params),
                // A degenerate draw (s = t or a non-unit); re-sample.
                Err(_) => continue,
            }
        }
        Err(InternalError::RetryFailed)
    }

    /// Encode the key as
    /// `u16_le(len N) || N [|| u16_le(len blob) || blob]` where
    /// `blob = u16_le(len p) || p || u16_le(len q) || q` is present only for
    /// private keys.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let n_bytes = self.modulus.to_bytes();
        let n_len = u16::try_from(n_bytes.len()).map_err(|_| InternalError::Serialization)?;
        buf.extend(n_len.to_le_bytes());
        buf.extend(n_bytes);

        if let Some(secret) = &self.secret {
            let mut blob = Zeroizing::new(Vec::new());
            for prime in [&secret.p, &secret.q] {
                let bytes = prime.to_bytes();
                let len = u16::try_from(bytes.len()).map_err(|_| InternalError::Serialization)?;
                blob.extend(len.to_le_bytes());
                blob.extend(bytes);
            }
            let blob_len = u16::try_from(blob.len()).map_err(|_| InternalError::Serialization)?;
            buf.extend(blob_len.to_le_bytes());
            buf.extend(blob.iter());
        }
        Ok(buf)
    }

    /// Decode a key previously encoded with [`PaillierKey::bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (n_bytes, rest) = split_len_prefixed(data)?;
        if n_bytes.is_empty() {
            return Err(InternalError::NilFields);
        }
        let modulus = BigNumber::from_slice(n_bytes);

        if rest.is_empty() {
            return Self::from_modulus(modulus);
        }

        let (blob, rest) = split_len_prefixed(rest)?;
        if !rest.is_empty() {
            return Err(InternalError::Serialization);
        }
        let (p_bytes, blob_rest) = split_len_prefixed(blob)?;
        let (q_bytes, blob_rest) = split_len_prefixed(blob_rest)?;
        if !blob_rest.is_empty() || p_bytes.is_empty() || q_bytes.is_empty() {
            return Err(InternalError::Serialization);
        }
        let p = BigNumber::from_slice(p_bytes);
        let q = BigNumber::from_slice(q_bytes);
        if &p * &q != modulus {
            return Err(InternalError::Serialization);
        }
        Self::from_primes(p, q)
    }

    /// The secret factors, for proofs of well-formedness of the modulus.
    pub(crate) fn secret_primes(&self) -> Result<(&BigNumber, &BigNumber)> {
        let secret = self.secret.as_ref().ok_or(InternalError::MissingSecretKey)?;
        Ok((&secret.p, &secret.q))
    }
}

impl DomainWriter for PaillierKey {
    fn domain(&self) -> &'static str {
        "Paillier Public Key"
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend(self.modulus.to_bytes());
        Ok(())
    }
}

fn split_len_prefixed(data: &[u8]) -> Result<(&[u8], &[u8])> {
    if data.len() < 2 {
        return Err(InternalError::Serialization);
    }
    let (len_bytes, tail) = data.split_at(2);
    let len = usize::from(u16::from_le_bytes([len_bytes[0], len_bytes[1]]));
    if tail.len() < len {
        return Err(InternalError::Serialization);
    }
    Ok(tail.split_at(len))
}

/// Generates keys and shepherds them in and out of the keystore.
///
/// Keys are stored under the hex encoding of their SKI; the keystore's
/// at-most-once import doubles as the uniqueness check on `N`.
pub struct PaillierKeyManager {
    keystore: Arc<dyn Keystore>,
    pool: Pool,
}

impl PaillierKeyManager {
    pub fn new(keystore: Arc<dyn Keystore>, pool: Pool) -> Self {
        Self { keystore, pool }
    }

    /// Generate a new keypair and persist it.
    pub fn generate_key<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<PaillierKey> {
        let key = PaillierKey::generate(&self.pool, rng)?;
        let encoded = key.bytes()?;
        let key_id = hex::encode(key.ski());
        self.keystore.import(&key_id, encoded)?;
        info!(%key_id, "generated Paillier key");
        Ok(key)
    }

    /// Fetch a key by its SKI.
    pub fn get_key(&self, ski: &[u8]) -> Result<PaillierKey> {
        let encoded = self.keystore.get(&hex::encode(ski))?;
        PaillierKey::from_bytes(&encoded)
    }

    /// Import an externally produced key, enforcing SKI uniqueness.
    pub fn import_key(&self, raw: &[u8]) -> Result<PaillierKey> {
        let key = PaillierKey::from_bytes(raw)?;
        let encoded = key.bytes()?;
        self.keystore.import(&hex::encode(key.ski()), encoded)?;
        Ok(key)
    }
}

// Safe prime generation functions for production and testing.
pub(crate) mod prime_gen {
    use super::*;
    #[cfg(test)]
    use rand::Rng;

    /// Sample a safe prime with length `PRIME_BITS` at random.
    pub(crate) fn get_random_safe_prime<R: RngCore + CryptoRng>(_rng: &mut R) -> BigNumber {
        BigNumber::safe_prime(PRIME_BITS)
    }

    #[cfg(test)]
    lazy_static::lazy_static! {
        /// List of `PRIME_BITS`-length safe primes, generated _insecurely_.
        static ref POOL_OF_PRIMES: Vec<BigNumber> = get_safe_primes_from_pool();
    }

    /// Load the set of pre-generated safe primes for testing efficiency.
    #[cfg(test)]
    fn get_safe_primes_from_pool() -> Vec<BigNumber> {
        crate::safe_primes_512::SAFE_PRIMES
            .iter()
            .map(|s| BigNumber::from_slice(hex::decode(s).unwrap()))
            .filter(|prime| prime.bit_length() == PRIME_BITS)
            .collect()
    }

    /// Sample a safe prime from a precompiled list. For testing purposes
    /// only!!
    #[cfg(test)]
    pub(crate) fn try_get_prime_from_pool_insecure<R: RngCore + CryptoRng>(
        rng: &mut R,
    ) -> Result<BigNumber> {
        if POOL_OF_PRIMES.is_empty() {
            return Err(InternalError::RetryFailed);
        }
        POOL_OF_PRIMES
            .get(rng.gen_range(0..POOL_OF_PRIMES.len()))
            .cloned()
            .ok_or(InternalError::RetryFailed)
    }

    /// Sample a pair of independent, non-matching safe primes from a
    /// precompiled list. For testing purposes only!!
    #[cfg(test)]
    pub(crate) fn get_prime_pair_from_pool_insecure<R: RngCore + CryptoRng>(
        rng: &mut R,
    ) -> Result<(BigNumber, BigNumber)> {
        let p = try_get_prime_from_pool_insecure(rng)?;
        loop {
            let q = try_get_prime_from_pool_insecure(rng)?;
            if p != q {
                break Ok((p, q));
            }
        }
    }
}
