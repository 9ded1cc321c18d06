// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Implements the ZKP from Figure 28 of <https://eprint.iacr.org/2021/060.pdf>
//!
//! Proves that neither factor of `N0` is smaller than `2^ELL`: the responses
//! carry the factors only in masked form, and the range bound on `z1`, `z2`
//! rules out a lopsided factorization with a tiny prime.

use super::Proof;
use crate::{
    arith::{mod_exp_signed, sqrt},
    errors::*,
    hash::{plusminus_bn_from_digest, Hash},
    parameters::{ELL, EPSILON},
    pedersen, sample,
    utils::curve_order,
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiFacProof {
    /// Commitment to the factor `p`.
    P: BigNumber,
    /// Commitment to the factor `q`.
    Q: BigNumber,
    /// Commitment to the mask `alpha`.
    A: BigNumber,
    /// Commitment to the mask `beta`.
    B: BigNumber,
    /// `T = Q^alpha t^r`.
    T: BigNumber,
    /// Commitment randomness for the combined statement.
    sigma: BigNumber,
    z1: BigNumber,
    z2: BigNumber,
    w1: BigNumber,
    w2: BigNumber,
    v: BigNumber,
}

#[derive(Clone)]
pub struct PiFacInput {
    aux: pedersen::Parameters,
    n0: BigNumber,
}

impl PiFacInput {
    pub fn new(aux: &pedersen::Parameters, n0: &BigNumber) -> Self {
        Self {
            aux: aux.clone(),
            n0: n0.clone(),
        }
    }
}

pub struct PiFacSecret {
    p: BigNumber,
    q: BigNumber,
}

impl PiFacSecret {
    pub fn new(p: &BigNumber, q: &BigNumber) -> Self {
        Self {
            p: p.clone(),
            q: q.clone(),
        }
    }
}

fn write_statement_and_commitment(
    transcript: &mut Hash,
    input: &PiFacInput,
    P: &BigNumber,
    Q: &BigNumber,
    A: &BigNumber,
    B: &BigNumber,
    T: &BigNumber,
    sigma: &BigNumber,
) -> Result<()> {
    transcript.write_domained(&input.aux)?;
    transcript.write_int(&input.n0)?;

    for value in [P, Q, A, B, T, sigma] {
        transcript.write_int(value)?;
    }
    Ok(())
}

/// The verifier samples e in +- q (where q is the group order).
fn challenge(transcript: &Hash) -> BigNumber {
    plusminus_bn_from_digest(&mut transcript.digest(), &curve_order())
}

impl Proof for PiFacProof {
    type CommonInput = PiFacInput;
    type ProverSecret = PiFacSecret;

    fn prove<R: RngCore + CryptoRng>(
        input: &Self::CommonInput,
        secret: &Self::ProverSecret,
        transcript: &mut Hash,
        rng: &mut R,
    ) -> Result<Self> {
        let n_hat = input.aux.modulus();
        // Small name for the scaling factor in our ranges
        let sqrt_n0 = sqrt(&input.n0);

        let alpha = sample::interval_l_eps_scaled(rng, &sqrt_n0);
        let beta = sample::interval_l_eps_scaled(rng, &sqrt_n0);
        let mu = sample::interval_l_scaled(rng, n_hat);
        let nu = sample::interval_l_scaled(rng, n_hat);
        let sigma = sample::interval_l_scaled(rng, &(&input.n0 * n_hat));
        let r = sample::interval_l_eps_scaled(rng, &(&input.n0 * n_hat));
        let x = sample::interval_l_eps_scaled(rng, n_hat);
        let y = sample::interval_l_eps_scaled(rng, n_hat);

        let P = input.aux.commit(&secret.p, &mu)?;
        let Q = input.aux.commit(&secret.q, &nu)?;
        let A = input.aux.commit(&alpha, &x)?;
        let B = input.aux.commit(&beta, &y)?;
        let T = mod_exp_signed(&Q, &alpha, n_hat)?
            .modmul(&mod_exp_signed(input.aux.t(), &r, n_hat)?, n_hat);

        write_statement_and_commitment(transcript, input, &P, &Q, &A, &B, &T, &sigma)?;
        let e = challenge(transcript);

        let z1 = &alpha + &e * &secret.p;
        let z2 = &beta + &e * &secret.q;
        let w1 = &x + &e * &mu;
        let w2 = &y + &e * &nu;
        // sigma_hat = sigma - nu * p
        let sigma_hat = &sigma - &nu * &secret.p;
        let v = &r + &e * &sigma_hat;

        Ok(Self {
            P,
            Q,
            A,
            B,
            T,
            sigma,
            z1,
            z2,
            w1,
            w2,
            v,
        })
    }

    fn verify(&self, input: &Self::CommonInput, transcript: &mut Hash) -> bool {
        if write_statement_and_commitment(
            transcript, input, &self.P, &self.Q, &self.A, &self.B, &self.T, &self.sigma,
        )
        .is_err()
        {
            return false;
        }
        let e = challenge(transcript);
        let n_hat = input.aux.modulus();

        // s^{z1} t^{w1} = A * P^e
        if !input.aux.verify(&self.z1, &self.w1, &e, &self.A, &self.P) {
            error!("no-small-factor proof first equation failed");
            return false;
        }
        // s^{z2} t^{w2} = B * Q^e
        if !input.aux.verify(&self.z2, &self.w2, &e, &self.B, &self.Q) {
            error!("no-small-factor proof second equation failed");
            return false;
        }

        // Q^{z1} t^v = T * R^e with R = s^{N0} t^sigma
        let R = match input.aux.commit(&input.n0, &self.sigma) {
            Ok(R) => R,
            Err(_) => return false,
        };
        let lhs = match (
            mod_exp_signed(&self.Q, &self.z1, n_hat),
            mod_exp_signed(input.aux.t(), &self.v, n_hat),
        ) {
            (Ok(a), Ok(b)) => a.modmul(&b, n_hat),
            _ => return false,
        };
        let rhs = match mod_exp_signed(&R, &e, n_hat) {
            Ok(re) => re.modmul(&self.T, n_hat),
            Err(_) => return false,
        };
        if lhs != rhs {
            error!("no-small-factor proof combined equation failed");
            return false;
        }

        // 2^{ELL + EPSILON} * sqrt(N0)
        let z_bound = &sqrt(&input.n0) * &(BigNumber::one() << (ELL + EPSILON));
        if self.z1 < -z_bound.clone() || self.z1 > z_bound {
            error!("no-small-factor proof z1 out of range");
            return false;
        }
        if self.z2 < -z_bound.clone() || self.z2 > z_bound {
            error!("no-small-factor proof z2 out of range");
            return false;
        }

        true
    }
}
