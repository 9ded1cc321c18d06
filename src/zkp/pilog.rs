// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Implements the ZKP from Figure 25 of <https://eprint.iacr.org/2021/060.pdf>
//!
//! The prover knows a bounded plaintext `x` such that `C` is a Paillier
//! encryption of `x` under its own key and `X = x * g` in the curve group.
//! Presign round 5 uses this proof to bind each `Gamma_j` to the ciphertext
//! `G_j` sent in round 1.

use super::Proof;
use crate::{
    arith::mod_exp_signed,
    errors::*,
    hash::{plusminus_bn_from_digest, Hash},
    paillier::{Ciphertext, PaillierKey},
    parameters::{ELL, EPSILON},
    pedersen, sample,
    utils::{bn_to_scalar, curve_order, CurvePoint},
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiLogProof {
    /// Commitment to the plaintext, `S = s^x t^mu` over the verifier's
    /// Pedersen parameters.
    S: BigNumber,
    /// Encryption of the masking value, `A = enc(alpha; r)`.
    A: Ciphertext,
    /// Curve commitment, `Y = alpha * g`.
    Y: CurvePoint,
    /// Commitment to the masking value, `D = s^alpha t^gamma`.
    D: BigNumber,
    z1: BigNumber,
    z2: BigNumber,
    z3: BigNumber,
}

impl Default for PiLogProof {
    fn default() -> Self {
        Self {
            S: BigNumber::zero(),
            A: Ciphertext::default(),
            Y: CurvePoint::IDENTITY,
            D: BigNumber::zero(),
            z1: BigNumber::zero(),
            z2: BigNumber::zero(),
            z3: BigNumber::zero(),
        }
    }
}

/// Common input is: aux `(N_hat, s, t)`, the prover's encryption key, `C`,
/// `X`, and the base point `g`.
#[derive(Clone)]
pub struct PiLogInput {
    aux: pedersen::Parameters,
    prover: PaillierKey,
    g: CurvePoint,
    C: Ciphertext,
    X: CurvePoint,
}

impl PiLogInput {
    pub fn new(
        aux: &pedersen::Parameters,
        prover: &PaillierKey,
        g: &CurvePoint,
        C: &Ciphertext,
        X: &CurvePoint,
    ) -> Self {
        Self {
            aux: aux.clone(),
            prover: prover.public_key(),
            g: *g,
            C: C.clone(),
            X: *X,
        }
    }
}

/// Prover secrets are `(x, rho)` with `C = enc(x; rho)`.
pub struct PiLogSecret {
    x: BigNumber,
    rho: BigNumber,
}

impl PiLogSecret {
    pub fn new(x: &BigNumber, rho: &BigNumber) -> Self {
        Self {
            x: x.clone(),
            rho: rho.clone(),
        }
    }
}

fn write_statement_and_commitment(
    transcript: &mut Hash,
    input: &PiLogInput,
    S: &BigNumber,
    A: &Ciphertext,
    Y: &CurvePoint,
    D: &BigNumber,
) -> Result<()> {
    transcript.write_domained(&input.aux)?;
    transcript.write_domained(&input.prover)?;
    transcript.write_domained(&input.C)?;
    transcript.write_domained(&input.X)?;
    transcript.write_domained(&input.g)?;

    transcript.write_int(S)?;
    transcript.write_domained(A)?;
    transcript.write_domained(Y)?;
    transcript.write_int(D)?;
    Ok(())
}

/// The verifier samples e in +- q (where q is the group order).
fn challenge(transcript: &Hash) -> BigNumber {
    plusminus_bn_from_digest(&mut transcript.digest(), &curve_order())
}

impl Proof for PiLogProof {
    type CommonInput = PiLogInput;
    type ProverSecret = PiLogSecret;

    fn prove<R: RngCore + CryptoRng>(
        input: &Self::CommonInput,
        secret: &Self::ProverSecret,
        transcript: &mut Hash,
        rng: &mut R,
    ) -> Result<Self> {
        let n0 = input.prover.modulus();

        // Masking value from +- 2^{ELL + EPSILON}, its nonce from Z*_{N0}
        let alpha = sample::interval_l_eps(rng);
        let r = sample::unit_mod_n(rng, n0)?;
        // Commitment randomness, scaled by the verifier's modulus N_hat
        let mu = sample::interval_l_scaled(rng, input.aux.modulus());
        let gamma = sample::interval_l_eps_scaled(rng, input.aux.modulus());

        let S = input.aux.commit(&secret.x, &mu)?;
        let A = input.prover.encode_with_nonce(&alpha, &r)?;
        let Y = CurvePoint(input.g.0 * bn_to_scalar(&alpha)?);
        let D = input.aux.commit(&alpha, &gamma)?;

        write_statement_and_commitment(transcript, input, &S, &A, &Y, &D)?;
        let e = challenge(transcript);

        let z1 = &alpha + &e * &secret.x;
        let z2 = r.modmul(&mod_exp_signed(&secret.rho, &e, n0)?, n0);
        let z3 = gamma + &e * mu;

        Ok(Self {
            S,
            A,
            Y,
            D,
            z1,
            z2,
            z3,
        })
    }

    fn verify(&self, input: &Self::CommonInput, transcript: &mut Hash) -> bool {
        if write_statement_and_commitment(transcript, input, &self.S, &self.A, &self.Y, &self.D)
            .is_err()
        {
            return false;
        }
        let e = challenge(transcript);

        // Range check: z1 in +- 2^{ELL + EPSILON + 1}
        let bound = BigNumber::one() << (ELL + EPSILON + 1);
        if self.z1 < -bound.clone() || self.z1 > bound {
            error!("log* proof response is out of range");
            return false;
        }

        // enc(z1; z2) = A * C^e (mod N0^2)
        let n0_squared = input.prover.modulus_squared();
        let lhs = match input.prover.encode_with_nonce(&self.z1, &self.z2) {
            Ok(ciphertext) => ciphertext,
            Err(_) => return false,
        };
        let c_to_e = match mod_exp_signed(&input.C.0, &e, n0_squared) {
            Ok(value) => value,
            Err(_) => return false,
        };
        if lhs.0 != self.A.0.modmul(&c_to_e, n0_squared) {
            error!("log* proof ciphertext equation failed");
            return false;
        }

        // z1 * g = Y + e * X
        let (z1_scalar, e_scalar) = match (bn_to_scalar(&self.z1), bn_to_scalar(&e)) {
            (Ok(z1_scalar), Ok(e_scalar)) => (z1_scalar, e_scalar),
            _ => return false,
        };
        if input.g.0 * z1_scalar != self.Y.0 + input.X.0 * e_scalar {
            error!("log* proof curve equation failed");
            return false;
        }

        // s^{z1} t^{z3} = D * S^e (mod N_hat)
        if !input.aux.verify(&self.z1, &self.z3, &e, &self.D, &self.S) {
            error!("log* proof commitment equation failed");
            return false;
        }

        true
    }
}
