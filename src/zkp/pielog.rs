// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Equality of discrete logarithms across two bases.
//!
//! Given an ElGamal ciphertext `E = (L, M) = (lambda * G, y * G + lambda * X)`
//! under public key `X` and a point `Y` over an arbitrary base, the prover
//! shows that the same `y` underlies both `M` and `Y = y * Base`. Presign
//! round 5 emits this proof to tie `Delta_i = k_i * Gamma` to the ElGamal
//! commitment to `k_i` made earlier in the protocol.

use super::Proof;
use crate::{
    elgamal,
    errors::*,
    hash::{scalar_from_digest, Hash},
    utils::CurvePoint,
};
use k256::elliptic_curve::Field;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiElogProof {
    /// `A = alpha * G`
    A: CurvePoint,
    /// `N = m * G + alpha * X`
    N: CurvePoint,
    /// `B = m * Base`
    B: CurvePoint,
    /// `z = alpha + e * lambda (mod q)`
    z: k256::Scalar,
    /// `u = m + e * y (mod q)`
    u: k256::Scalar,
}

impl Default for PiElogProof {
    fn default() -> Self {
        Self {
            A: CurvePoint::IDENTITY,
            N: CurvePoint::IDENTITY,
            B: CurvePoint::IDENTITY,
            z: k256::Scalar::ZERO,
            u: k256::Scalar::ZERO,
        }
    }
}

#[derive(Clone)]
pub struct PiElogInput {
    /// `E = (L, M)`, the ElGamal encryption of `y`.
    E: elgamal::Ciphertext,
    /// The ElGamal public key `X`.
    elgamal_public: elgamal::PublicKey,
    /// The second base.
    base: CurvePoint,
    /// `Y = y * base`.
    Y: CurvePoint,
}

impl PiElogInput {
    pub fn new(
        E: &elgamal::Ciphertext,
        elgamal_public: &elgamal::PublicKey,
        base: &CurvePoint,
        Y: &CurvePoint,
    ) -> Self {
        Self {
            E: *E,
            elgamal_public: *elgamal_public,
            base: *base,
            Y: *Y,
        }
    }
}

/// Prover secrets: the encrypted value `y` and the ElGamal nonce `lambda`.
pub struct PiElogSecret {
    y: k256::Scalar,
    lambda: k256::Scalar,
}

impl PiElogSecret {
    pub fn new(y: &k256::Scalar, lambda: &k256::Scalar) -> Self {
        Self {
            y: *y,
            lambda: *lambda,
        }
    }
}

fn write_statement_and_commitment(
    transcript: &mut Hash,
    input: &PiElogInput,
    A: &CurvePoint,
    N: &CurvePoint,
    B: &CurvePoint,
) -> Result<()> {
    transcript.write_domained(&input.E)?;
    transcript.write_domained(&input.elgamal_public)?;
    transcript.write_domained(&input.base)?;
    transcript.write_domained(&input.Y)?;

    transcript.write_domained(A)?;
    transcript.write_domained(N)?;
    transcript.write_domained(B)?;
    Ok(())
}

fn challenge(transcript: &Hash) -> Result<k256::Scalar> {
    scalar_from_digest(&mut transcript.digest())
}

impl Proof for PiElogProof {
    type CommonInput = PiElogInput;
    type ProverSecret = PiElogSecret;

    fn prove<R: RngCore + CryptoRng>(
        input: &Self::CommonInput,
        secret: &Self::ProverSecret,
        transcript: &mut Hash,
        rng: &mut R,
    ) -> Result<Self> {
        let alpha = k256::Scalar::random(&mut *rng);
        let m = k256::Scalar::random(rng);

        let A = CurvePoint(CurvePoint::GENERATOR.0 * alpha);
        let N = CurvePoint(CurvePoint::GENERATOR.0 * m + input.elgamal_public.0 .0 * alpha);
        let B = CurvePoint(input.base.0 * m);

        write_statement_and_commitment(transcript, input, &A, &N, &B)?;
        let e = challenge(transcript)?;

        let z = alpha + e * secret.lambda;
        let u = m + e * secret.y;

        Ok(Self { A, N, B, z, u })
    }

    fn verify(&self, input: &Self::CommonInput, transcript: &mut Hash) -> bool {
        if write_statement_and_commitment(transcript, input, &self.A, &self.N, &self.B).is_err() {
            return false;
        }
        let e = match challenge(transcript) {
            Ok(e) => e,
            Err(_) => return false,
        };

        // z * G = A + e * L
        if CurvePoint::GENERATOR.0 * self.z != self.A.0 + input.E.l.0 * e {
            error!("elog proof nonce equation failed");
            return false;
        }
        // u * G + z * X = N + e * M
        if CurvePoint::GENERATOR.0 * self.u + input.elgamal_public.0 .0 * self.z
            != self.N.0 + input.E.m.0 * e
        {
            error!("elog proof ciphertext equation failed");
            return false;
        }
        // u * Base = B + e * Y
        if input.base.0 * self.u != self.B.0 + input.Y.0 * e {
            error!("elog proof base equation failed");
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    fn random_elog_proof<R: RngCore + CryptoRng>(
        rng: &mut R,
    ) -> Result<(PiElogInput, PiElogProof, Hash)> {
        let (_, elgamal_public) = elgamal::keygen(rng);
        let y = k256::Scalar::random(&mut *rng);
        let (E, lambda) = elgamal_public.encrypt(rng, &y);

        let base = CurvePoint(CurvePoint::GENERATOR.0 * k256::Scalar::random(&mut *rng));
        let Y = CurvePoint(base.0 * y);

        let input = PiElogInput::new(&E, &elgamal_public, &base, &Y);

        let mut session = Hash::new();
        session.write_bytes(b"pielog test session")?;

        let proof =
            PiElogProof::prove(&input, &PiElogSecret::new(&y, &lambda), &mut session.fork(), rng)?;
        Ok((input, proof, session))
    }

    #[test]
    fn honest_proof_verifies() {
        let mut rng = init_testing();
        let (input, proof, session) = random_elog_proof(&mut rng).unwrap();
        assert!(proof.verify(&input, &mut session.fork()));
    }

    #[test]
    fn wrong_witness_fails() {
        let mut rng = init_testing();
        let (_, elgamal_public) = elgamal::keygen(&mut rng);
        let y = k256::Scalar::random(&mut rng);
        let (E, lambda) = elgamal_public.encrypt(&mut rng, &y);

        let base = CurvePoint::GENERATOR;
        // Y claims a different discrete log than the ciphertext carries.
        let y_other = k256::Scalar::random(&mut rng);
        let Y = CurvePoint(base.0 * y_other);

        let input = PiElogInput::new(&E, &elgamal_public, &base, &Y);
        let mut session = Hash::new();
        session.write_bytes(b"pielog test session").unwrap();

        let proof = PiElogProof::prove(
            &input,
            &PiElogSecret::new(&y, &lambda),
            &mut session.fork(),
            &mut rng,
        )
        .unwrap();
        assert!(!proof.verify(&input, &mut session.fork()));
    }

    #[test]
    fn mutated_proof_fails() {
        let mut rng = init_testing();
        let (input, proof, session) = random_elog_proof(&mut rng).unwrap();

        let mut bad = proof.clone();
        bad.z = bad.z + k256::Scalar::ONE;
        assert!(!bad.verify(&input, &mut session.fork()));

        let mut bad = proof.clone();
        bad.u = bad.u + k256::Scalar::ONE;
        assert!(!bad.verify(&input, &mut session.fork()));

        let mut bad = proof;
        bad.A = CurvePoint(bad.A.0 + CurvePoint::GENERATOR.0);
        assert!(!bad.verify(&input, &mut session.fork()));
    }

    #[test]
    fn mismatched_transcript_fails() {
        let mut rng = init_testing();
        let (input, proof, _) = random_elog_proof(&mut rng).unwrap();

        let mut other = Hash::new();
        other.write_bytes(b"a different session").unwrap();
        assert!(!proof.verify(&input, &mut other));
    }
}
