// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! ElGamal encryption in the secp256k1 group.
//!
//! Presigning commits each party to its `k` share with an ElGamal ciphertext
//! `(L, M) = (lambda * G, m * G + lambda * X)`; the nonce `lambda` later
//! serves as the witness of the equality-of-discrete-logs proof.

use crate::{errors::Result, hash::DomainWriter, utils::CurvePoint};
use k256::elliptic_curve::Field;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// An ElGamal public key `X = x * G`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(pub CurvePoint);

/// An ElGamal ciphertext `(L, M)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    /// `L = lambda * G`
    pub l: CurvePoint,
    /// `M = m * G + lambda * X`
    pub m: CurvePoint,
}

/// Generate a fresh keypair.
pub fn keygen<R: RngCore + CryptoRng>(rng: &mut R) -> (k256::Scalar, PublicKey) {
    let x = k256::Scalar::random(rng);
    let public = PublicKey(CurvePoint(CurvePoint::GENERATOR.0 * x));
    (x, public)
}

impl PublicKey {
    /// Encrypt the scalar `m`, returning the ciphertext and the nonce.
    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        m: &k256::Scalar,
    ) -> (Ciphertext, k256::Scalar) {
        let lambda = k256::Scalar::random(rng);
        let l = CurvePoint(CurvePoint::GENERATOR.0 * lambda);
        let big_m = CurvePoint(CurvePoint::GENERATOR.0 * m + self.0 .0 * lambda);
        (Ciphertext { l, m: big_m }, lambda)
    }
}

impl DomainWriter for PublicKey {
    fn domain(&self) -> &'static str {
        "ElGamal Public Key"
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend(self.0.to_bytes());
        Ok(())
    }
}

impl DomainWriter for Ciphertext {
    fn domain(&self) -> &'static str {
        "ElGamal Ciphertext"
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend(self.l.to_bytes());
        out.extend(self.m.to_bytes());
        Ok(())
    }
}
