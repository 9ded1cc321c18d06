// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The cryptographic core of CMP threshold-ECDSA presigning.
//!
//! This crate implements the primitives the presigning protocol is built
//! from, and the representative gather-verify-aggregate rounds that use them:
//!
//! - Pedersen commitment parameters over an RSA modulus ([`pedersen`]),
//! - Paillier encryption with safe-prime moduli ([`paillier`]),
//! - a domain-separated, restartable BLAKE3 transcript ([`hash`]),
//! - the zero-knowledge proofs tying them together ([`zkp`]),
//! - presign rounds 5 and 6 ([`presign`], [`round`]).
//!
//! Key persistence, transport, and the surrounding keygen/sign protocols are
//! external collaborators, reached through the narrow interfaces in
//! [`keystore`] and [`pool`].

#![allow(non_snake_case)]

#[macro_use]
pub mod errors;

pub(crate) mod arith;
pub mod elgamal;
pub mod hash;
pub mod keystore;
pub mod paillier;
pub(crate) mod parameters;
pub mod pedersen;
pub mod pool;
pub mod presign;
pub mod round;
pub(crate) mod sample;
mod utils;
pub mod zkp;

#[cfg(test)]
pub(crate) mod safe_primes_512;

pub use errors::{InternalError, Result};
pub use utils::CurvePoint;

use hash::DomainWriter;
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};

/// The unique identifier of a protocol instance.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(u128);

impl Identifier {
    /// Produces a random [`Identifier`].
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(rng.gen())
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// The unique identifier of a protocol participant.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantIdentifier(Identifier);

impl ParticipantIdentifier {
    /// Generates a random [`ParticipantIdentifier`].
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        ParticipantIdentifier(Identifier::random(rng))
    }
}

impl std::fmt::Display for ParticipantIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl DomainWriter for ParticipantIdentifier {
    fn domain(&self) -> &'static str {
        "Participant ID"
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend(self.0 .0.to_be_bytes());
        Ok(())
    }
}
