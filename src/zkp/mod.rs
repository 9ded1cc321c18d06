// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Non-interactive zero-knowledge proofs.
//!
//! Every proof is made non-interactive with the Fiat-Shamir transform over
//! the crate's transcript hash: the prover and verifier each write the public
//! input and the proof commitment into the transcript they were handed and
//! draw the challenge from its digest stream. A proof only verifies against a
//! transcript in the exact state the prover used, which is how the protocol
//! binds proofs to a session and a sender.

pub mod pielog;
pub mod pifac;
pub mod pilog;
pub mod pimod;

use crate::{errors::Result, hash::Hash};
use rand::{CryptoRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};

pub trait Proof: Sized + Serialize + DeserializeOwned {
    type CommonInput;
    type ProverSecret;

    /// Produce a proof for `input` under `transcript`.
    fn prove<R: RngCore + CryptoRng>(
        input: &Self::CommonInput,
        secret: &Self::ProverSecret,
        transcript: &mut Hash,
        rng: &mut R,
    ) -> Result<Self>;

    /// Check the proof against `input` under `transcript`. Total: ill-formed
    /// inputs return `false` rather than panicking.
    fn verify(&self, input: &Self::CommonInput, transcript: &mut Hash) -> bool;
}
