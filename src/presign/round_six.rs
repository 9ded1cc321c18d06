// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Presign round 6.
//!
//! Collects the peers' `Delta_j = k_j * Gamma` shares. Each broadcast carries
//! an elog proof tying `Delta_j` to the ElGamal commitment to `k_j`, checked
//! against the sender-specific transcript at store time; this round has no
//! point-to-point messages.

use crate::{
    elgamal,
    errors::{InternalError, Result},
    hash::Hash,
    round::{Content, FinalizeError, Message, Round, RoundNumber},
    utils::CurvePoint,
    zkp::{
        pielog::{PiElogInput, PiElogProof},
        Proof,
    },
    ParticipantIdentifier,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error};

/// The round-6 broadcast payload: `Delta_i` and its elog proof.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundSixBroadcast {
    pub big_delta_share: CurvePoint,
    pub proof: PiElogProof,
}

/// Round 6 of presigning. Produced by finalizing [`super::RoundFive`].
#[derive(Debug)]
pub struct RoundSix {
    pub(crate) self_id: ParticipantIdentifier,
    pub(crate) participants: Vec<ParticipantIdentifier>,
    pub(crate) transcript: Hash,
    pub(crate) elgamal: HashMap<ParticipantIdentifier, elgamal::PublicKey>,
    pub(crate) elgamal_k: HashMap<ParticipantIdentifier, elgamal::Ciphertext>,
    /// `Gamma`, aggregated in round 5.
    pub(crate) gamma: CurvePoint,
    /// `Delta_j` per party, seeded with this party's own share.
    pub(crate) big_delta_shares: HashMap<ParticipantIdentifier, CurvePoint>,
    pub(crate) message_broadcasted: HashSet<ParticipantIdentifier>,
}

/// The hand-off out of round 6, consumed by the remaining presign rounds.
#[derive(Debug, Clone)]
pub struct RoundSixOutput {
    /// The aggregated `Gamma`.
    pub gamma: CurvePoint,
    /// Every party's `Delta_j`.
    pub big_delta_shares: HashMap<ParticipantIdentifier, CurvePoint>,
    /// `Delta = sum_j Delta_j`.
    pub big_delta: CurvePoint,
}

impl RoundSix {
    /// The aggregated `Gamma` this round was built around.
    pub fn gamma(&self) -> &CurvePoint {
        &self.gamma
    }

    fn is_peer(&self, id: ParticipantIdentifier) -> bool {
        id != self.self_id && self.participants.contains(&id)
    }
}

impl Round for RoundSix {
    type Next = RoundSixOutput;

    fn round_number() -> RoundNumber {
        6
    }

    fn message_content(&self) -> Option<Content> {
        None
    }

    fn broadcast_content(&self) -> Option<Content> {
        Some(Content::SixBroadcast(RoundSixBroadcast::default()))
    }

    /// Save `Delta_j` once its elog proof checks out.
    fn store_broadcast_message(&mut self, msg: Message) -> Result<()> {
        let body = match msg.content {
            Content::SixBroadcast(body) => body,
            _ => return Err(InternalError::InvalidContent),
        };
        if !self.is_peer(msg.from) {
            return Err(InternalError::InvalidContent);
        }
        if body.big_delta_share.is_identity() {
            return Err(InternalError::NilFields);
        }
        if self.message_broadcasted.contains(&msg.from) {
            return Err(InternalError::DuplicateMessage);
        }

        let elgamal_k = self
            .elgamal_k
            .get(&msg.from)
            .ok_or(InternalError::ProofFailed)?;
        let elgamal_public = self
            .elgamal
            .get(&msg.from)
            .ok_or(InternalError::ProofFailed)?;
        let input = PiElogInput::new(elgamal_k, elgamal_public, &self.gamma, &body.big_delta_share);
        let mut transcript = self.transcript.hash_for_id(msg.from);
        if !body.proof.verify(&input, &mut transcript) {
            error!(from = ?msg.from, "failed to validate elog proof for Delta share");
            return Err(InternalError::ProofFailed);
        }

        let _ = self.big_delta_shares.insert(msg.from, body.big_delta_share);
        let _ = self.message_broadcasted.insert(msg.from);
        debug!(from = ?msg.from, "stored round 6 broadcast");
        Ok(())
    }

    fn verify_message(&self, _msg: &Message) -> Result<()> {
        // Broadcast-only round.
        Err(InternalError::InvalidContent)
    }

    fn store_message(&mut self, _msg: Message) -> Result<()> {
        // Broadcast-only round.
        Ok(())
    }

    /// Aggregate `Delta = sum_j Delta_j` and hand off.
    fn finalize<R: RngCore + CryptoRng>(
        self,
        _rng: &mut R,
        _out: &mut Vec<Message>,
    ) -> std::result::Result<Self::Next, FinalizeError<Self>> {
        if self.message_broadcasted.len() != self.participants.len() - 1 {
            return Err(FinalizeError {
                round: self,
                error: InternalError::NotEnoughMessages,
            });
        }

        let mut big_delta = CurvePoint::IDENTITY;
        for share in self.big_delta_shares.values() {
            big_delta = CurvePoint(big_delta.0 + share.0);
        }
        debug!(self_id = ?self.self_id, "finalized presign round 6");

        Ok(RoundSixOutput {
            gamma: self.gamma,
            big_delta_shares: self.big_delta_shares,
            big_delta,
        })
    }
}
