// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Presign round 5.
//!
//! Each party has broadcast `Gamma_i = gamma_i * G` and sent every peer a
//! log* proof binding `Gamma_i` to the Paillier ciphertext `G_i` from round
//! 1. This round stores the incoming `Gamma_j`, checks each proof against the
//! sender-specific transcript, and finalizes by aggregating
//! `Gamma = sum_j Gamma_j`, computing `Delta_i = k_i * Gamma`, and
//! broadcasting `Delta_i` together with an elog proof for round 6.

use crate::{
    elgamal,
    errors::{InternalError, Result},
    hash::Hash,
    paillier::{Ciphertext, PaillierKey},
    pedersen,
    round::{Content, FinalizeError, Message, Round, RoundNumber},
    utils::CurvePoint,
    zkp::{
        pielog::{PiElogInput, PiElogProof, PiElogSecret},
        pilog::{PiLogInput, PiLogProof},
        Proof,
    },
    ParticipantIdentifier,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error};

use super::round_six::{RoundSix, RoundSixBroadcast};

/// The round-5 broadcast payload: the sender's `Gamma_i`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundFiveBroadcast {
    pub big_gamma_share: CurvePoint,
}

/// The round-5 point-to-point payload: a log* proof addressed to the
/// receiver's Pedersen parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundFiveMessage {
    pub proof_log: PiLogProof,
}

/// Everything rounds 1-4 leave behind that round 5 needs.
pub struct RoundFiveInput {
    pub self_id: ParticipantIdentifier,
    pub participants: Vec<ParticipantIdentifier>,
    /// The session transcript, identical at every party.
    pub transcript: Hash,
    /// Every party's Paillier public key.
    pub paillier: HashMap<ParticipantIdentifier, PaillierKey>,
    /// Every party's Pedersen parameters.
    pub pedersen: HashMap<ParticipantIdentifier, pedersen::Parameters>,
    /// Every party's round-1 ciphertext `G_j`.
    pub g_ciphertexts: HashMap<ParticipantIdentifier, Ciphertext>,
    /// Every party's ElGamal public key.
    pub elgamal: HashMap<ParticipantIdentifier, elgamal::PublicKey>,
    /// Every party's ElGamal commitment to its `k` share.
    pub elgamal_k: HashMap<ParticipantIdentifier, elgamal::Ciphertext>,
    /// This party's `k_i`.
    pub k_share: k256::Scalar,
    /// The nonce of this party's `elgamal_k` ciphertext.
    pub elgamal_k_nonce: k256::Scalar,
    /// This party's own `Gamma_i`.
    pub big_gamma_share: CurvePoint,
}

/// Round 5 of presigning.
#[derive(Debug)]
pub struct RoundFive {
    pub(crate) self_id: ParticipantIdentifier,
    pub(crate) participants: Vec<ParticipantIdentifier>,
    pub(crate) transcript: Hash,
    pub(crate) paillier: HashMap<ParticipantIdentifier, PaillierKey>,
    pub(crate) pedersen: HashMap<ParticipantIdentifier, pedersen::Parameters>,
    pub(crate) g_ciphertexts: HashMap<ParticipantIdentifier, Ciphertext>,
    pub(crate) elgamal: HashMap<ParticipantIdentifier, elgamal::PublicKey>,
    pub(crate) elgamal_k: HashMap<ParticipantIdentifier, elgamal::Ciphertext>,
    pub(crate) k_share: k256::Scalar,
    pub(crate) elgamal_k_nonce: k256::Scalar,
    /// `Gamma_j` per party, seeded with this party's own share.
    pub(crate) big_gamma_shares: HashMap<ParticipantIdentifier, CurvePoint>,
    /// Peers whose broadcast has been accepted.
    pub(crate) message_broadcasted: HashSet<ParticipantIdentifier>,
    /// Peers whose log* proof has been verified.
    pub(crate) proof_verified: HashSet<ParticipantIdentifier>,
}

impl RoundFive {
    /// Build the round from the carried-over protocol state.
    pub fn new(input: RoundFiveInput) -> Result<Self> {
        if !input.participants.contains(&input.self_id) {
            return Err(InternalError::InternalInvariantFailed);
        }
        if input.big_gamma_share.is_identity() {
            return Err(InternalError::NilFields);
        }
        // Every participant must come with its full public context.
        for id in &input.participants {
            if !input.paillier.contains_key(id)
                || !input.pedersen.contains_key(id)
                || !input.g_ciphertexts.contains_key(id)
                || !input.elgamal.contains_key(id)
                || !input.elgamal_k.contains_key(id)
            {
                return Err(InternalError::StorageItemNotFound);
            }
        }

        let mut big_gamma_shares = HashMap::new();
        let _ = big_gamma_shares.insert(input.self_id, input.big_gamma_share);

        Ok(Self {
            self_id: input.self_id,
            participants: input.participants,
            transcript: input.transcript,
            paillier: input.paillier,
            pedersen: input.pedersen,
            g_ciphertexts: input.g_ciphertexts,
            elgamal: input.elgamal,
            elgamal_k: input.elgamal_k,
            k_share: input.k_share,
            elgamal_k_nonce: input.elgamal_k_nonce,
            big_gamma_shares,
            message_broadcasted: HashSet::new(),
            proof_verified: HashSet::new(),
        })
    }

    fn is_peer(&self, id: ParticipantIdentifier) -> bool {
        id != self.self_id && self.participants.contains(&id)
    }

    fn peer_count(&self) -> usize {
        self.participants.len() - 1
    }
}

impl Round for RoundFive {
    type Next = RoundSix;

    fn round_number() -> RoundNumber {
        5
    }

    fn message_content(&self) -> Option<Content> {
        Some(Content::Five(RoundFiveMessage::default()))
    }

    fn broadcast_content(&self) -> Option<Content> {
        Some(Content::FiveBroadcast(RoundFiveBroadcast::default()))
    }

    /// Save `Gamma_j`.
    fn store_broadcast_message(&mut self, msg: Message) -> Result<()> {
        let body = match msg.content {
            Content::FiveBroadcast(body) => body,
            _ => return Err(InternalError::InvalidContent),
        };
        if !self.is_peer(msg.from) {
            return Err(InternalError::InvalidContent);
        }
        if body.big_gamma_share.is_identity() {
            return Err(InternalError::NilFields);
        }
        if self.message_broadcasted.contains(&msg.from) {
            return Err(InternalError::DuplicateMessage);
        }

        let _ = self.big_gamma_shares.insert(msg.from, body.big_gamma_share);
        let _ = self.message_broadcasted.insert(msg.from);
        debug!(from = ?msg.from, "stored round 5 broadcast");
        Ok(())
    }

    /// Check the sender's log* proof for its `Gamma_j` against the
    /// sender-specific transcript.
    fn verify_message(&self, msg: &Message) -> Result<()> {
        let body = match &msg.content {
            Content::Five(body) => body,
            _ => return Err(InternalError::InvalidContent),
        };
        if !self.is_peer(msg.from) {
            return Err(InternalError::InvalidContent);
        }

        // The statement needs the sender's broadcast; without it the proof
        // cannot be checked, let alone accepted.
        let big_gamma_share = self
            .big_gamma_shares
            .get(&msg.from)
            .ok_or(InternalError::ProofFailed)?;
        let g_ciphertext = self
            .g_ciphertexts
            .get(&msg.from)
            .ok_or(InternalError::ProofFailed)?;
        let prover = self
            .paillier
            .get(&msg.from)
            .ok_or(InternalError::ProofFailed)?;
        let aux = self
            .pedersen
            .get(&self.self_id)
            .ok_or(InternalError::ProofFailed)?;

        let input = PiLogInput::new(
            aux,
            prover,
            &CurvePoint::GENERATOR,
            g_ciphertext,
            big_gamma_share,
        );
        let mut transcript = self.transcript.hash_for_id(msg.from);
        if !body.proof_log.verify(&input, &mut transcript) {
            error!(from = ?msg.from, "failed to validate log* proof for Gamma share");
            return Err(InternalError::ProofFailed);
        }
        Ok(())
    }

    /// Record that the sender's proof checked out.
    fn store_message(&mut self, msg: Message) -> Result<()> {
        match msg.content {
            Content::Five(_) => {}
            _ => return Err(InternalError::InvalidContent),
        }
        if !self.is_peer(msg.from) {
            return Err(InternalError::InvalidContent);
        }
        let _ = self.proof_verified.insert(msg.from);
        Ok(())
    }

    /// Compute `Gamma = sum_j Gamma_j` and `Delta_i = k_i * Gamma`, and
    /// broadcast `Delta_i` with its elog proof.
    fn finalize<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
        out: &mut Vec<Message>,
    ) -> std::result::Result<Self::Next, FinalizeError<Self>> {
        // Every peer must have both broadcast and proven its share.
        if self.message_broadcasted.len() != self.peer_count()
            || self.proof_verified.len() != self.peer_count()
        {
            return Err(FinalizeError {
                round: self,
                error: InternalError::NotEnoughMessages,
            });
        }

        // Gamma = sum_j Gamma_j
        let mut gamma = CurvePoint::IDENTITY;
        for share in self.big_gamma_shares.values() {
            gamma = CurvePoint(gamma.0 + share.0);
        }

        // Delta_i = k_i * Gamma
        let big_delta_share = CurvePoint(gamma.0 * self.k_share);

        let proof = {
            let input = PiElogInput::new(
                &self.elgamal_k[&self.self_id],
                &self.elgamal[&self.self_id],
                &gamma,
                &big_delta_share,
            );
            let secret = PiElogSecret::new(&self.k_share, &self.elgamal_k_nonce);
            let mut transcript = self.transcript.hash_for_id(self.self_id);
            match PiElogProof::prove(&input, &secret, &mut transcript, rng) {
                Ok(proof) => proof,
                Err(error) => return Err(FinalizeError { round: self, error }),
            }
        };

        out.push(Message::new_broadcast(
            self.self_id,
            Content::SixBroadcast(RoundSixBroadcast {
                big_delta_share,
                proof,
            }),
        ));
        debug!(self_id = ?self.self_id, "finalized presign round 5");

        let mut big_delta_shares = HashMap::new();
        let _ = big_delta_shares.insert(self.self_id, big_delta_share);

        Ok(RoundSix {
            self_id: self.self_id,
            participants: self.participants,
            transcript: self.transcript,
            elgamal: self.elgamal,
            elgamal_k: self.elgamal_k,
            gamma,
            big_delta_shares,
            message_broadcasted: HashSet::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presign::testing::{broadcast_from, log_proof_message, presign_five_quorum};
    use crate::utils::testing::init_testing;

    #[test]
    fn templates_carry_the_round_number() {
        let mut rng = init_testing();
        let mut quorum = presign_five_quorum(&mut rng);
        let party = quorum.remove(0);

        assert_eq!(RoundFive::round_number(), 5);
        assert_eq!(party.round.message_content().unwrap().round_number(), 5);
        assert_eq!(party.round.broadcast_content().unwrap().round_number(), 5);
    }

    #[test]
    fn happy_path_finalizes_into_round_six() {
        let mut rng = init_testing();
        let mut quorum = presign_five_quorum(&mut rng);
        let party_c = quorum.pop().unwrap();
        let party_b = quorum.pop().unwrap();
        let mut party_a = quorum.pop().unwrap();

        // Out-of-order delivery: C's broadcast, then B's, then the proofs.
        party_a
            .round
            .store_broadcast_message(broadcast_from(&party_c))
            .unwrap();
        party_a
            .round
            .store_broadcast_message(broadcast_from(&party_b))
            .unwrap();
        for sender in [&party_b, &party_c] {
            let msg = log_proof_message(&mut rng, sender, &party_a);
            party_a.round.verify_message(&msg).unwrap();
            party_a.round.store_message(msg).unwrap();
        }

        let expected_gamma = CurvePoint(
            party_a.round.big_gamma_shares[&party_a.id].0
                + party_b.round.big_gamma_shares[&party_b.id].0
                + party_c.round.big_gamma_shares[&party_c.id].0,
        );
        let k_share = party_a.round.k_share;
        let elgamal_k = party_a.round.elgamal_k[&party_a.id];
        let elgamal_public = party_a.round.elgamal[&party_a.id];
        let session_transcript = party_a.round.transcript.fork();

        let mut out = Vec::new();
        let next = party_a.round.finalize(&mut rng, &mut out).unwrap();

        // Gamma is the sum over all three shares, in any order.
        assert_eq!(next.gamma, expected_gamma);
        let expected_delta = CurvePoint(expected_gamma.0 * k_share);
        assert_eq!(next.big_delta_shares[&party_a.id], expected_delta);

        // The fresh round starts with an empty broadcast ledger.
        assert!(next.message_broadcasted.is_empty());

        // One broadcast for round 6, carrying a valid elog proof.
        assert_eq!(out.len(), 1);
        let msg = &out[0];
        assert!(msg.is_broadcast());
        assert_eq!(msg.round_number(), 6);
        match &msg.content {
            Content::SixBroadcast(body) => {
                assert_eq!(body.big_delta_share, expected_delta);
                let input = PiElogInput::new(
                    &elgamal_k,
                    &elgamal_public,
                    &expected_gamma,
                    &body.big_delta_share,
                );
                let mut transcript = session_transcript.hash_for_id(party_a.id);
                assert!(body.proof.verify(&input, &mut transcript));
            }
            _ => panic!("expected a round 6 broadcast"),
        }
    }

    #[test]
    fn missing_broadcast_keeps_round_open() {
        let mut rng = init_testing();
        let mut quorum = presign_five_quorum(&mut rng);
        let _party_c = quorum.pop().unwrap();
        let party_b = quorum.pop().unwrap();
        let mut party_a = quorum.pop().unwrap();

        party_a
            .round
            .store_broadcast_message(broadcast_from(&party_b))
            .unwrap();
        let msg = log_proof_message(&mut rng, &party_b, &party_a);
        party_a.round.verify_message(&msg).unwrap();
        party_a.round.store_message(msg).unwrap();

        let mut out = Vec::new();
        let err = party_a.round.finalize(&mut rng, &mut out).unwrap_err();
        assert_eq!(err.error, InternalError::NotEnoughMessages);
        assert!(out.is_empty());

        // The round comes back untouched and can still make progress.
        let round = err.round;
        assert_eq!(round.message_broadcasted.len(), 1);
        assert_eq!(round.big_gamma_shares.len(), 2);
    }

    #[test]
    fn duplicate_broadcast_is_rejected() {
        let mut rng = init_testing();
        let mut quorum = presign_five_quorum(&mut rng);
        let _party_c = quorum.pop().unwrap();
        let party_b = quorum.pop().unwrap();
        let mut party_a = quorum.pop().unwrap();

        party_a
            .round
            .store_broadcast_message(broadcast_from(&party_b))
            .unwrap();
        let stored = party_a.round.big_gamma_shares[&party_b.id];

        // A second, different broadcast from B must not displace the first.
        let second = Message::new_broadcast(
            party_b.id,
            Content::FiveBroadcast(RoundFiveBroadcast {
                big_gamma_share: CurvePoint(stored.0 + CurvePoint::GENERATOR.0),
            }),
        );
        assert_eq!(
            party_a.round.store_broadcast_message(second),
            Err(InternalError::DuplicateMessage)
        );
        assert_eq!(party_a.round.big_gamma_shares[&party_b.id], stored);
    }

    #[test]
    fn identity_gamma_share_is_rejected() {
        let mut rng = init_testing();
        let mut quorum = presign_five_quorum(&mut rng);
        let _party_c = quorum.pop().unwrap();
        let party_b = quorum.pop().unwrap();
        let mut party_a = quorum.pop().unwrap();

        let msg = Message::new_broadcast(
            party_b.id,
            Content::FiveBroadcast(RoundFiveBroadcast {
                big_gamma_share: CurvePoint::IDENTITY,
            }),
        );
        assert_eq!(
            party_a.round.store_broadcast_message(msg),
            Err(InternalError::NilFields)
        );
        assert!(party_a.round.message_broadcasted.is_empty());
    }

    #[test]
    fn bad_proof_keeps_round_open() {
        let mut rng = init_testing();
        let mut quorum = presign_five_quorum(&mut rng);
        let mut party_c = quorum.pop().unwrap();
        let party_b = quorum.pop().unwrap();
        let mut party_a = quorum.pop().unwrap();

        party_a
            .round
            .store_broadcast_message(broadcast_from(&party_b))
            .unwrap();
        party_a
            .round
            .store_broadcast_message(broadcast_from(&party_c))
            .unwrap();

        // B behaves.
        let msg = log_proof_message(&mut rng, &party_b, &party_a);
        party_a.round.verify_message(&msg).unwrap();
        party_a.round.store_message(msg).unwrap();

        // C proves a statement it has no witness for.
        party_c.gamma = &party_c.gamma + 1;
        let bad_msg = log_proof_message(&mut rng, &party_c, &party_a);
        assert_eq!(
            party_a.round.verify_message(&bad_msg),
            Err(InternalError::ProofFailed)
        );

        // Not enough *valid* messages, so the round stays open.
        let mut out = Vec::new();
        let err = party_a.round.finalize(&mut rng, &mut out).unwrap_err();
        assert_eq!(err.error, InternalError::NotEnoughMessages);
    }

    #[test]
    fn mismatched_content_is_rejected() {
        let mut rng = init_testing();
        let mut quorum = presign_five_quorum(&mut rng);
        let party_b = quorum.remove(1);
        let mut party_a = quorum.remove(0);

        // A round 6 payload cannot be stored as a round 5 broadcast.
        let msg = Message::new_broadcast(
            party_b.id,
            Content::SixBroadcast(RoundSixBroadcast::default()),
        );
        assert_eq!(
            party_a.round.store_broadcast_message(msg),
            Err(InternalError::InvalidContent)
        );

        // Nor does the dispatcher accept it for round 5 in the first place.
        let msg = Message::new_broadcast(
            party_b.id,
            Content::SixBroadcast(RoundSixBroadcast::default()),
        );
        assert!(!crate::round::accepts(
            RoundFive::round_number(),
            &party_a.round.participants,
            &msg
        ));
    }

    #[test]
    fn proof_before_broadcast_cannot_verify() {
        let mut rng = init_testing();
        let mut quorum = presign_five_quorum(&mut rng);
        let _party_c = quorum.pop().unwrap();
        let party_b = quorum.pop().unwrap();
        let party_a = quorum.pop().unwrap();

        // B's proof arrives before its broadcast; there is no Gamma_B yet.
        let msg = log_proof_message(&mut rng, &party_b, &party_a);
        assert_eq!(
            party_a.round.verify_message(&msg),
            Err(InternalError::ProofFailed)
        );
    }
}
