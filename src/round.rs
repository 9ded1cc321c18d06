// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The per-round message-collection machinery.
//!
//! A round buffers broadcast and point-to-point messages from its peers,
//! verifies them, and finalizes into the next round once every peer has
//! delivered. The transport hands messages to an upper dispatcher which drops
//! anything from an unknown party or carrying the wrong round number; the
//! round itself only sees messages addressed to its number and rejects
//! malformed, zero-valued, or duplicated payloads.

use crate::{
    errors::{InternalError, Result},
    presign::{RoundFiveBroadcast, RoundFiveMessage, RoundSixBroadcast},
    ParticipantIdentifier,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Presign rounds are numbered 1 through 7.
pub type RoundNumber = u16;

/// The payload of a [`Message`]: one variant per round content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Content {
    /// Round 5 broadcast, carrying `Gamma_i`.
    FiveBroadcast(RoundFiveBroadcast),
    /// Round 5 point-to-point message, carrying a log* proof.
    Five(RoundFiveMessage),
    /// Round 6 broadcast, carrying `Delta_i` and its elog proof.
    SixBroadcast(RoundSixBroadcast),
}

impl Content {
    /// The round this content belongs to.
    pub fn round_number(&self) -> RoundNumber {
        match self {
            Content::FiveBroadcast(_) | Content::Five(_) => 5,
            Content::SixBroadcast(_) => 6,
        }
    }
}

/// A message travelling between parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The sending party.
    pub from: ParticipantIdentifier,
    /// The receiving party; `None` for a broadcast.
    pub to: Option<ParticipantIdentifier>,
    /// The payload.
    pub content: Content,
}

impl Message {
    pub fn new_broadcast(from: ParticipantIdentifier, content: Content) -> Self {
        Self {
            from,
            to: None,
            content,
        }
    }

    pub fn new(from: ParticipantIdentifier, to: ParticipantIdentifier, content: Content) -> Self {
        Self {
            from,
            to: Some(to),
            content,
        }
    }

    pub fn round_number(&self) -> RoundNumber {
        self.content.round_number()
    }

    pub fn is_broadcast(&self) -> bool {
        self.to.is_none()
    }
}

/// Returned by [`Round::finalize`] on failure: the unchanged round is handed
/// back so the session can keep collecting messages and retry.
#[derive(Debug)]
pub struct FinalizeError<R> {
    pub round: R,
    pub error: InternalError,
}

/// A single round of a protocol.
///
/// `finalize` consumes the round and produces the next one, so a session can
/// never re-enter a round it has already left.
pub trait Round: Sized {
    /// The state produced by a successful [`Round::finalize`].
    type Next;

    /// The round number this round answers to.
    fn round_number() -> RoundNumber;

    /// Zero-valued template of this round's point-to-point content, or `None`
    /// for a broadcast-only round.
    fn message_content(&self) -> Option<Content>;

    /// Zero-valued template of this round's broadcast content.
    fn broadcast_content(&self) -> Option<Content>;

    /// Validate and record a broadcast message.
    fn store_broadcast_message(&mut self, msg: Message) -> Result<()>;

    /// Check a point-to-point message. Stateless with respect to this
    /// party's outbound state.
    fn verify_message(&self, msg: &Message) -> Result<()>;

    /// Record per-sender state from a verified point-to-point message.
    fn store_message(&mut self, msg: Message) -> Result<()>;

    /// Aggregate, emit outgoing messages into `out`, and advance.
    ///
    /// Fails with [`InternalError::NotEnoughMessages`] until every peer has
    /// delivered; the error carries the round back for retry.
    fn finalize<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
        out: &mut Vec<Message>,
    ) -> std::result::Result<Self::Next, FinalizeError<Self>>;
}

/// The dispatcher-side acceptance filter: a message is handed to a round only
/// if it carries that round's number and comes from a known peer. Anything
/// else is dropped without an error.
pub fn accepts(
    round_number: RoundNumber,
    participants: &[ParticipantIdentifier],
    msg: &Message,
) -> bool {
    msg.round_number() == round_number && participants.contains(&msg.from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    #[test]
    fn content_advertises_its_round_number() {
        assert_eq!(
            Content::FiveBroadcast(RoundFiveBroadcast::default()).round_number(),
            5
        );
        assert_eq!(Content::Five(RoundFiveMessage::default()).round_number(), 5);
        assert_eq!(
            Content::SixBroadcast(RoundSixBroadcast::default()).round_number(),
            6
        );
    }

    #[test]
    fn dispatcher_filter_rejects_wrong_round_and_unknown_sender() {
        let mut rng = init_testing();
        let known = ParticipantIdentifier::random(&mut rng);
        let unknown = ParticipantIdentifier::random(&mut rng);
        let participants = vec![known];

        let msg = Message::new_broadcast(
            known,
            Content::FiveBroadcast(RoundFiveBroadcast::default()),
        );
        assert!(accepts(5, &participants, &msg));
        assert!(!accepts(6, &participants, &msg));

        let msg = Message::new_broadcast(
            unknown,
            Content::FiveBroadcast(RoundFiveBroadcast::default()),
        );
        assert!(!accepts(5, &participants, &msg));
    }

    #[test]
    fn messages_round_trip_through_serialization() {
        let mut rng = init_testing();
        let from = ParticipantIdentifier::random(&mut rng);
        let msg = Message::new_broadcast(
            from,
            Content::SixBroadcast(RoundSixBroadcast::default()),
        );

        let encoded = serialize!(&msg).unwrap();
        let decoded: Message = deserialize!(&encoded).unwrap();
        assert_eq!(decoded.from, from);
        assert!(decoded.is_broadcast());
        assert_eq!(decoded.round_number(), 6);
    }
}
