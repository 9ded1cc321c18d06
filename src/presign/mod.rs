// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The presigning rounds.
//!
//! Presigning computes the nonce-dependent half of an ECDSA signature before
//! the message is known. This module carries the gather-verify-aggregate
//! rounds in the middle of the protocol: round 5 collects the `Gamma_j`
//! shares and their log* proofs and aggregates `Gamma`, round 6 collects the
//! `Delta_j` shares and their elog proofs.

mod round_five;
mod round_six;

pub use round_five::{RoundFive, RoundFiveBroadcast, RoundFiveInput, RoundFiveMessage};
pub use round_six::{RoundSix, RoundSixBroadcast, RoundSixOutput};
