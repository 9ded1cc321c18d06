// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! A list of error types which are produced during an execution of the
//! protocol.

use thiserror::Error;

/// The default Result type used in this crate
pub type Result<T> = std::result::Result<T, InternalError>;

/// Represents an error in the manipulation of internal cryptographic data
#[derive(Clone, Copy, Eq, PartialEq, Error, Debug)]
pub enum InternalError {
    #[error("Serialization Error")]
    Serialization,
    #[error("A required field of the payload was missing or zero-valued")]
    NilFields,
    #[error("The content of the message did not match the expected type")]
    InvalidContent,
    #[error("The sender already delivered a message for this round")]
    DuplicateMessage,
    #[error("Value is not a member of the multiplicative group modulo N")]
    NotInUnitGroup,
    #[error("Pedersen parameter s must not equal t")]
    SEqualsT,
    #[error("Paillier ciphertext failed validation")]
    InvalidCiphertext,
    #[error("Failed to verify zero-knowledge proof")]
    ProofFailed,
    #[error("Cannot finalize the round before all peers have delivered")]
    NotEnoughMessages,
    #[error("An entry with this id was already imported into the keystore")]
    DuplicateKeyId,
    #[error("Storage does not contain the requested item")]
    StorageItemNotFound,
    #[error("The operation requires the private part of the key")]
    MissingSecretKey,
    #[error("Could not successfully generate proof")]
    CouldNotGenerateProof,
    #[error("Elements are not coprime")]
    NotCoprime,
    #[error("Could not invert a BigNumber")]
    CouldNotInvertBigNumber,
    #[error("Failed to convert BigNumber to k256::Scalar, as BigNumber was not in [0,p)")]
    CouldNotConvertToScalar,
    #[error("Reached the maximum allowed number of retries")]
    RetryFailed,
    #[error("Represents some code assumption that was checked at runtime but failed to be true")]
    InternalInvariantFailed,
}

macro_rules! serialize {
    ($x:expr) => {{
        bincode::serialize($x).or(Err(crate::errors::InternalError::Serialization))
    }};
}

macro_rules! deserialize {
    ($x:expr) => {{
        bincode::deserialize($x).or(Err(crate::errors::InternalError::Serialization))
    }};
}
