// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Domain-separated, restartable transcript hash.
//!
//! Every write is framed as `"(" || u64_be(len(domain)) || domain ||
//! u64_be(len(data)) || data || ")"` and folded into a BLAKE3 hasher, so that
//! two transcripts agree on their digest exactly when they received the same
//! sequence of `(domain, data)` pairs. The sequence itself is kept as a state
//! list; when a [`KeyLinkedStore`] is attached, the list is persisted after
//! every write and a transcript can be rebuilt from it after a restart.
//!
//! Fiat-Shamir challenges are drawn from the hasher's extendable output via
//! rejection sampling, so prover and verifier derive identical challenges
//! from identical transcripts.

use crate::{
    errors::Result,
    keystore::KeyLinkedStore,
    parameters::DIGEST_LENGTH_BYTES,
    utils::curve_order,
    ParticipantIdentifier,
};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};

/// One transcript entry: a domain tag and the bytes written under it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytesWithDomain {
    pub domain: String,
    pub bytes: Vec<u8>,
}

/// Types that contribute to the transcript under a self-declared domain.
pub trait DomainWriter {
    /// The domain tag separating this type's contributions.
    fn domain(&self) -> &'static str;

    /// Serialize the transcript contribution into `out`.
    fn write_to(&self, out: &mut Vec<u8>) -> Result<()>;
}

/// A single input accepted by [`Hash::write_any`].
///
/// The closed set of variants replaces the source material's runtime type
/// dispatch; anything else simply cannot be written.
pub enum HashInput<'a> {
    /// A raw byte string, hashed under the domain `"[]byte"`.
    RawBytes(&'a [u8]),
    /// An arbitrary-precision integer, hashed under the domain `"big.Int"`
    /// with a sign byte followed by the big-endian magnitude.
    BigInt(&'a BigNumber),
    /// A value carrying its own domain tag.
    Domained(&'a dyn DomainWriter),
    /// Pre-marshaled bytes hashed under the marshaling type's name. Fallback
    /// path for types without a domain of their own.
    Marshaled {
        type_name: &'static str,
        bytes: Vec<u8>,
    },
}

/// Encoding of a signed big integer compatible with Go's `big.Int` gob
/// encoding: one byte holding `version << 1 | sign`, then the magnitude.
fn gob_encode_int(x: &BigNumber) -> Vec<u8> {
    let negative = x < &BigNumber::zero();
    let magnitude = if negative { -x.clone() } else { x.clone() };
    let mut out = vec![(1u8 << 1) | u8::from(negative)];
    out.extend(magnitude.to_bytes());
    out
}

/// The transcript hash.
///
/// Forks ([`Hash::fork`], [`Hash::hash_for_id`]) continue from the current
/// state but never write back to the parent or to its store.
pub struct Hash {
    hasher: blake3::Hasher,
    state: Vec<BytesWithDomain>,
    store: Option<KeyLinkedStore>,
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hash")
            .field("writes", &self.state.len())
            .field("persisted", &self.store.is_some())
            .finish()
    }
}

impl Hash {
    /// An empty transcript with no persistence.
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
            state: Vec::new(),
            store: None,
        }
    }

    /// An empty transcript persisting its state to `store` after each write.
    pub fn with_store(store: KeyLinkedStore) -> Self {
        Self {
            hasher: blake3::Hasher::new(),
            state: Vec::new(),
            store: Some(store),
        }
    }

    /// Rebuild a transcript from the state persisted in `store`.
    ///
    /// Each recorded `(domain, bytes)` entry is re-applied in order, so the
    /// restored transcript produces the same digest as the one that was
    /// persisted. Only the recorded state is replayed; nothing from the
    /// original construction is carried over.
    pub fn restore(store: KeyLinkedStore) -> Result<Self> {
        let persisted = store.get()?;
        let state: Vec<BytesWithDomain> = deserialize!(&persisted)?;

        let mut hasher = blake3::Hasher::new();
        for entry in &state {
            Self::write_framed(&mut hasher, entry);
        }

        Ok(Self {
            hasher,
            state,
            store: Some(store),
        })
    }

    /// Append `input` to the transcript.
    pub fn write_any(&mut self, input: HashInput<'_>) -> Result<()> {
        let entry = match input {
            HashInput::RawBytes(bytes) => BytesWithDomain {
                domain: "[]byte".to_string(),
                bytes: bytes.to_vec(),
            },
            HashInput::BigInt(x) => BytesWithDomain {
                domain: "big.Int".to_string(),
                bytes: gob_encode_int(x),
            },
            HashInput::Domained(writer) => {
                let mut bytes = Vec::new();
                writer.write_to(&mut bytes)?;
                BytesWithDomain {
                    domain: writer.domain().to_string(),
                    bytes,
                }
            }
            HashInput::Marshaled { type_name, bytes } => BytesWithDomain {
                domain: type_name.to_string(),
                bytes,
            },
        };

        self.update_state(entry)
    }

    /// Append a raw byte string.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_any(HashInput::RawBytes(bytes))
    }

    /// Append a signed big integer.
    pub fn write_int(&mut self, x: &BigNumber) -> Result<()> {
        self.write_any(HashInput::BigInt(x))
    }

    /// Append a domain-carrying value.
    pub fn write_domained(&mut self, writer: &dyn DomainWriter) -> Result<()> {
        self.write_any(HashInput::Domained(writer))
    }

    fn update_state(&mut self, entry: BytesWithDomain) -> Result<()> {
        self.state.push(entry);
        if let Some(store) = &self.store {
            let persisted = serialize!(&self.state)?;
            store.import(persisted)?;
        }
        // The entry was just pushed, so last() cannot be empty.
        if let Some(entry) = self.state.last() {
            Self::write_framed(&mut self.hasher, entry);
        }
        Ok(())
    }

    /// Write `(<domain_size><domain><data_size><data>)` so that each
    /// domain-separated piece of data is distinguished from others.
    fn write_framed(hasher: &mut blake3::Hasher, entry: &BytesWithDomain) {
        let mut size_buf = [0u8; 8];

        let _ = hasher.update(b"(");
        // <domain_size>
        size_buf.copy_from_slice(&(entry.domain.len() as u64).to_be_bytes());
        let _ = hasher.update(&size_buf);
        // <domain>
        let _ = hasher.update(entry.domain.as_bytes());
        // <data_size>
        size_buf.copy_from_slice(&(entry.bytes.len() as u64).to_be_bytes());
        let _ = hasher.update(&size_buf);
        // <data>
        let _ = hasher.update(&entry.bytes);
        // )
        let _ = hasher.update(b")");
    }

    /// The current digest, truncated to [`DIGEST_LENGTH_BYTES`]. Further
    /// writes are still possible.
    pub fn sum(&self) -> [u8; DIGEST_LENGTH_BYTES] {
        let mut out = [0u8; DIGEST_LENGTH_BYTES];
        self.digest().fill(&mut out);
        out
    }

    /// The extendable output stream over the current transcript.
    pub(crate) fn digest(&self) -> blake3::OutputReader {
        self.hasher.finalize_xof()
    }

    /// An independent transcript continuing from the current state. The fork
    /// carries no store and cannot write back into this transcript.
    pub fn fork(&self) -> Hash {
        Hash {
            hasher: self.hasher.clone(),
            state: self.state.clone(),
            store: None,
        }
    }

    /// A fork with `id` mixed in, yielding the sender-specific transcript
    /// used for per-party Fiat-Shamir challenges.
    pub fn hash_for_id(&self, id: ParticipantIdentifier) -> Hash {
        let mut forked = self.fork();
        // Writing a participant id cannot fail.
        let _ = forked.write_domained(&id);
        forked
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::new()
    }
}

//////////////////////////
// Challenge derivation //
//////////////////////////

/// Derive a deterministic pseudorandom value in `[0, n)` from the digest
/// stream.
///
/// To avoid sample bias we can't take the drawn value mod `n`, because that
/// would bias smaller numbers. Instead, we re-draw from the stream until the
/// value lands below `n`.
pub(crate) fn positive_bn_from_digest(
    reader: &mut blake3::OutputReader,
    n: &BigNumber,
) -> BigNumber {
    let len = n.to_bytes().len();
    let mut buf = vec![0u8; len];
    loop {
        reader.fill(&mut buf);
        let b = BigNumber::from_slice(&buf);
        if &b < n {
            return b;
        }
    }
}

/// Derive a deterministic pseudorandom value in `[-n, n]` from the digest
/// stream.
pub(crate) fn plusminus_bn_from_digest(
    reader: &mut blake3::OutputReader,
    n: &BigNumber,
) -> BigNumber {
    let mut is_neg_byte = [0u8; 1];
    reader.fill(&mut is_neg_byte);
    let is_neg = is_neg_byte[0] & 1 == 1;

    // The sampling method samples from the open interval, so add 1 to sample
    // from the _closed_ interval we want here.
    let open_interval_max = n + 1;
    let b = positive_bn_from_digest(reader, &open_interval_max);
    match is_neg {
        true => -b,
        false => b,
    }
}

/// Derive a deterministic pseudorandom scalar of the secp256k1 group from the
/// digest stream.
pub(crate) fn scalar_from_digest(reader: &mut blake3::OutputReader) -> Result<k256::Scalar> {
    let e = positive_bn_from_digest(reader, &curve_order());
    crate::utils::bn_to_scalar(&e)
}
