// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Opaque keystore for persisted key material and transcript state.
//!
//! The store maps string ids to byte payloads. Keys are imported exactly once
//! per id; re-importing an id fails. A [`KeyLinkedStore`] is a single-value
//! view bound to one parent id, with overwrite semantics, used by the
//! transcript to persist its replayable state.

use crate::errors::{InternalError, Result};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// Opaque `(id, bytes)` storage shared by sessions.
pub trait Keystore: Send + Sync {
    /// Store `payload` under `id`. At most one import per id; a second import
    /// with the same id fails with [`InternalError::DuplicateKeyId`].
    fn import(&self, id: &str, payload: Vec<u8>) -> Result<()>;

    /// Store `payload` under `id`, replacing any previous value.
    fn put(&self, id: &str, payload: Vec<u8>) -> Result<()>;

    /// Fetch the payload stored under `id`.
    fn get(&self, id: &str) -> Result<Vec<u8>>;

    /// Returns true if a payload is stored under `id`.
    fn contains(&self, id: &str) -> bool;
}

/// An in-memory [`Keystore`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryKeystore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryKeystore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Keystore for InMemoryKeystore {
    fn import(&self, id: &str, payload: Vec<u8>) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| InternalError::InternalInvariantFailed)?;
        if entries.contains_key(id) {
            return Err(InternalError::DuplicateKeyId);
        }
        let _ = entries.insert(id.to_string(), payload);
        Ok(())
    }

    fn put(&self, id: &str, payload: Vec<u8>) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| InternalError::InternalInvariantFailed)?;
        let _ = entries.insert(id.to_string(), payload);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| InternalError::InternalInvariantFailed)?;
        entries
            .get(id)
            .cloned()
            .ok_or(InternalError::StorageItemNotFound)
    }

    fn contains(&self, id: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(id))
            .unwrap_or(false)
    }
}

/// A single-value store bound to one parent id.
///
/// Writes replace the previous value; the parent id scopes the entry so that
/// several linked stores can share one backing [`Keystore`].
#[derive(Clone)]
pub struct KeyLinkedStore {
    store: Arc<dyn Keystore>,
    id: String,
}

impl KeyLinkedStore {
    pub fn new(store: Arc<dyn Keystore>, parent_id: &str, tag: &str) -> Self {
        Self {
            store,
            id: format!("{parent_id}/{tag}"),
        }
    }

    pub fn get(&self) -> Result<Vec<u8>> {
        self.store.get(&self.id)
    }

    pub fn import(&self, payload: Vec<u8>) -> Result<()> {
        self.store.put(&self.id, payload)
    }
}

impl std::fmt::Debug for KeyLinkedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLinkedStore").field("id", &self.id).finish()
    }
}
