//! Durable key-value slots.
//!
//! The cart and the listing cache persist themselves through a tiny
//! string-to-string interface. The storefront backs it with the request
//! session; tests back it with in-memory maps that record every write.

use std::collections::HashMap;

/// A durable, string-keyed slot store.
///
/// Writes are fire-and-forget: implementations swallow (and log) their own
/// failures rather than surfacing them to the cart.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String);

    /// Delete the value stored under `key`. Removing a missing key is a no-op.
    fn remove(&mut self, key: &str);
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        (**self).set(key, value);
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key);
    }
}

/// A plain in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.into());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// A write recorded by a [`JournaledStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOp {
    Set { key: String, value: String },
    Remove { key: String },
}

impl SlotOp {
    /// The key this operation targets.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Remove { key } => key,
        }
    }
}

/// An in-memory store that journals every write as a persist intent.
///
/// Reads see the writes already made. The journal is drained by the owner
/// and replayed against the real backing store (for the storefront, the
/// request session) once the operation has finished.
#[derive(Debug, Clone, Default)]
pub struct JournaledStore {
    entries: MemoryStore,
    journal: Vec<SlotOp>,
}

impl JournaledStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value loaded from the backing store. Seeding is not journaled.
    pub fn seed(&mut self, key: &str, value: impl Into<String>) {
        self.entries.set(key, value.into());
    }

    /// The writes recorded so far, oldest first.
    #[must_use]
    pub fn journal(&self) -> &[SlotOp] {
        &self.journal
    }

    /// Drain the recorded writes, oldest first.
    pub fn take_journal(&mut self) -> Vec<SlotOp> {
        std::mem::take(&mut self.journal)
    }
}

impl KeyValueStore for JournaledStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        self.journal.push(SlotOp::Set {
            key: key.to_string(),
            value: value.clone(),
        });
        self.entries.set(key, value);
    }

    fn remove(&mut self, key: &str) {
        self.journal.push(SlotOp::Remove {
            key: key.to_string(),
        });
        self.entries.remove(key);
    }
}
