//! Locally known documents, kept independently of any CRDT state.

pub mod store;

use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub use store::{FileStore, LocalStore, MemoryStore};

use crate::error::RegistryError;
use crate::models::{DocumentId, RegistryEntry};

/// Slot name holding the JSON encoded entry list.
pub const REGISTRY_SLOT: &str = "hedwig-documents";

pub struct DocumentRegistry {
    store: Arc<dyn LocalStore>,
    slot: String,
    // Makes read-modify-write sequences atomic for callers.
    write_lock: Mutex<()>,
}

impl DocumentRegistry {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self::with_slot(store, REGISTRY_SLOT)
    }

    pub fn with_slot(store: Arc<dyn LocalStore>, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Entries in storage order. Absent or corrupt data reads as empty.
    pub fn list(&self) -> Vec<RegistryEntry> {
        let Some(stored) = self.store.get_item(&self.slot) else {
            return Vec::new();
        };
        serde_json::from_str(&stored).unwrap_or_else(|e| {
            warn!("Ignoring unreadable document list in '{}': {}", self.slot, e);
            Vec::new()
        })
    }

    /// Entries for display, most recently updated first.
    pub fn list_recent(&self) -> Vec<RegistryEntry> {
        let mut entries = self.list();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries
    }

    /// Replace the entry for `id` or append a new one, stamping it with now.
    pub fn upsert(&self, id: &DocumentId, title: &str) -> Result<RegistryEntry, RegistryError> {
        let _guard = self.lock();
        let entry = RegistryEntry {
            id: id.clone(),
            title: title.to_string(),
            updated_at: Utc::now(),
        };

        let mut entries = self.list();
        match entries.iter_mut().find(|existing| existing.id == *id) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        self.write(&entries)?;
        debug!("Registry entry for {} set to '{}'", id, title);
        Ok(entry)
    }

    /// Forget `id` locally. Returns whether an entry was removed; the
    /// document itself and other peers' copies are untouched.
    pub fn remove(&self, id: &DocumentId) -> Result<bool, RegistryError> {
        let _guard = self.lock();
        let mut entries = self.list();
        let before = entries.len();
        entries.retain(|entry| entry.id != *id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write(&entries)?;
        debug!("Registry entry for {} removed", id);
        Ok(true)
    }

    fn write(&self, entries: &[RegistryEntry]) -> Result<(), RegistryError> {
        let encoded = serde_json::to_string(entries)?;
        self.store.set_item(&self.slot, &encoded)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
