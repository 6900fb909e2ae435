//! In-process slot storage for tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use viper_types::error::StoreError;

use super::slot_store::SlotStore;

/// [`SlotStore`] backed by a shared `HashMap`.
///
/// Clones share the same slots, so a test can keep a handle while a
/// `FleetStore` owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one slot value.
    pub fn with_slot(name: &str, value: &str) -> Self {
        let store = Self::default();
        if let Ok(mut slots) = store.slots.lock() {
            slots.insert(name.to_string(), value.to_string());
        }
        store
    }

    /// Make every subsequent write fail with `PersistFailure`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current raw value of a slot.
    pub fn raw(&self, name: &str) -> Option<String> {
        self.slots.lock().ok()?.get(name).cloned()
    }
}

impl SlotStore for MemorySlotStore {
    async fn read(&self, name: &str) -> Result<Option<String>, StoreError> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| StoreError::ReadFailure("memory slot lock poisoned".to_string()))?;
        Ok(slots.get(name).cloned())
    }

    async fn write(&self, name: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::PersistFailure(
                "memory slot rejected write".to_string(),
            ));
        }
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| StoreError::PersistFailure("memory slot lock poisoned".to_string()))?;
        slots.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemorySlotStore::new();
        assert_eq!(store.read("viper_bots").await.unwrap(), None);

        store.write("viper_bots", "[]").await.unwrap();
        assert_eq!(store.read("viper_bots").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_clones_share_slots() {
        let store = MemorySlotStore::new();
        let handle = store.clone();
        store.write("a", "1").await.unwrap();
        assert_eq!(handle.raw("a").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_fail_writes_leaves_value_untouched() {
        let store = MemorySlotStore::with_slot("a", "old");
        store.set_fail_writes(true);
        let err = store.write("a", "new").await.unwrap_err();
        assert!(matches!(err, StoreError::PersistFailure(_)));
        assert_eq!(store.raw("a").as_deref(), Some("old"));
    }
}
