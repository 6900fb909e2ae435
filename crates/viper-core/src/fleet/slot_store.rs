//! SlotStore trait -- a named durable string slot.
//!
//! The fleet is kept as one serialized value under one name, so the
//! adapter surface is a single read and a single overwrite. Implemented by
//! `SqliteSlotStore` in viper-infra and by [`MemorySlotStore`](super::memory_slot::MemorySlotStore).

use std::future::Future;

use viper_types::error::StoreError;

/// Durable key-value slot storage.
pub trait SlotStore: Send + Sync {
    /// Read the value stored under `name`, if any.
    fn read(&self, name: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Overwrite the value stored under `name`.
    fn write(&self, name: &str, value: &str)
    -> impl Future<Output = Result<(), StoreError>> + Send;
}
