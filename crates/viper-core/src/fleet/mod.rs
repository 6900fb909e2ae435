//! Fleet persistence: the ordered collection of deployed bot records.

pub mod memory_slot;
pub mod slot_store;
pub mod store;
