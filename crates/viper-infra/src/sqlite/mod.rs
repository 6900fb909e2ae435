//! SQLite persistence: connection pool and the fleet slot store.

pub mod pool;
pub mod slot;
