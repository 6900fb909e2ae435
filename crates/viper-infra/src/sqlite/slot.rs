//! SQLite slot store implementation.
//!
//! Implements `SlotStore` from `viper-core` over the `storage_slots` table.
//! Each write replaces the slot's value wholesale.

use chrono::Utc;
use sqlx::Row;

use viper_core::fleet::slot_store::SlotStore;
use viper_types::error::StoreError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of [`SlotStore`].
#[derive(Clone)]
pub struct SqliteSlotStore {
    pool: DatabasePool,
}

impl SqliteSlotStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl SlotStore for SqliteSlotStore {
    async fn read(&self, name: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM storage_slots WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::ReadFailure(e.to_string()))?;

        match row {
            Some(row) => {
                let value: String = row
                    .try_get("value")
                    .map_err(|e| StoreError::ReadFailure(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn write(&self, name: &str, value: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO storage_slots (name, value, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT (name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(name)
        .bind(value)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::PersistFailure(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::database_url;
    use viper_core::fleet::store::FleetStore;
    use viper_types::bot::{BotId, BotRecord, BotStatus};
    use viper_types::config::StorageSettings;

    async fn test_store() -> (SqliteSlotStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url(dir.path())).await.unwrap();
        (SqliteSlotStore::new(pool), dir)
    }

    #[tokio::test]
    async fn test_read_missing_slot() {
        let (store, _dir) = test_store().await;
        assert_eq!(store.read("viper_bots").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let (store, _dir) = test_store().await;
        store.write("viper_bots", "[]").await.unwrap();
        store.write("viper_bots", r#"[{"id":"a"}]"#).await.unwrap();

        assert_eq!(
            store.read("viper_bots").await.unwrap().as_deref(),
            Some(r#"[{"id":"a"}]"#)
        );

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM storage_slots")
            .fetch_one(&store.pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_fleet_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());
        let settings = StorageSettings::default();

        let record = BotRecord {
            id: BotId::from("bot-1"),
            name: "ModGuard".to_string(),
            description: "Moderation".to_string(),
            status: BotStatus::Online,
            commands: vec!["/ban".to_string()],
            credentials: None,
            created_at: chrono::DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        };

        {
            let pool = DatabasePool::new(&url).await.unwrap();
            let mut fleet = FleetStore::open(SqliteSlotStore::new(pool), &settings).await;
            fleet.append(record.clone()).await.unwrap();
        }

        let pool = DatabasePool::new(&url).await.unwrap();
        let fleet = FleetStore::open(SqliteSlotStore::new(pool), &settings).await;
        assert_eq!(fleet.list(), &[record]);
    }
}
