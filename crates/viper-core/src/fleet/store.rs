//! FleetStore -- ordered bot records mirrored to a durable slot.
//!
//! The whole fleet is serialized as one JSON array and every mutation
//! rewrites the slot. A failed write rolls the in-memory change back, so
//! memory and storage never diverge.

use viper_types::bot::{BotId, BotRecord};
use viper_types::config::StorageSettings;
use viper_types::error::StoreError;

use super::slot_store::SlotStore;

/// The user's fleet of deployed bots.
pub struct FleetStore<S: SlotStore> {
    slot: S,
    slot_name: String,
    max_bytes: usize,
    records: Vec<BotRecord>,
}

impl<S: SlotStore> FleetStore<S> {
    /// Empty fleet over `slot`. Call [`load`](Self::load) to read persisted records.
    pub fn new(slot: S, settings: &StorageSettings) -> Self {
        Self {
            slot,
            slot_name: settings.slot_name.clone(),
            max_bytes: settings.max_slot_bytes,
            records: Vec::new(),
        }
    }

    /// Create a fleet and load it from the slot in one step.
    pub async fn open(slot: S, settings: &StorageSettings) -> Self {
        let mut fleet = Self::new(slot, settings);
        fleet.load().await;
        fleet
    }

    /// Replace the in-memory fleet with the persisted one.
    ///
    /// Fails soft: an absent, unreadable or malformed slot yields an empty
    /// fleet and a warning.
    pub async fn load(&mut self) -> &[BotRecord] {
        self.records = match self.slot.read(&self.slot_name).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<BotRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(
                        slot = %self.slot_name,
                        "ignoring malformed fleet data: {e}"
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(slot = %self.slot_name, "could not read fleet: {e}");
                Vec::new()
            }
        };
        tracing::debug!(count = self.records.len(), "fleet loaded");
        &self.records
    }

    /// All records, in insertion order.
    pub fn list(&self) -> &[BotRecord] {
        &self.records
    }

    pub fn get(&self, id: &BotId) -> Option<&BotRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record and persist the fleet.
    pub async fn append(&mut self, record: BotRecord) -> Result<(), StoreError> {
        let id = record.id.clone();
        self.records.push(record);

        if let Err(e) = self.persist().await {
            self.records.pop();
            return Err(e);
        }

        tracing::info!(bot_id = %id, count = self.records.len(), "bot added to fleet");
        Ok(())
    }

    /// Remove the record with `id` and persist the fleet.
    ///
    /// Returns whether a record was removed. An unknown id still rewrites
    /// the slot with the unchanged list.
    pub async fn remove(&mut self, id: &BotId) -> Result<bool, StoreError> {
        let removed = self
            .records
            .iter()
            .position(|r| &r.id == id)
            .map(|index| (index, self.records.remove(index)));

        if let Err(e) = self.persist().await {
            if let Some((index, record)) = removed {
                self.records.insert(index, record);
            }
            return Err(e);
        }

        if removed.is_some() {
            tracing::info!(bot_id = %id, count = self.records.len(), "bot removed from fleet");
        }
        Ok(removed.is_some())
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.records)
            .map_err(|e| StoreError::PersistFailure(e.to_string()))?;

        if json.len() > self.max_bytes {
            return Err(StoreError::QuotaExceeded {
                size: json.len(),
                limit: self.max_bytes,
            });
        }

        self.slot.write(&self.slot_name, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::memory_slot::MemorySlotStore;
    use chrono::{TimeZone, Utc};
    use viper_types::bot::{BotCredentials, BotStatus};

    fn settings() -> StorageSettings {
        StorageSettings::default()
    }

    fn record(id: &str, name: &str) -> BotRecord {
        BotRecord {
            id: BotId::from(id),
            name: name.to_string(),
            description: format!("{name} description"),
            status: BotStatus::Online,
            commands: vec!["/ping".to_string()],
            credentials: Some(BotCredentials {
                token: "abc123".to_string(),
                client_id: String::new(),
                client_secret: String::new(),
            }),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_append_then_list() {
        let slot = MemorySlotStore::new();
        let mut fleet = FleetStore::open(slot, &settings()).await;
        assert!(fleet.is_empty());

        fleet.append(record("a", "Alpha")).await.unwrap();
        fleet.append(record("b", "Beta")).await.unwrap();

        let names: Vec<_> = fleet.list().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert_eq!(fleet.list().last().unwrap(), &record("b", "Beta"));
    }

    #[tokio::test]
    async fn test_persist_then_reload_preserves_order() {
        let slot = MemorySlotStore::new();
        let mut fleet = FleetStore::open(slot.clone(), &settings()).await;
        fleet.append(record("a", "Alpha")).await.unwrap();
        fleet.append(record("b", "Beta")).await.unwrap();
        fleet.append(record("c", "Gamma")).await.unwrap();

        let reloaded = FleetStore::open(slot, &settings()).await;
        assert_eq!(reloaded.list(), fleet.list());
    }

    #[tokio::test]
    async fn test_slot_holds_json_array() {
        let slot = MemorySlotStore::new();
        let mut fleet = FleetStore::open(slot.clone(), &settings()).await;
        fleet.append(record("a", "Alpha")).await.unwrap();

        let raw = slot.raw("viper_bots").unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], "a");
        assert_eq!(value[0]["createdAt"], 1_700_000_000_000i64);
    }

    #[tokio::test]
    async fn test_remove_existing_and_missing() {
        let slot = MemorySlotStore::new();
        let mut fleet = FleetStore::open(slot.clone(), &settings()).await;
        fleet.append(record("a", "Alpha")).await.unwrap();
        fleet.append(record("b", "Beta")).await.unwrap();

        assert!(fleet.remove(&BotId::from("a")).await.unwrap());
        assert!(fleet.get(&BotId::from("a")).is_none());
        assert_eq!(fleet.len(), 1);

        assert!(!fleet.remove(&BotId::from("zzz")).await.unwrap());
        assert_eq!(fleet.len(), 1);

        let reloaded = FleetStore::open(slot, &settings()).await;
        assert_eq!(reloaded.list(), fleet.list());
    }

    #[tokio::test]
    async fn test_absent_slot_loads_empty() {
        let fleet = FleetStore::open(MemorySlotStore::new(), &settings()).await;
        assert!(fleet.is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_slot_loads_empty() {
        let slot = MemorySlotStore::with_slot("viper_bots", "{not json");
        let fleet = FleetStore::open(slot, &settings()).await;
        assert!(fleet.is_empty());

        let slot = MemorySlotStore::with_slot("viper_bots", r#"{"id":"a"}"#);
        let fleet = FleetStore::open(slot, &settings()).await;
        assert!(fleet.is_empty());
    }

    #[tokio::test]
    async fn test_append_rolls_back_on_persist_failure() {
        let slot = MemorySlotStore::new();
        let mut fleet = FleetStore::open(slot.clone(), &settings()).await;
        fleet.append(record("a", "Alpha")).await.unwrap();

        slot.set_fail_writes(true);
        let err = fleet.append(record("b", "Beta")).await.unwrap_err();
        assert!(matches!(err, StoreError::PersistFailure(_)));
        assert_eq!(fleet.len(), 1);
        assert!(fleet.get(&BotId::from("b")).is_none());
    }

    #[tokio::test]
    async fn test_remove_rolls_back_in_place() {
        let slot = MemorySlotStore::new();
        let mut fleet = FleetStore::open(slot.clone(), &settings()).await;
        fleet.append(record("a", "Alpha")).await.unwrap();
        fleet.append(record("b", "Beta")).await.unwrap();
        fleet.append(record("c", "Gamma")).await.unwrap();

        slot.set_fail_writes(true);
        assert!(fleet.remove(&BotId::from("b")).await.is_err());
        let ids: Vec<_> = fleet.list().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_surfaced() {
        let slot = MemorySlotStore::new();
        let small = StorageSettings {
            slot_name: "viper_bots".to_string(),
            max_slot_bytes: 64,
        };
        let mut fleet = FleetStore::open(slot.clone(), &small).await;

        let err = fleet.append(record("a", "Alpha")).await.unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { limit: 64, .. }));
        assert!(fleet.is_empty());
        assert!(slot.raw("viper_bots").is_none());
    }
}
