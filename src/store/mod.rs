//! Local persistence of the farm.
//!
//! Each collection lives under its own key so one corrupted value only costs
//! that collection. Loading never fails: anything unreadable falls back to
//! its default. Saving refuses to wipe a previously populated pet list.

pub mod kv;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::journal::records::{Diary, FarmData, Note, Pet, Stats};

pub use kv::{FileStore, KeyValueStore, MemoryStore};

pub const PETS_KEY: &str = "pets";
pub const NOTES_KEY: &str = "notes";
pub const DIARIES_KEY: &str = "diaries";
pub const STATS_KEY: &str = "stats";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("refusing to overwrite {previous} saved pets with an empty list")]
    DataLossGuard { previous: usize },

    #[error("invalid backup bundle: {0}")]
    InvalidBundle(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Import format: `pets` and `diaries` are required, the rest optional.
#[derive(Debug, Deserialize)]
struct ImportBundle {
    pets: Option<Vec<Pet>>,
    #[serde(default)]
    notes: Option<Vec<Note>>,
    diaries: Option<Vec<Diary>>,
    #[serde(default)]
    stats: Option<Stats>,
}

pub struct Persistence<K> {
    store: K,
    /// Pet count of the last successful load or save. On load this counts
    /// stored records, including ones that could not be read.
    last_valid_pets: usize,
}

impl<K: KeyValueStore> Persistence<K> {
    pub fn new(store: K) -> Self {
        Self {
            store,
            last_valid_pets: 0,
        }
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn last_valid_pets(&self) -> usize {
        self.last_valid_pets
    }

    /// Load every collection, falling back per field on any problem.
    pub fn load(&mut self) -> FarmData {
        let mut data = FarmData::default();

        if let Some((pets, stored)) = self.read_list::<Pet>(PETS_KEY) {
            self.last_valid_pets = stored;
            data.pets = pets;
        }
        if let Some((notes, _)) = self.read_list::<Note>(NOTES_KEY) {
            data.notes = notes;
        }
        if let Some((diaries, _)) = self.read_list::<Diary>(DIARIES_KEY) {
            data.diaries = diaries;
        }
        if let Some(text) = self.read_raw(STATS_KEY) {
            match serde_json::from_str::<Stats>(&text) {
                Ok(stats) => data.stats = stats,
                Err(e) => log::error!("stats unreadable, using defaults: {e}"),
            }
        }

        data.reconcile_stats();
        log::info!(
            "loaded {} pets, {} notes, {} diaries",
            data.pets.len(),
            data.notes.len(),
            data.diaries.len()
        );
        data
    }

    /// Persist all four collections.
    ///
    /// Rejected with [`StoreError::DataLossGuard`] when the pet list would go
    /// from populated to empty; the stored state is left untouched.
    pub fn save(&mut self, data: &FarmData) -> Result<(), StoreError> {
        if self.last_valid_pets > 0 && data.pets.is_empty() {
            log::warn!(
                "possible data loss: {} pets would be replaced by none, save skipped",
                self.last_valid_pets
            );
            return Err(StoreError::DataLossGuard {
                previous: self.last_valid_pets,
            });
        }

        self.write_all(data)?;
        self.last_valid_pets = data.pets.len();
        log::debug!(
            "saved {} pets / {} diaries",
            data.pets.len(),
            data.diaries.len()
        );
        Ok(())
    }

    /// Replace the stored state with a backup bundle and reload it.
    ///
    /// Importing is an explicit user action, so the data-loss guard does not
    /// apply. `current_stats` fills in when the bundle carries none.
    pub fn import_bundle(&mut self, json: &str, current_stats: &Stats) -> Result<FarmData, StoreError> {
        let bundle: ImportBundle = serde_json::from_str(json)?;
        let (Some(pets), Some(diaries)) = (bundle.pets, bundle.diaries) else {
            return Err(StoreError::InvalidBundle(
                "expected both \"pets\" and \"diaries\"".into(),
            ));
        };
        let data = FarmData {
            pets,
            notes: bundle.notes.unwrap_or_default(),
            diaries,
            stats: bundle.stats.unwrap_or_else(|| current_stats.clone()),
        };
        self.write_all(&data)?;
        log::info!("imported backup with {} pets", data.pets.len());
        Ok(self.load())
    }

    fn write_all(&mut self, data: &FarmData) -> Result<(), StoreError> {
        self.store.set(PETS_KEY, &serde_json::to_string(&data.pets)?)?;
        self.store.set(NOTES_KEY, &serde_json::to_string(&data.notes)?)?;
        self.store.set(DIARIES_KEY, &serde_json::to_string(&data.diaries)?)?;
        self.store.set(STATS_KEY, &serde_json::to_string(&data.stats)?)?;
        Ok(())
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::error!("could not read {key}: {e}");
                None
            }
        }
    }

    /// Readable records plus the number of stored elements. `None` when the
    /// key is missing, unparsable, or not a list. Bad records are skipped.
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Option<(Vec<T>, usize)> {
        let text = self.read_raw(key)?;
        let value: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                log::error!("{key} is not valid JSON, ignoring: {e}");
                return None;
            }
        };
        let Value::Array(items) = value else {
            log::error!("{key} is not a list, ignoring");
            return None;
        };
        let stored = items.len();
        let list: Vec<T> = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::error!("{key}[{i}] unreadable, skipping: {e}");
                    None
                }
            })
            .collect();
        if list.len() < stored {
            log::warn!("{key}: kept {} of {stored} stored records", list.len());
        }
        Some((list, stored))
    }
}

/// Human-readable backup of the whole farm.
pub fn export_bundle(data: &FarmData) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Suggested file name for a backup taken now.
pub fn backup_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("pet_farm_backup_{}.json", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::Breed;
    use chrono::Utc;

    fn pets(n: usize) -> Vec<Pet> {
        (0..n)
            .map(|i| Pet::new(i.to_string(), Breed::Shiba, Utc::now()))
            .collect()
    }

    #[test]
    fn empty_store_loads_defaults() {
        let mut p = Persistence::new(MemoryStore::new());
        assert_eq!(p.load(), FarmData::default());
    }

    #[test]
    fn malformed_fields_fall_back_individually() {
        let store = MemoryStore::new()
            .with(PETS_KEY, "{not json")
            .with(NOTES_KEY, r#"[{"id":"n1","content":"feed the corgi"}]"#)
            .with(DIARIES_KEY, r#"{"oops": true}"#)
            .with(STATS_KEY, r#"{"dogs": "many"}"#);
        let mut p = Persistence::new(store);
        let data = p.load();
        assert!(data.pets.is_empty());
        assert_eq!(data.notes.len(), 1);
        assert!(data.diaries.is_empty());
        assert_eq!(data.stats, Stats::default());
        assert_eq!(p.last_valid_pets(), 0);
    }

    #[test]
    fn stats_are_reconciled_on_load() {
        let store = MemoryStore::new()
            .with(PETS_KEY, r#"[{"id":"1","type":"dog","breed":"shiba"},{"id":"2","type":"cat"}]"#)
            .with(STATS_KEY, r#"{"dogs": 40, "cats": 0, "totalDiaries": 7}"#);
        let data = Persistence::new(store).load();
        assert_eq!(data.stats.dogs, 1);
        assert_eq!(data.stats.cats, 1);
        assert_eq!(data.stats.total_diaries, 0);
    }

    #[test]
    fn guard_rejects_wiping_pets() {
        let mut p = Persistence::new(MemoryStore::new());
        let mut data = FarmData {
            pets: pets(3),
            ..FarmData::default()
        };
        p.save(&data).unwrap();

        data.pets.clear();
        let err = p.save(&data).unwrap_err();
        assert!(matches!(err, StoreError::DataLossGuard { previous: 3 }));

        assert_eq!(p.load().pets.len(), 3);
    }

    #[test]
    fn guard_tracks_loaded_count() {
        let store = MemoryStore::new().with(PETS_KEY, r#"[{"id":"1","type":"dog"}]"#);
        let mut p = Persistence::new(store);
        p.load();
        assert!(p.save(&FarmData::default()).is_err());
    }

    #[test]
    fn one_bad_pet_does_not_cost_the_others() {
        let stored = r#"[{"id":"1","type":"dog","breed":"shiba"},{"id":"2","type":"cat","breed":"munchkin"},{"type":"dog","breed":"corgi"}]"#;
        let store = MemoryStore::new().with(PETS_KEY, stored);
        let mut p = Persistence::new(store);
        let data = p.load();
        assert_eq!(data.pets.len(), 2);
        assert_eq!(data.stats.dogs, 1);
        assert_eq!(data.stats.cats, 1);
        assert_eq!(p.last_valid_pets(), 3);

        let err = p.save(&FarmData::default()).unwrap_err();
        assert!(matches!(err, StoreError::DataLossGuard { previous: 3 }));
        assert_eq!(p.store().get(PETS_KEY).unwrap().as_deref(), Some(stored));
    }

    #[test]
    fn empty_farm_can_stay_empty() {
        let mut p = Persistence::new(MemoryStore::new());
        p.save(&FarmData::default()).unwrap();
        p.save(&FarmData::default()).unwrap();
    }

    #[test]
    fn import_requires_pets_and_diaries() {
        let mut p = Persistence::new(MemoryStore::new());
        let err = p.import_bundle(r#"{"pets": []}"#, &Stats::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidBundle(_)));
        let err = p.import_bundle("not json", &Stats::default()).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn import_fills_missing_notes() {
        let mut p = Persistence::new(MemoryStore::new());
        let data = p
            .import_bundle(
                r#"{"pets":[{"id":"7","type":"cat","breed":"munchkin"}],"diaries":[]}"#,
                &Stats::default(),
            )
            .unwrap();
        assert!(data.notes.is_empty());
        assert_eq!(data.stats.cats, 1);
        assert_eq!(p.last_valid_pets(), 1);
    }

    #[test]
    fn export_then_import_is_idempotent() {
        let mut data = FarmData {
            pets: pets(2),
            notes: vec![Note::new("n".into(), "buy kibble".into())],
            diaries: vec![Diary::new(
                "d".into(),
                "sunny day".into(),
                Utc::now(),
                Breed::Corgi,
            )],
            stats: Stats::default(),
        };
        data.reconcile_stats();

        let bundle = export_bundle(&data).unwrap();
        let mut fresh = Persistence::new(MemoryStore::new());
        let imported = fresh.import_bundle(&bundle, &Stats::default()).unwrap();
        assert_eq!(imported, data);
    }

    #[test]
    fn backup_names_carry_millis() {
        let at = "2024-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(backup_file_name(at), "pet_farm_backup_1704067200000.json");
    }
}
