//! Diaries, notes and the pets they earn.
//!
//! Writing a diary adopts a dog, completing a note adopts a cat, deleting
//! either gives the matching pet back. Every mutation is persisted and
//! reported as [`FarmEvent`]s so the simulation can spawn or despawn agents.

pub mod records;

use chrono::Utc;
use thiserror::Error;

use crate::pet::{Breed, PetKind};
use crate::store::{self, KeyValueStore, Persistence, StoreError};
use crate::sync::SyncClient;

pub use records::{Diary, FarmData, Note, Pet, Stats};

/// Prefix of diaries written when a note is completed.
pub const NOTE_DONE_PREFIX: &str = "[note done]";

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("content is empty")]
    EmptyContent,

    #[error("no note with id {0}")]
    NoteNotFound(String),

    #[error("no diary with id {0}")]
    DiaryNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Change to the pet population caused by a journal operation.
#[derive(Debug, Clone, PartialEq)]
pub enum FarmEvent {
    PetAdopted(Pet),
    PetReleased(String),
}

pub struct Farm<K> {
    data: FarmData,
    persistence: Persistence<K>,
    sync: SyncClient,
    rng: fastrand::Rng,
    /// Most recent failed save, waiting to be surfaced.
    save_error: Option<StoreError>,
}

impl<K: KeyValueStore> Farm<K> {
    /// Load the farm from storage.
    pub fn open(store: K, sync: SyncClient, rng: fastrand::Rng) -> Self {
        let mut persistence = Persistence::new(store);
        let data = persistence.load();
        Self {
            data,
            persistence,
            sync,
            rng,
            save_error: None,
        }
    }

    pub fn data(&self) -> &FarmData {
        &self.data
    }

    pub fn pets(&self) -> &[Pet] {
        &self.data.pets
    }

    pub fn notes(&self) -> &[Note] {
        &self.data.notes
    }

    pub fn diaries(&self) -> &[Diary] {
        &self.data.diaries
    }

    pub fn stats(&self) -> &Stats {
        &self.data.stats
    }

    pub fn sync(&self) -> &SyncClient {
        &self.sync
    }

    pub fn persistence(&self) -> &Persistence<K> {
        &self.persistence
    }

    /// Take the last persistence failure, if any.
    pub fn take_save_error(&mut self) -> Option<StoreError> {
        self.save_error.take()
    }

    /// Record a diary entry. The newest diary comes first and earns a dog.
    pub fn save_diary(&mut self, content: &str) -> Result<Vec<FarmEvent>, JournalError> {
        let content = non_blank(content)?;
        let reward = PetKind::Dog.random_breed(&mut self.rng);
        let events = self.write_diary(content.to_string(), reward);
        self.persist();
        Ok(events)
    }

    /// Remove a diary together with the newest pet of its reward breed.
    pub fn delete_diary(&mut self, id: &str) -> Result<Vec<FarmEvent>, JournalError> {
        let pos = self
            .data
            .diaries
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| JournalError::DiaryNotFound(id.to_string()))?;
        let diary = self.data.diaries.remove(pos);

        let mut events = Vec::new();
        if let Some(reward) = diary.pet_reward {
            events.extend(self.release_latest(|p| p.breed == Some(reward)));
        }
        self.data.stats.total_diaries = self.data.diaries.len() as u32;
        self.sync.delete_diary(&diary.id);
        log::info!("deleted diary {}", diary.id);

        self.persist();
        Ok(events)
    }

    pub fn add_note(&mut self, content: &str) -> Result<Note, JournalError> {
        let content = non_blank(content)?;
        let note = Note::new(new_id(), content.to_string());
        self.data.notes.push(note.clone());
        self.sync.save_note(&note);
        log::info!("added note {}", note.id);
        self.persist();
        Ok(note)
    }

    /// Drop a note and give back the newest cat.
    pub fn delete_note(&mut self, id: &str) -> Result<Vec<FarmEvent>, JournalError> {
        let note = self.take_note(id)?;
        let events: Vec<_> = self
            .release_latest(|p| p.kind() == Some(PetKind::Cat))
            .into_iter()
            .collect();
        log::info!("deleted note {}", note.id);
        self.persist();
        Ok(events)
    }

    /// Turn a note into a diary entry and earn a cat for it.
    pub fn complete_note(&mut self, id: &str) -> Result<Vec<FarmEvent>, JournalError> {
        let note = self.take_note(id)?;
        let content = format!("{NOTE_DONE_PREFIX} {}", note.content);
        let events = self.write_diary(content, Breed::Munchkin);
        log::info!("completed note {}", note.id);
        self.persist();
        Ok(events)
    }

    /// Adopt a pet of the given kind, or of a random kind.
    pub fn adopt_pet(&mut self, kind: Option<PetKind>) -> Vec<FarmEvent> {
        let kind = kind.unwrap_or_else(|| PetKind::random(&mut self.rng));
        let breed = kind.random_breed(&mut self.rng);
        let event = self.adopt(breed);
        self.persist();
        vec![event]
    }

    /// Pretty JSON of everything, for a backup file.
    pub fn export(&self) -> Result<String, JournalError> {
        Ok(store::export_bundle(&self.data)?)
    }

    /// Replace the whole farm with a backup.
    ///
    /// Every current pet is released and every imported pet adopted, so
    /// the caller can rebuild its agents from the events.
    pub fn import(&mut self, json: &str) -> Result<Vec<FarmEvent>, JournalError> {
        let imported = self.persistence.import_bundle(json, &self.data.stats)?;
        let old = std::mem::replace(&mut self.data, imported);

        let mut events: Vec<_> = old
            .pets
            .into_iter()
            .map(|p| FarmEvent::PetReleased(p.id))
            .collect();
        events.extend(self.data.pets.iter().cloned().map(FarmEvent::PetAdopted));
        Ok(events)
    }

    /// Retry uploading diaries the remote rejected earlier.
    pub fn push_pending(&mut self) -> usize {
        self.sync.push_pending()
    }

    fn write_diary(&mut self, content: String, reward: Breed) -> Vec<FarmEvent> {
        let now = Utc::now();
        let diary = Diary::new(new_id(), content, now, reward);
        self.sync.save_diary(&diary);
        log::info!("saved diary {} (reward: {})", diary.id, reward);
        self.data.diaries.insert(0, diary);
        self.data.stats.total_diaries += 1;
        self.data.stats.last_entry_date = Some(now.date_naive());
        vec![self.adopt(reward)]
    }

    fn adopt(&mut self, breed: Breed) -> FarmEvent {
        let pet = Pet::new(new_id(), breed, Utc::now());
        match breed.kind() {
            PetKind::Dog => self.data.stats.dogs += 1,
            PetKind::Cat => self.data.stats.cats += 1,
        }
        self.sync.save_pet(&pet);
        log::info!("adopted {} {}", breed.display_name(), pet.id);
        self.data.pets.push(pet.clone());
        FarmEvent::PetAdopted(pet)
    }

    /// Remove the most recently adopted pet matching `pred`.
    fn release_latest(&mut self, pred: impl Fn(&Pet) -> bool) -> Option<FarmEvent> {
        let pos = self.data.pets.iter().rposition(pred)?;
        let pet = self.data.pets.remove(pos);
        match pet.kind() {
            Some(PetKind::Dog) => self.data.stats.dogs = self.data.stats.dogs.saturating_sub(1),
            Some(PetKind::Cat) => self.data.stats.cats = self.data.stats.cats.saturating_sub(1),
            None => {}
        }
        self.sync.delete_pet(&pet.id);
        log::info!("released pet {}", pet.id);
        Some(FarmEvent::PetReleased(pet.id))
    }

    fn take_note(&mut self, id: &str) -> Result<Note, JournalError> {
        let pos = self
            .data
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| JournalError::NoteNotFound(id.to_string()))?;
        let note = self.data.notes.remove(pos);
        self.sync.delete_note(&note.id);
        Ok(note)
    }

    fn persist(&mut self) {
        match self.persistence.save(&self.data) {
            Ok(()) => {}
            // Already logged as a warning; in-memory state stays authoritative.
            Err(e @ StoreError::DataLossGuard { .. }) => self.save_error = Some(e),
            Err(e) => {
                log::error!("saving farm failed: {e}");
                self.save_error = Some(e);
            }
        }
    }
}

fn non_blank(content: &str) -> Result<&str, JournalError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(JournalError::EmptyContent)
    } else {
        Ok(trimmed)
    }
}

/// Time-ordered record id.
fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
