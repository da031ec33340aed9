//! Optional mirroring of records to a remote database.
//!
//! The farm is fully functional without it. Every remote failure is logged
//! and the caller carries on with its local copy.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::journal::records::{Diary, Note, Pet};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("remote rejected request: {0}")]
    Rejected(String),
}

/// Remote record collections. Saves return the remote key of the record.
pub trait RemoteSync {
    fn save_pet(&mut self, pet: &Pet) -> Result<String, SyncError>;
    fn save_diary(&mut self, diary: &Diary) -> Result<String, SyncError>;
    fn save_note(&mut self, note: &Note) -> Result<String, SyncError>;

    fn all_pets(&self) -> Result<Vec<Pet>, SyncError>;
    fn all_diaries(&self) -> Result<Vec<Diary>, SyncError>;
    fn all_notes(&self) -> Result<Vec<Note>, SyncError>;

    fn delete_pet(&mut self, id: &str) -> Result<(), SyncError>;
    fn delete_diary(&mut self, id: &str) -> Result<(), SyncError>;
    fn delete_note(&mut self, id: &str) -> Result<(), SyncError>;
}

/// Front for an optional remote that never fails the caller.
#[derive(Default)]
pub struct SyncClient {
    remote: Option<Box<dyn RemoteSync>>,
    /// Diaries whose upload failed, kept for a later [`SyncClient::push_pending`].
    pending_diaries: Vec<Diary>,
}

impl SyncClient {
    /// Local-only mode.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn with_remote(remote: Box<dyn RemoteSync>) -> Self {
        Self {
            remote: Some(remote),
            pending_diaries: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.remote.is_some()
    }

    pub fn pending_diaries(&self) -> &[Diary] {
        &self.pending_diaries
    }

    pub fn save_pet(&mut self, pet: &Pet) -> Option<String> {
        let remote = self.remote.as_mut()?;
        log_failure("save pet", remote.save_pet(pet))
    }

    pub fn save_diary(&mut self, diary: &Diary) -> Option<String> {
        let remote = self.remote.as_mut()?;
        let key = log_failure("save diary", remote.save_diary(diary));
        if key.is_none() {
            self.pending_diaries.push(diary.clone());
        }
        key
    }

    pub fn save_note(&mut self, note: &Note) -> Option<String> {
        let remote = self.remote.as_mut()?;
        log_failure("save note", remote.save_note(note))
    }

    pub fn delete_pet(&mut self, id: &str) {
        if let Some(remote) = self.remote.as_mut() {
            log_failure("delete pet", remote.delete_pet(id));
        }
    }

    pub fn delete_diary(&mut self, id: &str) {
        self.pending_diaries.retain(|d| d.id != id);
        if let Some(remote) = self.remote.as_mut() {
            log_failure("delete diary", remote.delete_diary(id));
        }
    }

    pub fn delete_note(&mut self, id: &str) {
        if let Some(remote) = self.remote.as_mut() {
            log_failure("delete note", remote.delete_note(id));
        }
    }

    /// Remote pets, or the local copy if the remote is absent or failing.
    pub fn pets(&self, local: &[Pet]) -> Vec<Pet> {
        self.read("pets", local, |r| r.all_pets())
    }

    pub fn diaries(&self, local: &[Diary]) -> Vec<Diary> {
        self.read("diaries", local, |r| r.all_diaries())
    }

    pub fn notes(&self, local: &[Note]) -> Vec<Note> {
        self.read("notes", local, |r| r.all_notes())
    }

    /// Upload diaries that failed earlier. Returns how many went through.
    pub fn push_pending(&mut self) -> usize {
        let Some(remote) = self.remote.as_mut() else {
            return 0;
        };
        let before = self.pending_diaries.len();
        self.pending_diaries
            .retain(|diary| log_failure("upload pending diary", remote.save_diary(diary)).is_none());
        let pushed = before - self.pending_diaries.len();
        if pushed > 0 {
            log::info!("uploaded {pushed} pending diaries");
        }
        pushed
    }

    fn read<T: Clone>(
        &self,
        what: &str,
        local: &[T],
        fetch: impl FnOnce(&dyn RemoteSync) -> Result<Vec<T>, SyncError>,
    ) -> Vec<T> {
        match &self.remote {
            Some(remote) => match fetch(&**remote) {
                Ok(list) => list,
                Err(e) => {
                    log::error!("fetching {what} failed, using local copy: {e}");
                    local.to_vec()
                }
            },
            None => local.to_vec(),
        }
    }
}

fn log_failure<T>(what: &str, result: Result<T, SyncError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            log::error!("{what} failed, keeping local copy only: {e}");
            None
        }
    }
}

/// In-process remote keyed by record id. `set_online(false)` simulates an outage.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    online: bool,
    pets: BTreeMap<String, Pet>,
    diaries: BTreeMap<String, Diary>,
    notes: BTreeMap<String, Note>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self {
            online: true,
            pets: BTreeMap::new(),
            diaries: BTreeMap::new(),
            notes: BTreeMap::new(),
        }
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    fn check(&self) -> Result<(), SyncError> {
        if self.online {
            Ok(())
        } else {
            Err(SyncError::Unavailable("offline".into()))
        }
    }
}

impl RemoteSync for MemoryRemote {
    fn save_pet(&mut self, pet: &Pet) -> Result<String, SyncError> {
        self.check()?;
        self.pets.insert(pet.id.clone(), pet.clone());
        Ok(pet.id.clone())
    }

    fn save_diary(&mut self, diary: &Diary) -> Result<String, SyncError> {
        self.check()?;
        self.diaries.insert(diary.id.clone(), diary.clone());
        Ok(diary.id.clone())
    }

    fn save_note(&mut self, note: &Note) -> Result<String, SyncError> {
        self.check()?;
        self.notes.insert(note.id.clone(), note.clone());
        Ok(note.id.clone())
    }

    fn all_pets(&self) -> Result<Vec<Pet>, SyncError> {
        self.check()?;
        Ok(self.pets.values().cloned().collect())
    }

    fn all_diaries(&self) -> Result<Vec<Diary>, SyncError> {
        self.check()?;
        Ok(self.diaries.values().cloned().collect())
    }

    fn all_notes(&self) -> Result<Vec<Note>, SyncError> {
        self.check()?;
        Ok(self.notes.values().cloned().collect())
    }

    fn delete_pet(&mut self, id: &str) -> Result<(), SyncError> {
        self.check()?;
        self.pets.remove(id);
        Ok(())
    }

    fn delete_diary(&mut self, id: &str) -> Result<(), SyncError> {
        self.check()?;
        self.diaries.remove(id);
        Ok(())
    }

    fn delete_note(&mut self, id: &str) -> Result<(), SyncError> {
        self.check()?;
        self.notes.remove(id);
        Ok(())
    }
}
