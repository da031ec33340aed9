//! Persisted records. Field names follow the exported JSON bundle, which is
//! camelCase and versionless, so older saves must keep loading.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::pet::{Breed, PetKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PetKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<Breed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    /// Fields this version does not understand, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pet {
    pub fn new(id: String, breed: Breed, added_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: Some(breed.kind()),
            breed: Some(breed),
            added_at: Some(added_at),
            extra: Map::new(),
        }
    }

    /// Breed to build the agent with. Unknown or missing breeds become a shiba.
    pub fn visual_breed(&self) -> Breed {
        self.breed.unwrap_or(Breed::FALLBACK)
    }

    pub fn kind(&self) -> Option<PetKind> {
        self.kind.or_else(|| self.breed.map(Breed::kind))
    }
}

impl<'de> Deserialize<'de> for Pet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::deserialize(deserializer)?;
        Ok(Self {
            id: take_id(&mut extra).map_err(de::Error::custom)?,
            kind: take_parsed(&mut extra, "type"),
            breed: take_parsed(&mut extra, "breed"),
            added_at: take_parsed(&mut extra, "addedAt"),
            extra,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    pub fn new(id: String, content: String) -> Self {
        Self {
            id,
            content,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diary {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_reward: Option<Breed>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Diary {
    pub fn new(id: String, content: String, created_at: DateTime<Utc>, pet_reward: Breed) -> Self {
        Self {
            id,
            content,
            created_at: Some(created_at),
            pet_reward: Some(pet_reward),
            extra: Map::new(),
        }
    }
}

impl<'de> Deserialize<'de> for Diary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::deserialize(deserializer)?;
        Ok(Self {
            id: take_id(&mut extra).map_err(de::Error::custom)?,
            content: match extra.remove("content") {
                Some(Value::String(s)) => s,
                _ => String::new(),
            },
            created_at: take_parsed(&mut extra, "createdAt"),
            pet_reward: take_parsed(&mut extra, "petReward"),
            extra,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub dogs: u32,
    pub cats: u32,
    pub total_diaries: u32,
    #[serde(deserialize_with = "lenient")]
    pub last_entry_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Everything the farm persists. Also the shape of the export bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmData {
    pub pets: Vec<Pet>,
    pub notes: Vec<Note>,
    pub diaries: Vec<Diary>,
    pub stats: Stats,
}

impl FarmData {
    /// Make the counters agree with the collections.
    pub fn reconcile_stats(&mut self) {
        self.stats.dogs = self.count(PetKind::Dog);
        self.stats.cats = self.count(PetKind::Cat);
        self.stats.total_diaries = self.diaries.len() as u32;
    }

    pub fn count(&self, kind: PetKind) -> u32 {
        self.pets.iter().filter(|p| p.kind() == Some(kind)).count() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.pets.is_empty() && self.diaries.is_empty()
    }
}

/// Parse a string field, treating anything unrecognized as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

/// Ids were millisecond timestamps in some saves; accept numbers too.
fn id_from(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("invalid id: {other}")),
    }
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_from(Value::deserialize(deserializer)?).map_err(de::Error::custom)
}

fn take_id(fields: &mut Map<String, Value>) -> Result<String, String> {
    let value = fields.remove("id").ok_or("missing id")?;
    id_from(value)
}

/// Remove `key` when its value is a string that parses. Anything else stays
/// in `fields` so it is saved back as it was found.
fn take_parsed<T: FromStr>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    let parsed = fields.get(key)?.as_str()?.parse().ok()?;
    fields.remove(key);
    Some(parsed)
}
