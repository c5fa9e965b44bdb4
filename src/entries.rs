//! The journal entry model
//!
//! An entry is never physically removed; `deleted` is a tombstone and every
//! listing operation filters it out.

use chrono::naive::NaiveDate;
use chrono::naive::NaiveDateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// One journal record
///
/// Serialized with camelCase keys; the same encoding is used for the local
/// mirror file and for the `payload` column of the Postgres backend.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Entry ID, immutable after creation
    pub id: Uuid,

    /// Creation instant, set once
    pub created_at: NaiveDateTime,

    /// Refreshed on every mutation
    pub updated_at: NaiveDateTime,

    /// Calendar date used for grouping and filtering
    ///
    /// Independent of `created_at`; entries can be backdated
    pub date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Ordinal sentiment scale, 1 through 5; absent means "not set"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<i16>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub photo_uris: Vec<String>,

    /// Mirror of `!photo_uris.is_empty()`, kept so backends can filter
    /// without deserializing the full record
    #[serde(default)]
    pub has_photos: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_data: Option<LocationData>,

    /// Original recording, retained after its transcription is merged into
    /// the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,

    /// Tombstone flag
    #[serde(default)]
    pub deleted: bool,
}

impl Entry {
    /// Is the entry tombstoned?
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// A normalized tag
///
/// The ID derives from the name (UUIDv5), so the same text yields the same
/// tag everywhere; see [`crate::tags::normalize_tag`]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// Place/address/coordinate snapshot captured at entry creation
///
/// Never re-resolved afterwards
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<Place>,

    /// GPS accuracy in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub formatted_address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

/// Input for a new entry; everything not supplied gets a default on create
#[derive(Debug, Default)]
pub struct NewEntry {
    pub id: Option<Uuid>,
    pub created_at: Option<NaiveDateTime>,
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub mood: Option<i16>,
    pub tags: Vec<Tag>,
    pub photo_uris: Vec<String>,
    pub has_photos: Option<bool>,
    pub location_data: Option<LocationData>,
    pub audio_uri: Option<String>,
    pub transcription: Option<String>,
}

/// Partial update for an existing entry
///
/// A field that is absent leaves the stored value unchanged; clearing a set
/// field is not supported.
#[derive(Debug, Default)]
pub struct EntryPatch {
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub mood: Option<i16>,
    pub tags: Option<Vec<Tag>>,
    pub photo_uris: Option<Vec<String>>,
    pub location_data: Option<LocationData>,
    pub audio_uri: Option<String>,
    pub transcription: Option<String>,
}

impl EntryPatch {
    /// Merge the patch over an existing entry
    ///
    /// `id` and `created_at` survive untouched regardless of the patch;
    /// `updated_at` is always refreshed; `has_photos` is recomputed only
    /// when the patch carries `photo_uris`.
    pub fn apply_to(self, current: Entry) -> Entry {
        let mut entry = current;

        if let Some(date) = self.date {
            entry.date = date;
        }

        if let Some(title) = self.title {
            entry.title = non_empty(title);
        }

        if let Some(body) = self.body {
            entry.body = non_empty(body);
        }

        if let Some(mood) = self.mood {
            entry.mood = Some(mood);
        }

        if let Some(tags) = self.tags {
            entry.tags = tags;
        }

        if let Some(photo_uris) = self.photo_uris {
            entry.has_photos = !photo_uris.is_empty();
            entry.photo_uris = photo_uris;
        }

        if let Some(location_data) = self.location_data {
            entry.location_data = Some(location_data);
        }

        if let Some(audio_uri) = self.audio_uri {
            entry.audio_uri = Some(audio_uri);
        }

        if let Some(transcription) = self.transcription {
            entry.transcription = Some(transcription);
        }

        entry.updated_at = Utc::now().naive_utc();

        entry
    }
}

/// Trim free text, dropping it entirely when nothing remains
pub fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Is a mood score on the 1-5 scale?
pub fn is_valid_mood(mood: i16) -> bool {
    (1..=5).contains(&mood)
}
