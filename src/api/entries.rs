//! Journal entry endpoints
//!
//! The HTTP face of the entries service: CRUD, range and substring
//! queries, calendar grouping and statistics. Everything is scoped to the
//! requesting user.

use std::collections::BTreeMap;

use axum::Extension;
use chrono::naive::NaiveDate;
use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::dates;
use crate::entries::is_valid_mood;
use crate::entries::Entry;
use crate::entries::EntryPatch;
use crate::entries::LocationData;
use crate::entries::NewEntry;
use crate::entries::Tag;
use crate::service;
use crate::service::JournalStats;
use crate::storage::Storage;
use crate::tags::normalize_tag;
use crate::tags::parse_tags;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::QueryParameters;
use super::Success;

/// Photos allowed on a single entry
///
/// An edit-layer rule; the stores accept any number.
const MAX_PHOTOS: usize = 5;

/// The entry response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub date: NaiveDate,
    pub title: Option<String>,
    pub body: Option<String>,
    pub mood: Option<i16>,
    pub tags: Vec<Tag>,
    pub photo_uris: Vec<String>,
    pub has_photos: bool,
    pub location_data: Option<LocationData>,
    pub audio_uri: Option<String>,
    pub transcription: Option<String>,
}

impl EntryResponse {
    /// Create an entry response from an [`Entry`](Entry)
    fn from_entry(entry: Entry) -> Self {
        Self {
            id: entry.id,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            date: entry.date,
            title: entry.title,
            body: entry.body,
            mood: entry.mood,
            tags: entry.tags,
            photo_uris: entry.photo_uris,
            has_photos: entry.has_photos,
            location_data: entry.location_data,
            audio_uri: entry.audio_uri,
            transcription: entry.transcription,
        }
    }

    /// Create entry responses from multiple [`Entry`](Entry)s
    fn from_entry_multiple(mut entries: Vec<Entry>) -> Vec<Self> {
        entries
            .drain(..)
            .map(Self::from_entry)
            .collect::<Vec<Self>>()
    }
}

/// List all live entries of the caller
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<EntryResponse>>, Error> {
    let entries = service::list_entries(&storage, &current_user.id).await?;

    Ok(Success::ok(EntryResponse::from_entry_multiple(entries)))
}

/// Get a single entry
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(entry_id): PathParameters<Uuid>,
) -> Result<Success<EntryResponse>, Error> {
    let entry = service::get_entry(&storage, &current_user.id, &entry_id).await?;

    entry.map_or_else(
        || Err(Error::not_found("Entry not found")),
        |entry| Ok(Success::ok(EntryResponse::from_entry(entry))),
    )
}

/// Create entry form
///
/// Everything is optional; defaults follow the entries service. An `id`
/// may be supplied for records composed offline, making the create an
/// upsert.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryForm {
    id: Option<Uuid>,
    created_at: Option<NaiveDateTime>,
    date: Option<NaiveDate>,
    title: Option<String>,
    body: Option<String>,
    mood: Option<i16>,
    tags: Option<Vec<String>>,
    photo_uris: Option<Vec<String>>,
    has_photos: Option<bool>,
    location_data: Option<LocationData>,
    audio_uri: Option<String>,
    transcription: Option<String>,
}

impl CreateEntryForm {
    fn into_new_entry(self) -> Result<NewEntry, Error> {
        let photo_uris = self.photo_uris.unwrap_or_default();

        Ok(NewEntry {
            id: self.id,
            created_at: self.created_at,
            date: self.date,
            title: self.title,
            body: self.body,
            mood: validate_mood(self.mood)?,
            tags: normalize_tags(self.tags.unwrap_or_default()),
            photo_uris: validate_photo_uris(photo_uris)?,
            has_photos: self.has_photos,
            location_data: self.location_data,
            audio_uri: self.audio_uri,
            transcription: self.transcription,
        })
    }
}

/// Create an entry
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "body": "Long walk before breakfast", "mood": 4, "tags": ["fitness"] }' \
///     http://localhost:6600/api/entries
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Form(form): Form<CreateEntryForm>,
) -> Result<Success<EntryResponse>, Error> {
    let input = form.into_new_entry()?;

    let entry = service::create_entry(&storage, &current_user.id, input).await?;

    Ok(Success::created(EntryResponse::from_entry(entry)))
}

/// Update entry form
///
/// Absent fields keep their stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryForm {
    date: Option<NaiveDate>,
    title: Option<String>,
    body: Option<String>,
    mood: Option<i16>,
    tags: Option<Vec<String>>,
    photo_uris: Option<Vec<String>>,
    location_data: Option<LocationData>,
    audio_uri: Option<String>,
    transcription: Option<String>,
}

impl UpdateEntryForm {
    fn into_patch(self) -> Result<EntryPatch, Error> {
        Ok(EntryPatch {
            date: self.date,
            title: self.title,
            body: self.body,
            mood: validate_mood(self.mood)?,
            tags: self.tags.map(normalize_tags),
            photo_uris: self.photo_uris.map(validate_photo_uris).transpose()?,
            location_data: self.location_data,
            audio_uri: self.audio_uri,
            transcription: self.transcription,
        })
    }
}

/// Patch an entry
pub async fn update<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(entry_id): PathParameters<Uuid>,
    Form(form): Form<UpdateEntryForm>,
) -> Result<Success<EntryResponse>, Error> {
    let patch = form.into_patch()?;

    let entry = service::update_entry(&storage, &current_user.id, &entry_id, patch).await?;

    entry.map_or_else(
        || Err(Error::not_found("Entry not found")),
        |entry| Ok(Success::ok(EntryResponse::from_entry(entry))),
    )
}

/// Tombstone an entry
///
/// Idempotent; an unknown ID also yields 204.
pub async fn delete<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(entry_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    service::delete_entry(&storage, &current_user.id, &entry_id).await?;

    Ok(Success::<&'static str>::no_content())
}

/// Date range query, both bounds `YYYY-MM-DD`
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    start: String,
    end: String,
}

/// List entries dated inside an inclusive range
pub async fn range<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    QueryParameters(query): QueryParameters<RangeQuery>,
) -> Result<Success<Vec<EntryResponse>>, Error> {
    let start = parse_date_parameter(&query.start)?;
    let end = parse_date_parameter(&query.end)?;

    let entries = service::list_by_date_range(&storage, &current_user.id, start, end).await?;

    Ok(Success::ok(EntryResponse::from_entry_multiple(entries)))
}

/// Parse a `YYYY-MM-DD` query value
fn parse_date_parameter(value: &str) -> Result<NaiveDate, Error> {
    dates::parse_date(value).ok_or_else(|| {
        Error::bad_request("Invalid date").with_description(format!("Not a YYYY-MM-DD date: {value}"))
    })
}

/// Search query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

/// Search entries by substring
///
/// Matches case-insensitively on title, body or tag name; a blank query
/// is the plain listing.
pub async fn search<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    QueryParameters(query): QueryParameters<SearchQuery>,
) -> Result<Success<Vec<EntryResponse>>, Error> {
    let entries = service::search_entries(
        &storage,
        &current_user.id,
        query.q.as_deref().unwrap_or_default(),
    )
    .await?;

    Ok(Success::ok(EntryResponse::from_entry_multiple(entries)))
}

/// Supported grouping buckets
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Day,
    Week,
    Month,
}

/// Grouping query
#[derive(Debug, Deserialize)]
pub struct GroupsQuery {
    by: GroupBy,
}

/// Group entries into calendar buckets
///
/// Keys are the bucket-start dates: the day itself, the Monday of the
/// week, or the first of the month.
pub async fn groups<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    QueryParameters(query): QueryParameters<GroupsQuery>,
) -> Result<Success<BTreeMap<String, Vec<EntryResponse>>>, Error> {
    let entries = service::list_entries(&storage, &current_user.id).await?;

    let grouped = match query.by {
        GroupBy::Day => service::group_entries_by_day(&entries),
        GroupBy::Week => service::group_entries_by_week(&entries),
        GroupBy::Month => service::group_entries_by_month(&entries),
    };

    let response = grouped
        .into_iter()
        .map(|(bucket, entries)| {
            (
                dates::format_date(bucket),
                EntryResponse::from_entry_multiple(entries),
            )
        })
        .collect();

    Ok(Success::ok(response))
}

/// Journal statistics
pub async fn stats<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
) -> Result<Success<JournalStats>, Error> {
    let entries = service::list_entries(&storage, &current_user.id).await?;

    Ok(Success::ok(service::journal_stats(&entries)))
}

/// Check a mood value against the 1-5 scale
fn validate_mood(mood: Option<i16>) -> Result<Option<i16>, Error> {
    match mood {
        Some(mood) if !is_valid_mood(mood) => {
            Err(Error::bad_request("Mood must be between 1 and 5"))
        }
        mood => Ok(mood),
    }
}

/// Enforce the photo cap
fn validate_photo_uris(photo_uris: Vec<String>) -> Result<Vec<String>, Error> {
    if photo_uris.len() > MAX_PHOTOS {
        Err(Error::bad_request(format!(
            "At most {MAX_PHOTOS} photos per entry"
        )))
    } else {
        Ok(photo_uris)
    }
}

/// Normalize raw tag strings into tags
///
/// Each input may carry several comma/whitespace separated tags, the way
/// the editor's tag field submits them; duplicates collapse, first
/// occurrence wins.
fn normalize_tags(raw: Vec<String>) -> Vec<Tag> {
    let mut tags: Vec<Tag> = Vec::new();

    for input in &raw {
        for name in parse_tags(input) {
            let tag = normalize_tag(&name);

            if !tags.iter().any(|seen| seen.name == tag.name) {
                tags.push(tag);
            }
        }
    }

    tags
}
