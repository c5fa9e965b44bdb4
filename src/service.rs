//! The entries service
//!
//! The façade every caller goes through: creation defaults, patch-merge
//! updates, tombstone deletes, reads, calendar bucketing and statistics.
//! Persistence is delegated to whichever [`Storage`](Storage) backend the
//! build selected; bucketing and stats are pure so they behave the same on
//! both.

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::naive::NaiveDate;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::dates;
use crate::entries::non_empty;
use crate::entries::Entry;
use crate::entries::EntryPatch;
use crate::entries::NewEntry;
use crate::storage;
use crate::storage::Storage;

/// Mood assumed for entries without one when averaging
///
/// A display-time default only; nothing is written back.
const ASSUMED_MOOD: i16 = 3;

/// How many top tags the statistics report
const TOP_TAG_COUNT: usize = 5;

/// Entries grouped under their bucket-start date
pub type GroupedEntries = BTreeMap<NaiveDate, Vec<Entry>>;

/// Create an entry from partial input
///
/// Everything not supplied gets its documented default: a fresh ID, the
/// current instant, today's date, empty tags, `has_photos` derived from
/// the photo list. The mood is stored exactly as given -- absent stays
/// absent. Returns the record as stored by the backend.
pub async fn create_entry<S: Storage>(
    storage: &S,
    owner: &Uuid,
    input: NewEntry,
) -> storage::Result<Entry> {
    let now = Utc::now().naive_utc();
    let photo_uris = input.photo_uris;

    let entry = Entry {
        id: input.id.unwrap_or_else(Uuid::new_v4),
        created_at: input.created_at.unwrap_or(now),
        updated_at: now,
        date: input.date.unwrap_or_else(dates::today),
        title: input.title.and_then(non_empty),
        body: input.body.and_then(non_empty),
        mood: input.mood,
        tags: input.tags,
        has_photos: input.has_photos.unwrap_or(!photo_uris.is_empty()),
        photo_uris,
        location_data: input.location_data,
        audio_uri: input.audio_uri,
        transcription: input.transcription,
        deleted: false,
    };

    storage.upsert_entry(owner, &entry).await
}

/// Patch an existing entry
///
/// Returns `None` when the ID does not exist for the owner. The merge
/// keeps `id` and `created_at`, refreshes `updated_at` and recomputes
/// `has_photos` only when the patch carries `photo_uris`.
pub async fn update_entry<S: Storage>(
    storage: &S,
    owner: &Uuid,
    id: &Uuid,
    patch: EntryPatch,
) -> storage::Result<Option<Entry>> {
    let Some(current) = storage.find_entry(owner, id).await? else {
        return Ok(None);
    };

    let merged = patch.apply_to(current);

    storage.upsert_entry(owner, &merged).await.map(Some)
}

/// Tombstone an entry
///
/// Idempotent, and silent about IDs that do not exist for the owner.
pub async fn delete_entry<S: Storage>(
    storage: &S,
    owner: &Uuid,
    id: &Uuid,
) -> storage::Result<()> {
    storage.tombstone_entry(owner, id).await
}

/// A single live entry
pub async fn get_entry<S: Storage>(
    storage: &S,
    owner: &Uuid,
    id: &Uuid,
) -> storage::Result<Option<Entry>> {
    storage.find_entry(owner, id).await
}

/// All live entries, date descending, creation instant breaking ties
pub async fn list_entries<S: Storage>(storage: &S, owner: &Uuid) -> storage::Result<Vec<Entry>> {
    storage.list_entries(owner).await
}

/// Live entries dated inside the inclusive range
pub async fn list_by_date_range<S: Storage>(
    storage: &S,
    owner: &Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> storage::Result<Vec<Entry>> {
    storage.list_entries_by_date_range(owner, start, end).await
}

/// Case-insensitive substring search over title, body and tag names
///
/// A blank query is the plain listing.
pub async fn search_entries<S: Storage>(
    storage: &S,
    owner: &Uuid,
    query: &str,
) -> storage::Result<Vec<Entry>> {
    let query = query.trim();

    if query.is_empty() {
        storage.list_entries(owner).await
    } else {
        storage.search_entries(owner, query).await
    }
}

/// Group entries under their calendar date
///
/// Buckets always key on the entry's `date`, so backdated entries land on
/// their displayed calendar position.
pub fn group_entries_by_day(entries: &[Entry]) -> GroupedEntries {
    group_by(entries, |entry| entry.date)
}

/// Group entries under the Monday starting their week
pub fn group_entries_by_week(entries: &[Entry]) -> GroupedEntries {
    group_by(entries, |entry| dates::start_of_week(entry.date))
}

/// Group entries under the first day of their month
pub fn group_entries_by_month(entries: &[Entry]) -> GroupedEntries {
    group_by(entries, |entry| dates::start_of_month(entry.date))
}

fn group_by<K>(entries: &[Entry], key: K) -> GroupedEntries
where
    K: Fn(&Entry) -> NaiveDate,
{
    let mut grouped = GroupedEntries::new();

    for entry in entries {
        grouped.entry(key(entry)).or_default().push(entry.clone());
    }

    grouped
}

/// Aggregate journal statistics
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalStats {
    pub total_entries: usize,

    /// Average mood rounded to one decimal; entries without a mood count
    /// as 3, an empty journal reports 0
    pub avg_mood: f64,

    /// The five most used tag names, most frequent first
    pub top_tags: Vec<String>,

    /// Distinct days journaled on
    pub total_days: usize,

    /// Consecutive days, counting back from today (or yesterday)
    pub current_streak: usize,

    /// Longest run of consecutive days ever
    pub longest_streak: usize,
}

/// Compute statistics over a list of live entries
pub fn journal_stats(entries: &[Entry]) -> JournalStats {
    let total_entries = entries.len();

    let avg_mood = if total_entries == 0 {
        0.0
    } else {
        let sum: i64 = entries
            .iter()
            .map(|entry| i64::from(entry.mood.unwrap_or(ASSUMED_MOOD)))
            .sum();

        round_to_tenth(sum as f64 / total_entries as f64)
    };

    let mut days = entries.iter().map(|entry| entry.date).collect::<Vec<NaiveDate>>();
    days.sort_unstable();
    days.dedup();

    // the streak only runs when the journal was touched today or yesterday
    let has_current_streak = days
        .last()
        .is_some_and(|last| dates::is_today(*last) || dates::is_yesterday(*last));

    let current_streak = if has_current_streak {
        trailing_run(&days)
    } else {
        0
    };

    JournalStats {
        total_entries,
        avg_mood,
        top_tags: top_tags(entries),
        total_days: days.len(),
        current_streak,
        longest_streak: longest_run(&days),
    }
}

/// The most used tag names, most frequent first, ties alphabetical
fn top_tags(entries: &[Entry]) -> Vec<String> {
    let mut tag_counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        for tag in &entry.tags {
            *tag_counts.entry(tag.name.as_str()).or_default() += 1;
        }
    }

    let mut counted = tag_counts.into_iter().collect::<Vec<(&str, usize)>>();
    counted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    counted
        .into_iter()
        .take(TOP_TAG_COUNT)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Longest run of consecutive days; input sorted ascending, deduplicated
fn longest_run(days: &[NaiveDate]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        current = match previous {
            Some(previous) if previous.succ_opt() == Some(*day) => current + 1,
            _ => 1,
        };

        longest = longest.max(current);
        previous = Some(*day);
    }

    longest
}

/// Length of the run ending at the most recent day; input sorted
/// ascending, deduplicated
fn trailing_run(days: &[NaiveDate]) -> usize {
    let mut run = 0;
    let mut expected: Option<NaiveDate> = None;

    for day in days.iter().rev() {
        match expected {
            Some(expected) if Some(expected) != day.succ_opt() => break,
            _ => {}
        }

        run += 1;
        expected = Some(*day);
    }

    run
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
