//! File-backed storage
//!
//! The journal mirror kept on device: one JSON file holds the full entry
//! array (tombstones included) and is rewritten on every mutation. Settings
//! live as one file per key under a `settings/` prefix, disjoint from the
//! entries blob. Parse failures on read are logged and degrade to an empty
//! collection instead of failing the caller.
//!
//! Entry operations are single-tenant: the store belongs to whoever owns
//! the data directory, so the owner ID passed by callers is not used for
//! partitioning.

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::naive::NaiveDate;
use chrono::Utc;
use percent_encoding::utf8_percent_encode;
use percent_encoding::NON_ALPHANUMERIC;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entries::Entry;
use crate::profiles::UserProfile;
use crate::users::User;

use super::CreateProfileValues;
use super::CreateUserValues;
use super::Error;
use super::Result;
use super::Storage;
use super::UpdateProfileValues;

/// File holding the serialized entry array
const ENTRIES_FILE: &str = "entries.json";

/// File holding the user accounts of this device
const USERS_FILE: &str = "users.json";

/// File holding the user profiles of this device
const PROFILES_FILE: &str = "profiles.json";

/// Directory holding one file per setting key
const SETTINGS_DIR: &str = "settings";

/// Everything the store keeps in memory between writes
#[derive(Default)]
struct State {
    users: Vec<User>,
    profiles: Vec<UserProfile>,

    /// Newest first; tombstoned entries stay in the list
    entries: Vec<Entry>,
}

/// A file-backed storage rooted at a data directory
#[derive(Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
    state: Arc<Mutex<State>>,
}

impl LocalStore {
    /// Open (or initialize) a store at the given directory
    pub async fn open(data_dir: PathBuf) -> Self {
        fs::create_dir_all(&data_dir)
            .await
            .expect("Writable data directory");

        let state = State {
            users: read_or_default(&data_dir.join(USERS_FILE)).await,
            profiles: read_or_default(&data_dir.join(PROFILES_FILE)).await,
            entries: read_or_default(&data_dir.join(ENTRIES_FILE)).await,
        };

        Self {
            data_dir,
            state: Arc::new(Mutex::new(state)),
        }
    }

    async fn persist_users(&self, state: &State) -> Result<()> {
        write_json(&self.data_dir.join(USERS_FILE), &state.users).await
    }

    async fn persist_profiles(&self, state: &State) -> Result<()> {
        write_json(&self.data_dir.join(PROFILES_FILE), &state.profiles).await
    }

    async fn persist_entries(&self, state: &State) -> Result<()> {
        write_json(&self.data_dir.join(ENTRIES_FILE), &state.entries).await
    }

    fn setting_path(&self, key: &str) -> PathBuf {
        let file_name = utf8_percent_encode(key, NON_ALPHANUMERIC).to_string();

        self.data_dir.join(SETTINGS_DIR).join(file_name)
    }
}

#[async_trait]
impl Storage for LocalStore {
    async fn find_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|user| &user.id == id && !user.is_deleted())
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|user| user.email == email && !user.is_deleted())
            .cloned())
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let now = Utc::now().naive_utc();

        let user = User {
            id: Uuid::new_v4(),
            session_id: *values.session_id,
            email: values.email.to_string(),
            hashed_password: values.hashed_password.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let mut state = self.state.lock().await;
        state.users.push(user.clone());
        self.persist_users(&state).await?;

        Ok(user)
    }

    async fn find_profile(&self, id: &Uuid) -> Result<Option<UserProfile>> {
        Ok(self
            .state
            .lock()
            .await
            .profiles
            .iter()
            .find(|profile| &profile.id == id)
            .cloned())
    }

    async fn create_profile(&self, values: &CreateProfileValues<'_>) -> Result<UserProfile> {
        let now = Utc::now().naive_utc();

        let profile = UserProfile {
            id: *values.id,
            email: values.email.map(ToString::to_string),
            display_name: values.display_name.map(ToString::to_string),
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock().await;
        state.profiles.push(profile.clone());
        self.persist_profiles(&state).await?;

        Ok(profile)
    }

    async fn update_profile(
        &self,
        id: &Uuid,
        values: &UpdateProfileValues<'_>,
    ) -> Result<UserProfile> {
        let mut state = self.state.lock().await;

        let profile = state
            .profiles
            .iter_mut()
            .find(|profile| &profile.id == id)
            .expect("Profile store is the source of the profile");

        if let Some(display_name) = values.display_name {
            profile.display_name = Some(display_name.to_string());
        }

        if let Some(bio) = values.bio {
            profile.bio = Some(bio.to_string());
        }

        if let Some(avatar_url) = values.avatar_url {
            profile.avatar_url = Some(avatar_url.to_string());
        }

        profile.updated_at = Utc::now().naive_utc();

        let updated = profile.clone();
        self.persist_profiles(&state).await?;

        Ok(updated)
    }

    async fn list_entries(&self, _owner: &Uuid) -> Result<Vec<Entry>> {
        let state = self.state.lock().await;

        Ok(live_sorted(&state.entries, |_| true))
    }

    async fn find_entry(&self, _owner: &Uuid, id: &Uuid) -> Result<Option<Entry>> {
        Ok(self
            .state
            .lock()
            .await
            .entries
            .iter()
            .find(|entry| &entry.id == id && !entry.is_deleted())
            .cloned())
    }

    async fn upsert_entry(&self, _owner: &Uuid, entry: &Entry) -> Result<Entry> {
        let mut state = self.state.lock().await;

        match state.entries.iter().position(|stored| stored.id == entry.id) {
            Some(index) => state.entries[index] = entry.clone(),
            None => state.entries.insert(0, entry.clone()),
        }

        self.persist_entries(&state).await?;

        Ok(entry.clone())
    }

    async fn tombstone_entry(&self, _owner: &Uuid, id: &Uuid) -> Result<()> {
        let mut state = self.state.lock().await;

        let Some(entry) = state.entries.iter_mut().find(|entry| &entry.id == id) else {
            return Ok(());
        };

        entry.deleted = true;
        entry.updated_at = Utc::now().naive_utc();

        self.persist_entries(&state).await
    }

    async fn list_entries_by_date_range(
        &self,
        _owner: &Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>> {
        let state = self.state.lock().await;

        Ok(live_sorted(&state.entries, |entry| {
            start <= entry.date && entry.date <= end
        }))
    }

    async fn search_entries(&self, _owner: &Uuid, query: &str) -> Result<Vec<Entry>> {
        let needle = query.to_lowercase();
        let state = self.state.lock().await;

        Ok(live_sorted(&state.entries, |entry| {
            let in_title = entry
                .title
                .as_ref()
                .is_some_and(|title| title.to_lowercase().contains(&needle));
            let in_body = entry
                .body
                .as_ref()
                .is_some_and(|body| body.to_lowercase().contains(&needle));
            // tag names are normalized to lowercase on the way in
            let in_tags = entry.tags.iter().any(|tag| tag.name.contains(&needle));

            in_title || in_body || in_tags
        }))
    }

    async fn get_setting(&self, _owner: &Uuid, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.setting_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err.to_string())),
        }
    }

    async fn set_setting(&self, _owner: &Uuid, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(self.data_dir.join(SETTINGS_DIR))
            .await
            .map_err(|err| Error::Io(err.to_string()))?;

        fs::write(self.setting_path(key), value)
            .await
            .map_err(|err| Error::Io(err.to_string()))
    }
}

/// Live entries matching the filter, ordered date descending with creation
/// instant breaking ties
fn live_sorted<F>(entries: &[Entry], filter: F) -> Vec<Entry>
where
    F: Fn(&Entry) -> bool,
{
    let mut matched = entries
        .iter()
        .filter(|entry| !entry.is_deleted() && filter(entry))
        .cloned()
        .collect::<Vec<Entry>>();

    matched.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    matched
}

/// Read a JSON file, falling back to the default on a missing file or a
/// parse failure
async fn read_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            tracing::error!("Failed to parse {}: {err}", path.display());
            T::default()
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => T::default(),
        Err(err) => {
            tracing::error!("Failed to read {}: {err}", path.display());
            T::default()
        }
    }
}

/// Serialize a value and rewrite the file holding it
async fn write_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    let bytes = serde_json::to_vec(value).map_err(|err| Error::Data(err.to_string()))?;

    fs::write(path, bytes)
        .await
        .map_err(|err| Error::Io(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn entry_on(date: &str, title: &str) -> Entry {
        let date = date.parse::<NaiveDate>().unwrap();

        Entry {
            id: Uuid::new_v4(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
            date,
            title: Some(title.to_string()),
            body: None,
            mood: None,
            tags: Vec::new(),
            photo_uris: Vec::new(),
            has_photos: false,
            location_data: None,
            audio_uri: None,
            transcription: None,
            deleted: false,
        }
    }

    #[tokio::test]
    async fn test_add_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().to_path_buf()).await;
        let owner = Uuid::new_v4();

        let entry = entry_on("2025-03-10", "Round trip");
        let stored = store.upsert_entry(&owner, &entry).await.unwrap();
        assert_eq!(entry, stored);

        let found = store.find_entry(&owner, &entry.id).await.unwrap();
        assert_eq!(Some(entry), found);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let owner = Uuid::new_v4();
        let entry = entry_on("2025-03-10", "Persistent");

        {
            let store = LocalStore::open(dir.path().to_path_buf()).await;
            store.upsert_entry(&owner, &entry).await.unwrap();
        }

        let store = LocalStore::open(dir.path().to_path_buf()).await;
        let entries = store.list_entries(&owner).await.unwrap();

        assert_eq!(vec![entry], entries);
    }

    #[tokio::test]
    async fn test_tombstone_hides_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().to_path_buf()).await;
        let owner = Uuid::new_v4();

        let entry = entry_on("2025-03-10", "Short lived");
        store.upsert_entry(&owner, &entry).await.unwrap();

        store.tombstone_entry(&owner, &entry.id).await.unwrap();
        store.tombstone_entry(&owner, &entry.id).await.unwrap();

        assert!(store.list_entries(&owner).await.unwrap().is_empty());
        assert_eq!(None, store.find_entry(&owner, &entry.id).await.unwrap());

        // unknown IDs are ignored as well
        store.tombstone_entry(&owner, &Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_orders_by_date_then_creation() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().to_path_buf()).await;
        let owner = Uuid::new_v4();

        let mut old = entry_on("2025-03-01", "Backdated");
        old.created_at = "2025-03-20T10:00:00"
            .parse::<NaiveDateTime>()
            .unwrap();

        let mut recent = entry_on("2025-03-15", "Recent");
        recent.created_at = "2025-03-15T08:00:00"
            .parse::<NaiveDateTime>()
            .unwrap();

        store.upsert_entry(&owner, &old).await.unwrap();
        store.upsert_entry(&owner, &recent).await.unwrap();

        let titles = store
            .list_entries(&owner)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.title.unwrap())
            .collect::<Vec<String>>();

        assert_eq!(vec!["Recent".to_string(), "Backdated".to_string()], titles);
    }

    #[tokio::test]
    async fn test_range_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().to_path_buf()).await;
        let owner = Uuid::new_v4();

        let mut first = entry_on("2025-03-10", "Gym session");
        first.tags = vec![crate::tags::normalize_tag("fitness")];
        let second = entry_on("2025-03-20", "Quiet evening");

        store.upsert_entry(&owner, &first).await.unwrap();
        store.upsert_entry(&owner, &second).await.unwrap();

        let range = store
            .list_entries_by_date_range(
                &owner,
                "2025-03-01".parse().unwrap(),
                "2025-03-15".parse().unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(vec![first.clone()], range);

        let by_title = store.search_entries(&owner, "GYM").await.unwrap();
        assert_eq!(vec![first.clone()], by_title);

        let by_tag = store.search_entries(&owner, "fitness").await.unwrap();
        assert_eq!(vec![first], by_tag);

        let nothing = store.search_entries(&owner, "missing").await.unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_entries_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ENTRIES_FILE), b"{ not json").unwrap();

        let store = LocalStore::open(dir.path().to_path_buf()).await;
        let entries = store.list_entries(&Uuid::new_v4()).await.unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().to_path_buf()).await;
        let owner = Uuid::new_v4();

        assert_eq!(None, store.get_setting(&owner, "theme").await.unwrap());

        store.set_setting(&owner, "theme", "dark").await.unwrap();
        assert_eq!(
            Some("dark".to_string()),
            store.get_setting(&owner, "theme").await.unwrap()
        );

        // keys with separators land in distinct, escaped files
        store
            .set_setting(&owner, "export/format", "markdown")
            .await
            .unwrap();
        assert_eq!(
            Some("markdown".to_string()),
            store.get_setting(&owner, "export/format").await.unwrap()
        );
    }
}
