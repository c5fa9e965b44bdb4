//! Postgres storage
//!
//! One row per entry: the `payload` column holds the full serialized
//! record and is the source of truth; `entry_date`, `mood_score`,
//! `has_photos` and `location_data` duplicate payload fields so the
//! database can filter without touching the JSON, and `tombstoned` is the
//! soft-delete flag. Every entry read and write is scoped by `user_id`;
//! the database's own row-level policies are assumed as a second layer,
//! not reimplemented here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::naive::NaiveDate;
use chrono::naive::NaiveDateTime;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
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

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Columns every entry query selects
const ENTRY_COLUMNS: &str = "id, user_id, entry_date, mood_score, has_photos, \
     location_data, payload, created_at, updated_at, tombstoned";

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Uses the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    pub async fn new() -> Self {
        let database_connection_string = std::env::var("DATABASE_URL").expect("Valid DATABASE_URL");

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with an existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }
}

/// Postgres version of a user
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    session_id: Uuid,
    email: String,
    hashed_password: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    deleted_at: Option<NaiveDateTime>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            email: row.email,
            hashed_password: row.hashed_password,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Postgres version of a user profile
#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: Option<String>,
    display_name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            bio: row.bio,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres version of an entry
#[derive(sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    #[allow(dead_code)] // selected for completeness, ownership is a filter
    user_id: Uuid,
    entry_date: NaiveDate,
    mood_score: Option<i16>,
    has_photos: bool,
    location_data: Option<serde_json::Value>,
    payload: serde_json::Value,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    tombstoned: bool,
}

impl EntryRow {
    /// Reassemble an entry from its row
    ///
    /// The payload carries the full record; the duplicated columns win
    /// where both are present, so an out-of-band column update (like a
    /// tombstone) is always honored.
    fn into_entry(self) -> Result<Entry> {
        let mut entry =
            serde_json::from_value::<Entry>(self.payload).map_err(data_error)?;

        entry.id = self.id;
        entry.date = self.entry_date;
        entry.mood = self.mood_score.or(entry.mood);
        entry.has_photos = self.has_photos;
        entry.deleted = self.tombstoned;

        if let Some(location_data) = self.location_data {
            entry.location_data = serde_json::from_value(location_data)
                .map_err(data_error)?;
        }

        Ok(entry)
    }
}

/// Collect entry rows into entries
fn into_entries(rows: Vec<EntryRow>) -> Result<Vec<Entry>> {
    rows.into_iter()
        .map(EntryRow::into_entry)
        .collect::<Result<Vec<Entry>>>()
}

#[async_trait]
impl Storage for Postgres {
    async fn find_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, session_id, email, hashed_password, created_at, updated_at, deleted_at
            FROM users
            WHERE deleted_at IS NULL
                AND id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(user.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, session_id, email, hashed_password, created_at, updated_at, deleted_at
            FROM users
            WHERE deleted_at IS NULL
                AND email = $1
            LIMIT 1
            ",
        )
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(user.map(User::from))
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (id, session_id, email, hashed_password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, session_id, email, hashed_password, created_at, updated_at, deleted_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.session_id)
        .bind(values.email)
        .bind(values.hashed_password)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(User::from(user))
    }

    async fn find_profile(&self, id: &Uuid) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT id, email, display_name, bio, avatar_url, created_at, updated_at
            FROM user_profiles
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(profile.map(UserProfile::from))
    }

    async fn create_profile(&self, values: &CreateProfileValues<'_>) -> Result<UserProfile> {
        let profile = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO user_profiles (id, email, display_name)
            VALUES ($1, $2, $3)
            RETURNING id, email, display_name, bio, avatar_url, created_at, updated_at
            ",
        )
        .bind(values.id)
        .bind(values.email)
        .bind(values.display_name)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(UserProfile::from(profile))
    }

    async fn update_profile(
        &self,
        id: &Uuid,
        values: &UpdateProfileValues<'_>,
    ) -> Result<UserProfile> {
        let profile = sqlx::query_as::<_, ProfileRow>(
            r"
            UPDATE user_profiles
            SET display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio),
                avatar_url = COALESCE($4, avatar_url),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING id, email, display_name, bio, avatar_url, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(values.display_name)
        .bind(values.bio)
        .bind(values.avatar_url)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(UserProfile::from(profile))
    }

    async fn list_entries(&self, owner: &Uuid) -> Result<Vec<Entry>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r"
            SELECT {ENTRY_COLUMNS}
            FROM entries
            WHERE user_id = $1 AND NOT tombstoned
            ORDER BY entry_date DESC, created_at DESC
            ",
        ))
        .bind(owner)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        into_entries(rows)
    }

    async fn find_entry(&self, owner: &Uuid, id: &Uuid) -> Result<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            r"
            SELECT {ENTRY_COLUMNS}
            FROM entries
            WHERE user_id = $1 AND id = $2 AND NOT tombstoned
            LIMIT 1
            ",
        ))
        .bind(owner)
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn upsert_entry(&self, owner: &Uuid, entry: &Entry) -> Result<Entry> {
        let payload = serde_json::to_value(entry).map_err(data_error)?;
        let location_data = entry
            .location_data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(data_error)?;

        let row = sqlx::query_as::<_, EntryRow>(&format!(
            r"
            INSERT INTO entries (id, user_id, entry_date, mood_score, has_photos,
                location_data, payload, created_at, updated_at, tombstoned)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                entry_date = EXCLUDED.entry_date,
                mood_score = EXCLUDED.mood_score,
                has_photos = EXCLUDED.has_photos,
                location_data = EXCLUDED.location_data,
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at,
                tombstoned = EXCLUDED.tombstoned
            WHERE entries.user_id = EXCLUDED.user_id
            RETURNING {ENTRY_COLUMNS}
            ",
        ))
        .bind(entry.id)
        .bind(owner)
        .bind(entry.date)
        .bind(entry.mood)
        .bind(entry.has_photos)
        .bind(location_data)
        .bind(payload)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .bind(entry.deleted)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        // the conditional upsert returns nothing when the ID is already
        // claimed by another user
        row.map_or_else(
            || Err(Error::Data("Entry ID belongs to another user".to_string())),
            EntryRow::into_entry,
        )
    }

    async fn tombstone_entry(&self, owner: &Uuid, id: &Uuid) -> Result<()> {
        sqlx::query(
            r"
            UPDATE entries
            SET tombstoned = TRUE, updated_at = $3
            WHERE user_id = $1 AND id = $2
            ",
        )
        .bind(owner)
        .bind(id)
        .bind(Utc::now().naive_utc())
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn list_entries_by_date_range(
        &self,
        owner: &Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r"
            SELECT {ENTRY_COLUMNS}
            FROM entries
            WHERE user_id = $1 AND NOT tombstoned
                AND entry_date >= $2 AND entry_date <= $3
            ORDER BY entry_date DESC, created_at DESC
            ",
        ))
        .bind(owner)
        .bind(start)
        .bind(end)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        into_entries(rows)
    }

    async fn search_entries(&self, owner: &Uuid, query: &str) -> Result<Vec<Entry>> {
        let pattern = like_pattern(query);

        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r"
            SELECT {ENTRY_COLUMNS}
            FROM entries
            WHERE user_id = $1 AND NOT tombstoned
                AND (payload->>'title' ILIKE $2
                    OR payload->>'body' ILIKE $2
                    OR EXISTS (
                        SELECT 1
                        FROM jsonb_array_elements(payload->'tags') AS tag
                        WHERE tag->>'name' ILIKE $2
                    ))
            ORDER BY entry_date DESC, created_at DESC
            ",
        ))
        .bind(owner)
        .bind(pattern)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        into_entries(rows)
    }

    async fn get_setting(&self, owner: &Uuid, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            r"
            SELECT value
            FROM user_settings
            WHERE user_id = $1 AND key = $2
            LIMIT 1
            ",
        )
        .bind(owner)
        .bind(key)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(value)
    }

    async fn set_setting(&self, owner: &Uuid, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO user_settings (user_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(owner)
        .bind(key)
        .bind(value)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }
}

/// Turn a query into a `ILIKE` pattern, escaping its wildcards
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}

/// Convert a `SQLx` error to a storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}

/// Convert a serialization error to a storage data error
fn data_error(err: serde_json::Error) -> Error {
    Error::Data(err.to_string())
}
