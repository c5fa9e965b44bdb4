//! All things related to the storage of entries, profiles and users
//!
//! The [`Storage`](Storage) trait is the port the rest of the application
//! depends on; the concrete backend is picked at build time. The default
//! build uses the on-device style file mirror, the `postgres` feature swaps
//! in the server-backed store.

#[cfg(not(feature = "postgres"))]
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::naive::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::entries::Entry;
use crate::profiles::UserProfile;
use crate::users::User;
#[cfg(not(feature = "postgres"))]
use crate::utils::env_var_or;

#[cfg(not(feature = "postgres"))]
use local::LocalStore;
#[cfg(feature = "postgres")]
use postgres::Postgres;

#[cfg(not(feature = "postgres"))]
mod local;
#[cfg(feature = "postgres")]
mod postgres;

/// How to construct the storage backend
pub enum StorageConfig {
    /// Detect configuration from the environment
    Detect,

    /// Use an existing connection pool
    #[cfg(feature = "postgres")]
    ExistingPool(sqlx::PgPool),

    /// Use a specific data directory
    #[cfg(not(feature = "postgres"))]
    DataDir(PathBuf),
}

/// Setup the storage
#[cfg(not(feature = "postgres"))]
pub async fn setup(config: StorageConfig) -> LocalStore {
    match config {
        StorageConfig::Detect => {
            let data_dir = PathBuf::from(env_var_or("DATA_DIR", "./data"));
            LocalStore::open(data_dir).await
        }
        StorageConfig::DataDir(data_dir) => LocalStore::open(data_dir).await,
    }
}

/// Setup the storage
#[cfg(feature = "postgres")]
pub async fn setup(config: StorageConfig) -> Postgres {
    match config {
        StorageConfig::Detect => Postgres::new().await,
        StorageConfig::ExistingPool(pool) => Postgres::new_with_pool(pool).await,
    }
}

/// Storage errors
#[derive(Debug, Error)]
#[allow(dead_code)] // not every backend constructs every variant
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),

    /// A stored record could not be encoded or decoded
    #[error("Data error: {0}")]
    Data(String),

    /// The underlying file could not be read or written
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The initial session ID for the user
    pub session_id: &'a Uuid,

    /// The email address the user signs in with
    pub email: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,
}

/// Values to create a UserProfile
pub struct CreateProfileValues<'a> {
    /// The owning user ID; profiles share their user's ID
    pub id: &'a Uuid,

    /// Email copied from the account at seeding time
    pub email: Option<&'a str>,

    /// Display name taken from sign-up metadata, when present
    pub display_name: Option<&'a str>,
}

/// Values to update a UserProfile
///
/// Fields left as `None` keep their stored value.
#[derive(Default)]
pub struct UpdateProfileValues<'a> {
    pub display_name: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

/// Storage with all supported operations
///
/// Entry reads all filter out tombstoned records and order by entry date
/// descending, creation instant descending.
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find a user by ID
    ///
    /// Respects the soft-delete
    async fn find_user_by_id(&self, id: &Uuid) -> Result<Option<User>>;

    /// Find a user by email address
    ///
    /// Respects the soft-delete
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Create a single user
    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User>;

    /// Find the profile belonging to a user
    async fn find_profile(&self, id: &Uuid) -> Result<Option<UserProfile>>;

    /// Create a profile row for a user
    async fn create_profile(&self, values: &CreateProfileValues<'_>) -> Result<UserProfile>;

    /// Patch a profile; `None` fields are left untouched
    async fn update_profile(
        &self,
        id: &Uuid,
        values: &UpdateProfileValues<'_>,
    ) -> Result<UserProfile>;

    /// All live entries of the owner
    async fn list_entries(&self, owner: &Uuid) -> Result<Vec<Entry>>;

    /// A single live entry by ID
    async fn find_entry(&self, owner: &Uuid, id: &Uuid) -> Result<Option<Entry>>;

    /// Insert or fully replace an entry, keyed by its ID
    ///
    /// Returns the stored record as the backend echoes it back.
    async fn upsert_entry(&self, owner: &Uuid, entry: &Entry) -> Result<Entry>;

    /// Tombstone an entry
    ///
    /// A no-op when the ID does not exist for the owner; repeating the call
    /// leaves the same state behind.
    async fn tombstone_entry(&self, owner: &Uuid, id: &Uuid) -> Result<()>;

    /// Live entries whose date falls inside the inclusive range
    async fn list_entries_by_date_range(
        &self,
        owner: &Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>>;

    /// Live entries matching a case-insensitive substring on title, body or
    /// tag name
    async fn search_entries(&self, owner: &Uuid, query: &str) -> Result<Vec<Entry>>;

    /// Read a single setting value
    async fn get_setting(&self, owner: &Uuid, key: &str) -> Result<Option<String>>;

    /// Write a single setting value
    async fn set_setting(&self, owner: &Uuid, key: &str, value: &str) -> Result<()>;
}
