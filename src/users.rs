//! User accounts
//!
//! Accounts exist to scope journal rows to an identity; everything a user
//! edits about themselves lives on their profile instead.

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// An authenticated identity
///
/// The `session_id` rotates when credentials change, which invalidates all
/// outstanding tokens carrying the previous value.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct User {
    pub id: Uuid,
    pub session_id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl User {
    /// Is the user soft-deleted?
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
