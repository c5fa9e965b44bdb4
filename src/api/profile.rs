//! Profile endpoints
//!
//! A user reads and edits their own profile; every write is announced on
//! the event bus so mounted observers refresh without polling.

use axum::Extension;
use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::events::EventBus;
use crate::profiles::ensure_user_profile;
use crate::profiles::UserProfile;
use crate::storage::Storage;
use crate::storage::UpdateProfileValues;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::Success;

/// The profile response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProfileResponse {
    /// Create a profile response from a [`UserProfile`](UserProfile)
    fn from_profile(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Get the profile of the current user
///
/// Ensures the row exists on the way, so a first read after sign-in never
/// 404s.
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
) -> Result<Success<ProfileResponse>, Error> {
    let profile = ensure_user_profile(
        &storage,
        &current_user.id,
        Some(&current_user.email),
        None,
    )
    .await?;

    Ok(Success::ok(ProfileResponse::from_profile(profile)))
}

/// Profile update form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileForm {
    display_name: Option<String>,
    bio: Option<String>,
}

/// Update the profile of the current user
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "displayName": "Ada", "bio": "Notes to self" }' \
///     http://localhost:6600/api/profile
/// ```
pub async fn update<S: Storage>(
    Extension(storage): Extension<S>,
    Extension(events): Extension<EventBus>,
    current_user: CurrentUser<S>,
    Form(form): Form<UpdateProfileForm>,
) -> Result<Success<ProfileResponse>, Error> {
    // the row may not exist yet when seeding failed earlier
    ensure_user_profile(&storage, &current_user.id, Some(&current_user.email), None).await?;

    let values = UpdateProfileValues {
        display_name: form.display_name.as_deref(),
        bio: form.bio.as_deref(),
        avatar_url: None,
    };

    let profile = storage
        .update_profile(&current_user.id, &values)
        .await
        .map_err(Error::internal_server_error)?;

    events.profile_updated(current_user.id);

    Ok(Success::ok(ProfileResponse::from_profile(profile)))
}
