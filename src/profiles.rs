//! User profiles
//!
//! One profile row per authenticated identity, created lazily the first
//! time the identity shows up. Seeding also renders a default avatar for
//! profiles that have none yet, and every profile write is announced on
//! the event bus.

use std::path::Path;
use std::path::PathBuf;

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use url::Url;
use uuid::Uuid;

use crate::events::EventBus;
use crate::storage;
use crate::storage::CreateProfileValues;
use crate::storage::Storage;
use crate::storage::UpdateProfileValues;
use crate::users::User;
use crate::utils::env_var_or;

/// Default endpoint rendering initials into an avatar image
const DEFAULT_AVATAR_ENDPOINT: &str = "https://ui-avatars.com/api/";

/// Rendered avatar size in pixels
const AVATAR_SIZE: &str = "256";

/// A user's editable profile
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserProfile {
    /// Shares the ID of the owning user
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserProfile {
    /// The name an avatar or greeting should show
    pub fn visible_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("User")
    }
}

/// Make sure a profile row exists for the identity
///
/// Idempotent: the first call creates the row seeded from sign-up
/// metadata; later calls only fill in a display name that is still empty,
/// never overwriting one the user edited.
pub async fn ensure_user_profile<S: Storage>(
    storage: &S,
    id: &Uuid,
    email: Option<&str>,
    display_name: Option<&str>,
) -> storage::Result<UserProfile> {
    let Some(profile) = storage.find_profile(id).await? else {
        let values = CreateProfileValues {
            id,
            email,
            display_name: display_name.filter(|name| !name.is_empty()),
        };

        return storage.create_profile(&values).await;
    };

    let name_is_empty = profile
        .display_name
        .as_deref()
        .map_or(true, str::is_empty);
    let seed_name = display_name.filter(|name| !name.is_empty());

    if name_is_empty && seed_name.is_some() {
        let values = UpdateProfileValues {
            display_name: seed_name,
            ..UpdateProfileValues::default()
        };

        return storage.update_profile(id, &values).await;
    }

    Ok(profile)
}

/// Failures while seeding a profile
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Storage(#[from] storage::Error),

    #[error("Avatar request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Avatar endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Could not store avatar image: {0}")]
    Io(#[from] std::io::Error),
}

/// Seeds profiles when identities sign in
///
/// Owns the HTTP client for the avatar-rendering endpoint and the media
/// directory the rendered images are stored in.
#[derive(Clone)]
pub struct ProfileSeeder {
    http: reqwest::Client,
    avatar_endpoint: String,
    media_dir: PathBuf,
    public_base_url: String,
    events: EventBus,
}

impl ProfileSeeder {
    /// Build a seeder from the environment
    ///
    /// Reads `AVATAR_ENDPOINT`, `MEDIA_DIR` and `PUBLIC_BASE_URL`.
    pub fn from_env(events: EventBus) -> Self {
        let avatar_endpoint = env_var_or("AVATAR_ENDPOINT", DEFAULT_AVATAR_ENDPOINT);

        // catch malformed configuration early, the URL itself stays a string
        Url::parse(&avatar_endpoint).expect("Valid AVATAR_ENDPOINT");

        Self {
            http: reqwest::Client::new(),
            avatar_endpoint,
            media_dir: PathBuf::from(env_var_or("MEDIA_DIR", "./media")),
            public_base_url: env_var_or("PUBLIC_BASE_URL", "http://localhost:6600"),
            events,
        }
    }

    /// Where rendered media is stored
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Ensure profile row and default avatar for a signed-in user
    ///
    /// Runs on every sign-in and sign-up. Failures are logged and
    /// swallowed: seeding is cosmetic and must never block
    /// authentication.
    pub async fn seed<S: Storage>(&self, storage: &S, user: &User, display_name: Option<&str>) {
        let profile =
            match ensure_user_profile(storage, &user.id, Some(&user.email), display_name).await {
                Ok(profile) => profile,
                Err(err) => {
                    tracing::warn!("Could not ensure profile for {}: {err}", user.id);
                    return;
                }
            };

        if profile.avatar_url.is_none() {
            if let Err(err) = self.ensure_default_avatar(storage, &profile).await {
                tracing::warn!("Could not store default avatar for {}: {err}", user.id);
            }
        }

        self.events.profile_updated(user.id);
    }

    /// Render, store and link a default avatar
    ///
    /// Runs at most once per identity: a profile that already has an
    /// avatar is left alone.
    async fn ensure_default_avatar<S: Storage>(
        &self,
        storage: &S,
        profile: &UserProfile,
    ) -> Result<UserProfile, SeedError> {
        let name = profile.visible_name();

        let response = self
            .http
            .get(&self.avatar_endpoint)
            .query(&[("name", name), ("format", "png"), ("size", AVATAR_SIZE)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SeedError::Status(response.status()));
        }

        let image = response.bytes().await?;

        let avatar_dir = self.media_dir.join("avatars");
        fs::create_dir_all(&avatar_dir).await?;
        fs::write(avatar_dir.join(format!("{}.png", profile.id)), &image).await?;

        let avatar_url = format!(
            "{}/media/avatars/{}.png",
            self.public_base_url.trim_end_matches('/'),
            profile.id
        );

        let values = UpdateProfileValues {
            avatar_url: Some(&avatar_url),
            ..UpdateProfileValues::default()
        };

        Ok(storage.update_profile(&profile.id, &values).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn profile(display_name: Option<&str>, email: Option<&str>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            email: email.map(ToString::to_string),
            display_name: display_name.map(ToString::to_string),
            bio: None,
            avatar_url: None,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_visible_name_prefers_display_name() {
        assert_eq!("Ada", profile(Some("Ada"), Some("ada@example.com")).visible_name());
        assert_eq!(
            "ada@example.com",
            profile(None, Some("ada@example.com")).visible_name()
        );
        assert_eq!(
            "ada@example.com",
            profile(Some(""), Some("ada@example.com")).visible_name()
        );
        assert_eq!("User", profile(None, None).visible_name());
    }
}
