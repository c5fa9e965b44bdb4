//! Account management
//!
//! Sign-up and token issuance. Both seed the caller's profile, which is
//! the hook that keeps "profile exists for every signed-in identity" true
//! without an explicit bootstrap step.

use axum::Extension;
use serde::Deserialize;
use uuid::Uuid;

use crate::password::hash;
use crate::password::verify;
use crate::profiles::ProfileSeeder;
use crate::storage::CreateUserValues;
use crate::storage::Storage;

use super::current_user::generate_token;
use super::current_user::Token;
use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;

/// Sign-up form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    /// Email address to sign in with
    email: String,

    /// Password for the new account
    password: String,

    /// Optional display name, seeded onto the profile
    display_name: Option<String>,
}

/// Create an account
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "email": "ada@example.com", "password": "verysecret", "displayName": "Ada" }' \
///     http://localhost:6600/api/users
/// ```
///
/// Response:
/// ```json
/// { "data": { "token_type": "Bearer", "access_token": "some token" } }
/// ```
pub async fn create<S: Storage>(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    Extension(seeder): Extension<ProfileSeeder>,
    Form(form): Form<SignUpForm>,
) -> Result<Success<Token>, Error> {
    let email = form.email.trim().to_lowercase();

    if email.is_empty() {
        return Err(Error::bad_request("Email is required"));
    }

    if form.password.is_empty() {
        return Err(Error::bad_request("Password is required"));
    }

    let existing = storage
        .find_user_by_email(&email)
        .await
        .map_err(Error::internal_server_error)?;

    if existing.is_some() {
        return Err(Error::bad_request("User already exists"));
    }

    let hashed_password = hash(&form.password);

    let values = CreateUserValues {
        session_id: &Uuid::new_v4(),
        email: &email,
        hashed_password: &hashed_password,
    };

    let user = storage
        .create_user(&values)
        .await
        .map_err(Error::internal_server_error)?;

    seeder
        .seed(&storage, &user, form.display_name.as_deref())
        .await;

    let token = generate_token(&jwt_keys, &user)?;

    Ok(Success::created(token))
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Email address of the user
    email: String,

    /// Password of the user
    password: String,
}

/// Get a token for a user "session"
///
/// The token unlocks the rest of the API routes through the
/// `Authorization` header. Issuing one also re-seeds the profile, the
/// equivalent of the app refreshing its session.
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "email": "ada@example.com", "password": "verysecret" }' \
///     http://localhost:6600/api/users/token
/// ```
///
/// Response:
/// ```json
/// { "data": { "token_type": "Bearer", "access_token": "some token" } }
/// ```
pub async fn token<S: Storage>(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    Extension(seeder): Extension<ProfileSeeder>,
    Form(form): Form<LoginForm>,
) -> Result<Success<Token>, Error> {
    let email = form.email.trim().to_lowercase();

    let user = storage
        .find_user_by_email(&email)
        .await
        .map_err(Error::internal_server_error)?;

    if let Some(user) = user {
        if verify(&user.hashed_password, &form.password) {
            seeder.seed(&storage, &user, None).await;

            let token = generate_token(&jwt_keys, &user)?;

            Ok(Success::ok(token))
        } else {
            Err(Error::bad_request("Invalid user"))
        }
    } else {
        Err(Error::bad_request("Invalid user"))
    }
}
