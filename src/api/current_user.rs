//! Current user service
//!
//! Resolves the user behind the Authorization header of a request.

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::Extension;
use axum::RequestPartsExt;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::api::Error;
use crate::storage::Storage;
use crate::users::User;

/// Token lifetime in seconds
const TOKEN_LIFETIME: i64 = 3600;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The JWT claims that identify a user
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The user ID
    sub: Uuid,

    /// Expiration instant as a Unix timestamp
    exp: i64,

    /// The session ID, used to invalidate tokens before they expire
    jti: Uuid,
}

/// Token information served to the user
#[derive(Debug, Serialize)]
pub struct Token {
    /// Type of the token: Bearer
    #[allow(clippy::struct_field_names)] // `type` is a reserved keyword
    token_type: String,

    /// In how many seconds the token expires
    expires_in: i64,

    /// The access token for the Authorization header of follow-up requests
    #[allow(clippy::struct_field_names)] // `access_token` is the name of the field
    access_token: String,
}

/// Generate a token for the outside world for a given user
pub fn generate_token(jwt_keys: &JwtKeys, user: &User) -> Result<Token, Error> {
    use jsonwebtoken::encode;
    use jsonwebtoken::Header;

    let claims = Claims {
        sub: user.id,
        exp: chrono::Utc::now().timestamp() + TOKEN_LIFETIME,
        jti: user.session_id,
    };

    let access_token = encode(&Header::default(), &claims, &jwt_keys.encoding)
        .map_err(Error::internal_server_error)?;

    Ok(Token {
        token_type: "Bearer".to_string(),
        expires_in: TOKEN_LIFETIME,
        access_token,
    })
}

/// The user making the current request
///
/// Generic over the storage backend the user is looked up in.
pub struct CurrentUser<S: Storage> {
    /// The actual user
    user: Arc<User>,

    storage: PhantomData<S>,
}

impl<S: Storage> CurrentUser<S> {
    /// Wrap a resolved user
    fn new(user: User) -> Self {
        Self {
            user: Arc::new(user),
            storage: PhantomData,
        }
    }
}

impl<S: Storage> Deref for CurrentUser<S> {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

#[async_trait]
impl<St, S> FromRequestParts<S> for CurrentUser<St>
where
    St: Storage,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        use jsonwebtoken::decode;
        use jsonwebtoken::Validation;

        // Extract the token from the authorization header
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::forbidden("Missing API token"))?;

        let Extension(jwt_keys) = parts
            .extract::<Extension<JwtKeys>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

        let Extension(storage) = parts
            .extract::<Extension<St>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get a storage backend"))?;

        let validation = Validation::default();

        // Decode the user data
        let token_data = decode::<Claims>(bearer.token(), &jwt_keys.decoding, &validation)
            .map_err(|err| Error::forbidden(format!("Invalid token: {err}")))?;

        let claims = token_data.claims;

        let user = storage
            .find_user_by_id(&claims.sub)
            .await
            .map_err(|_| Error::forbidden("Could not find user"))?;

        if let Some(user) = user {
            // mechanism to invalidate JWT tokens
            if claims.jti != user.session_id {
                return Err(Error::forbidden("Token expired"));
            }

            Ok(CurrentUser::new(user))
        } else {
            Err(Error::forbidden("Could not find user"))
        }
    }
}
