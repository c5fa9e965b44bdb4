//! Per-user settings endpoints
//!
//! Plain string key/value pairs, stored next to (but apart from) the
//! journal itself.

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;

use crate::storage::Storage;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// The setting response information
#[derive(Debug, Serialize)]
pub struct SettingResponse {
    pub key: String,
    pub value: String,
}

/// Read a single setting
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(key): PathParameters<String>,
) -> Result<Success<SettingResponse>, Error> {
    let value = storage
        .get_setting(&current_user.id, &key)
        .await
        .map_err(Error::internal_server_error)?;

    value.map_or_else(
        || Err(Error::not_found("Setting not found")),
        |value| Ok(Success::ok(SettingResponse { key, value })),
    )
}

/// Setting update form
#[derive(Debug, Deserialize)]
pub struct SettingForm {
    value: String,
}

/// Write a single setting
pub async fn update<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(key): PathParameters<String>,
    Form(form): Form<SettingForm>,
) -> Result<Success<SettingResponse>, Error> {
    storage
        .set_setting(&current_user.id, &key, &form.value)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(SettingResponse {
        key,
        value: form.value,
    }))
}
