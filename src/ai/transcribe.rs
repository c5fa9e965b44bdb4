//! Audio transcription via a speech-to-text endpoint
//!
//! A single multipart upload, no retry. Unlike analysis there is no safe
//! local equivalent, so failures propagate; the caller surfaces them and
//! lets the user type instead.

use reqwest::multipart::Form;
use reqwest::multipart::Part;
use serde::Deserialize;
use thiserror::Error;

use crate::utils::env_var_or;

use super::DEFAULT_BASE_URL;

/// Transcription model sent along with the upload
const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Failures of the transcription call
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcription request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transcription endpoint returned status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: Option<String>,
}

/// Client for the speech-to-text endpoint
#[derive(Clone)]
pub struct Transcriber {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Transcriber {
    /// Build a transcriber from the environment
    ///
    /// Reads `OPENAI_BASE_URL` and `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: env_var_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            api_key: env_var_or("OPENAI_API_KEY", ""),
        }
    }

    /// Transcribe one audio recording
    pub async fn transcribe(
        &self,
        file_name: String,
        content_type: &str,
        audio: Vec<u8>,
    ) -> Result<String, TranscriptionError> {
        let file = Part::bytes(audio)
            .file_name(file_name)
            .mime_str(content_type)?;

        let form = Form::new()
            .part("file", file)
            .text("model", TRANSCRIPTION_MODEL);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranscriptionError::Status(response.status()));
        }

        let body: TranscriptionResponse = response.json().await?;

        Ok(body.text.unwrap_or_default())
    }
}
