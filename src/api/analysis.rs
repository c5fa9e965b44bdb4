//! AI analysis and transcription endpoints
//!
//! Thin proxies in front of the language-model clients. Analysis never
//! fails (the client falls back locally); transcription surfaces upstream
//! failures as 502 and leaves retrying to the person holding the phone.

use axum::extract::Multipart;
use axum::Extension;
use serde::Deserialize;
use serde::Serialize;

use crate::ai::Analyzer;
use crate::ai::AnalysisContext;
use crate::ai::Sentiment;
use crate::ai::Transcriber;
use crate::entries::is_valid_mood;
use crate::storage::Storage;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::Success;

/// Fallbacks for uploads without metadata
const DEFAULT_AUDIO_NAME: &str = "recording.m4a";
const DEFAULT_AUDIO_TYPE: &str = "audio/m4a";

/// Analysis request form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeForm {
    /// The entry text to analyze
    content: String,

    mood: Option<i16>,
    has_photos: Option<bool>,
    location_name: Option<String>,
}

/// The analysis response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub title: String,
    pub tags: Vec<String>,
    pub sentiment: Sentiment,
    pub themes: Vec<String>,
}

/// Analyze entry text
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "content": "Long walk before breakfast", "mood": 4 }' \
///     http://localhost:6600/api/analysis
/// ```
pub async fn analyze<S: Storage>(
    Extension(analyzer): Extension<Analyzer>,
    _current_user: CurrentUser<S>,
    Form(form): Form<AnalyzeForm>,
) -> Result<Success<AnalysisResponse>, Error> {
    if let Some(mood) = form.mood {
        if !is_valid_mood(mood) {
            return Err(Error::bad_request("Mood must be between 1 and 5"));
        }
    }

    let context = AnalysisContext {
        mood: form.mood,
        has_photos: form.has_photos.unwrap_or(false),
        location_name: form.location_name,
    };

    let analysis = analyzer.analyze(&form.content, &context).await;

    Ok(Success::ok(AnalysisResponse {
        title: analysis.title,
        tags: analysis.tags,
        sentiment: analysis.sentiment,
        themes: analysis.themes,
    }))
}

/// The transcription response information
#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// Transcribe an uploaded recording
///
/// Expects a multipart body with a `file` part holding the audio.
pub async fn transcribe<S: Storage>(
    Extension(transcriber): Extension<Transcriber>,
    _current_user: CurrentUser<S>,
    mut multipart: Multipart,
) -> Result<Success<TranscriptionResponse>, Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| Error::bad_request("Invalid multipart body").with_description(err))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .unwrap_or(DEFAULT_AUDIO_NAME)
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_AUDIO_TYPE)
            .to_string();

        let audio = field
            .bytes()
            .await
            .map_err(|err| Error::bad_request("Could not read audio upload").with_description(err))?
            .to_vec();

        let text = transcriber
            .transcribe(file_name, &content_type, audio)
            .await
            .map_err(|err| Error::bad_gateway("Transcription failed").with_description(err))?;

        return Ok(Success::ok(TranscriptionResponse { text }));
    }

    Err(Error::bad_request("Missing `file` part"))
}
