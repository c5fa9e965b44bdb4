//! Entry analysis via a language model
//!
//! A single chat-completion call asks for a strict JSON reply with a short
//! title, tags, a sentiment label and themes. Any failure -- network,
//! non-2xx status, malformed reply -- drops to a deterministic local
//! heuristic, so analysis as a whole never fails. There is no retry and no
//! timeout beyond the client default.

use chrono::Datelike;
use chrono::Local;
use chrono::Weekday;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::utils::env_var_or;

pub use transcribe::TranscriptionError;
pub use transcribe::Transcriber;

mod transcribe;

/// Default completion endpoint base
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Upper bound on tags kept from a reply
const MAX_TAGS: usize = 10;

/// Title used when nothing better can be derived
const FALLBACK_TITLE: &str = "Daily Entry";

const SYSTEM_PROMPT: &str = "\
You are an expert journal analyzer. Analyze the given journal entry and provide:
1. A concise, meaningful title (2-4 words that capture the essence)
2. Up to 10 relevant tags for future analysis

Tags should cover:
- Emotions/feelings (happy, sad, anxious, grateful, etc.)
- Activities (work, exercise, social, travel, etc.)
- Themes (family, relationships, health, achievement, etc.)
- Time context (morning, evening, weekend, etc.)
- Topics (specific subjects mentioned)
- Sentiment (overall mood)

Return ONLY valid JSON in this format:
{
  \"title\": \"Brief Title Here\",
  \"tags\": [\"tag1\", \"tag2\", \"tag3\"],
  \"sentiment\": \"positive|negative|neutral|mixed\",
  \"themes\": [\"theme1\", \"theme2\"]
}";

/// Sentiment label attached to an analysis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

/// What an analysis yields
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    pub title: String,
    pub tags: Vec<String>,
    pub sentiment: Sentiment,
    pub themes: Vec<String>,
}

/// Entry context sent along with the text
#[derive(Clone, Debug, Default)]
pub struct AnalysisContext {
    pub mood: Option<i16>,
    pub has_photos: bool,
    pub location_name: Option<String>,
}

/// Failures of the remote analysis call
///
/// Callers never see these; they select the local fallback.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Completion response held no choices")]
    EmptyResponse,

    #[error("Completion reply was not the requested JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u16,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// The raw reply shape; everything optional, clamped afterwards
#[derive(Deserialize)]
struct RawAnalysis {
    title: Option<String>,
    tags: Option<Vec<String>>,
    sentiment: Option<Sentiment>,
    themes: Option<Vec<String>>,
}

/// Client for the completion endpoint
#[derive(Clone)]
pub struct Analyzer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Analyzer {
    /// Build an analyzer from the environment
    ///
    /// Reads `OPENAI_BASE_URL`, `OPENAI_API_KEY` and `OPENAI_MODEL`. A
    /// missing key is not an error here; the request will fail and the
    /// fallback takes over.
    pub fn from_env() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: env_var_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            api_key: env_var_or("OPENAI_API_KEY", ""),
            model: env_var_or("OPENAI_MODEL", DEFAULT_MODEL),
        }
    }

    /// Analyze entry text, with context
    ///
    /// Never fails: a failed remote call selects the local heuristic.
    pub async fn analyze(&self, content: &str, context: &AnalysisContext) -> Analysis {
        match self.request_analysis(content, context).await {
            Ok(analysis) => analysis,
            Err(err) => {
                tracing::warn!("AI analysis failed, using local fallback: {err}");
                fallback_analysis(content, context, Local::now().weekday())
            }
        }
    }

    async fn request_analysis(
        &self,
        content: &str,
        context: &AnalysisContext,
    ) -> Result<Analysis, AnalysisError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(content, context),
                },
            ],
            // low temperature for consistent output
            temperature: 0.3,
            max_tokens: 200,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::Status(response.status()));
        }

        let completion: ChatResponse = response.json().await?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AnalysisError::EmptyResponse)?;

        let raw: RawAnalysis = serde_json::from_str(&reply)?;

        Ok(clamp_analysis(raw))
    }
}

/// Compose the user message
fn user_prompt(content: &str, context: &AnalysisContext) -> String {
    let mut prompt = format!("Journal Entry: \"{content}\"");

    if let Some(mood) = context.mood {
        prompt.push_str(&format!("\nMood Score: {mood}/5"));
    }

    if context.has_photos {
        prompt.push_str("\nIncludes photos");
    }

    if let Some(location_name) = &context.location_name {
        prompt.push_str(&format!("\nLocation: {location_name}"));
    }

    prompt
}

/// Force a raw reply into the guaranteed shape
fn clamp_analysis(raw: RawAnalysis) -> Analysis {
    let mut tags = raw.tags.unwrap_or_default();
    tags.truncate(MAX_TAGS);

    Analysis {
        title: raw
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_TITLE.to_string()),
        tags,
        sentiment: raw.sentiment.unwrap_or(Sentiment::Neutral),
        themes: raw.themes.unwrap_or_default(),
    }
}

/// Deterministic local analysis, used when the endpoint is unreachable
///
/// Keyword matching for the title, mood/photo/location/weekday for the
/// tags. No network, always succeeds.
fn fallback_analysis(content: &str, context: &AnalysisContext, weekday: Weekday) -> Analysis {
    let lower_content = content.to_lowercase();

    let title = if lower_content.contains("work") {
        "Work Day"
    } else if lower_content.contains("family") {
        "Family Time"
    } else if lower_content.contains("friend") {
        "Friend Moments"
    } else {
        FALLBACK_TITLE
    };

    let mut tags: Vec<String> = Vec::new();

    if let Some(mood) = context.mood {
        let mood_tag = if mood >= 4 {
            "positive"
        } else if mood <= 2 {
            "challenging"
        } else {
            "neutral"
        };

        tags.push(mood_tag.to_string());
    }

    if context.has_photos {
        tags.push("photo-memory".to_string());
    }

    if context.location_name.is_some() {
        tags.push("location-tagged".to_string());
    }

    tags.push(weekday_tag(weekday).to_string());
    tags.truncate(MAX_TAGS);

    let sentiment = if context.mood.is_some_and(|mood| mood >= 3) {
        Sentiment::Positive
    } else {
        Sentiment::Negative
    };

    Analysis {
        title: title.to_string(),
        tags,
        sentiment,
        themes: Vec::new(),
    }
}

/// Lowercase day name for tagging
const fn weekday_tag(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
