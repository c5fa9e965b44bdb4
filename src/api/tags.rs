//! Tag suggestion endpoint
//!
//! Backs the editor's tag autocomplete: the caller's own tags ranked by
//! use, padded with the preset list.

use axum::Extension;
use serde::Deserialize;

use crate::service;
use crate::storage::Storage;
use crate::tags::is_valid_tag;
use crate::tags::tag_suggestions;
use crate::tags::TAG_PRESETS;

use super::CurrentUser;
use super::Error;
use super::QueryParameters;
use super::Success;

/// Suggestions returned at most
const SUGGESTION_LIMIT: usize = 5;

/// Suggestion query
#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    q: Option<String>,
}

/// Suggest tags for the current input
///
/// Without a query: the caller's distinct tags by frequency, padded with
/// presets. With one: matching candidates, the way the editor filters
/// while typing.
pub async fn suggestions<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    QueryParameters(query): QueryParameters<SuggestionsQuery>,
) -> Result<Success<Vec<String>>, Error> {
    let entries = service::list_entries(&storage, &current_user.id).await?;

    // the caller's own tags, most used first; the stable sort keeps ties
    // in recency order
    let mut counts: Vec<(String, usize)> = Vec::new();
    for entry in &entries {
        for tag in &entry.tags {
            match counts.iter_mut().find(|(name, _)| name == &tag.name) {
                Some(counted) => counted.1 += 1,
                None => counts.push((tag.name.clone(), 1)),
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut candidates = counts
        .into_iter()
        .map(|(name, _)| name)
        .collect::<Vec<String>>();

    for preset in TAG_PRESETS {
        if !candidates.iter().any(|candidate| candidate == preset) {
            candidates.push(preset.to_string());
        }
    }

    let suggestions = match query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(q) if !is_valid_tag(q) => Vec::new(),
        Some(q) => tag_suggestions(q, &candidates, SUGGESTION_LIMIT)
            .into_iter()
            .cloned()
            .collect(),
        None => {
            candidates.truncate(SUGGESTION_LIMIT);
            candidates
        }
    };

    Ok(Success::ok(suggestions))
}
