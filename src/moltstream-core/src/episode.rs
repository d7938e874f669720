//! Episode metadata and the in-memory episode registry.
//!
//! The registry lives for the process lifetime and backs the web layer's
//! episode endpoints; a durable store is an external collaborator choice.

use serde::{Deserialize, Serialize};

use crate::error::EpisodeError;

/// A published episode: one assembled audio file plus metadata.
///
/// Serialized in camelCase to match the wire shape the web layer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub submolt: String,
    pub post_id: String,
    /// Distinct speaker names in first-appearance order.
    pub speakers: Vec<String>,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub created_at: String,
}

/// How many episodes `list` returns at most.
const LIST_LIMIT: usize = 20;

/// In-memory, insertion-ordered episode registry.
#[derive(Debug, Default)]
pub struct EpisodeRegistry {
    episodes: Vec<Episode>,
}

impl EpisodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a completed episode. Re-registering an id replaces the
    /// earlier entry in place.
    pub fn register(&mut self, episode: Episode) -> Result<(), EpisodeError> {
        if episode.id.is_empty() || episode.title.is_empty() || episode.audio_url.is_empty() {
            return Err(EpisodeError::InvalidEpisode(
                "id, title and audioUrl are required".to_string(),
            ));
        }

        if let Some(existing) = self.episodes.iter_mut().find(|e| e.id == episode.id) {
            *existing = episode;
        } else {
            self.episodes.push(episode);
        }
        Ok(())
    }

    /// The most recent episodes, oldest first, capped at 20.
    pub fn list(&self) -> &[Episode] {
        let start = self.episodes.len().saturating_sub(LIST_LIMIT);
        &self.episodes[start..]
    }

    /// The most recently registered episode.
    pub fn latest(&self) -> Option<&Episode> {
        self.episodes.last()
    }

    pub fn get(&self, id: &str) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}
