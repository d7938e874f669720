//! Voice pool and per-run speaker-to-voice assignment.
//!
//! Each distinct speaker in an episode gets a stable voice for the duration
//! of that run, assigned round-robin over the pool. The host voice sits
//! outside the rotation and is selected explicitly for narration lines.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EpisodeError;

/// Delivery style of a voice, used for pool curation and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceStyle {
    Calm,
    Energetic,
    Deep,
    Warm,
    Quirky,
    Professional,
}

/// A named voice configuration for the synthesis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceActor {
    /// Synthesis-engine voice identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short character description.
    pub description: String,
    pub style: VoiceStyle,
}

impl VoiceActor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        style: VoiceStyle,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            style,
        }
    }
}

/// The built-in voice pool.
pub fn default_pool() -> Vec<VoiceActor> {
    use VoiceStyle::*;
    vec![
        VoiceActor::new("CwhRBWXzGAHq8TQ4Fs17", "Roger", "Laid-Back, Casual", Calm),
        VoiceActor::new("EXAVITQu4vr4xnSDxMaL", "Sarah", "Mature, Reassuring", Warm),
        VoiceActor::new("FGY2WhTYpPnrIDTdsKH5", "Laura", "Enthusiast, Quirky", Quirky),
        VoiceActor::new("IKne3meq5aSn9XLyUdCD", "Charlie", "Deep, Confident", Deep),
        VoiceActor::new("JBFqnCBsd6RMkjVDRZzb", "George", "Warm Storyteller", Warm),
        VoiceActor::new("N2lVS1w4EtoT3dr4eOWO", "Callum", "Husky Trickster", Quirky),
        VoiceActor::new("SAz9YHcvj6GT2YYXdXww", "River", "Relaxed, Neutral", Calm),
        VoiceActor::new("TX3LPaxmHKxFdv7VOQHJ", "Liam", "Energetic Creator", Energetic),
        VoiceActor::new("Xb7hH8MSUJpSbSDYk0k2", "Alice", "Clear Educator", Professional),
        VoiceActor::new("XrExE9yKIg1WjnnlVkGX", "Matilda", "Knowledgable Pro", Professional),
        VoiceActor::new("bIHbv24MWmeRgasZH58o", "Will", "Relaxed Optimist", Calm),
        VoiceActor::new("cgSgspJ2msm6clMCkdW9", "Jessica", "Playful, Bright", Energetic),
        VoiceActor::new("cjVigY5qzO86Huf0OWal", "Eric", "Smooth, Trustworthy", Professional),
        VoiceActor::new("iP95p4xoKVk53GoZ742B", "Chris", "Charming, Down-to-Earth", Warm),
        VoiceActor::new("nPczCjzI2devNBz1zQrb", "Brian", "Deep, Resonant", Deep),
        VoiceActor::new("onwK4e9ZLuTAKqWW03F9", "Daniel", "Steady Broadcaster", Professional),
        VoiceActor::new("pFZP5JQG7iQjIQuC4Bku", "Lily", "Velvety Actress", Warm),
        VoiceActor::new("pqHfZKP75CvOlQylNhV4", "Bill", "Wise, Mature", Deep),
    ]
}

/// The built-in host voice. Never handed out by rotation.
pub fn default_host() -> VoiceActor {
    VoiceActor::new(
        "onwK4e9ZLuTAKqWW03F9",
        "Daniel",
        "Steady Broadcaster",
        VoiceStyle::Professional,
    )
}

/// Speaker-to-voice assignments for a single episode run.
///
/// Assignments are stable within one run and are not a durable identity:
/// the same agent name in a different episode may get a different voice.
/// Construct a fresh session (or call [`reset`](Self::reset)) per run.
pub struct VoiceAssignmentSession {
    pool: Vec<VoiceActor>,
    host: VoiceActor,
    assignments: HashMap<String, usize>,
    seen_order: Vec<String>,
    next_index: usize,
}

impl VoiceAssignmentSession {
    pub fn new(pool: Vec<VoiceActor>, host: VoiceActor) -> Result<Self, EpisodeError> {
        if pool.is_empty() {
            return Err(EpisodeError::ConfigError(
                "voice pool must not be empty".to_string(),
            ));
        }
        Ok(Self {
            pool,
            host,
            assignments: HashMap::new(),
            seen_order: Vec::new(),
            next_index: 0,
        })
    }

    /// Session over the built-in pool and host.
    pub fn with_defaults() -> Self {
        Self {
            pool: default_pool(),
            host: default_host(),
            assignments: HashMap::new(),
            seen_order: Vec::new(),
            next_index: 0,
        }
    }

    /// Get the stable voice for a speaker, assigning the next pool entry
    /// (wrapping) on first sight.
    pub fn voice_for(&mut self, speaker: &str) -> &VoiceActor {
        if !self.assignments.contains_key(speaker) {
            let index = self.next_index % self.pool.len();
            self.next_index += 1;
            self.assignments.insert(speaker.to_string(), index);
            self.seen_order.push(speaker.to_string());
        }
        &self.pool[self.assignments[speaker]]
    }

    /// The voice already assigned to a speaker, if any. Does not advance
    /// the rotation.
    pub fn assigned(&self, speaker: &str) -> Option<&VoiceActor> {
        self.assignments.get(speaker).map(|&i| &self.pool[i])
    }

    /// The host voice.
    pub fn host(&self) -> &VoiceActor {
        &self.host
    }

    /// Distinct speakers in first-seen order.
    pub fn speakers(&self) -> &[String] {
        &self.seen_order
    }

    /// Clear all assignments and rewind the rotation.
    pub fn reset(&mut self) {
        self.assignments.clear();
        self.seen_order.clear();
        self.next_index = 0;
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_session() -> VoiceAssignmentSession {
        let pool = vec![
            VoiceActor::new("v0", "Ana", "first", VoiceStyle::Calm),
            VoiceActor::new("v1", "Ben", "second", VoiceStyle::Deep),
            VoiceActor::new("v2", "Cat", "third", VoiceStyle::Warm),
        ];
        let host = VoiceActor::new("vh", "Host", "narrator", VoiceStyle::Professional);
        VoiceAssignmentSession::new(pool, host).unwrap()
    }

    #[test]
    fn test_round_robin_order() {
        let mut session = small_session();
        assert_eq!(session.voice_for("alpha").id, "v0");
        assert_eq!(session.voice_for("beta").id, "v1");
        assert_eq!(session.voice_for("gamma").id, "v2");
    }

    #[test]
    fn test_rotation_wraps() {
        let mut session = small_session();
        for name in ["a", "b", "c"] {
            session.voice_for(name);
        }
        assert_eq!(session.voice_for("d").id, "v0");
        assert_eq!(session.voice_for("e").id, "v1");
    }

    #[test]
    fn test_repeat_speaker_is_stable() {
        let mut session = small_session();
        let first = session.voice_for("alpha").id.clone();
        session.voice_for("beta");
        session.voice_for("gamma");
        assert_eq!(session.voice_for("alpha").id, first);
        // re-query does not advance rotation for the next new speaker
        assert_eq!(session.voice_for("delta").id, "v0");
    }

    #[test]
    fn test_reset_replays_identically() {
        let mut session = small_session();
        let names = ["x", "y", "x", "z", "w"];
        let before: Vec<String> = names
            .iter()
            .map(|n| session.voice_for(n).id.clone())
            .collect();

        session.reset();
        assert!(session.speakers().is_empty());

        let after: Vec<String> = names
            .iter()
            .map(|n| session.voice_for(n).id.clone())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_host_outside_rotation() {
        let mut session = small_session();
        assert_eq!(session.host().id, "vh");
        session.voice_for("alpha");
        assert_eq!(session.host().id, "vh");
        assert!(!session.speakers().contains(&"Host".to_string()));
    }

    #[test]
    fn test_speakers_first_seen_order() {
        let mut session = small_session();
        for name in ["beta", "alpha", "beta", "gamma"] {
            session.voice_for(name);
        }
        assert_eq!(session.speakers(), ["beta", "alpha", "gamma"]);
    }

    #[test]
    fn test_empty_pool_rejected() {
        let host = VoiceActor::new("vh", "Host", "narrator", VoiceStyle::Professional);
        assert!(VoiceAssignmentSession::new(vec![], host).is_err());
    }

    #[test]
    fn test_default_pool_excludes_duplicate_entries() {
        let pool = default_pool();
        let mut ids: Vec<&str> = pool.iter().map(|v| v.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), pool.len());
    }
}
