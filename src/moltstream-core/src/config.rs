//! Configuration module for loading TOML config files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::EpisodeError;
use crate::voices::{self, VoiceActor};

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub sanitize: SanitizeConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub voices: VoicesConfig,
}

/// Upstream content API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// How many trending posts to pull per selection round.
    pub fetch_limit: usize,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.moltbook.com/api/v1".to_string(),
            fetch_limit: 20,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Filter applied when picking a trending thread automatically.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    pub min_comments: u32,
    /// Post body must be strictly longer than this, in characters.
    pub min_content_len: usize,
    /// Post body must be strictly shorter than this, in characters.
    pub max_content_len: usize,
    /// Pick uniformly among this many top qualifying candidates.
    pub candidate_pool: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_comments: 3,
            min_content_len: 100,
            max_content_len: 3000,
            candidate_pool: 5,
        }
    }
}

/// Script composition knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    /// Cap on top-level comments voiced per episode.
    pub max_comments: usize,
    /// Cap on first-level replies voiced per comment.
    pub max_replies: usize,
    /// Chance of a host attribution line before a comment.
    pub attribution_probability: f64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            max_comments: 8,
            max_replies: 2,
            attribution_probability: 0.4,
        }
    }
}

/// Text cleanup limits applied before synthesis.
#[derive(Debug, Clone, Deserialize)]
pub struct SanitizeConfig {
    pub max_len: usize,
    pub min_len: usize,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            max_len: 1500,
            min_len: 5,
        }
    }
}

/// Synthesis and assembly settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Scratch directory for per-line clips and the concat manifest.
    pub work_dir: PathBuf,
    /// Where finished episode audio and metadata land.
    pub output_dir: PathBuf,
    pub tts_command: String,
    pub ffmpeg_command: String,
    pub ffprobe_command: String,
    pub line_timeout_secs: u64,
    pub assembly_timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/moltstream-audio"),
            output_dir: PathBuf::from("episodes"),
            tts_command: "sag".to_string(),
            ffmpeg_command: "ffmpeg".to_string(),
            ffprobe_command: "ffprobe".to_string(),
            line_timeout_secs: 60,
            assembly_timeout_secs: 120,
        }
    }
}

/// Voice pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VoicesConfig {
    pub pool: Vec<VoiceActor>,
    pub host: VoiceActor,
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            pool: voices::default_pool(),
            host: voices::default_host(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EpisodeError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| EpisodeError::ConfigError(format!("failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML content.
    pub fn parse(content: &str) -> Result<Self, EpisodeError> {
        toml::from_str(content)
            .map_err(|e| EpisodeError::ConfigError(format!("failed to parse config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.selection.min_comments, 3);
        assert_eq!(config.script.max_replies, 2);
        assert_eq!(config.sanitize.max_len, 1500);
        assert_eq!(config.audio.line_timeout_secs, 60);
        assert_eq!(config.voices.pool.len(), 18);
        assert_eq!(config.voices.host.name, "Daniel");
    }

    #[test]
    fn test_parse_partial_override() {
        let config = Config::parse(
            r#"
            [script]
            max_comments = 6
            max_replies = 1
            attribution_probability = 0.25

            [audio]
            work_dir = "/tmp/scratch"
            output_dir = "out"
            tts_command = "sag"
            ffmpeg_command = "ffmpeg"
            ffprobe_command = "ffprobe"
            line_timeout_secs = 30
            assembly_timeout_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.script.max_comments, 6);
        assert_eq!(config.audio.work_dir, PathBuf::from("/tmp/scratch"));
        // untouched sections keep defaults
        assert_eq!(config.api.fetch_limit, 20);
        assert_eq!(config.voices.pool.len(), 18);
    }

    #[test]
    fn test_parse_custom_voices() {
        let config = Config::parse(
            r#"
            [[voices.pool]]
            id = "abc"
            name = "Nova"
            description = "Test voice"
            style = "energetic"

            [voices.host]
            id = "xyz"
            name = "Anchor"
            description = "Test host"
            style = "professional"
            "#,
        )
        .unwrap();

        assert_eq!(config.voices.pool.len(), 1);
        assert_eq!(config.voices.pool[0].name, "Nova");
        assert_eq!(config.voices.host.id, "xyz");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/moltstream.toml").unwrap_err();
        assert!(matches!(err, EpisodeError::ConfigError(_)));
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(Config::parse("not [valid").is_err());
    }
}
