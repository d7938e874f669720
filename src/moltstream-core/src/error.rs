//! Error types for episode generation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EpisodeError {
    #[error("post not found: {0}")]
    PostNotFound(String),

    #[error("no suitable thread among trending candidates")]
    NoSuitableThread,

    #[error("no audio was generated for any dialogue line")]
    NoAudioGenerated,

    #[error("audio assembly failed: {0}")]
    AssemblyFailed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("invalid episode: {0}")]
    InvalidEpisode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of a single line's synthesis. Recovered by skipping the line,
/// never by aborting the episode.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct SynthesisFailed(pub String);
