//! Moltstream Core Library
//!
//! Turns trending Moltbook threads into multi-voice narrated audio
//! episodes: content fetching, script composition, per-speaker voice
//! assignment, text cleanup, and synthesis/assembly via external tools.

pub mod audio;
pub mod config;
pub mod episode;
pub mod error;
pub mod moltbook;
pub mod sanitize;
pub mod script;
pub mod voices;

pub use audio::{
    AudioAssembler, EpisodeGenerator, GenerationCallback, GenerationEvent, SagSynthesizer,
    Synthesizer,
};
pub use config::Config;
pub use episode::{Episode, EpisodeRegistry};
pub use error::{EpisodeError, SynthesisFailed};
pub use moltbook::{Comment, MoltbookClient, Post, SortOption, Submolt, Thread};
pub use script::{DialogueLine, EpisodeScript, HOST_SPEAKER, compose};
pub use voices::{VoiceActor, VoiceAssignmentSession, VoiceStyle};
