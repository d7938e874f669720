//! Synthesis and assembly engine.
//!
//! Renders each dialogue line to a per-line clip through an external TTS
//! command, then concatenates the surviving clips into one episode file via
//! ffmpeg stream copy. A failed line is skipped; a run with zero surviving
//! clips fails, and assembly failure is fatal.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use tokio::process::Command;

use crate::config::{AudioConfig, SanitizeConfig};
use crate::episode::Episode;
use crate::error::{EpisodeError, SynthesisFailed};
use crate::sanitize::clean_for_tts;
use crate::script::EpisodeScript;
use crate::voices::VoiceAssignmentSession;

/// One synthesized clip, ephemeral: deleted after successful assembly.
#[derive(Debug, Clone)]
pub struct GeneratedClip {
    pub path: PathBuf,
    pub speaker: String,
    pub voice_name: String,
}

/// The external render-one-line capability.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render `text` with the given voice to an audio file at `output`.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        output: &Path,
    ) -> Result<(), SynthesisFailed>;
}

/// Synthesizer backed by the `sag` CLI.
///
/// Arguments are passed as a vector, never through a shell, so no quoting
/// or escaping of the line text is needed.
pub struct SagSynthesizer {
    command: String,
    timeout: Duration,
}

impl SagSynthesizer {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(
            config.tts_command.clone(),
            Duration::from_secs(config.line_timeout_secs),
        )
    }
}

#[async_trait]
impl Synthesizer for SagSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        output: &Path,
    ) -> Result<(), SynthesisFailed> {
        let mut command = Command::new(&self.command);
        command
            .arg("-v")
            .arg(voice_id)
            .arg("-o")
            .arg(output)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => Err(SynthesisFailed(format!(
                "{} timed out after {}s",
                self.command,
                self.timeout.as_secs()
            ))),
            Ok(Err(e)) => Err(SynthesisFailed(format!(
                "failed to run {}: {}",
                self.command, e
            ))),
            Ok(Ok(out)) if !out.status.success() => Err(SynthesisFailed(format!(
                "{} exited with {}: {}",
                self.command,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ))),
            Ok(Ok(_)) => Ok(()),
        }
    }
}

/// Concatenates ordered clips losslessly via ffmpeg's concat demuxer.
pub struct AudioAssembler {
    ffmpeg: String,
    ffprobe: String,
    timeout: Duration,
}

impl AudioAssembler {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_command.clone(),
            ffprobe: config.ffprobe_command.clone(),
            timeout: Duration::from_secs(config.assembly_timeout_secs),
        }
    }

    /// Stream-copy all clips, in the given order, into one file.
    pub async fn assemble(
        &self,
        clips: &[PathBuf],
        manifest: &Path,
        output: &Path,
    ) -> Result<(), EpisodeError> {
        if clips.is_empty() {
            return Err(EpisodeError::NoAudioGenerated);
        }

        tokio::fs::write(manifest, concat_manifest(clips)).await?;

        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-y")
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(manifest)
            .args(["-c", "copy"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => Err(EpisodeError::AssemblyFailed(format!(
                "{} timed out after {}s",
                self.ffmpeg,
                self.timeout.as_secs()
            ))),
            Ok(Err(e)) => Err(EpisodeError::AssemblyFailed(format!(
                "failed to run {}: {}",
                self.ffmpeg, e
            ))),
            Ok(Ok(out)) if !out.status.success() => Err(EpisodeError::AssemblyFailed(format!(
                "{} exited with {}: {}",
                self.ffmpeg,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ))),
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// Best-effort duration probe of the assembled file, in seconds.
    pub async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let out = tokio::time::timeout(Duration::from_secs(15), command.output())
            .await
            .ok()?
            .ok()?;
        if !out.status.success() {
            return None;
        }
        String::from_utf8_lossy(&out.stdout).trim().parse().ok()
    }
}

fn concat_manifest(clips: &[PathBuf]) -> String {
    let mut listing = String::new();
    for path in clips {
        // ffmpeg concat format; paths are generated by us and contain no quotes
        let _ = writeln!(listing, "file '{}'", path.display());
    }
    listing
}

/// Events emitted while generating an episode.
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    /// A line is about to be synthesized.
    LineStarted {
        index: usize,
        speaker: String,
        voice: String,
        preview: String,
    },
    /// A line produced a clip.
    LineSynthesized { index: usize },
    /// A line was dropped (sanitizer rejection or synthesis failure).
    LineSkipped { index: usize, reason: String },
    /// Concatenation is starting.
    Assembling { clip_count: usize },
    /// Temporary clips and the manifest were removed.
    CleanedUp,
}

/// Callback for generation events.
pub type GenerationCallback = Box<dyn Fn(GenerationEvent) + Send + Sync>;

/// Drives sanitize, per-line synthesis, assembly, and metadata emission for
/// one episode run.
pub struct EpisodeGenerator<S: Synthesizer> {
    synthesizer: S,
    assembler: AudioAssembler,
    audio: AudioConfig,
    sanitize: SanitizeConfig,
    callback: Option<GenerationCallback>,
}

impl<S: Synthesizer> EpisodeGenerator<S> {
    pub fn new(synthesizer: S, audio: AudioConfig, sanitize: SanitizeConfig) -> Self {
        let assembler = AudioAssembler::from_config(&audio);
        Self {
            synthesizer,
            assembler,
            audio,
            sanitize,
            callback: None,
        }
    }

    /// Set a callback for generation events.
    pub fn with_callback(mut self, callback: GenerationCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Generate the episode: synthesize every line in dialogue order, then
    /// assemble the surviving clips and emit metadata.
    pub async fn generate(
        &self,
        script: &EpisodeScript,
        session: &mut VoiceAssignmentSession,
    ) -> Result<Episode, EpisodeError> {
        let episode_id = new_episode_id();
        tokio::fs::create_dir_all(&self.audio.work_dir).await?;
        tokio::fs::create_dir_all(&self.audio.output_dir).await?;

        let clips = self.synthesize_lines(script, session, &episode_id).await;
        if clips.is_empty() {
            return Err(EpisodeError::NoAudioGenerated);
        }

        let manifest = self
            .audio
            .work_dir
            .join(format!("{}_concat.txt", episode_id));
        let audio_file = format!("{}.mp3", episode_id);
        let audio_path = self.audio.output_dir.join(&audio_file);

        self.emit(GenerationEvent::Assembling {
            clip_count: clips.len(),
        });

        let clip_paths: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
        self.assembler
            .assemble(&clip_paths, &manifest, &audio_path)
            .await?;

        let duration = self.assembler.probe_duration(&audio_path).await;

        for path in clip_paths.iter().chain(std::iter::once(&manifest)) {
            if let Err(e) = tokio::fs::remove_file(path).await {
                eprintln!("cleanup: failed to remove {}: {}", path.display(), e);
            }
        }
        self.emit(GenerationEvent::CleanedUp);

        let episode = Episode {
            id: episode_id,
            title: script.title.clone(),
            submolt: script.submolt.clone(),
            post_id: script.post_id.clone(),
            speakers: script.speakers.clone(),
            audio_url: audio_file,
            duration,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let metadata_path = self
            .audio
            .output_dir
            .join(format!("{}.json", episode.id));
        let metadata = serde_json::to_string_pretty(&episode)
            .map_err(|e| EpisodeError::InvalidEpisode(format!("metadata encoding: {}", e)))?;
        tokio::fs::write(&metadata_path, metadata).await?;

        Ok(episode)
    }

    /// Synthesize all lines in strict dialogue order. Clip filenames carry
    /// a zero-padded index so name order equals dialogue order.
    async fn synthesize_lines(
        &self,
        script: &EpisodeScript,
        session: &mut VoiceAssignmentSession,
        episode_id: &str,
    ) -> Vec<GeneratedClip> {
        let mut clips = Vec::new();

        for (index, line) in script.dialogue.iter().enumerate() {
            // assign the voice before any skip so rotation follows
            // dialogue order even when a line is later dropped
            let voice = if line.is_host {
                session.host().clone()
            } else {
                session.voice_for(&line.speaker).clone()
            };

            let Some(text) = clean_for_tts(&line.text, &self.sanitize) else {
                self.emit(GenerationEvent::LineSkipped {
                    index,
                    reason: "rejected by sanitizer".to_string(),
                });
                continue;
            };

            let path = self
                .audio
                .work_dir
                .join(format!("{}_{:03}.mp3", episode_id, index));

            self.emit(GenerationEvent::LineStarted {
                index,
                speaker: line.speaker.clone(),
                voice: voice.name.clone(),
                preview: text.chars().take(50).collect(),
            });

            match self.synthesizer.synthesize(&text, &voice.id, &path).await {
                Ok(()) => {
                    clips.push(GeneratedClip {
                        path,
                        speaker: line.speaker.clone(),
                        voice_name: voice.name.clone(),
                    });
                    self.emit(GenerationEvent::LineSynthesized { index });
                }
                Err(e) => {
                    self.emit(GenerationEvent::LineSkipped {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        clips
    }

    fn emit(&self, event: GenerationEvent) {
        if let Some(ref callback) = self.callback {
            callback(event);
        }
    }
}

/// Unique episode identifier: `ep_{unix_millis}_{random suffix}`.
pub fn new_episode_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| {
            let n = rng.gen_range(0..36u8);
            char::from_digit(n as u32, 36).unwrap_or('0')
        })
        .collect();
    format!("ep_{}_{}", millis, suffix)
}
