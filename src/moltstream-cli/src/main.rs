//! Moltstream CLI - Episode Generator
//!
//! Fetches a Moltbook conversation and converts it into a multi-voice
//! narrated audio episode.

use clap::Parser;
use colored::Colorize;
use moltstream_core::{
    Config, EpisodeGenerator, EpisodeRegistry, GenerationEvent, MoltbookClient, SagSynthesizer,
    Thread, VoiceAssignmentSession, compose,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "moltstream",
    version,
    about = "Moltstream Episode Generator - voices from the agent internet",
    long_about = "Fetches a Moltbook thread (a trending one when no post id is given), \
composes a multi-voice dialogue script, and synthesizes it into one audio episode."
)]
struct Cli {
    /// Post ID to narrate; picks a trending post automatically when omitted
    #[arg(value_name = "POST_ID")]
    post_id: Option<String>,

    /// Restrict trending selection to one submolt
    #[arg(long, value_name = "NAME")]
    submolt: Option<String>,

    /// Seed for template and attribution choices (reproducible scripts)
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Path to a TOML config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the episode output directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Override the cap on voiced top-level comments
    #[arg(long, value_name = "N")]
    max_comments: Option<usize>,

    /// Compose and print the script without synthesizing audio
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Ok(base) = env::var("MOLTBOOK_API_BASE") {
        config.api.base_url = base;
    }
    if let Some(dir) = &cli.output_dir {
        config.audio.output_dir = dir.clone();
    }
    if let Some(n) = cli.max_comments {
        config.script.max_comments = n;
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!(
        "{}",
        "  Moltstream Episode Generator".bright_blue().bold()
    );
    println!("{}", "═".repeat(70).bright_blue());
    println!();

    let client = MoltbookClient::new(&config.api)?;

    // Pick or fetch the thread
    let thread = match &cli.post_id {
        Some(id) => {
            println!("{} fetching post {}...", "→".bright_cyan(), id.bright_white());
            client.fetch_thread(id).await?
        }
        None => {
            println!("{} finding a trending post...", "→".bright_cyan());
            let post = client
                .pick_next_post(&config.selection, cli.submolt.as_deref(), &mut rng)
                .await?;
            let comments = client.get_comments(&post.id).await;
            Thread { post, comments }
        }
    };

    println!();
    println!("{} {}", "Selected:".bold(), thread.post.title.bright_white());
    println!(
        "  from m/{} by {}  (score {}, {} comments)",
        thread.post.submolt.name().bright_cyan(),
        thread.post.author.name.bright_cyan(),
        thread.post.score(),
        thread.post.comment_count
    );
    println!();

    // Compose the dialogue script
    let script = compose(&thread, &config.script, &mut rng);

    println!("{}", "Script:".bold());
    for (index, line) in script.dialogue.iter().enumerate() {
        let speaker = if line.is_host {
            line.speaker.bright_magenta().bold()
        } else {
            line.speaker.bright_cyan()
        };
        let preview: String = line.text.chars().take(70).collect();
        println!("  {:>3}. {}: {}", index, speaker, preview.dimmed());
    }
    println!();
    println!(
        "{} {} lines, {} distinct speakers",
        "▸".bright_blue(),
        script.dialogue.len(),
        script.speakers.len()
    );
    println!("{}", "─".repeat(70).dimmed());

    if cli.dry_run {
        println!("{}", "  Dry run - no audio generated.".yellow());
        return Ok(());
    }

    // Synthesize and assemble
    let mut session =
        VoiceAssignmentSession::new(config.voices.pool.clone(), config.voices.host.clone())?;
    let synthesizer = SagSynthesizer::from_config(&config.audio);
    let generator =
        EpisodeGenerator::new(synthesizer, config.audio.clone(), config.sanitize.clone())
            .with_callback(create_console_callback());

    let episode = generator.generate(&script, &mut session).await?;

    // Register for the web layer
    let mut registry = EpisodeRegistry::new();
    registry.register(episode.clone())?;

    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!("{}", "  Episode generated.".bright_green().bold());
    println!("{}", "═".repeat(70).bright_blue());
    println!();
    println!("  {}  {}", "ID:".bold(), episode.id);
    println!(
        "  {}  {}",
        "Audio:".bold(),
        config
            .audio
            .output_dir
            .join(&episode.audio_url)
            .display()
    );
    if let Some(duration) = episode.duration {
        println!("  {}  {:.1}s", "Duration:".bold(), duration);
    }
    println!("  {}  {}", "Speakers:".bold(), episode.speakers.join(", "));
    println!();

    Ok(())
}

/// Create a callback that prints generation progress to the console.
fn create_console_callback() -> moltstream_core::GenerationCallback {
    Box::new(move |event| match event {
        GenerationEvent::LineStarted {
            index,
            speaker,
            voice,
            preview,
        } => {
            println!(
                "{} line {:>3}  {} {}  {}",
                "♪".bright_cyan(),
                index,
                speaker.bright_cyan(),
                format!("[{}]", voice).yellow(),
                preview.dimmed()
            );
        }
        GenerationEvent::LineSynthesized { .. } => {}
        GenerationEvent::LineSkipped { index, reason } => {
            eprintln!(
                "{} line {:>3} skipped: {}",
                "⚠".yellow(),
                index,
                reason.dimmed()
            );
        }
        GenerationEvent::Assembling { clip_count } => {
            println!();
            println!(
                "{} concatenating {} clips...",
                "⧉".bright_magenta(),
                clip_count
            );
        }
        GenerationEvent::CleanedUp => {
            println!("{} temporary clips removed", "✓".dimmed());
        }
    })
}
