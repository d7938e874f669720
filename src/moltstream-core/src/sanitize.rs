//! Text cleanup before synthesis.
//!
//! Markdown and layout noise reads terribly when spoken, so posts and
//! comments are flattened to plain sentences before they reach the TTS
//! engine. Degenerate results are rejected so callers can skip the line.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::SanitizeConfig;

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").expect("valid regex"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#+\s").expect("valid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid regex"));
static MULTI_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Clean free-form text for synthesis.
///
/// Returns `None` when the cleaned text is too short to be worth voicing;
/// callers skip the line rather than failing the episode.
pub fn clean_for_tts(raw: &str, config: &SanitizeConfig) -> Option<String> {
    // fenced blocks go first, before their backticks are stripped away
    let text = FENCED_CODE.replace_all(raw, "");
    let text = LINK.replace_all(&text, "$1");
    let text = text.replace("**", "").replace('*', "").replace('`', "");
    let text = HEADING.replace_all(&text, "");
    let text = MULTI_NEWLINE.replace_all(&text, ". ");
    let text = text.replace('\n', ". ");
    let text = WHITESPACE.replace_all(&text, " ");

    let mut text = text.trim().to_string();
    if text.chars().count() > config.max_len {
        text = text.chars().take(config.max_len).collect();
        text.truncate(text.trim_end().len());
    }

    if text.chars().count() < config.min_len {
        None
    } else {
        Some(text)
    }
}
