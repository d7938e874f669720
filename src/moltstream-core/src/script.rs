//! Script composition.
//!
//! Turns a thread (post plus comment tree) into an ordered dialogue script:
//! host intro, the original post, a transition, the top comments with their
//! first-level replies flattened in, and a host outro. The order produced
//! here is mirrored exactly into clip order at synthesis time.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ScriptConfig;
use crate::moltbook::Thread;

/// Speaker name used for host narration lines.
pub const HOST_SPEAKER: &str = "Host";

/// One attributed, orderable unit of narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
    /// Host narration (intro, transitions, attributions, outro) as opposed
    /// to quoted agent content.
    pub is_host: bool,
}

impl DialogueLine {
    fn host(text: impl Into<String>) -> Self {
        Self {
            speaker: HOST_SPEAKER.to_string(),
            text: text.into(),
            is_host: true,
        }
    }

    fn agent(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            is_host: false,
        }
    }
}

/// A composed episode script, ready for synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeScript {
    pub title: String,
    pub submolt: String,
    pub post_id: String,
    pub dialogue: Vec<DialogueLine>,
    /// Distinct non-host speakers in first-appearance order.
    pub speakers: Vec<String>,
}

/// Compose the dialogue script for a thread.
///
/// Deterministic for a given rng state: template picks and attribution
/// draws are the only random choices, so a seeded rng reproduces the exact
/// same script.
pub fn compose<R: Rng>(thread: &Thread, config: &ScriptConfig, rng: &mut R) -> EpisodeScript {
    let post = &thread.post;
    let submolt = post.submolt.name().to_string();

    let mut dialogue = Vec::new();
    let mut speakers: Vec<String> = Vec::new();
    let note_speaker = |speakers: &mut Vec<String>, name: &str| {
        if !speakers.iter().any(|s| s == name) {
            speakers.push(name.to_string());
        }
    };

    dialogue.push(DialogueLine::host(intro_text(
        &submolt,
        &post.author.name,
        &post.title,
        rng,
    )));

    if let Some(content) = post.content.as_deref()
        && !content.trim().is_empty()
    {
        dialogue.push(DialogueLine::agent(&post.author.name, content));
        note_speaker(&mut speakers, &post.author.name);
    }

    dialogue.push(DialogueLine::host(
        "[short pause] And the responses are coming in.",
    ));

    for comment in thread.comments.iter().take(config.max_comments) {
        if rng.gen_bool(config.attribution_probability) {
            dialogue.push(DialogueLine::host(format!(
                "{} responds:",
                comment.author.name
            )));
        }

        dialogue.push(DialogueLine::agent(&comment.author.name, &comment.content));
        note_speaker(&mut speakers, &comment.author.name);

        // first-level replies, flattened into the sequence
        for reply in comment.replies.iter().take(config.max_replies) {
            dialogue.push(DialogueLine::agent(&reply.author.name, &reply.content));
            note_speaker(&mut speakers, &reply.author.name);
        }
    }

    dialogue.push(DialogueLine::host(outro_text(&submolt, speakers.len(), rng)));

    EpisodeScript {
        title: post.title.clone(),
        submolt,
        post_id: post.id.clone(),
        dialogue,
        speakers,
    }
}

fn intro_text<R: Rng>(submolt: &str, author: &str, title: &str, rng: &mut R) -> String {
    let variants = [
        format!(
            "Welcome to Moltstream. [short pause] We're tuning into a conversation \
             from m/{submolt}. [pause] {author} just posted: {title}. Let's listen in."
        ),
        format!(
            "You're listening to Moltstream, voices from the agent internet. [pause] \
             Coming to you from m/{submolt}, here's a discussion that's heating up. \
             [short pause] {author} starts us off."
        ),
        format!(
            "Moltstream here. [short pause] Right now on m/{submolt}, there's an \
             interesting thread happening. {author} kicked it off with: {title}. \
             [pause] Here's what they had to say."
        ),
    ];
    let index = rng.gen_range(0..variants.len());
    variants[index].clone()
}

fn outro_text<R: Rng>(submolt: &str, speaker_count: usize, rng: &mut R) -> String {
    let variants = [
        format!(
            "[pause] That was {speaker_count} voices from m/{submolt}. [short pause] \
             The conversation continues on Moltbook. This is Moltstream."
        ),
        "[short pause] And the discussion goes on. [pause] You've been listening to \
         Moltstream, bringing you the voices of the agent internet. Until next time."
            .to_string(),
        format!(
            "[pause] {speaker_count} agents, one conversation. [short pause] Thanks \
             for tuning in to Moltstream. More voices coming up."
        ),
    ];
    let index = rng.gen_range(0..variants.len());
    variants[index].clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moltbook::{Author, Comment, Post, SubmoltRef};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn author(name: &str) -> Author {
        Author {
            name: name.to_string(),
            id: None,
        }
    }

    fn comment(id: &str, who: &str, text: &str, replies: Vec<Comment>) -> Comment {
        Comment {
            id: id.to_string(),
            content: text.to_string(),
            author: author(who),
            reported_score: None,
            upvotes: None,
            downvotes: None,
            created_at: None,
            replies,
        }
    }

    fn thread(body_len: usize, comments: Vec<Comment>) -> Thread {
        Thread {
            post: Post {
                id: "p1".to_string(),
                title: "Do agents dream?".to_string(),
                content: if body_len > 0 {
                    Some("a".repeat(body_len))
                } else {
                    None
                },
                submolt: SubmoltRef::Name("philosophy".to_string()),
                author: author("original_poster"),
                reported_score: None,
                upvotes: None,
                downvotes: None,
                comment_count: comments.len() as u32,
                created_at: None,
            },
            comments,
        }
    }

    fn five_comment_thread() -> Thread {
        let comments = (0..5)
            .map(|i| {
                comment(
                    &format!("c{}", i),
                    &format!("commenter_{}", i),
                    "A thoughtful response worth hearing.",
                    vec![],
                )
            })
            .collect();
        thread(150, comments)
    }

    #[test]
    fn test_structure_with_body_and_five_comments() {
        // 1 intro + 1 post line + 1 transition + 5x(0-1 attribution + 1
        // comment) + 1 outro = between 9 and 14 lines for this fixture
        let thread = five_comment_thread();
        let config = ScriptConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let script = compose(&thread, &config, &mut rng);

        assert!(script.dialogue.len() >= 9 && script.dialogue.len() <= 14);
        assert!(script.dialogue[0].is_host);
        assert_eq!(script.dialogue[1].speaker, "original_poster");
        assert!(!script.dialogue[1].is_host);
        assert!(script.dialogue[2].is_host);
        assert!(script.dialogue[2].text.contains("responses are coming in"));
        assert!(script.dialogue.last().unwrap().is_host);
    }

    #[test]
    fn test_line_count_bounds_across_seeds() {
        let thread = five_comment_thread();
        let config = ScriptConfig::default();
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let script = compose(&thread, &config, &mut rng);
            // fixed lines: intro, post body, transition, outro (4) plus 5
            // comments, plus 0-5 attribution lines
            assert!(
                script.dialogue.len() >= 9 && script.dialogue.len() <= 14,
                "seed {} produced {} lines",
                seed,
                script.dialogue.len()
            );
        }
    }

    #[test]
    fn test_no_body_skips_post_line() {
        let thread = thread(0, vec![comment("c0", "solo", "only reply", vec![])]);
        let config = ScriptConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let script = compose(&thread, &config, &mut rng);

        assert!(script.dialogue[0].is_host);
        // second line is the transition, not the post body
        assert!(script.dialogue[1].is_host);
        assert!(!script.speakers.contains(&"original_poster".to_string()));
    }

    #[test]
    fn test_comment_cap_applies() {
        let comments = (0..20)
            .map(|i| comment(&format!("c{}", i), &format!("who_{}", i), "words here", vec![]))
            .collect();
        let thread = thread(200, comments);
        let config = ScriptConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let script = compose(&thread, &config, &mut rng);

        let voiced: Vec<&str> = script
            .dialogue
            .iter()
            .filter(|l| !l.is_host && l.speaker.starts_with("who_"))
            .map(|l| l.speaker.as_str())
            .collect();
        assert_eq!(voiced.len(), config.max_comments);
    }

    #[test]
    fn test_replies_flattened_in_order_and_capped() {
        let replies = vec![
            comment("r0", "replier_0", "first reply", vec![]),
            comment("r1", "replier_1", "second reply", vec![]),
            comment("r2", "replier_2", "third reply", vec![]),
        ];
        let thread = thread(200, vec![comment("c0", "commenter", "top comment", replies)]);
        let config = ScriptConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let script = compose(&thread, &config, &mut rng);

        let agents: Vec<&str> = script
            .dialogue
            .iter()
            .filter(|l| !l.is_host)
            .map(|l| l.speaker.as_str())
            .collect();
        assert_eq!(
            agents,
            ["original_poster", "commenter", "replier_0", "replier_1"]
        );
    }

    #[test]
    fn test_speakers_distinct_and_ordered() {
        let comments = vec![
            comment("c0", "alice", "one", vec![comment("r0", "bob", "reply", vec![])]),
            comment("c1", "alice", "two", vec![]),
            comment("c2", "carol", "three", vec![]),
        ];
        let thread = thread(150, comments);
        let config = ScriptConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let script = compose(&thread, &config, &mut rng);

        assert_eq!(script.speakers, ["original_poster", "alice", "bob", "carol"]);
        assert!(!script.speakers.contains(&HOST_SPEAKER.to_string()));
    }

    #[test]
    fn test_same_seed_reproduces_byte_identical_script() {
        let thread = five_comment_thread();
        let config = ScriptConfig::default();

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let script_a = compose(&thread, &config, &mut rng_a);
        let script_b = compose(&thread, &config, &mut rng_b);

        assert_eq!(script_a, script_b);
        let json_a = serde_json::to_vec(&script_a).unwrap();
        let json_b = serde_json::to_vec(&script_b).unwrap();
        assert_eq!(json_a, json_b);
    }

    #[test]
    fn test_outro_mentions_submolt_or_speaker_count() {
        let thread = five_comment_thread();
        let config = ScriptConfig::default();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let script = compose(&thread, &config, &mut rng);
            let outro = &script.dialogue.last().unwrap().text;
            assert!(
                outro.contains("philosophy")
                    || outro.contains(&script.speakers.len().to_string())
                    || outro.contains("Moltstream")
            );
        }
    }
}
