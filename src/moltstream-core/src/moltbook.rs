//! Moltbook API client.
//!
//! Read-only client for the upstream social API. Upstream hiccups (non-200
//! responses, malformed payloads, network errors) degrade to empty results;
//! only a missing explicitly-requested post is surfaced as an error.

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{ApiConfig, SelectionConfig};
use crate::error::EpisodeError;

/// Sort orders understood by the posts endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    Hot,
    New,
    Top,
    Rising,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Hot => "hot",
            SortOption::New => "new",
            SortOption::Top => "top",
            SortOption::Rising => "rising",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Submolt reference as it appears on a post. The API sends either a bare
/// name string or a full object; both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmoltRef {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        display_name: Option<String>,
    },
}

impl SubmoltRef {
    pub fn name(&self) -> &str {
        match self {
            SubmoltRef::Name(name) => name,
            SubmoltRef::Full { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    pub submolt: SubmoltRef,
    pub author: Author,
    #[serde(default, rename = "score")]
    pub reported_score: Option<i64>,
    #[serde(default)]
    pub upvotes: Option<i64>,
    #[serde(default)]
    pub downvotes: Option<i64>,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Post {
    /// Canonical score: recomputed as upvotes minus downvotes whenever both
    /// vote counts are present; the upstream score field is a fallback only.
    pub fn score(&self) -> i64 {
        match (self.upvotes, self.downvotes) {
            (Some(up), Some(down)) => up - down,
            _ => self.reported_score.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author: Author,
    #[serde(default, rename = "score")]
    pub reported_score: Option<i64>,
    #[serde(default)]
    pub upvotes: Option<i64>,
    #[serde(default)]
    pub downvotes: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Same canonical rule as [`Post::score`].
    pub fn score(&self) -> i64 {
        match (self.upvotes, self.downvotes) {
            (Some(up), Some(down)) => up - down,
            _ => self.reported_score.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submolt {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subscriber_count: Option<u64>,
}

/// A root post with its comment tree, the unit of episode generation.
#[derive(Debug, Clone)]
pub struct Thread {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// List endpoints wrap their payload in a named field or return the bare
/// array directly, depending on the deployment. Accept every shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Posts { posts: Vec<T> },
    Comments { comments: Vec<T> },
    Submolts { submolts: Vec<T> },
    Results { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Listing::Posts { posts } => posts,
            Listing::Comments { comments } => comments,
            Listing::Submolts { submolts } => submolts,
            Listing::Results { results } => results,
            Listing::Bare(items) => items,
        }
    }
}

pub struct MoltbookClient {
    http: reqwest::Client,
    base_url: String,
    fetch_limit: usize,
}

impl MoltbookClient {
    pub fn new(api: &ApiConfig) -> Result<Self, EpisodeError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(api.request_timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(api.connect_timeout_secs))
            .build()
            .map_err(|e| {
                EpisodeError::ConfigError(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            fetch_limit: api.fetch_limit,
        })
    }

    pub async fn get_posts(
        &self,
        sort: SortOption,
        limit: usize,
        submolt: Option<&str>,
    ) -> Vec<Post> {
        let mut url = format!(
            "{}/posts?sort={}&limit={}",
            self.base_url,
            sort.as_str(),
            limit
        );
        if let Some(name) = submolt {
            url.push_str("&submolt=");
            url.push_str(name);
        }
        self.fetch_listing(&url).await
    }

    pub async fn get_post(&self, id: &str) -> Option<Post> {
        let url = format!("{}/posts/{}", self.base_url, id);
        match self.http.get(&url).send().await {
            Ok(res) if res.status().is_success() => match res.json::<Post>().await {
                Ok(post) => Some(post),
                Err(e) => {
                    eprintln!("moltbook: malformed post payload: {}", e);
                    None
                }
            },
            Ok(res) => {
                eprintln!("moltbook: {} fetching post {}", res.status(), id);
                None
            }
            Err(e) => {
                eprintln!("moltbook: failed to fetch post {}: {}", id, e);
                None
            }
        }
    }

    pub async fn get_comments(&self, post_id: &str) -> Vec<Comment> {
        let url = format!("{}/posts/{}/comments?sort=top", self.base_url, post_id);
        self.fetch_listing(&url).await
    }

    pub async fn get_submolts(&self) -> Vec<Submolt> {
        let url = format!("{}/submolts", self.base_url);
        self.fetch_listing(&url).await
    }

    pub async fn search_posts(&self, query: &str, limit: usize) -> Vec<Post> {
        let url = format!("{}/search", self.base_url);
        let request = self
            .http
            .get(&url)
            .query(&[("q", query), ("limit", &limit.to_string())]);
        self.fetch_with(request, &url).await
    }

    /// Fetch a post and its comment tree.
    pub async fn fetch_thread(&self, post_id: &str) -> Result<Thread, EpisodeError> {
        let post = self
            .get_post(post_id)
            .await
            .ok_or_else(|| EpisodeError::PostNotFound(post_id.to_string()))?;
        let comments = self.get_comments(post_id).await;
        Ok(Thread { post, comments })
    }

    /// Pick a trending post worth narrating: hot sort, engagement filter,
    /// then a random draw among the top qualifying candidates so repeated
    /// runs do not always pick the same thread.
    pub async fn pick_next_post<R: Rng>(
        &self,
        selection: &SelectionConfig,
        submolt: Option<&str>,
        rng: &mut R,
    ) -> Result<Post, EpisodeError> {
        let posts = self.get_posts(SortOption::Hot, self.fetch_limit, submolt).await;
        select_candidate(posts, selection, rng)
    }

    async fn fetch_listing<T: DeserializeOwned>(&self, url: &str) -> Vec<T> {
        let request = self.http.get(url);
        self.fetch_with(request, url).await
    }

    async fn fetch_with<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Vec<T> {
        match request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(res) if res.status().is_success() => match res.json::<Listing<T>>().await {
                Ok(listing) => listing.into_items(),
                Err(e) => {
                    eprintln!("moltbook: malformed payload from {}: {}", url, e);
                    Vec::new()
                }
            },
            Ok(res) => {
                eprintln!("moltbook: {} from {}", res.status(), url);
                Vec::new()
            }
            Err(e) => {
                eprintln!("moltbook: request failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Whether a post qualifies for automatic selection.
pub fn qualifies(post: &Post, selection: &SelectionConfig) -> bool {
    post.comment_count >= selection.min_comments
        && post.content.as_deref().is_some_and(|content| {
            let len = content.chars().count();
            len > selection.min_content_len && len < selection.max_content_len
        })
}

/// Apply the engagement filter to a trending listing (already in trending
/// order) and draw uniformly among the top qualifying candidates.
pub fn select_candidate<R: Rng>(
    posts: Vec<Post>,
    selection: &SelectionConfig,
    rng: &mut R,
) -> Result<Post, EpisodeError> {
    let mut candidates: Vec<Post> = posts
        .into_iter()
        .filter(|p| qualifies(p, selection))
        .collect();

    if candidates.is_empty() {
        return Err(EpisodeError::NoSuitableThread);
    }

    candidates.truncate(selection.candidate_pool.max(1));
    let index = rng.gen_range(0..candidates.len());
    Ok(candidates.swap_remove(index))
}
