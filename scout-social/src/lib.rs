//! Social network clients and the caption keyword filter used by Scout.
//!
//! Only Instagram is implemented. Anything that can list the top posts of a
//! hashtag implements [`HashtagSource`], which is all [`filter::find_users`]
//! needs.
pub mod filter;
pub mod instagram;

use async_trait::async_trait;
use scout_http::HttpError;
use serde::{Deserialize, Serialize};

pub use filter::{filter_posts, find_users, search_terms};
pub use instagram::InstagramClient;

/// A post as far as discovery is concerned: who wrote it and what it says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    /// Caption text; empty when the post has none.
    #[serde(default)]
    pub caption: String,
    pub username: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("configuration error: {0}")]
    Config(String),
}

#[async_trait]
pub trait HashtagSource: Send + Sync {
    /// Up to `amount` of the most engaged posts under `hashtag`, in ranking order.
    async fn top_posts(&self, hashtag: &str, amount: usize) -> Result<Vec<Post>, SocialError>;
}
