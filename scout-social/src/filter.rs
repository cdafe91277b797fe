//! Keyword filter over post captions.
use crate::{HashtagSource, Post, SocialError};
use std::collections::BTreeSet;

/// `#tag` for every hashtag followed by the free-text keywords, lowercased.
///
/// ```
/// use scout_social::search_terms;
///
/// let terms = search_terms(&["handmade"], &["DM for order"]);
/// assert_eq!(terms, vec!["#handmade", "dm for order"]);
/// ```
pub fn search_terms<H: AsRef<str>, T: AsRef<str>>(hashtags: &[H], texts: &[T]) -> Vec<String> {
    hashtags
        .iter()
        .map(|h| format!("#{}", h.as_ref().trim().trim_start_matches('#')))
        .chain(texts.iter().map(|t| t.as_ref().trim().to_string()))
        .map(|term| term.to_lowercase())
        .filter(|term| !term.is_empty() && term != "#")
        .collect()
}

/// First term contained in `caption`, ignoring case.
pub fn matching_term<'t>(caption: &str, terms: &'t [String]) -> Option<&'t str> {
    let caption = caption.to_lowercase();
    terms
        .iter()
        .find(|term| caption.contains(term.to_lowercase().as_str()))
        .map(String::as_str)
}

/// Authors of the posts whose caption contains at least one term.
pub fn filter_posts(posts: &[Post], terms: &[String]) -> BTreeSet<String> {
    let mut usernames = BTreeSet::new();

    for post in posts {
        tracing::debug!("Checking post by {}", post.username);

        if let Some(term) = matching_term(&post.caption, terms) {
            tracing::info!(username = %post.username, term, "Match found: {}", post.caption);
            usernames.insert(post.username.clone());
        }
    }

    usernames
}

/// Fetch the top `amount` posts under `base_hashtag` and keep the matching authors.
pub async fn find_users<H: AsRef<str>, T: AsRef<str>>(
    source: &dyn HashtagSource,
    base_hashtag: &str,
    search_hashtags: &[H],
    search_texts: &[T],
    amount: usize,
) -> Result<BTreeSet<String>, SocialError> {
    let posts = source.top_posts(base_hashtag, amount).await?;
    tracing::info!(hashtag = base_hashtag, fetched = posts.len(), "fetched top posts");

    let terms = search_terms(search_hashtags, search_texts);
    Ok(filter_posts(&posts, &terms))
}
