//! Promotion stage: per-platform promotional copy for a finished post.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::text::first_words;
use crate::core::types::Post;

pub const EXCERPT_WORDS: usize = 30;
pub const DEFAULT_PLATFORMS: [&str; 2] = ["twitter", "linkedin"];

/// Build promotional text for each platform.
///
/// Known platforms (`twitter`, `linkedin`) match case-insensitively and are
/// keyed by their lowercase name; anything else keeps the caller's spelling
/// and gets a generic template. Duplicates overwrite earlier entries. An empty
/// list means [`DEFAULT_PLATFORMS`].
pub fn create_promotions(post: &Post, platforms: &[String]) -> BTreeMap<String, String> {
    let excerpt = first_words(&post.body, EXCERPT_WORDS);
    let defaults: Vec<String>;
    let platforms = if platforms.is_empty() {
        defaults = DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect();
        defaults.as_slice()
    } else {
        platforms
    };

    let mut promotions = BTreeMap::new();
    for platform in platforms {
        let (key, text) = promote(&post.title, &excerpt, platform);
        promotions.insert(key, text);
    }
    debug!(platforms = promotions.len(), "promotions created");
    promotions
}

fn promote(title: &str, excerpt: &str, platform: &str) -> (String, String) {
    match platform.to_lowercase().as_str() {
        "twitter" => (
            "twitter".to_string(),
            format!("{title} — {excerpt}... Read: <link> #AI #Dev"),
        ),
        "linkedin" => (
            "linkedin".to_string(),
            format!("{title}\n\n{excerpt}... Read the full article: <link>"),
        ),
        _ => (platform.to_string(), format!("{title} - {excerpt}")),
    }
}
