//! Editor stage: normalize a post and apply free-text feedback.
//!
//! Feedback is matched by keyword, case-insensitively:
//!
//! - "shorten" or "concise" keeps the first [`SHORTEN_WORD_LIMIT`] words,
//!   joined by single spaces. Paragraph structure is lost.
//! - "expand" or "more detail" appends a filler paragraph.
//!
//! When both match, shortening runs first and the filler is appended after.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use crate::core::text::{first_words, word_count};
use crate::core::types::Post;

pub const SHORTEN_WORD_LIMIT: usize = 300;
pub const FILLER_SENTENCE: &str = "Additional details to expand the section.";
pub const FILLER_REPEAT: usize = 20;

const SHORTEN_TRIGGERS: [&str; 2] = ["shorten", "concise"];
const EXPAND_TRIGGERS: [&str; 2] = ["expand", "more detail"];

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run regex"));

/// Edit `post` in place. Only the body changes.
#[instrument(skip_all, fields(feedback = feedback.is_some()))]
pub fn edit(post: &mut Post, feedback: Option<&str>) {
    let collapsed = BLANK_RUN_RE.replace_all(&post.body, "\n\n");
    post.body = collapsed.trim().to_string();

    let Some(feedback) = feedback else {
        return;
    };
    let feedback = feedback.to_lowercase();

    if SHORTEN_TRIGGERS.iter().any(|t| feedback.contains(t)) {
        post.body = first_words(&post.body, SHORTEN_WORD_LIMIT);
        debug!(words = word_count(&post.body), "post shortened");
    }
    if EXPAND_TRIGGERS.iter().any(|t| feedback.contains(t)) {
        post.body.push_str("\n\n");
        post.body.push_str(&FILLER_SENTENCE.repeat(FILLER_REPEAT));
        debug!(words = word_count(&post.body), "post expanded");
    }
}
