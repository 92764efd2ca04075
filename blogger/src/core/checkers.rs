//! Acceptance checkers consulted by the retry loop.
//!
//! Checkers inspect raw artifacts and must never panic or error: anything that
//! does not have the expected shape is simply [`CheckResult::Rejected`].

use serde_json::Value;

use crate::core::text::word_count;
use crate::core::types::{CheckResult, text_field};

pub const DEFAULT_MIN_SECTIONS: usize = 3;
pub const DEFAULT_MIN_WORDS: usize = 300;

/// Predicate over one produced artifact.
pub trait Checker<A: ?Sized> {
    fn name(&self) -> &'static str;
    fn check(&self, artifact: &A) -> CheckResult;
}

/// Accepts outlines with enough titled sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineChecker {
    pub min_sections: usize,
}

impl Default for OutlineChecker {
    fn default() -> Self {
        Self {
            min_sections: DEFAULT_MIN_SECTIONS,
        }
    }
}

impl OutlineChecker {
    pub fn new(min_sections: usize) -> Self {
        Self { min_sections }
    }
}

impl Checker<Value> for OutlineChecker {
    fn name(&self) -> &'static str {
        "outline"
    }

    fn check(&self, artifact: &Value) -> CheckResult {
        let Some(sections) = artifact.get("sections").and_then(Value::as_array) else {
            return CheckResult::Rejected;
        };
        // An empty sections list is rejected even when min_sections is 0.
        if sections.is_empty() || sections.len() < self.min_sections {
            return CheckResult::Rejected;
        }
        CheckResult::from_bool(sections.iter().all(has_title))
    }
}

/// Accepts posts with a title and a body of at least `min_words` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostChecker {
    pub min_words: usize,
}

impl Default for PostChecker {
    fn default() -> Self {
        Self {
            min_words: DEFAULT_MIN_WORDS,
        }
    }
}

impl PostChecker {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }
}

impl Checker<Value> for PostChecker {
    fn name(&self) -> &'static str {
        "post"
    }

    fn check(&self, artifact: &Value) -> CheckResult {
        if !artifact.is_object() || !has_title(artifact) {
            return CheckResult::Rejected;
        }
        let body = text_field(artifact, "body");
        CheckResult::from_bool(word_count(&body) >= self.min_words)
    }
}

fn has_title(value: &Value) -> bool {
    value
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|title| !title.is_empty())
}
