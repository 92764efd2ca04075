//! Writer stage: outline to [`Post`].

use std::num::NonZeroU32;

use anyhow::Result;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::core::checkers::PostChecker;
use crate::core::retry::{RetryLoop, RetryOutcome};
use crate::core::synth;
use crate::core::text::word_count;
use crate::core::types::{CodebaseSummary, Outline, Post};
use crate::io::backend::{GenerativeBackend, PostRequest};
use crate::io::config::WriterConfig;

#[derive(Debug, Clone, Copy)]
pub struct Writer {
    max_retries: NonZeroU32,
    min_words: usize,
}

impl Writer {
    pub fn new(max_retries: NonZeroU32, min_words: usize) -> Self {
        Self {
            max_retries,
            min_words,
        }
    }

    pub fn from_config(config: &WriterConfig) -> Result<Self> {
        Ok(Self::new(config.retries()?, config.min_words))
    }

    /// Write a post for `outline`, retrying while the post checker rejects it.
    ///
    /// The outline is only read. Backend failures fall back to the
    /// rule-based post for that attempt.
    #[instrument(
        skip_all,
        fields(backend = backend.name(), max_retries = self.max_retries.get(), tone = %tone)
    )]
    pub fn write<B: GenerativeBackend + ?Sized>(
        &self,
        backend: &B,
        outline: &Outline,
        codebase: Option<&CodebaseSummary>,
        tone: &str,
    ) -> RetryOutcome<Post> {
        let request = PostRequest {
            outline,
            codebase,
            tone,
            min_words: self.min_words,
        };
        let retry = RetryLoop::<Value>::new("post", self.max_retries)
            .with_checker(PostChecker::new(self.min_words));

        let outcome = retry
            .run(|| match backend.generate_post(&request) {
                Ok(value) => value,
                Err(err) => {
                    warn!(err = ?err, "post backend failed, using deterministic post");
                    synth::post(outline, codebase).to_artifact()
                }
            })
            .map(|value| Post::from_artifact(&value));

        info!(
            attempts = outcome.attempts,
            accepted = outcome.accepted,
            words = word_count(&outcome.artifact.body),
            "post written"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Section;
    use crate::io::backend::DisabledBackend;
    use crate::test_support::{ScriptedBackend, codebase_summary, long_text};
    use anyhow::anyhow;
    use serde_json::json;

    fn writer(retries: u32, min_words: usize) -> Writer {
        Writer::new(NonZeroU32::new(retries).expect("non-zero"), min_words)
    }

    fn outline() -> Outline {
        Outline {
            title: "Caching".to_string(),
            sections: vec![
                Section::new("Intro", "Why caches matter."),
                Section::new("Code", "Show code for an LRU."),
            ],
        }
    }

    #[test]
    fn fallback_post_meets_default_minimum() {
        let outline = outline();
        let outcome = writer(2, 400).write(&DisabledBackend, &outline, None, "technical");
        assert!(outcome.accepted);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.artifact.title, "Caching");
        assert!(word_count(&outcome.artifact.body) >= 400);
    }

    #[test]
    fn short_backend_posts_are_retried() {
        let backend = ScriptedBackend::default()
            .push_post(Ok(json!({"title": "Caching", "body": "too short"})))
            .push_post(Ok(json!({"title": "Caching", "body": long_text(50)})));
        let outline = outline();

        let outcome = writer(2, 50).write(&backend, &outline, None, "playful");

        assert!(outcome.accepted);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(backend.post_calls(), 2);
        assert_eq!(backend.last_tone().as_deref(), Some("playful"));
    }

    #[test]
    fn exhausted_retries_keep_last_post() {
        let backend = ScriptedBackend::default()
            .push_post(Ok(json!({"title": "", "body": long_text(500)})))
            .push_post(Ok(json!({"title": "Last", "body": "short"})));
        let outline = outline();

        let outcome = writer(2, 400).write(&backend, &outline, None, "technical");

        assert!(!outcome.accepted);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.artifact.body, "short");
    }

    #[test]
    fn backend_error_mid_run_uses_fallback_for_that_attempt() {
        let backend = ScriptedBackend::default()
            .push_post(Ok(json!({"title": "Caching", "body": "short"})))
            .push_post(Err(anyhow!("backend crashed")));
        let outline = outline();

        let outcome = writer(2, 400).write(&backend, &outline, None, "technical");

        assert!(outcome.accepted);
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.artifact.body.starts_with("## Intro"));
    }

    #[test]
    fn codebase_context_adds_code_placeholder_to_fallback() {
        let outline = outline();
        let codebase = codebase_summary(4);
        let outcome = writer(1, 10).write(&DisabledBackend, &outline, Some(&codebase), "technical");
        let body = &outcome.artifact.body;
        assert!(body.starts_with("## Intro\n\nWhy caches matter.\n\n## Code"));
        assert!(body.contains("Show code for an LRU.\n\n\n```python"));
    }

    #[test]
    fn caller_outline_is_untouched() {
        let outline = outline();
        let before = outline.clone();
        writer(1, 10).write(&DisabledBackend, &outline, None, "technical");
        assert_eq!(outline, before);
    }
}
