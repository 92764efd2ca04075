//! End-to-end pipeline scenarios driven through `run_pipeline`.
//!
//! These tests run every stage against scripted backends and feed sources and
//! check the saved file, the outcome, and the retry bookkeeping.

use std::fs;

use anyhow::anyhow;
use serde_json::json;

use blogger::agents::editor::{FILLER_SENTENCE, SHORTEN_WORD_LIMIT};
use blogger::core::text::word_count;
use blogger::io::backend::{DeterministicBackend, DisabledBackend};
use blogger::io::config::{BloggerConfig, WriterConfig};
use blogger::pipeline::{RunRequest, run_pipeline};
use blogger::test_support::{ScriptedBackend, ScriptedFeedSource, long_text};

fn request(dir: &std::path::Path, prompt: &str) -> RunRequest {
    RunRequest {
        output_dir: dir.join("out"),
        ..RunRequest::from_config(&BloggerConfig::default(), prompt)
    }
}

/// Default options, no codebase, no feeds, rule-based backend.
#[test]
fn intro_to_caching_with_defaults() {
    let temp = tempfile::tempdir().expect("tempdir");
    let req = request(temp.path(), "Intro to Caching\nWhy caches matter");

    let outcome = run_pipeline(
        &DeterministicBackend,
        &ScriptedFeedSource::default(),
        &BloggerConfig::default(),
        &req,
    )
    .expect("run");

    let titles: Vec<&str> = outcome
        .outline
        .sections
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles.len(), 5);
    assert_eq!(titles.first(), Some(&"Introduction"));
    assert_eq!(titles.last(), Some(&"Conclusion"));
    assert_eq!(outcome.outline.title, "Intro to Caching");

    assert!(word_count(&outcome.post.body) >= 400);
    assert_eq!(
        outcome.file_path,
        temp.path().join("out").join("intro_to_caching.md")
    );
    let saved = fs::read_to_string(&outcome.file_path).expect("read saved post");
    assert!(saved.starts_with("# Intro to Caching\n\n## Introduction"));

    let keys: Vec<&str> = outcome.promotions.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["linkedin", "twitter"]);
    assert!(outcome.codebase_context.is_none());
    assert!(outcome.headlines.is_empty());
    assert_eq!(outcome.planner.attempts, 1);
    assert_eq!(outcome.writer.attempts, 1);
}

#[test]
fn disabled_backend_matches_rule_based_output() {
    let temp = tempfile::tempdir().expect("tempdir");
    let cfg = BloggerConfig::default();
    let det = run_pipeline(
        &DeterministicBackend,
        &ScriptedFeedSource::default(),
        &cfg,
        &request(&temp.path().join("a"), "Intro to Caching"),
    )
    .expect("deterministic");
    let disabled = run_pipeline(
        &DisabledBackend,
        &ScriptedFeedSource::default(),
        &cfg,
        &request(&temp.path().join("b"), "Intro to Caching"),
    )
    .expect("disabled");

    assert_eq!(det.outline, disabled.outline);
    assert_eq!(det.post, disabled.post);
}

/// A backend that never produces an acceptable post is called exactly
/// `writer.max_retries` times and its last reply is kept.
#[test]
fn unacceptable_posts_degrade_to_last_attempt() {
    let temp = tempfile::tempdir().expect("tempdir");
    let backend = ScriptedBackend::default()
        .push_outline(Ok(json!({
            "title": "Scripted",
            "sections": [{"title": "One"}, {"title": "Two"}, {"title": "Three"}]
        })))
        .push_post(Ok(json!({"title": "Scripted", "body": "first try"})))
        .push_post(Ok(json!({"title": "Scripted", "body": "second try"})))
        .push_post(Ok(json!({"title": "Scripted", "body": long_text(500)})));
    let cfg = BloggerConfig {
        writer: WriterConfig {
            max_retries: 2,
            min_words: 400,
        },
        ..BloggerConfig::default()
    };

    let outcome = run_pipeline(
        &backend,
        &ScriptedFeedSource::default(),
        &cfg,
        &request(temp.path(), "Scripted"),
    )
    .expect("run");

    assert_eq!(backend.post_calls(), 2);
    assert!(!outcome.writer.accepted);
    assert_eq!(outcome.post.body, "second try");
    let saved = fs::read_to_string(&outcome.file_path).expect("read");
    assert_eq!(saved, "# Scripted\n\nsecond try");
}

#[test]
fn malformed_outlines_are_retried_then_fallback_used() {
    let temp = tempfile::tempdir().expect("tempdir");
    let backend = ScriptedBackend::default()
        .push_outline(Ok(json!([1, 2, 3])))
        .push_outline(Ok(json!({"sections": [{"title": ""}, {"title": "B"}, {"title": "C"}]})))
        .push_outline(Err(anyhow!("quota exceeded")));

    let outcome = run_pipeline(
        &backend,
        &ScriptedFeedSource::default(),
        &BloggerConfig::default(),
        &request(temp.path(), "Retry Story"),
    )
    .expect("run");

    assert_eq!(backend.outline_calls(), 3);
    assert!(outcome.planner.accepted);
    assert_eq!(outcome.planner.attempts, 3);
    assert_eq!(outcome.outline.title, "Retry Story");
    assert_eq!(outcome.outline.sections.len(), 5);
}

#[test]
fn shorten_and_expand_feedback_apply_in_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut req = request(temp.path(), "Intro to Caching");
    req.feedback = Some("Shorten this, then expand the end".to_string());

    let outcome = run_pipeline(
        &DeterministicBackend,
        &ScriptedFeedSource::default(),
        &BloggerConfig::default(),
        &req,
    )
    .expect("run");

    let (kept, filler) = outcome
        .post
        .body
        .split_once("\n\n")
        .expect("filler paragraph");
    assert_eq!(word_count(kept), SHORTEN_WORD_LIMIT);
    assert!(filler.starts_with(FILLER_SENTENCE));
}

#[test]
fn feeds_and_platforms_flow_through() {
    let temp = tempfile::tempdir().expect("tempdir");
    let feeds = ScriptedFeedSource::default().with_feed(
        "https://news.example/atom",
        concat!(
            "<feed><entry><title>Edge caching</title>",
            r#"<link href="https://news.example/1"/></entry></feed>"#,
        ),
    );
    let mut req = request(temp.path(), "Intro to Caching");
    req.rss_feeds = vec!["https://news.example/atom".to_string()];
    req.platforms = vec![
        "twitter".to_string(),
        "twitter".to_string(),
        "unknownx".to_string(),
    ];

    let outcome = run_pipeline(&DeterministicBackend, &feeds, &BloggerConfig::default(), &req)
        .expect("run");

    assert_eq!(outcome.headlines.len(), 1);
    assert_eq!(outcome.headlines[0].link, "https://news.example/1");
    assert_eq!(outcome.promotions.len(), 2);
    assert!(outcome.promotions["unknownx"].starts_with("Intro to Caching - "));
}
