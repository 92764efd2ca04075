//! Test-only backends, feed sources and fixtures.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::core::types::{CodebaseSummary, Post};
use crate::io::backend::{GenerativeBackend, OutlineRequest, PostRequest};
use crate::io::feeds::FeedSource;

/// Backend that replays queued replies and records what it was asked.
///
/// An empty queue answers with an error, so the stages fall back to
/// rule-based synthesis once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    outlines: RefCell<VecDeque<Result<Value>>>,
    posts: RefCell<VecDeque<Result<Value>>>,
    outline_calls: Cell<u32>,
    post_calls: Cell<u32>,
    last_outline_prompt: RefCell<Option<String>>,
    last_headline_count: Cell<Option<usize>>,
    last_tone: RefCell<Option<String>>,
}

impl ScriptedBackend {
    pub fn push_outline(self, reply: Result<Value>) -> Self {
        self.outlines.borrow_mut().push_back(reply);
        self
    }

    pub fn push_post(self, reply: Result<Value>) -> Self {
        self.posts.borrow_mut().push_back(reply);
        self
    }

    pub fn outline_calls(&self) -> u32 {
        self.outline_calls.get()
    }

    pub fn post_calls(&self) -> u32 {
        self.post_calls.get()
    }

    pub fn last_outline_prompt(&self) -> Option<String> {
        self.last_outline_prompt.borrow().clone()
    }

    pub fn last_headline_count(&self) -> Option<usize> {
        self.last_headline_count.get()
    }

    pub fn last_tone(&self) -> Option<String> {
        self.last_tone.borrow().clone()
    }
}

impl GenerativeBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn generate_outline(&self, request: &OutlineRequest<'_>) -> Result<Value> {
        self.outline_calls.set(self.outline_calls.get() + 1);
        *self.last_outline_prompt.borrow_mut() = Some(request.prompt.to_string());
        self.last_headline_count.set(Some(request.headlines.len()));
        self.outlines
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("outline script exhausted")))
    }

    fn generate_post(&self, request: &PostRequest<'_>) -> Result<Value> {
        self.post_calls.set(self.post_calls.get() + 1);
        *self.last_tone.borrow_mut() = Some(request.tone.to_string());
        self.posts
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("post script exhausted")))
    }
}

/// Feed source backed by an in-memory map. Unknown URLs fail.
#[derive(Debug, Default)]
pub struct ScriptedFeedSource {
    documents: HashMap<String, String>,
    fetches: Cell<u32>,
}

impl ScriptedFeedSource {
    pub fn with_feed(mut self, url: &str, document: &str) -> Self {
        self.documents.insert(url.to_string(), document.to_string());
        self
    }

    pub fn fetches(&self) -> u32 {
        self.fetches.get()
    }
}

impl FeedSource for ScriptedFeedSource {
    fn fetch(&self, url: &str) -> Result<String> {
        self.fetches.set(self.fetches.get() + 1);
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no scripted feed for {url}"))
    }
}

/// `count` distinct whitespace-separated words.
pub fn long_text(count: usize) -> String {
    (0..count)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn post(title: &str, body: &str) -> Post {
    Post {
        title: title.to_string(),
        body: body.to_string(),
    }
}

/// Summary of a small fake source tree with `file_count` Rust files.
pub fn codebase_summary(file_count: usize) -> CodebaseSummary {
    CodebaseSummary {
        file_count,
        total_lines: file_count * 10,
        top_extensions: vec![(".rs".to_string(), file_count)],
        sample_files: (0..file_count.min(3))
            .map(|i| format!("src/file{i}.rs"))
            .collect(),
    }
}
