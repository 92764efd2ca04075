//! Shared artifact types for the blog pipeline.
//!
//! Artifacts cross the retry loop as raw JSON because a generative backend may
//! return any shape. The typed views here are built from that JSON once a stage
//! has settled on an attempt, and the conversion never fails: missing or
//! mistyped fields become empty values.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One planned section of an outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub notes: String,
}

impl Section {
    pub fn new(title: &str, notes: &str) -> Self {
        Self {
            title: title.to_string(),
            notes: notes.to_string(),
        }
    }
}

/// Structured plan for a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Outline {
    /// Build an outline from a raw artifact. Non-object sections are skipped.
    pub fn from_artifact(value: &Value) -> Self {
        let sections = value
            .get("sections")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.is_object())
                    .map(|item| Section {
                        title: str_field(item, "title"),
                        notes: text_field(item, "notes"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            title: str_field(value, "title"),
            sections,
        }
    }

    pub fn to_artifact(&self) -> Value {
        json!({ "title": &self.title, "sections": &self.sections })
    }
}

/// Generated article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub body: String,
}

impl Post {
    pub fn from_artifact(value: &Value) -> Self {
        Self {
            title: str_field(value, "title"),
            body: text_field(value, "body"),
        }
    }

    pub fn to_artifact(&self) -> Value {
        json!({ "title": &self.title, "body": &self.body })
    }
}

/// Summary of a scanned source tree. Treated as opaque context by the stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodebaseSummary {
    pub file_count: usize,
    pub total_lines: usize,
    /// `(extension, count)` pairs, most common first.
    pub top_extensions: Vec<(String, usize)>,
    pub sample_files: Vec<String>,
}

impl CodebaseSummary {
    pub fn has_files(&self) -> bool {
        self.file_count > 0
    }
}

/// A feed entry used as topical context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub link: String,
    pub summary: String,
}

/// Verdict of a checker for a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckResult {
    Accepted,
    Rejected,
}

impl CheckResult {
    pub fn is_accepted(self) -> bool {
        self == CheckResult::Accepted
    }

    pub fn from_bool(accepted: bool) -> Self {
        if accepted {
            CheckResult::Accepted
        } else {
            CheckResult::Rejected
        }
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Like [`str_field`], but non-string scalars and containers keep their JSON text.
pub(crate) fn text_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
