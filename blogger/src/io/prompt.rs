//! Prompt rendering for the command-line generative backend.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use std::sync::LazyLock;
use tracing::debug;

use crate::io::backend::{OutlineRequest, PostRequest};

const OUTLINE_TEMPLATE: &str = include_str!("prompts/outline.md");
const POST_TEMPLATE: &str = include_str!("prompts/post.md");

/// Droppable sections, least important first.
const DROP_ORDER: [&str; 2] = ["headlines", "codebase"];
const TRUNCATED_MARKER: &str = "\n[truncated]";

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("outline", OUTLINE_TEMPLATE)
            .context("load outline template")?;
        env.add_template("post", POST_TEMPLATE)
            .context("load post template")?;
        Ok(Self { env })
    }

    fn render_outline(&self, request: &OutlineRequest<'_>) -> Result<String> {
        let template = self.env.get_template("outline")?;
        let rendered = template.render(context! {
            prompt => request.prompt.trim(),
            min_sections => request.min_sections,
            codebase => request.codebase,
            headlines => request.headlines,
        })?;
        Ok(rendered)
    }

    fn render_post(&self, request: &PostRequest<'_>) -> Result<String> {
        let template = self.env.get_template("post")?;
        let rendered = template.render(context! {
            outline => request.outline,
            tone => request.tone,
            min_words => request.min_words,
            codebase => request.codebase,
        })?;
        Ok(rendered)
    }
}

/// A parsed section from rendered template output.
#[derive(Debug, Clone)]
struct ParsedSection {
    key: String,
    required: bool,
    content: String,
}

/// Split rendered output on `<!-- section:KEY required|droppable -->` markers.
fn parse_sections(rendered: &str) -> Vec<ParsedSection> {
    static SECTION_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"<!--\s*section:(\w+)\s+(required|droppable)\s*-->")
            .expect("section marker regex")
    });

    let markers: Vec<_> = SECTION_RE.captures_iter(rendered).collect();
    let mut sections = Vec::with_capacity(markers.len());
    for (i, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(key), Some(kind)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(rendered.len(), |m| m.start());
        let content = rendered[whole.end()..end].trim().to_string();
        let required = kind.as_str() == "required";
        if !content.is_empty() || required {
            sections.push(ParsedSection {
                key: key.as_str().to_string(),
                required,
                content,
            });
        }
    }
    sections
}

/// Drop droppable sections in [`DROP_ORDER`] until the prompt fits, then cut
/// the last section if it still does not.
fn apply_budget(sections: &mut Vec<ParsedSection>, budget: usize) {
    let total_len =
        |secs: &[ParsedSection]| -> usize { secs.iter().map(|s| s.content.len()).sum() };

    for key in DROP_ORDER {
        if total_len(sections) <= budget {
            return;
        }
        if let Some(idx) = sections.iter().position(|s| s.key == key && !s.required) {
            debug!(
                section = key,
                bytes_dropped = sections[idx].content.len(),
                "dropped section for budget"
            );
            sections.remove(idx);
        }
    }

    let over = total_len(sections).saturating_sub(budget);
    if over == 0 {
        return;
    }
    if let Some(last) = sections.last_mut() {
        let before_len = last.content.len();
        let keep = before_len.saturating_sub(over + TRUNCATED_MARKER.len());
        truncate_at_char_boundary(&mut last.content, keep);
        last.content.push_str(TRUNCATED_MARKER);
        debug!(
            section = %last.key,
            before_len,
            after_len = last.content.len(),
            "truncated section for budget"
        );
    }
}

fn truncate_at_char_boundary(text: &mut String, max_bytes: usize) {
    let mut cut = max_bytes.min(text.len());
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

fn render_sections(sections: &[ParsedSection]) -> String {
    sections
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds backend prompts within a byte budget, dropping context sections first.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    budget_bytes: usize,
}

impl PromptBuilder {
    pub fn new(budget_bytes: usize) -> Self {
        Self { budget_bytes }
    }

    pub fn build_outline(&self, request: &OutlineRequest<'_>) -> Result<String> {
        let rendered = PromptEngine::new()?.render_outline(request)?;
        Ok(self.fit(&rendered))
    }

    pub fn build_post(&self, request: &PostRequest<'_>) -> Result<String> {
        let rendered = PromptEngine::new()?.render_post(request)?;
        Ok(self.fit(&rendered))
    }

    fn fit(&self, rendered: &str) -> String {
        let mut sections = parse_sections(rendered);
        apply_budget(&mut sections, self.budget_bytes);
        render_sections(&sections)
    }
}
