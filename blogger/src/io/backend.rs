//! Generative backend abstraction for the planning and writing stages.
//!
//! The [`GenerativeBackend`] trait decouples the stages from the source of
//! their artifacts. Replies are raw JSON so a checker can reject whatever
//! shape a backend produces; the stages fall back to rule-based synthesis when
//! a backend errors. Tests use scripted backends that return predetermined
//! values without spawning processes.

use std::process::Command;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::synth;
use crate::core::types::{CodebaseSummary, Headline, Outline};
use crate::io::config::{BackendConfig, BackendKind};
use crate::io::process::run_with_timeout;
use crate::io::prompt::PromptBuilder;

/// Rendered prompts larger than this are trimmed before reaching the backend.
pub const PROMPT_BUDGET_BYTES: usize = 64 * 1024;

/// Inputs for an outline attempt.
#[derive(Debug, Clone, Copy)]
pub struct OutlineRequest<'a> {
    pub prompt: &'a str,
    pub codebase: Option<&'a CodebaseSummary>,
    pub headlines: &'a [Headline],
    pub min_sections: usize,
}

/// Inputs for a post attempt.
#[derive(Debug, Clone, Copy)]
pub struct PostRequest<'a> {
    pub outline: &'a Outline,
    pub codebase: Option<&'a CodebaseSummary>,
    pub tone: &'a str,
    pub min_words: usize,
}

/// Source of candidate outlines and posts.
pub trait GenerativeBackend {
    fn name(&self) -> &'static str;

    /// Produce a candidate outline (`{"title", "sections": [{"title", "notes"}]}`).
    fn generate_outline(&self, request: &OutlineRequest<'_>) -> Result<Value>;

    /// Produce a candidate post (`{"title", "body"}`).
    fn generate_post(&self, request: &PostRequest<'_>) -> Result<Value>;
}

/// Rule-based synthesis. Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicBackend;

impl GenerativeBackend for DeterministicBackend {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    fn generate_outline(&self, request: &OutlineRequest<'_>) -> Result<Value> {
        Ok(synth::outline(request.prompt, request.codebase).to_artifact())
    }

    fn generate_post(&self, request: &PostRequest<'_>) -> Result<Value> {
        Ok(synth::post(request.outline, request.codebase).to_artifact())
    }
}

/// A backend that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBackend;

impl GenerativeBackend for DisabledBackend {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn generate_outline(&self, _request: &OutlineRequest<'_>) -> Result<Value> {
        Err(anyhow!("generative backend not configured"))
    }

    fn generate_post(&self, _request: &PostRequest<'_>) -> Result<Value> {
        Err(anyhow!("generative backend not configured"))
    }
}

/// Spawns `command`, writes the rendered prompt to its stdin and parses the
/// JSON object in its stdout.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    config: BackendConfig,
    prompts: PromptBuilder,
}

impl CommandBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            prompts: PromptBuilder::new(PROMPT_BUDGET_BYTES),
        }
    }

    #[instrument(skip_all, fields(stage = %stage, prompt_bytes = prompt.len()))]
    fn invoke(&self, stage: &str, prompt: &str) -> Result<Value> {
        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or_else(|| anyhow!("backend.command is empty"))?;
        info!(program = %program, "invoking generative backend");

        let mut cmd = Command::new(program);
        cmd.args(args);
        let output = run_with_timeout(cmd, Some(prompt.as_bytes()), self.config.limits())
            .with_context(|| format!("run backend for {stage}"))?;
        if output.stdout_truncated > 0 {
            warn!(
                dropped_bytes = output.stdout_truncated,
                "backend stdout truncated"
            );
        }
        output.ensure_success(program)?;

        let value = extract_json(&output.stdout_text())
            .with_context(|| format!("parse backend reply for {stage}"))?;
        debug!("backend reply parsed");
        Ok(value)
    }
}

impl GenerativeBackend for CommandBackend {
    fn name(&self) -> &'static str {
        "command"
    }

    fn generate_outline(&self, request: &OutlineRequest<'_>) -> Result<Value> {
        let prompt = self.prompts.build_outline(request)?;
        self.invoke("outline", &prompt)
    }

    fn generate_post(&self, request: &PostRequest<'_>) -> Result<Value> {
        let prompt = self.prompts.build_post(request)?;
        self.invoke("post", &prompt)
    }
}

/// Pick the backend named by `config.kind`.
pub fn build_backend(config: &BackendConfig) -> Box<dyn GenerativeBackend> {
    match config.kind {
        BackendKind::Deterministic => Box::new(DeterministicBackend),
        BackendKind::Llm => Box::new(CommandBackend::new(config.clone())),
        BackendKind::Disabled => Box::new(DisabledBackend),
    }
}

/// Parse the whole reply as JSON, or else the span from the first `{` to the
/// last `}`.
pub fn extract_json(reply: &str) -> Result<Value> {
    let trimmed = reply.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str(&trimmed[start..=end]).context("invalid JSON object in reply")
        }
        _ => Err(anyhow!("no JSON object in reply")),
    }
}
