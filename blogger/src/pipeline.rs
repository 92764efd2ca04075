//! Orchestration for a single `blogger run`: plan, write, edit, save, promote.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::agents::editor;
use crate::agents::planner::Planner;
use crate::agents::social::create_promotions;
use crate::agents::writer::Writer;
use crate::core::retry::RetryOutcome;
use crate::core::synth::TITLE_CHAR_LIMIT;
use crate::core::text::{first_line, truncate_chars};
use crate::core::types::{CodebaseSummary, Headline, Outline, Post};
use crate::io::backend::GenerativeBackend;
use crate::io::codebase;
use crate::io::config::BloggerConfig;
use crate::io::feeds::{FeedSource, fetch_headlines};
use crate::io::store::save_post;

/// Prompt used when the caller supplies an empty one.
pub const DEFAULT_PROMPT: &str = "Write a technical blog post";

/// Inputs for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub prompt: String,
    pub codebase_path: Option<PathBuf>,
    pub rss_feeds: Vec<String>,
    pub tone: String,
    pub feedback: Option<String>,
    pub output_dir: PathBuf,
    pub platforms: Vec<String>,
}

impl RunRequest {
    /// A request for `prompt` with every other option taken from `config`.
    pub fn from_config(config: &BloggerConfig, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            codebase_path: None,
            rss_feeds: config.feeds.urls.clone(),
            tone: config.tone.clone(),
            feedback: None,
            output_dir: config.output_dir.clone(),
            platforms: config.platforms.clone(),
        }
    }
}

/// How a retried stage settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub attempts: u32,
    /// `false` when the stage kept its last attempt after exhausting retries.
    pub accepted: bool,
}

impl<A> From<&RetryOutcome<A>> for StageReport {
    fn from(outcome: &RetryOutcome<A>) -> Self {
        Self {
            attempts: outcome.attempts,
            accepted: outcome.accepted,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub outline: Outline,
    /// The post after editing.
    pub post: Post,
    pub file_path: PathBuf,
    pub promotions: BTreeMap<String, String>,
    pub codebase_context: Option<CodebaseSummary>,
    pub headlines: Vec<Headline>,
    pub planner: StageReport,
    pub writer: StageReport,
}

/// Run the five stages in order.
///
/// Backend and feed failures are absorbed inside the stages. Only config
/// errors and a failure to save the post reach the caller.
#[instrument(
    skip_all,
    fields(backend = backend.name(), output_dir = %request.output_dir.display())
)]
pub fn run_pipeline<B, S>(
    backend: &B,
    feeds: &S,
    config: &BloggerConfig,
    request: &RunRequest,
) -> Result<RunOutcome>
where
    B: GenerativeBackend + ?Sized,
    S: FeedSource + ?Sized,
{
    let planner = Planner::from_config(&config.planner)?;
    let writer = Writer::from_config(&config.writer)?;

    let prompt = effective_prompt(&request.prompt, config.prompt_char_limit);
    let codebase_context = analyze_codebase(request);
    let headlines = if request.rss_feeds.is_empty() {
        Vec::new()
    } else {
        fetch_headlines(feeds, &request.rss_feeds, config.feeds.limit_per_feed)
    };

    let (outline, planner_report) =
        plan_stage(&planner, backend, &prompt, codebase_context.as_ref(), &headlines);

    let written = writer.write(backend, &outline, codebase_context.as_ref(), &request.tone);
    let writer_report = StageReport::from(&written);
    let mut post = written.artifact;

    editor::edit(&mut post, request.feedback.as_deref());

    let file_path = save_post(&post.title, &post.body, &request.output_dir)?;
    let promotions = create_promotions(&post, &request.platforms);

    info!(
        path = %file_path.display(),
        platforms = promotions.len(),
        "pipeline finished"
    );
    Ok(RunOutcome {
        outline,
        post,
        file_path,
        promotions,
        codebase_context,
        headlines,
        planner: planner_report,
        writer: writer_report,
    })
}

/// Run only the planner stage, as `blogger outline` does.
#[instrument(skip_all, fields(backend = backend.name()))]
pub fn plan_outline<B: GenerativeBackend + ?Sized>(
    backend: &B,
    config: &BloggerConfig,
    prompt: &str,
    codebase_path: Option<&Path>,
) -> Result<Outline> {
    let planner = Planner::from_config(&config.planner)?;
    let prompt = effective_prompt(prompt, config.prompt_char_limit);
    let codebase_context = codebase_path.and_then(analyze_path);
    let (outline, _) = plan_stage(&planner, backend, &prompt, codebase_context.as_ref(), &[]);
    Ok(outline)
}

fn plan_stage<B: GenerativeBackend + ?Sized>(
    planner: &Planner,
    backend: &B,
    prompt: &str,
    codebase: Option<&CodebaseSummary>,
    headlines: &[Headline],
) -> (Outline, StageReport) {
    let planned = planner.plan(backend, prompt, codebase, headlines);
    let report = StageReport::from(&planned);
    let mut outline = planned.artifact;
    if outline.title.is_empty() {
        outline.title = first_line(prompt, TITLE_CHAR_LIMIT);
    }
    (outline, report)
}

fn effective_prompt(prompt: &str, limit: usize) -> String {
    if prompt.trim().is_empty() {
        return DEFAULT_PROMPT.to_string();
    }
    truncate_chars(prompt, limit)
}

fn analyze_codebase(request: &RunRequest) -> Option<CodebaseSummary> {
    request.codebase_path.as_deref().and_then(analyze_path)
}

fn analyze_path(path: &Path) -> Option<CodebaseSummary> {
    if !path.exists() {
        warn!(path = %path.display(), "codebase path does not exist, skipping analysis");
        return None;
    }
    Some(codebase::analyze(path))
}
