//! Pipeline configuration stored in `blogger.toml`.

use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::process::CommandLimits;

pub const DEFAULT_CONFIG_FILE: &str = "blogger.toml";

pub const ENV_OUTPUT_DIR: &str = "BLOGGER_OUT";
pub const ENV_MIN_WORDS: &str = "BLOGGER_MIN_WORDS";
pub const ENV_RSS_FEEDS: &str = "BLOGGER_RSS_FEEDS";

/// Pipeline configuration (TOML).
///
/// Intended to be edited by humans. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BloggerConfig {
    /// Directory the finished post is written to.
    pub output_dir: PathBuf,
    pub tone: String,
    /// Platforms to write promotional copy for.
    pub platforms: Vec<String>,
    /// Prompts longer than this many characters are cut.
    pub prompt_char_limit: usize,
    pub planner: PlannerConfig,
    pub writer: WriterConfig,
    pub feeds: FeedConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlannerConfig {
    pub max_retries: u32,
    pub min_sections: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WriterConfig {
    pub max_retries: u32,
    pub min_words: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedConfig {
    pub urls: Vec<String>,
    pub limit_per_feed: usize,
    pub timeout_secs: u64,
}

/// Which generative backend the stages try before the rule-based fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Rule-based synthesis only.
    Deterministic,
    /// Spawn `backend.command` and parse its JSON reply.
    Llm,
    /// No backend; every stage falls back.
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Command receiving the rendered prompt on stdin (e.g. `["codex","exec","-"]`).
    pub command: Vec<String>,
    pub timeout_secs: u64,
    /// Truncate backend stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for BloggerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./out"),
            tone: "technical".to_string(),
            platforms: vec!["twitter".to_string(), "linkedin".to_string()],
            prompt_char_limit: 1000,
            planner: PlannerConfig::default(),
            writer: WriterConfig::default(),
            feeds: FeedConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_sections: 3,
        }
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            min_words: 400,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            limit_per_feed: 5,
            timeout_secs: 10,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Deterministic,
            command: vec![
                "codex".to_string(),
                "exec".to_string(),
                "--skip-git-repo-check".to_string(),
                "-".to_string(),
            ],
            timeout_secs: 10 * 60,
            output_limit_bytes: 200_000,
        }
    }
}

impl PlannerConfig {
    pub fn retries(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.max_retries).ok_or_else(|| anyhow!("planner.max_retries must be > 0"))
    }
}

impl WriterConfig {
    pub fn retries(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.max_retries).ok_or_else(|| anyhow!("writer.max_retries must be > 0"))
    }
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BackendConfig {
    pub fn limits(&self) -> CommandLimits {
        CommandLimits {
            timeout: Duration::from_secs(self.timeout_secs),
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}

impl BloggerConfig {
    pub fn validate(&self) -> Result<()> {
        self.planner.retries()?;
        self.writer.retries()?;
        if self.prompt_char_limit == 0 {
            return Err(anyhow!("prompt_char_limit must be > 0"));
        }
        if self.feeds.limit_per_feed == 0 {
            return Err(anyhow!("feeds.limit_per_feed must be > 0"));
        }
        if self.feeds.timeout_secs == 0 {
            return Err(anyhow!("feeds.timeout_secs must be > 0"));
        }
        if self.backend.kind == BackendKind::Llm {
            if self.backend.command.is_empty() || self.backend.command[0].trim().is_empty() {
                return Err(anyhow!("backend.command must be a non-empty array"));
            }
            if self.backend.timeout_secs == 0 {
                return Err(anyhow!("backend.timeout_secs must be > 0"));
            }
            if self.backend.output_limit_bytes == 0 {
                return Err(anyhow!("backend.output_limit_bytes must be > 0"));
            }
        }
        Ok(())
    }

    /// Apply `BLOGGER_OUT`, `BLOGGER_MIN_WORDS` and `BLOGGER_RSS_FEEDS`.
    ///
    /// `lookup` resolves a variable name; pass `|k| std::env::var(k).ok()` for
    /// the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_MIN_WORDS).filter(|v| !v.trim().is_empty()) {
            self.writer.min_words = raw
                .trim()
                .parse()
                .with_context(|| format!("parse {ENV_MIN_WORDS}={raw}"))?;
        }
        if let Some(raw) = lookup(ENV_RSS_FEEDS).filter(|v| !v.trim().is_empty()) {
            self.feeds.urls = raw
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BloggerConfig::default()`.
pub fn load_config(path: &Path) -> Result<BloggerConfig> {
    if !path.exists() {
        let cfg = BloggerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BloggerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &BloggerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
