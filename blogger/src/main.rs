//! Blog content pipeline CLI.
//!
//! `blogger run` plans, writes, edits, saves and promotes a post. The other
//! subcommands expose single collaborators for inspection.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use blogger::exit_codes;
use blogger::io::backend::build_backend;
use blogger::io::codebase::analyze;
use blogger::io::config::{
    BackendKind, BloggerConfig, DEFAULT_CONFIG_FILE, load_config, write_config,
};
use blogger::io::feeds::{HttpFeedSource, fetch_headlines};
use blogger::logging;
use blogger::pipeline::{RunOutcome, RunRequest, plan_outline, run_pipeline};

#[derive(Parser)]
#[command(
    name = "blogger",
    version,
    about = "Blog content pipeline: plan, write, edit, save, promote"
)]
struct Cli {
    /// Path to the TOML config. Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline and save the post.
    Run(RunArgs),
    /// Print the planned outline as JSON without writing a post.
    Outline {
        #[arg(long, default_value = "")]
        prompt: String,
        #[arg(long)]
        codebase: Option<PathBuf>,
        #[arg(long, value_enum)]
        backend: Option<BackendKind>,
    },
    /// Print a codebase summary as JSON.
    Analyze { path: PathBuf },
    /// Fetch feeds and print their headlines as JSON.
    Headlines {
        #[arg(required = true)]
        urls: Vec<String>,
        /// Headlines kept per feed (defaults to `feeds.limit_per_feed`).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write a default config file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// Prompt text; the first line becomes the default title.
    #[arg(long, conflicts_with = "prompt_file")]
    prompt: Option<String>,
    /// Read the prompt from a file.
    #[arg(long)]
    prompt_file: Option<PathBuf>,
    /// Source tree to draw code context from.
    #[arg(long)]
    codebase: Option<PathBuf>,
    /// RSS/Atom feed URL (repeatable). Replaces `feeds.urls`.
    #[arg(long = "feed")]
    feeds: Vec<String>,
    #[arg(long)]
    tone: Option<String>,
    /// Editing instructions, e.g. "shorten" or "expand".
    #[arg(long)]
    feedback: Option<String>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Promotion platform (repeatable). Replaces `platforms`.
    #[arg(long = "platform")]
    platforms: Vec<String>,
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,
    /// Print the full outcome as JSON.
    #[arg(long)]
    json: bool,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::InitConfig { force } => cmd_init_config(&cli.config, force),
        Command::Run(args) => cmd_run(load(&cli.config)?, args),
        Command::Outline {
            prompt,
            codebase,
            backend,
        } => cmd_outline(load(&cli.config)?, &prompt, codebase.as_deref(), backend),
        Command::Analyze { path } => cmd_analyze(&path),
        Command::Headlines { urls, limit } => cmd_headlines(load(&cli.config)?, &urls, limit),
    }
}

fn load(path: &Path) -> Result<BloggerConfig> {
    let mut cfg = load_config(path)?;
    cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_run(mut cfg: BloggerConfig, args: RunArgs) -> Result<()> {
    if let Some(kind) = args.backend {
        cfg.backend.kind = kind;
        cfg.validate()?;
    }
    let request = build_request(&cfg, &args)?;
    let backend = build_backend(&cfg.backend);
    let feeds = HttpFeedSource::new(cfg.feeds.timeout());

    let outcome = run_pipeline(backend.as_ref(), &feeds, &cfg, &request)?;
    if args.json {
        print_json(&outcome)
    } else {
        print_summary(&outcome);
        Ok(())
    }
}

fn build_request(cfg: &BloggerConfig, args: &RunArgs) -> Result<RunRequest> {
    let prompt = match (&args.prompt, &args.prompt_file) {
        (Some(prompt), _) => prompt.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("read prompt file {}", path.display()))?,
        (None, None) => String::new(),
    };
    let mut request = RunRequest::from_config(cfg, prompt);
    request.codebase_path = args.codebase.clone();
    request.feedback = args.feedback.clone();
    if !args.feeds.is_empty() {
        request.rss_feeds = args.feeds.clone();
    }
    if let Some(tone) = &args.tone {
        request.tone = tone.clone();
    }
    if let Some(dir) = &args.output_dir {
        request.output_dir = dir.clone();
    }
    if !args.platforms.is_empty() {
        request.platforms = args.platforms.clone();
    }
    Ok(request)
}

fn cmd_outline(
    mut cfg: BloggerConfig,
    prompt: &str,
    codebase: Option<&Path>,
    backend: Option<BackendKind>,
) -> Result<()> {
    if let Some(kind) = backend {
        cfg.backend.kind = kind;
        cfg.validate()?;
    }
    let backend = build_backend(&cfg.backend);
    let outline = plan_outline(backend.as_ref(), &cfg, prompt, codebase)?;
    print_json(&outline)
}

fn cmd_analyze(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("codebase path {} does not exist", path.display());
    }
    print_json(&analyze(path))
}

fn cmd_headlines(cfg: BloggerConfig, urls: &[String], limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(cfg.feeds.limit_per_feed);
    let source = HttpFeedSource::new(cfg.feeds.timeout());
    print_json(&fetch_headlines(&source, urls, limit))
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &BloggerConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    println!("Saved: {}", outcome.file_path.display());
    println!("Title: {}", outcome.post.title);
    println!("Outline ({} attempt(s)):", outcome.planner.attempts);
    for (i, section) in outcome.outline.sections.iter().enumerate() {
        println!("  {}. {}", i + 1, section.title);
    }
    if !outcome.writer.accepted {
        println!(
            "Note: post kept after {} attempt(s) without passing checks",
            outcome.writer.attempts
        );
    }
    for (platform, text) in &outcome.promotions {
        println!("\n[{platform}]\n{text}");
    }
}

/// Print `value` as pretty JSON with a trailing newline.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
