//! Markdown persistence for finished posts.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::core::text::slugify_title;

pub const POST_EXTENSION: &str = "md";

/// Path a post with `title` is written to under `directory`.
pub fn post_path(title: &str, directory: &Path) -> PathBuf {
    directory.join(format!("{}.{POST_EXTENSION}", slugify_title(title)))
}

/// Write `# {title}` followed by the body into `{directory}/{slug}.md`.
///
/// Creates `directory` if needed and overwrites an existing post with the same
/// slug. This is the one collaborator whose errors reach the caller.
pub fn save_post(title: &str, body: &str, directory: &Path) -> Result<PathBuf> {
    fs::create_dir_all(directory)
        .with_context(|| format!("create output dir {}", directory.display()))?;
    let path = post_path(title, directory);
    let contents = format!("# {title}\n\n{body}");
    fs::write(&path, contents).with_context(|| format!("write post {}", path.display()))?;
    info!(path = %path.display(), bytes = body.len(), "post saved");
    Ok(path)
}
