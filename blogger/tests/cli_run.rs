//! CLI tests for the `blogger` binary.
//!
//! Spawns the binary in a temp directory and checks exit codes, stdout and the
//! files it writes.

use std::fs;
use std::process::Command;

use blogger::exit_codes;
use serde_json::Value;

fn blogger() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_blogger"));
    cmd.env_remove("BLOGGER_OUT")
        .env_remove("BLOGGER_MIN_WORDS")
        .env_remove("BLOGGER_RSS_FEEDS")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn run_json_saves_post_and_prints_outcome() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out_dir = temp.path().join("posts");

    let output = blogger()
        .current_dir(temp.path())
        .args(["run", "--prompt", "Intro to Caching\nWhy caches matter"])
        .arg("--output-dir")
        .arg(&out_dir)
        .args(["--backend", "disabled", "--json"])
        .output()
        .expect("blogger run");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let outcome: Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(outcome["outline"]["sections"].as_array().map(Vec::len), Some(5));
    assert!(outcome["promotions"]["twitter"].is_string());
    assert!(outcome["promotions"]["linkedin"].is_string());
    assert!(out_dir.join("intro_to_caching.md").is_file());
}

#[test]
fn env_override_sets_output_dir() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out_dir = temp.path().join("from-env");

    let status = blogger()
        .current_dir(temp.path())
        .env("BLOGGER_OUT", &out_dir)
        .args(["run", "--prompt", "Env Post"])
        .status()
        .expect("blogger run");

    assert_eq!(status.code(), Some(exit_codes::OK));
    assert!(out_dir.join("env_post.md").is_file());
}

#[test]
fn invalid_config_exits_with_invalid_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("blogger.toml"),
        "[planner]\nmax_retries = 0\n",
    )
    .expect("write config");

    let output = blogger()
        .current_dir(temp.path())
        .args(["run", "--prompt", "x"])
        .output()
        .expect("blogger run");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("planner.max_retries"));
}

#[test]
fn init_config_writes_defaults_once() {
    let temp = tempfile::tempdir().expect("tempdir");

    let first = blogger()
        .current_dir(temp.path())
        .arg("init-config")
        .status()
        .expect("init-config");
    assert_eq!(first.code(), Some(exit_codes::OK));
    let written = fs::read_to_string(temp.path().join("blogger.toml")).expect("read config");
    assert!(written.contains("tone = \"technical\""));

    let second = blogger()
        .current_dir(temp.path())
        .arg("init-config")
        .status()
        .expect("init-config again");
    assert_eq!(second.code(), Some(exit_codes::INVALID));
}

#[test]
fn analyze_prints_summary() {
    let temp = tempfile::tempdir().expect("tempdir");
    let src = temp.path().join("src");
    fs::create_dir_all(&src).expect("mkdir");
    fs::write(src.join("main.rs"), "fn main() {}\n").expect("write");

    let output = blogger()
        .current_dir(temp.path())
        .arg("analyze")
        .arg(&src)
        .output()
        .expect("blogger analyze");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let summary: Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(summary["file_count"], 1);
    assert_eq!(summary["total_lines"], 2);
    assert_eq!(summary["top_extensions"][0][0], ".rs");
}
