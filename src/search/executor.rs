//! Supervised subprocess driver: spawns an external fixed-string search
//! tool, streams `path:line:text` records from its stdout, applies the
//! per-line admission filter, and supports mid-stream termination on
//! cancellation or result-cap.
//!
//! Grounded on the teacher's own child-process lifecycle in
//! `LspClient::new`/`shutdown` (spawn via `tokio::process::Command`, reap
//! via `child.wait()`/`child.kill()`), generalized from "a long-lived LSP
//! server child" to "a short-lived, cap-or-cancel-terminated search child".

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::inflight::{InFlightEntry, NO_CHILD};
use crate::search::heuristics::find_column0;

/// A single admitted lexical match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepMatch {
    pub path: String,
    pub line: u32,
    pub column: i64,
    pub text: String,
}

/// Where to search: an explicit file list, or a workspace root plus a
/// comma-separated extension filter.
pub enum SearchMode<'a> {
    Workspace {
        root: &'a str,
        extensions: &'a str,
    },
    FileList {
        files: &'a [String],
    },
}

fn build_args(needle: &str, mode: &SearchMode<'_>) -> Vec<String> {
    let mut args = Vec::new();
    match mode {
        SearchMode::Workspace { root, extensions } => {
            args.push("-r".to_string());
            args.push("-n".to_string());
            args.push("-I".to_string());
            args.push("--color=never".to_string());
            args.push("--exclude-dir=build".to_string());
            args.push("--exclude-dir=.git".to_string());
            for raw_ext in extensions.split(',') {
                let ext = raw_ext.trim().trim_start_matches('.');
                if !ext.is_empty() {
                    args.push(format!("--include=*.{ext}"));
                }
            }
            args.push("-F".to_string());
            args.push("--".to_string());
            args.push(needle.to_string());
            args.push((*root).to_string());
        }
        SearchMode::FileList { files } => {
            args.push("-n".to_string());
            args.push("-H".to_string());
            args.push("-I".to_string());
            args.push("--color=never".to_string());
            args.push("-F".to_string());
            args.push("--".to_string());
            args.push(needle.to_string());
            for f in *files {
                args.push(f.clone());
            }
        }
    }
    args
}

/// Split a grep output line on its first two `:` characters into
/// `(path, line_number, text)`. Returns `None` for lines that don't have
/// two colons, or whose middle field isn't a positive integer.
fn parse_grep_line(line: &str) -> Option<(String, u32, String)> {
    let first = line.find(':')?;
    let rest = &line[first + 1..];
    let second = rest.find(':')?;
    let path = line[..first].to_string();
    let line_no: u32 = rest[..second].parse().ok()?;
    if line_no == 0 {
        return None;
    }
    let text = rest[second + 1..].to_string();
    Some((path, line_no, text))
}

/// Run a search, honoring `max_results` and cooperative cancellation.
///
/// Publishes the child's pid into `entry` so a concurrent
/// `$/cancelRequest` can deliver `SIGTERM` to it; clears the pid before
/// returning. Every spawn is unconditionally reaped. Failures (missing
/// binary, spawn error) yield an empty result rather than propagating —
/// grep-based search is inherently best-effort (spec §4.C, §7).
pub async fn search(
    grep_bin: &str,
    needle: &str,
    max_results: usize,
    mode: &SearchMode<'_>,
    entry: &InFlightEntry,
) -> Vec<GrepMatch> {
    if max_results == 0 || needle.is_empty() || entry.is_cancelled() {
        return Vec::new();
    }

    let args = build_args(needle, mode);
    let mut command = Command::new(grep_bin);
    command
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!("failed to spawn search tool {grep_bin}: {e}");
            return Vec::new();
        }
    };

    let pid = child.id().map_or(NO_CHILD, |p| p as i32);
    entry.set_child_pid(pid);

    let mut results = Vec::with_capacity(max_results.min(256));
    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            let next = lines.next_line().await;
            let Ok(Some(line)) = next else { break };
            let Some((path, line_no, text)) = parse_grep_line(&line) else {
                continue;
            };
            let column = find_column0(&text, needle);
            if column < 0 {
                continue;
            }
            results.push(GrepMatch {
                path,
                line: line_no,
                column,
                text,
            });
            if results.len() >= max_results {
                if pid != NO_CHILD {
                    crate::inflight::terminate_pid(pid);
                }
                break;
            }
        }
    }

    entry.clear_child_pid();
    let _ = child.wait().await;
    results
}
