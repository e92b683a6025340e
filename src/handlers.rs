//! Per-method handler glue: translate a JSON-RPC request's params into a
//! search, rank the results, and shape the JSON-RPC result value.
//!
//! Grounded on the teacher's `tools.rs` per-tool methods — validate input,
//! ensure backing state, call the backend, shape the response — adapted
//! from "call an LSP server and format its reply as tool text" to "run a
//! search and shape its reply as an LSP result".

use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::inflight::InFlightEntry;
use crate::paths;
use crate::search::{self, heuristics, rank, stopwords, GrepMatch, SearchMode};
use crate::session::SessionState;
use crate::uri;

const WORKSPACE_SYMBOL_CAP: usize = 50;
const HOVER_CAP: usize = 20;
const DEFINITION_CAP: usize = 20;
const REFERENCES_CAP: usize = 50;
const DEFINITION_SCORE_THRESHOLD: i64 = 60;
const WORKSPACE_EXTENSIONS: &str = "c,cc,cpp,cxx,h,hh,hpp,hxx";

/// Dispatch an already-validated async method name to its handler.
pub async fn dispatch(
    state: &SessionState,
    method: &str,
    params: &Value,
    entry: &InFlightEntry,
) -> Result<Value> {
    match method {
        "workspace/symbol" => workspace_symbol(state, params, entry).await,
        "textDocument/hover" => hover(state, params, entry).await,
        "textDocument/definition" => definition(state, params, entry).await,
        "textDocument/references" => references(state, params, entry).await,
        other => Err(anyhow!("unhandled async method: {other}")),
    }
}

/// Synchronous `initialize` handler: records the workspace root and the
/// `clangdFileStatus` option, replies with server capabilities.
pub fn initialize(state: &SessionState, params: &Value) -> Value {
    let root_uri = params.get("rootUri").and_then(Value::as_str);
    let root_path = params.get("rootPath").and_then(Value::as_str);
    let resolved = root_path
        .map(str::to_string)
        .or_else(|| root_uri.map(uri::file_uri_to_path));

    // A `--root` CLI flag overrides whatever the client sends here; only
    // fill in the root from `initialize` if nothing has claimed it yet.
    let mut guard = state
        .root
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if guard.is_none() {
        *guard = resolved;
    }
    drop(guard);

    let clangd_file_status = params
        .pointer("/initializationOptions/clangdFileStatus")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    state
        .clangd_file_status
        .store(clangd_file_status, std::sync::atomic::Ordering::SeqCst);

    json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                "change": 1,
            },
            "hoverProvider": true,
            "definitionProvider": true,
            "referencesProvider": true,
            "workspaceSymbolProvider": true,
        },
        "serverInfo": {
            "name": "super-lazy-clangd",
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

fn search_mode<'a>(state: &'a SessionState, root: &'a str) -> SearchMode<'a> {
    match &state.files {
        Some(files) => SearchMode::FileList { files },
        None => SearchMode::Workspace {
            root,
            extensions: WORKSPACE_EXTENSIONS,
        },
    }
}

async fn run_search_absolute(
    state: &SessionState,
    root: &str,
    needle: &str,
    cap: usize,
    entry: &InFlightEntry,
) -> Vec<GrepMatch> {
    let mode = search_mode(state, root);
    let matches = search::search(&state.grep_bin, needle, cap, &mode, entry).await;
    matches
        .into_iter()
        .map(|m| GrepMatch {
            path: paths::normalize_join(root, &m.path),
            ..m
        })
        .collect()
}

struct Cursor {
    uri: String,
    abs_path: String,
    line0: u32,
    character: u32,
}

fn extract_cursor(params: &Value) -> Option<Cursor> {
    let uri_str = params
        .get("textDocument")
        .and_then(|d| d.get("uri"))
        .and_then(Value::as_str)?
        .to_string();
    let line0 = u32::try_from(params.pointer("/position/line")?.as_u64()?).ok()?;
    let character = u32::try_from(params.pointer("/position/character")?.as_u64()?).ok()?;
    let abs_path = uri::file_uri_to_path(&uri_str);
    Some(Cursor {
        uri: uri_str,
        abs_path,
        line0,
        character,
    })
}

/// Resolve the word under the cursor, applying the comment and stop-word
/// filters. Returns `None` for any "bad input" condition the handler
/// should treat as a neutral empty result (spec §7).
async fn resolve_word(state: &SessionState, cursor: &Cursor) -> Option<String> {
    let text = state.documents.get(&cursor.uri).await?;
    let line_text = text.lines().nth(cursor.line0 as usize).unwrap_or("");
    if heuristics::cursor_in_comment(line_text, cursor.character as usize) {
        return None;
    }
    let word = heuristics::word_at(&text, cursor.line0 as usize, cursor.character as usize);
    if word.is_empty() {
        return None;
    }
    if stopwords::is_stop_word(&word.to_lowercase()) {
        return None;
    }
    Some(word)
}

fn location(abs_path: &str, line0: u32, column: i64, len: usize) -> Value {
    let start_char = column.max(0) as u64;
    json!({
        "uri": uri::path_to_file_uri(abs_path),
        "range": {
            "start": {"line": line0, "character": start_char},
            "end": {"line": line0, "character": start_char + len as u64},
        },
    })
}

pub async fn workspace_symbol(
    state: &SessionState,
    params: &Value,
    entry: &InFlightEntry,
) -> Result<Value> {
    let query = params
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    if query.is_empty() {
        return Ok(json!([]));
    }

    let root = state.root();
    let matches = run_search_absolute(state, &root, &query, WORKSPACE_SYMBOL_CAP, entry).await;

    let symbols: Vec<Value> = matches
        .iter()
        .map(|m| {
            json!({
                "name": query,
                "kind": 13,
                "location": location(&m.path, m.line.saturating_sub(1), m.column, query.chars().count()),
                "containerName": m.path,
            })
        })
        .collect();
    Ok(Value::Array(symbols))
}

pub async fn hover(state: &SessionState, params: &Value, entry: &InFlightEntry) -> Result<Value> {
    let Some(cursor) = extract_cursor(params) else {
        return Ok(Value::Null);
    };
    let Some(word) = resolve_word(state, &cursor).await else {
        return Ok(Value::Null);
    };

    let root = state.root();
    let matches = run_search_absolute(state, &root, &word, HOVER_CAP, entry).await;
    let ranked = rank::rank(
        matches,
        &word,
        Some(&cursor.abs_path),
        Some(cursor.line0 + 1),
        Some(&cursor.abs_path),
    );

    let Some(top) = ranked.first() else {
        return Ok(Value::Null);
    };

    let contents = format!(
        "**{}:{}**\n```cpp\n{}\n```",
        top.path,
        top.line,
        top.text.trim()
    );
    Ok(json!({
        "contents": {"kind": "markdown", "value": contents},
        "range": {
            "start": {"line": cursor.line0, "character": cursor.character},
            "end": {"line": cursor.line0, "character": cursor.character},
        },
    }))
}

pub async fn definition(
    state: &SessionState,
    params: &Value,
    entry: &InFlightEntry,
) -> Result<Value> {
    let Some(cursor) = extract_cursor(params) else {
        return Ok(Value::Null);
    };
    let Some(word) = resolve_word(state, &cursor).await else {
        return Ok(Value::Null);
    };

    let root = state.root();
    let matches = run_search_absolute(state, &root, &word, DEFINITION_CAP, entry).await;
    // Definition does not bias toward the current file (spec §9).
    let ranked = rank::rank(matches, &word, Some(&cursor.abs_path), Some(cursor.line0 + 1), None);

    if ranked.is_empty() {
        return Ok(Value::Null);
    }

    let strong_hits: Vec<_> = ranked
        .iter()
        .filter(|m| m.score >= DEFINITION_SCORE_THRESHOLD)
        .collect();

    let locations: Vec<Value> = if strong_hits.len() == 1 {
        vec![location(
            &strong_hits[0].path,
            strong_hits[0].line.saturating_sub(1),
            strong_hits[0].column,
            word.chars().count(),
        )]
    } else {
        ranked
            .iter()
            .map(|m| location(&m.path, m.line.saturating_sub(1), m.column, word.chars().count()))
            .collect()
    };

    Ok(Value::Array(locations))
}

pub async fn references(
    state: &SessionState,
    params: &Value,
    entry: &InFlightEntry,
) -> Result<Value> {
    let Some(cursor) = extract_cursor(params) else {
        return Ok(json!([]));
    };
    let Some(word) = resolve_word(state, &cursor).await else {
        return Ok(json!([]));
    };

    let root = state.root();
    let matches = run_search_absolute(state, &root, &word, REFERENCES_CAP, entry).await;
    let ranked = rank::rank(
        matches,
        &word,
        Some(&cursor.abs_path),
        Some(cursor.line0 + 1),
        Some(&cursor.abs_path),
    );

    let locations: Vec<Value> = ranked
        .iter()
        .map(|m| location(&m.path, m.line.saturating_sub(1), m.column, word.chars().count()))
        .collect();
    Ok(Value::Array(locations))
}
