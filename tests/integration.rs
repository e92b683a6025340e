//! End-to-end framed-stdio scenarios driving the session engine in-process
//! against a real `grep` over a scratch workspace, matching the teacher's
//! own `tests/integration.rs` structure (tempfile-backed scratch dirs,
//! skip-if-prerequisite-missing rather than fail).

use std::pin::Pin;
use std::process::Command as StdCommand;
use std::sync::{Arc, Mutex as StdMutex};
use std::task::{Context, Poll};

use serde_json::{json, Value};
use tokio::io::AsyncWrite;

use super_lazy_clangd::session::{Session, SessionState};

/// An in-memory sink the session writes its framed responses into, so the
/// test can inspect them without a real pipe.
#[derive(Clone)]
struct SharedBuffer(Arc<StdMutex<Vec<u8>>>);

impl SharedBuffer {
    fn new() -> Self {
        Self(Arc::new(StdMutex::new(Vec::new())))
    }

    fn snapshot(&self) -> Vec<u8> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }
    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn binary_exists(name: &str) -> bool {
    StdCommand::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn frame(body: &Value) -> Vec<u8> {
    let body = serde_json::to_string(body).unwrap();
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body).into_bytes()
}

/// Split a byte buffer of back-to-back `Content-Length`-framed bodies into
/// their parsed JSON values, in arrival order.
fn parse_frames(buf: &[u8]) -> Vec<Value> {
    let mut out = Vec::new();
    let mut rest = buf;
    loop {
        let Some(header_end) = find_subslice(rest, b"\r\n\r\n") else { break };
        let header = std::str::from_utf8(&rest[..header_end]).unwrap();
        let len: usize = header
            .lines()
            .find_map(|l| l.split_once(':'))
            .filter(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if rest.len() < body_start + len {
            break;
        }
        let body = &rest[body_start..body_start + len];
        out.push(serde_json::from_slice(body).unwrap());
        rest = &rest[body_start + len..];
    }
    out
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn response_for<'a>(frames: &'a [Value], id: i64) -> Option<&'a Value> {
    frames.iter().find(|f| f.get("id") == Some(&json!(id)))
}

#[tokio::test]
async fn initialize_shutdown_exit_handshake() {
    let state = Arc::new(SessionState::new("grep".to_string(), None));
    let writer = SharedBuffer::new();
    let session = Session::new(state, writer.clone());

    let input = [
        frame(&json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{"rootUri":"file:///tmp/x","capabilities":{}}})),
        frame(&json!({"jsonrpc":"2.0","id":2,"method":"shutdown"})),
        frame(&json!({"jsonrpc":"2.0","method":"exit"})),
    ]
    .concat();

    let shutdown_received = session.run(&input[..]).await;
    assert!(shutdown_received);

    let frames = parse_frames(&writer.snapshot());
    let init_reply = response_for(&frames, 1).expect("initialize response");
    assert_eq!(init_reply["result"]["capabilities"]["hoverProvider"], json!(true));
    assert_eq!(init_reply["result"]["capabilities"]["definitionProvider"], json!(true));

    let shutdown_reply = response_for(&frames, 2).expect("shutdown response");
    assert_eq!(shutdown_reply["result"], Value::Null);
}

#[tokio::test]
async fn hover_on_unknown_document_returns_null() {
    let state = Arc::new(SessionState::new("grep".to_string(), None));
    let writer = SharedBuffer::new();
    let session = Session::new(state, writer.clone());

    let input = [
        frame(&json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{}})),
        frame(&json!({
            "jsonrpc":"2.0","id":10,"method":"textDocument/hover",
            "params":{"textDocument":{"uri":"file:///no/such"},"position":{"line":0,"character":0}}
        })),
        frame(&json!({"jsonrpc":"2.0","method":"exit"})),
    ]
    .concat();

    session.run(&input[..]).await;
    // The hover handler runs on a spawned task; give it a moment to post.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let frames = parse_frames(&writer.snapshot());
    let hover_reply = response_for(&frames, 10).expect("hover response");
    assert_eq!(hover_reply["result"], Value::Null);
}

#[tokio::test]
async fn workspace_symbol_empty_query_short_circuits() {
    if !binary_exists("grep") {
        eprintln!("SKIP: grep binary not found on PATH");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let state = Arc::new(SessionState::new(
        "grep".to_string(),
        Some(vec![tmp.path().join("missing.c").to_string_lossy().into_owned()]),
    ));
    let writer = SharedBuffer::new();
    let session = Session::new(state, writer.clone());

    let input = [
        frame(&json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{}})),
        frame(&json!({"jsonrpc":"2.0","id":5,"method":"workspace/symbol","params":{"query":""}})),
        frame(&json!({"jsonrpc":"2.0","method":"exit"})),
    ]
    .concat();

    session.run(&input[..]).await;
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let frames = parse_frames(&writer.snapshot());
    let reply = response_for(&frames, 5).expect("workspace/symbol response");
    assert_eq!(reply["result"], json!([]));
}

#[tokio::test]
async fn definition_finds_unique_strong_hit_in_real_workspace() {
    if !binary_exists("grep") {
        eprintln!("SKIP: grep binary not found on PATH");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let file_path = tmp.path().join("main.c");
    std::fs::write(
        &file_path,
        "int compute(int x) {\n    return x + 1;\n}\n\nint main(void) {\n    return compute(3);\n}\n",
    )
    .expect("write scratch file");

    let uri = format!("file://{}", file_path.to_str().unwrap());
    let root = tmp.path().to_str().unwrap().to_string();

    let state = Arc::new(SessionState::new("grep".to_string(), None));
    let writer = SharedBuffer::new();
    let session = Session::new(state, writer.clone());

    let open_text = std::fs::read_to_string(&file_path).unwrap();
    let input = [
        frame(&json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{"rootUri": format!("file://{root}")}})),
        frame(&json!({
            "jsonrpc":"2.0","method":"textDocument/didOpen",
            "params":{"textDocument":{"uri":uri,"text":open_text}}
        })),
        frame(&json!({
            "jsonrpc":"2.0","id":7,"method":"textDocument/definition",
            "params":{"textDocument":{"uri":uri},"position":{"line":5,"character":11}}
        })),
        frame(&json!({"jsonrpc":"2.0","method":"exit"})),
    ]
    .concat();

    session.run(&input[..]).await;
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    let frames = parse_frames(&writer.snapshot());
    let reply = response_for(&frames, 7).expect("definition response");
    let locations = reply["result"].as_array().expect("definition result is an array");
    assert_eq!(locations.len(), 1, "expected the unique strong hit, got {locations:?}");
    assert!(locations[0]["uri"].as_str().unwrap().ends_with("main.c"));
    assert_eq!(locations[0]["range"]["start"]["line"], json!(0));
}

#[tokio::test]
async fn cancel_notification_for_unknown_id_is_silently_dropped() {
    let state = Arc::new(SessionState::new("grep".to_string(), None));
    let writer = SharedBuffer::new();
    let session = Session::new(state, writer.clone());

    let input = [
        frame(&json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{}})),
        frame(&json!({"jsonrpc":"2.0","method":"$/cancelRequest","params":{"id":"never-seen"}})),
        frame(&json!({"jsonrpc":"2.0","id":2,"method":"shutdown"})),
        frame(&json!({"jsonrpc":"2.0","method":"exit"})),
    ]
    .concat();

    let shutdown_received = session.run(&input[..]).await;
    assert!(shutdown_received, "an unknown cancel must not derail the session");

    let frames = parse_frames(&writer.snapshot());
    assert!(response_for(&frames, 2).is_some());
}
