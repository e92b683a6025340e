//! `Content-Length:`-framed message codec, the wire format LSP uses over
//! stdio.
//!
//! Grounded on the teacher's own `reader_loop`/`send_message` pair in
//! `lsp_client.rs`, which implement this exact framing for the client role;
//! here the same loop shape reads the *other* direction (editor -> us).

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Outcome of reading one frame.
pub enum Frame {
    /// A message body was read (may be empty — callers must skip it).
    Body(String),
    /// Clean EOF before any header byte: the stream is closed.
    Eof,
}

/// Read one `Content-Length`-framed message from `reader`.
///
/// Header parsing is line-oriented and tolerant: unknown headers are
/// ignored, whitespace around values is trimmed, and a missing or
/// unparsable `Content-Length` is treated as zero. A short read on the body
/// (fewer bytes available than declared) is a fatal framing error.
pub async fn read_message<R>(reader: &mut BufReader<R>) -> crate::error::Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut content_length: usize = 0;
    let mut saw_header_byte = false;

    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            if saw_header_byte {
                return Err(crate::error::ServerError::Framing(
                    "EOF while reading headers".into(),
                ));
            }
            return Ok(Frame::Eof);
        }
        saw_header_byte = true;

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    if content_length == 0 {
        return Ok(Frame::Body(String::new()));
    }

    let mut body = vec![0u8; content_length];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|_| crate::error::ServerError::Framing("short read on message body".into()))?;

    let text = String::from_utf8(body)
        .map_err(|e| crate::error::ServerError::Framing(format!("invalid UTF-8 body: {e}")))?;
    Ok(Frame::Body(text))
}

/// Write one framed message, flushing so the header and body reach the peer
/// as a single logical unit. Callers must serialize concurrent writers
/// themselves (see `session::Session::write_mutex`) — this function makes
/// no atomicity guarantee beyond its own two writes.
pub async fn write_message<W>(writer: &mut W, body: &str) -> crate::error::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn round_trip_single_message() {
        let mut buf = Vec::new();
        write_message(&mut buf, r#"{"hello":"world"}"#).await.unwrap();

        let mut reader = BufReader::new(&buf[..]);
        match read_message(&mut reader).await.unwrap() {
            Frame::Body(s) => assert_eq!(s, r#"{"hello":"world"}"#),
            Frame::Eof => panic!("expected a body"),
        }
    }

    #[tokio::test]
    async fn empty_body_yields_empty_string_not_eof() {
        let mut reader = BufReader::new(&b"Content-Length: 0\r\n\r\n"[..]);
        match read_message(&mut reader).await.unwrap() {
            Frame::Body(s) => assert_eq!(s, ""),
            Frame::Eof => panic!("zero-length body is not EOF"),
        }
    }

    #[tokio::test]
    async fn missing_content_length_treated_as_zero() {
        let mut reader = BufReader::new(&b"X-Custom: 1\r\n\r\n"[..]);
        match read_message(&mut reader).await.unwrap() {
            Frame::Body(s) => assert_eq!(s, ""),
            Frame::Eof => panic!("should not be EOF"),
        }
    }

    #[tokio::test]
    async fn clean_eof_before_any_header_byte() {
        let mut reader = BufReader::new(&b""[..]);
        match read_message(&mut reader).await.unwrap() {
            Frame::Eof => {}
            Frame::Body(_) => panic!("expected EOF"),
        }
    }

    #[tokio::test]
    async fn short_body_is_a_framing_error() {
        let mut reader = BufReader::new(&b"Content-Length: 10\r\n\r\nabc"[..]);
        assert!(read_message(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn unknown_headers_are_ignored_and_whitespace_trimmed() {
        let input = b"X-Foo: bar\r\nContent-Length:   5  \r\n\r\nhello";
        let mut reader = BufReader::new(&input[..]);
        match read_message(&mut reader).await.unwrap() {
            Frame::Body(s) => assert_eq!(s, "hello"),
            Frame::Eof => panic!("expected a body"),
        }
    }

    #[tokio::test]
    async fn two_messages_back_to_back() {
        let mut buf = Vec::new();
        write_message(&mut buf, "one").await.unwrap();
        write_message(&mut buf, "two").await.unwrap();

        let mut reader = BufReader::new(&buf[..]);
        let first = match read_message(&mut reader).await.unwrap() {
            Frame::Body(s) => s,
            Frame::Eof => panic!(),
        };
        let second = match read_message(&mut reader).await.unwrap() {
            Frame::Body(s) => s,
            Frame::Eof => panic!(),
        };
        assert_eq!(first, "one");
        assert_eq!(second, "two");
    }
}
