//! HTTP/1.1 exchange over one transport.
//!
//! Requests are always `POST /<ActionName>` with a protobuf body. One
//! exchange owns the connection for its whole duration; there is no
//! pipelining. The response is read incrementally into a growable buffer
//! until the head is parsed and `content-length` bytes of body arrived.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::protocol::action::Action;

use super::transport::Transport;

#[derive(Debug, Error)]
pub(crate) enum ExchangeError {
    #[error("cannot write request: {0}")]
    Write(std::io::Error),

    #[error("cannot read response: {0}")]
    Read(std::io::Error),

    #[error("connection closed before a full response arrived")]
    UnexpectedEof,

    #[error("malformed response: {0}")]
    Malformed(String),
}

pub(crate) type Result<T, E = ExchangeError> = std::result::Result<T, E>;

/// Compression negotiation headers.
pub(crate) const HEADER_REQUEST_COMPRESS_TYPE: &str = "x-ots-request-compress-type";
pub(crate) const HEADER_REQUEST_COMPRESS_SIZE: &str = "x-ots-request-compress-size";
pub(crate) const HEADER_RESPONSE_COMPRESS_TYPE: &str = "x-ots-response-compress-type";
pub(crate) const HEADER_RESPONSE_COMPRESS_SIZE: &str = "x-ots-response-compress-size";

/// The only compression type spoken here. A misspelled variant exists in
/// the wild; it is NOT accepted.
pub(crate) const COMPRESS_TYPE_DEFLATE: &str = "deflate";

#[derive(Debug)]
pub(crate) struct HttpRequest {
    pub(crate) action: Action,
    /// Header names are expected lowercase.
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
}

#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub(crate) status: u16,
    /// Header names lowercased on parse.
    pub(crate) headers: HashMap<String, String>,
    pub(crate) body: Bytes,
}

impl HttpResponse {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Runs one request/response exchange.
pub(crate) async fn exchange(
    transport: &mut Transport,
    host: &str,
    request: &HttpRequest,
) -> Result<HttpResponse> {
    // headers and body gather into one scatter buffer, one async write
    let mut wire = BytesMut::with_capacity(256 + request.body.len());
    wire.extend_from_slice(format!("POST /{} HTTP/1.1\r\n", request.action.name()).as_bytes());
    wire.extend_from_slice(format!("host: {host}\r\n").as_bytes());
    wire.extend_from_slice(format!("content-length: {}\r\n", request.body.len()).as_bytes());
    for (name, value) in &request.headers {
        wire.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    wire.extend_from_slice(b"\r\n");
    wire.extend_from_slice(&request.body);

    transport
        .write_all(&wire)
        .await
        .map_err(ExchangeError::Write)?;
    transport.flush().await.map_err(ExchangeError::Write)?;

    read_response(transport).await
}

async fn read_response(transport: &mut Transport) -> Result<HttpResponse> {
    let mut buf = BytesMut::with_capacity(4096);

    // read until the head is complete
    let (status, headers, content_length) = loop {
        if let Some(head_len) = find_head_end(&buf) {
            let (status, headers) = parse_head(&buf[..head_len])?;
            let _ = buf.split_to(head_len);
            let content_length = headers
                .get("content-length")
                .ok_or_else(|| {
                    ExchangeError::Malformed("response lacks content-length".to_string())
                })?
                .parse::<usize>()
                .map_err(|_| ExchangeError::Malformed("unparsable content-length".to_string()))?;
            break (status, headers, content_length);
        }
        let n = transport
            .read_buf(&mut buf)
            .await
            .map_err(ExchangeError::Read)?;
        if n == 0 {
            return Err(ExchangeError::UnexpectedEof);
        }
    };

    // then until the body is complete
    while buf.len() < content_length {
        let n = transport
            .read_buf(&mut buf)
            .await
            .map_err(ExchangeError::Read)?;
        if n == 0 {
            return Err(ExchangeError::UnexpectedEof);
        }
    }
    if buf.len() > content_length {
        return Err(ExchangeError::Malformed(format!(
            "{} stray bytes beyond the response body",
            buf.len() - content_length
        )));
    }

    let body = decompress(&headers, buf.freeze())?;
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

/// Index one past the `\r\n\r\n` terminating the head, if present.
fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

fn parse_head(head: &[u8]) -> Result<(u16, HashMap<String, String>)> {
    let head = std::str::from_utf8(head)
        .map_err(|_| ExchangeError::Malformed("response head is not ASCII".to_string()))?;
    let mut lines = head.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| ExchangeError::Malformed("empty response head".to_string()))?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if version != "HTTP/1.1" && version != "HTTP/1.0" {
        return Err(ExchangeError::Malformed(format!(
            "unsupported HTTP version {version:?}"
        )));
    }
    let status = parts
        .next()
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| {
            ExchangeError::Malformed(format!("unparsable status line {status_line:?}"))
        })?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            ExchangeError::Malformed(format!("malformed header line {line:?}"))
        })?;
        headers.insert(
            name.trim().to_ascii_lowercase(),
            value.trim().to_string(),
        );
    }
    Ok((status, headers))
}

#[cfg(feature = "compression-deflate")]
fn decompress(headers: &HashMap<String, String>, body: Bytes) -> Result<Bytes> {
    use std::io::Read;

    let Some(compress_type) = headers.get(HEADER_RESPONSE_COMPRESS_TYPE) else {
        return Ok(body);
    };
    if compress_type != COMPRESS_TYPE_DEFLATE {
        return Err(ExchangeError::Malformed(format!(
            "unsupported response compression {compress_type:?}"
        )));
    }
    let want_size = headers
        .get(HEADER_RESPONSE_COMPRESS_SIZE)
        .and_then(|s| s.parse::<usize>().ok());

    let mut decoder = flate2::read::ZlibDecoder::new(&body[..]);
    let mut out = Vec::with_capacity(want_size.unwrap_or(body.len() * 2));
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ExchangeError::Malformed(format!("undecodable deflate body: {e}")))?;
    if let Some(want) = want_size {
        if out.len() != want {
            return Err(ExchangeError::Malformed(format!(
                "deflate body inflated to {} bytes, header promised {want}",
                out.len()
            )));
        }
    }
    Ok(out.into())
}

#[cfg(not(feature = "compression-deflate"))]
fn decompress(headers: &HashMap<String, String>, body: Bytes) -> Result<Bytes> {
    if let Some(compress_type) = headers.get(HEADER_RESPONSE_COMPRESS_TYPE) {
        return Err(ExchangeError::Malformed(format!(
            "response compression {compress_type:?} is not enabled"
        )));
    }
    Ok(body)
}
