//! `multipart/mixed` codec for batch requests.
//!
//! Each part wraps one HTTP request (`application/http`) tagged with a
//! `Content-ID` of the form `<item-N>`. The server answers with the same
//! structure, using `<response-item-N>` ids.

use reelsync_core::RemoteServiceError;

/// One inner HTTP request of a batch.
pub(crate) struct BatchPart {
    pub method: &'static str,
    pub path: String,
    pub json_body: String,
}

/// One inner HTTP response of a batch.
#[derive(Debug)]
pub(crate) struct PartResponse {
    pub content_id: Option<String>,
    pub status: u16,
    pub body: String,
}

pub(crate) fn encode(boundary: &str, parts: &[BatchPart]) -> String {
    let mut body = String::new();
    for (index, part) in parts.iter().enumerate() {
        body.push_str(&format!("--{}\r\n", boundary));
        body.push_str("Content-Type: application/http\r\n");
        body.push_str(&format!("Content-ID: <item-{}>\r\n\r\n", index));
        body.push_str(&format!("{} {}\r\n", part.method, part.path));
        body.push_str("Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.push_str(&part.json_body);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    body
}

/// Extract the boundary parameter from a `multipart/mixed` content type.
pub(crate) fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        key.eq_ignore_ascii_case("boundary")
            .then(|| value.trim_matches('"').to_string())
    })
}

pub(crate) fn decode(boundary: &str, body: &str) -> Result<Vec<PartResponse>, RemoteServiceError> {
    let normalized = body.replace("\r\n", "\n");
    let delimiter = format!("--{}", boundary);

    let mut parts = Vec::new();
    // The first segment is the preamble; the one starting with "--" is the epilogue.
    for segment in normalized.split(delimiter.as_str()).skip(1) {
        if segment.starts_with("--") {
            break;
        }
        parts.push(decode_part(segment)?);
    }
    Ok(parts)
}

fn decode_part(segment: &str) -> Result<PartResponse, RemoteServiceError> {
    let segment = segment.trim_start_matches('\n');
    let (outer_headers, inner) = segment
        .split_once("\n\n")
        .ok_or_else(|| malformed("batch part has no body"))?;

    let content_id = outer_headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-id")
            .then(|| value.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    });

    let inner = inner.trim_start_matches('\n');
    let (status_line, rest) = inner.split_once('\n').unwrap_or((inner, ""));
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| malformed(&format!("bad status line '{}'", status_line)))?;

    let body = rest
        .split_once("\n\n")
        .map(|(_, body)| body.trim().to_string())
        .unwrap_or_default();

    Ok(PartResponse {
        content_id,
        status,
        body,
    })
}

/// Index encoded in a content id (`item-3` or `response-item-3`).
pub(crate) fn item_index(content_id: &str) -> Option<usize> {
    content_id.rsplit_once("item-")?.1.parse().ok()
}

fn malformed(message: &str) -> RemoteServiceError {
    RemoteServiceError::MalformedResponse(message.to_string())
}
