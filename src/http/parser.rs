use crate::http::request::{Method, Request};
use std::collections::HashMap;

/// Upper bound on how many bytes of a connection are read before parsing.
pub const MAX_REQUEST_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The first line of the request was empty
    EmptyRequest,
    /// The request line did not have exactly three space-separated tokens
    InvalidRequestLine,
    /// A header line without a colon
    InvalidHeader,
    /// The header section is not valid UTF-8
    InvalidEncoding,
    /// Input ended before the blank line that terminates the headers
    Incomplete,
}

/// Parses the request line and headers out of `buf`.
///
/// Everything after the blank line that ends the header section is ignored.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    let (headers_end, _) = find_headers_end(buf).ok_or(ParseError::Incomplete)?;

    let head = std::str::from_utf8(&buf[..headers_end])
        .map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = head.lines().map(|line| line.trim_end_matches('\r'));

    let (method, path, version) = split_request_line(lines.next().unwrap_or(""))?;

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeader)?;

        headers.insert(key.to_string(), value.trim().to_string());
    }

    Ok(Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
    })
}

/// Parses only the request line at the start of `buf`.
///
/// Needs neither the rest of the headers nor the blank line after them, so
/// the verb of a request is known even when its header block is broken.
pub fn parse_request_line(buf: &[u8]) -> Result<(Method, &str, &str), ParseError> {
    let end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
    let line = std::str::from_utf8(&buf[..end]).map_err(|_| ParseError::InvalidEncoding)?;

    split_request_line(line.trim_end_matches('\r'))
}

fn split_request_line(line: &str) -> Result<(Method, &str, &str), ParseError> {
    if line.is_empty() {
        return Err(ParseError::EmptyRequest);
    }

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, path, version] = parts.as_slice() else {
        return Err(ParseError::InvalidRequestLine);
    };

    Ok((Method::parse(method), path, version))
}

/// Locates the blank line ending the header section.
///
/// Returns the offset where the header text ends and the length of the
/// terminator that follows it. Both `\r\n\r\n` and `\n\n` are recognised;
/// whichever appears first wins.
pub fn find_headers_end(buf: &[u8]) -> Option<(usize, usize)> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n");
    let lf = buf.windows(2).position(|w| w == b"\n\n");

    match (crlf, lf) {
        (Some(c), Some(l)) if l < c + 2 => Some((l, 2)),
        (Some(c), _) => Some((c, 4)),
        (None, Some(l)) => Some((l, 2)),
        (None, None) => None,
    }
}
