//! Decides whether a request path names a CGI script.
//!
//! Unlike servers that only run scripts from whitelisted directories, every
//! directory under the document root is eligible: a directory whose only
//! index is `index.py` is served by running that script. An HTML index
//! always wins over a script index.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension that marks a CGI script.
pub const SCRIPT_EXTENSION: &str = "py";

/// Script run for a directory without an HTML index.
pub const SCRIPT_INDEX: &str = "index.py";

/// Index files that make a directory static content.
pub const HTML_INDEXES: [&str; 2] = ["index.html", "index.htm"];

/// A request path split into the first segment and everything after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgiResolution {
    /// First path segment with its leading `/` (e.g. `/cgi`); empty when
    /// the path has a single segment
    pub head: String,
    /// Remainder after the separator, without a leading `/`
    pub tail: String,
    /// Raw query string, if the request target had one
    pub query: Option<String>,
}

/// A request target after canonicalisation.
///
/// The decoded path and the raw query are kept apart: a decoded `%3F` is
/// part of a file name, never a query separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedPath {
    /// Percent-decoded path, always starting with `/`
    pub path: String,
    /// Query string as received, without the `?`
    pub query: Option<String>,
}

impl fmt::Display for CollapsedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{}", self.path, query),
            None => f.write_str(&self.path),
        }
    }
}

/// Canonicalises a request target.
///
/// - The query (from the first `?`) is split off before anything else and
///   kept undecoded.
/// - The path is percent-decoded, then split on `/`.
/// - Empty and `.` segments are dropped; `..` drops the previous segment and
///   is ignored at the root, so the result never climbs above `/`.
/// - The path always starts with `/` and keeps a trailing `/` when the
///   input ended in `/`, `/.` or `/..`.
///
/// ```
/// # use sensible_server::cgi::resolver::collapse_path;
/// assert_eq!(collapse_path("/a/./b/../c").path, "/a/c");
/// assert_eq!(collapse_path("/../../etc/passwd").path, "/etc/passwd");
/// assert_eq!(collapse_path("/a//b/?x=1").to_string(), "/a/b/?x=1");
/// assert_eq!(collapse_path("/a%3Fb.txt").query, None);
/// ```
pub fn collapse_path(target: &str) -> CollapsedPath {
    let (path, query) = split_query(target);
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    let mut trailing_slash = false;

    for segment in decoded.split('/') {
        trailing_slash = false;
        match segment {
            "" | "." => trailing_slash = true,
            ".." => {
                segments.pop();
                trailing_slash = true;
            }
            s => segments.push(s),
        }
    }

    let mut collapsed = String::with_capacity(decoded.len() + 1);
    for segment in &segments {
        collapsed.push('/');
        collapsed.push_str(segment);
    }
    if collapsed.is_empty() || trailing_slash {
        collapsed.push('/');
    }

    CollapsedPath {
        path: collapsed,
        query: query.map(str::to_string),
    }
}

/// Splits a raw request target at the first `?`.
pub fn split_query(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Splits a collapsed path at the first separator after the leading one.
pub fn split_head_tail(collapsed: &str) -> (String, String) {
    match collapsed.get(1..).and_then(|rest| rest.find('/')) {
        Some(idx) => {
            let sep = idx + 1;
            (collapsed[..sep].to_string(), collapsed[sep + 1..].to_string())
        }
        None => (
            String::new(),
            collapsed.trim_start_matches('/').to_string(),
        ),
    }
}

/// Joins a collapsed path onto the document root.
pub fn to_filesystem_path(document_root: &Path, collapsed: &str) -> PathBuf {
    let relative = collapsed.trim_start_matches('/');

    if relative.is_empty() {
        document_root.to_path_buf()
    } else {
        document_root.join(relative)
    }
}

/// Decides whether `target` denotes a CGI script under `document_root`.
///
/// Returns the head/tail split when it does. For a directory implying its
/// `index.py`, the tail names the index script.
pub async fn resolve(target: &str, document_root: &Path) -> Option<CgiResolution> {
    let CollapsedPath { path, query } = collapse_path(target);
    let (head, mut tail) = split_head_tail(&path);

    let candidate = to_filesystem_path(document_root, &path);
    debug!(
        document_root = %document_root.display(),
        relative = path.trim_start_matches('/'),
        absolute = %candidate.display(),
        "Resolving CGI path"
    );

    let metadata = tokio::fs::metadata(&candidate).await.ok()?;

    if metadata.is_file() {
        if is_executable(&metadata) && has_script_extension(&candidate) {
            debug!(head = %head, tail = %tail, "Path is a CGI script");
            return Some(CgiResolution { head, tail, query });
        }
        return None;
    }

    if metadata.is_dir() && directory_implies_script(&candidate).await {
        if tail.is_empty() || tail.ends_with('/') {
            tail.push_str(SCRIPT_INDEX);
        } else {
            tail.push('/');
            tail.push_str(SCRIPT_INDEX);
        }

        debug!(head = %head, tail = %tail, "Directory resolves to its index script");
        return Some(CgiResolution { head, tail, query });
    }

    None
}

/// True when the directory has `index.py` and no HTML index.
async fn directory_implies_script(dir: &Path) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return false;
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }

    let has = |name: &str| names.iter().any(|n| n == name);

    !HTML_INDEXES.iter().any(|index| has(index)) && has(SCRIPT_INDEX)
}

fn has_script_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == SCRIPT_EXTENSION)
        .unwrap_or(false)
}

#[cfg(unix)]
pub fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
pub fn is_executable(metadata: &fs::Metadata) -> bool {
    metadata.is_file()
}
