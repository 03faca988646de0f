//! Serves files from the document root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cgi::resolver::{HTML_INDEXES, collapse_path, to_filesystem_path};
use crate::http::mime;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Serves a GET for `path`.
///
/// 404 when no regular file (or directory index) exists, 406 when the
/// `Accept` header rules out the file's type, otherwise 200 with the file.
pub async fn get(document_root: &Path, path: &str, headers: &HashMap<String, String>) -> Response {
    serve(document_root, path, headers, true).await
}

/// Serves a HEAD for `path`: GET's status and headers, no body.
///
/// The file is not read; Content-Length comes from its metadata.
pub async fn head(document_root: &Path, path: &str, headers: &HashMap<String, String>) -> Response {
    serve(document_root, path, headers, false).await
}

async fn serve(
    document_root: &Path,
    path: &str,
    headers: &HashMap<String, String>,
    with_body: bool,
) -> Response {
    let Some((file, len)) = locate_file(document_root, path).await else {
        debug!(path, "No file to serve");
        return Response::not_found();
    };

    let mime = mime::resolve(&file).await;

    if let Some(accept) = headers.get("Accept") {
        if !mime::accepts(accept, &mime) {
            debug!(path, mime = %mime, accept = %accept, "No acceptable representation");
            return Response::not_acceptable();
        }
    }

    if !with_body {
        return ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", mime)
            .header("Content-Length", len.to_string())
            .build();
    }

    // The file can vanish or become unreadable after the existence check
    let payload = match tokio::fs::read(&file).await {
        Ok(payload) => payload,
        Err(e) => {
            debug!(file = %file.display(), error = %e, "File became unreadable");
            return Response::not_found();
        }
    };

    info!(file = %file.display(), "Serving file");

    ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", mime)
        .body(payload)
        .build()
}

/// Finds the regular file a request path maps to, with its length.
///
/// Directories resolve to their `index.html` or `index.htm`, if any.
async fn locate_file(document_root: &Path, path: &str) -> Option<(PathBuf, u64)> {
    let target = to_filesystem_path(document_root, &collapse_path(path).path);
    let metadata = tokio::fs::metadata(&target).await.ok()?;

    if metadata.is_file() {
        return Some((target, metadata.len()));
    }

    if metadata.is_dir() {
        for index in HTML_INDEXES {
            let candidate = target.join(index);
            if let Ok(metadata) = tokio::fs::metadata(&candidate).await {
                if metadata.is_file() {
                    return Some((candidate, metadata.len()));
                }
            }
        }
    }

    None
}
