//! Content type resolution and `Accept` negotiation.

use std::path::Path;

use tokio::io::AsyncReadExt;

/// Type served for files without an extension.
pub const DEFAULT_TEXT_TYPE: &str = "text/plain";

/// Type served when neither the extension nor the content says otherwise.
pub const DEFAULT_BINARY_TYPE: &str = "application/octet-stream";

const SNIFF_LEN: usize = 512;

/// Resolves the content type of an existing file.
///
/// A final path segment without a `.` is `text/plain`. Known extensions are
/// looked up in the `mime_guess` table; anything else is sniffed from the
/// first bytes of the file.
pub async fn resolve(path: &Path) -> String {
    let has_extension = path
        .file_name()
        .map(|name| name.to_string_lossy().contains('.'))
        .unwrap_or(false);

    if !has_extension {
        return DEFAULT_TEXT_TYPE.to_string();
    }

    if let Some(mime) = mime_guess::from_path(path).first() {
        return mime.essence_str().to_string();
    }

    sniff(path).await.to_string()
}

async fn sniff(path: &Path) -> &'static str {
    let mut head = Vec::with_capacity(SNIFF_LEN);

    let read = match tokio::fs::File::open(path).await {
        Ok(file) => file.take(SNIFF_LEN as u64).read_to_end(&mut head).await,
        Err(e) => Err(e),
    };

    match read {
        Ok(_) if looks_like_text(&head) => DEFAULT_TEXT_TYPE,
        _ => DEFAULT_BINARY_TYPE,
    }
}

fn looks_like_text(bytes: &[u8]) -> bool {
    if bytes.contains(&0) {
        return false;
    }

    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        // A multi-byte character cut off by the sniff window is still text
        Err(e) => e.error_len().is_none() && bytes.len() == SNIFF_LEN,
    }
}

/// Reports whether an `Accept` header value admits `mime`.
///
/// The header is a comma-separated list of `type/subtype` entries. Entry
/// parameters (`;q=0.5`) and surrounding whitespace are ignored. `*/*`
/// accepts anything; otherwise type and subtype must both match exactly.
pub fn accepts(accept: &str, mime: &str) -> bool {
    let Some((mime_type, mime_subtype)) = mime.split_once('/') else {
        return false;
    };

    accept
        .split(',')
        .filter_map(|entry| {
            let range = entry.split(';').next().unwrap_or("").trim();
            range.split_once('/')
        })
        .any(|(general, specific)| {
            (general == "*" && specific == "*")
                || (general == mime_type && specific == mime_subtype)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_accepts_everything() {
        assert!(accepts("*/*", "image/png"));
        assert!(accepts("text/html, */*;q=0.8", "application/pdf"));
    }

    #[test]
    fn exact_match_required_without_wildcard() {
        assert!(accepts("text/plain", "text/plain"));
        assert!(!accepts("image/png", "text/plain"));
        assert!(!accepts("text/*", "text/plain"));
    }

    #[test]
    fn entries_without_slash_never_match() {
        assert!(!accepts("garbage", "text/plain"));
        assert!(!accepts("", "text/plain"));
    }

    #[test]
    fn text_detection() {
        assert!(looks_like_text(b"hello world\n"));
        assert!(!looks_like_text(&[0x89, b'P', b'N', b'G', 0, 0]));
    }
}
