//! Stream locations for completed files.

/// Path segment under the server prefix that serves downloaded files.
pub const STREAM_SEGMENT: &str = "downloaded";

/// Relative stream location (`downloaded/<encoded basename>`) for a stored
/// file path.
///
/// Only the basename is kept, split on both separator styles, so a stored
/// path can never address anything outside the download directory.
#[must_use]
pub fn stream_path(file_path: &str) -> Option<String> {
    let basename = file_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if basename.is_empty() || basename == "." || basename == ".." {
        return None;
    }
    Some(format!(
        "{STREAM_SEGMENT}/{}",
        urlencoding::encode(basename)
    ))
}
