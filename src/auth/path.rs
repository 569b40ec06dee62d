//! Path safety rules for client-supplied paths.
//!
//! Paths are allow-listed rather than deny-listed: every segment must consist
//! solely of `[A-Za-z0-9._-]`, so traversal through encoded separators,
//! alternate separators or Unicode look-alikes cannot be expressed at all.

/// Maximum number of segments in a path.
pub const MAX_SEGMENTS: usize = 20;

/// Maximum length of a single segment in bytes.
pub const MAX_SEGMENT_LEN: usize = 1000;

/// Reserved top-level directory holding internal state (staged uploads).
///
/// Never addressable through the HTTP surface.
pub const RESERVED_DIR: &str = ".fsgate";

/// Returns `true` if `path` is a canonical, traversal-free relative path.
///
/// `path` is expected to have been percent-decoded once already; a path that
/// still changes under a second decode is rejected.
pub fn is_safe(path: &str) -> bool {
    match urlencoding::decode(path) {
        Ok(decoded) if decoded == path => {}
        _ => return false,
    }

    if !path.starts_with('/') || path.contains("//") {
        return false;
    }

    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() || segments.len() > MAX_SEGMENTS {
        return false;
    }

    segments.iter().all(|segment| is_safe_segment(segment))
}

fn is_safe_segment(segment: &str) -> bool {
    segment != "."
        && segment != ".."
        && segment != RESERVED_DIR
        && segment.len() <= MAX_SEGMENT_LEN
        && !segment.contains('\0')
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}
