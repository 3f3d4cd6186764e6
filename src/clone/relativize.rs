//! Mount-path derivation for discovered layers
//!
//! This is a textual operation: the root is removed by substring replacement,
//! not by comparing parsed URL paths.

fn is_trimmed(c: char) -> bool {
    c == '/' || c.is_whitespace()
}

/// Strip surrounding whitespace and slashes
pub fn trim_path(s: &str) -> &str {
    s.trim_matches(is_trimmed)
}

/// Path of `absolute_url` relative to `root_url`, as `/A/B/`.
///
/// Every occurrence of the trimmed root is removed. Duplicate slashes are
/// collapsed. A URL equal to the root yields `/`.
pub fn relativize(absolute_url: &str, root_url: &str) -> String {
    let absolute = trim_path(absolute_url);
    let root = trim_path(root_url);

    let remainder = if root.is_empty() {
        absolute.to_string()
    } else {
        absolute.replace(root, "")
    };

    let segments: Vec<&str> = remainder
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

/// Whether `absolute_url` is `root_url` or a path below it, once both are
/// trimmed. The root must end on a segment boundary: `.../services2` is not
/// under `.../services`.
pub fn is_under_root(absolute_url: &str, root_url: &str) -> bool {
    let root = trim_path(root_url);
    !root.is_empty()
        && trim_path(absolute_url)
            .strip_prefix(root)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Remote URL for a relative path: `trim(root) + "/" + trim(relative)`
pub fn join_remote(root_url: &str, relative_path: &str) -> String {
    format!("{}/{}", trim_path(root_url), trim_path(relative_path))
}

/// Normalize a mount prefix to `/a/b` form; the root prefix becomes `""`
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = trim_path(prefix);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
