//! Small string helpers shared by the extractors and the output writers.

/// Truncate to at most `max_chars` characters, never splitting a UTF-8
/// sequence.
///
/// ```
/// # use sitescout::utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("删除项目", 2), "删除");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
#[must_use]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Collapse every run of whitespace into one space and trim both ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive a file stem from a page title.
///
/// Non-alphanumeric characters become `_`, leading and trailing underscores
/// are trimmed and the result is lower-cased. Returns `fallback` when nothing
/// is left.
///
/// ```
/// # use sitescout::utils::sanitize_page_name;
/// assert_eq!(sanitize_page_name("Login | My App", "page"), "login___my_app");
/// assert_eq!(sanitize_page_name("  ", "page"), "page");
/// ```
#[must_use]
pub fn sanitize_page_name(title: &str, fallback: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let trimmed = replaced.trim_matches('_').to_lowercase();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed
    }
}
