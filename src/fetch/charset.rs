//! Charset detection and lossy decoding for static responses.

use encoding_rs::Encoding;
use regex::bytes::Regex;
use std::sync::LazyLock;

use crate::utils::CHARSET_SNIFF_BYTES;

static CHARSET_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*['"]?([a-zA-Z0-9._-]+)"#).ok());

fn capture_charset(haystack: &[u8]) -> Option<String> {
    let pattern = CHARSET_PATTERN.as_ref()?;
    let caps = pattern.captures(haystack)?;
    let label = caps.get(1)?.as_bytes();
    Some(String::from_utf8_lossy(label).to_ascii_lowercase())
}

/// `charset` parameter of a Content-Type header value.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    capture_charset(content_type.as_bytes())
}

/// Look for a `charset=` declaration in the first 4096 bytes of a body.
#[must_use]
pub fn sniff_charset(body: &[u8]) -> Option<String> {
    capture_charset(&body[..body.len().min(CHARSET_SNIFF_BYTES)])
}

/// Decode `body` with `charset`, falling back to UTF-8 with replacement
/// characters when the label is missing or unknown.
#[must_use]
pub fn decode_body(body: &[u8], charset: Option<&str>) -> String {
    if let Some(label) = charset
        && let Some(encoding) = Encoding::for_label(label.trim().as_bytes())
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }
    String::from_utf8_lossy(body).into_owned()
}
