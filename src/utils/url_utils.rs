//! URL canonicalization utilities.
//!
//! Every URL that enters the frontier passes through [`normalize_url`], so two
//! hrefs that differ only in scheme/host case, default port or fragment
//! collapse onto the same key. Path and query are kept as written: `url` is
//! used to validate and to read the host and port, never to re-encode.

use url::Url;

/// Canonicalize `raw` into a comparable frontier key.
///
/// Rejects empty input, non-http(s) schemes and URLs without a host. Default
/// ports are dropped, the scheme and host are lower-cased, credentials are
/// discarded, dot segments are removed and an empty path becomes `/`. The
/// query is kept verbatim; the fragment is kept only when `keep_fragment` is
/// set.
///
/// Returns `None` on rejection. Callers drop the link, it is never fatal.
///
/// ```
/// # use sitescout::utils::normalize_url;
/// assert_eq!(
///     normalize_url("HTTP://Example.COM:80/a?b=1#top", false).as_deref(),
///     Some("http://example.com/a?b=1")
/// );
/// assert_eq!(normalize_url("mailto:someone@example.com", false), None);
/// ```
#[must_use]
pub fn normalize_url(raw: &str, keep_fragment: bool) -> Option<String> {
    let raw = strip_tabs_and_newlines(raw.trim());
    if raw.is_empty() {
        return None;
    }

    let url = Url::parse(&raw).ok()?;
    let scheme = url.scheme();
    if !matches!(scheme, "http" | "https") {
        return None;
    }
    let host = url.host_str().filter(|h| !h.is_empty())?;
    // Url::parse already drops default ports and lower-cases scheme and host.
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let rest = after_authority(&raw)?;
    let (path, query, fragment) = split_reference(rest);
    let path = path.replace('\\', "/");
    let path = remove_dot_segments(if path.is_empty() { "/" } else { &path });

    let mut out = format!("{scheme}://{authority}{path}");
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        out.push('?');
        out.push_str(query);
    }
    if keep_fragment && let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
        out.push('#');
        out.push_str(fragment);
    }
    Some(out)
}

/// The `host[:port]` of a normalized URL, used as the crawl origin key.
///
/// IPv6 hosts keep their brackets; the port is present only when it is not
/// the scheme default.
#[must_use]
pub fn netloc(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// Resolve `href` against `base` and normalize the result.
///
/// Reference resolution works on the text as written, so a relative path or
/// query reaches the result without being percent-encoded.
#[must_use]
pub fn resolve_href(base: &str, href: &str, keep_fragment: bool) -> Option<String> {
    let href = strip_tabs_and_newlines(href.trim());
    if has_scheme(&href) {
        return normalize_url(&href, keep_fragment);
    }

    let base = normalize_url(base, false)?;
    let scheme_end = base.find("://")?;
    if href.starts_with("//") || href.starts_with("\\\\") {
        return normalize_url(&format!("{}:{href}", &base[..scheme_end]), keep_fragment);
    }

    let rest = after_authority(&base)?;
    let origin = &base[..base.len() - rest.len()];
    let (base_path, base_query, _) = split_reference(rest);
    let (path, query, fragment) = split_reference(&href);

    let (path, query) = if path.is_empty() {
        (base_path.to_string(), query.or(base_query))
    } else if path.starts_with('/') || path.starts_with('\\') {
        (path.to_string(), query)
    } else {
        let dir = &base_path[..base_path.rfind('/').map_or(0, |i| i + 1)];
        (format!("{dir}{path}"), query)
    };

    let mut joined = format!("{origin}{path}");
    if let Some(query) = query {
        joined.push('?');
        joined.push_str(query);
    }
    if let Some(fragment) = fragment {
        joined.push('#');
        joined.push_str(fragment);
    }
    normalize_url(&joined, keep_fragment)
}

/// Whether two absolute URLs name the same resource once parsed, ignoring
/// fragments. Used to keep the caller's spelling when no redirect happened.
#[must_use]
pub fn same_location(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(mut a), Ok(mut b)) => {
            a.set_fragment(None);
            b.set_fragment(None);
            a == b
        }
        _ => false,
    }
}

fn strip_tabs_and_newlines(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '\t' | '\n' | '\r')).collect()
}

fn has_scheme(s: &str) -> bool {
    let Some(colon) = s.find(':') else {
        return false;
    };
    let scheme = &s[..colon];
    scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Everything after `scheme://authority` of an absolute URL, as written.
fn after_authority(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let rest = url[colon + 1..].trim_start_matches(['/', '\\']);
    let end = rest.find(['/', '\\', '?', '#']).unwrap_or(rest.len());
    Some(&rest[end..])
}

/// Split a reference into path, query and fragment.
fn split_reference(reference: &str) -> (&str, Option<&str>, Option<&str>) {
    let (rest, fragment) = match reference.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (reference, None),
    };
    match rest.split_once('?') {
        Some((path, query)) => (path, Some(query), fragment),
        None => (rest, None, fragment),
    }
}

/// Remove `.` and `..` segments from an absolute path.
fn remove_dot_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let mut parts = path.split('/').skip(1).peekable();
    let mut trailing_slash = false;
    while let Some(segment) = parts.next() {
        let last = parts.peek().is_none();
        match segment {
            "." => trailing_slash = last,
            ".." => {
                segments.pop();
                trailing_slash = last;
            }
            _ => {
                segments.push(segment);
                trailing_slash = false;
            }
        }
    }
    let mut out = String::with_capacity(path.len());
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    if trailing_slash || out.is_empty() {
        out.push('/');
    }
    out
}
