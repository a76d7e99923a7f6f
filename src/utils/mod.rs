pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{collapse_whitespace, safe_truncate_chars, sanitize_page_name};
pub use url_utils::{netloc, normalize_url, resolve_href, same_location};
