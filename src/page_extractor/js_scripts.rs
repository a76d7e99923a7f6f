//! JavaScript evaluated inside rendered pages
//!
//! Every script is a self-invoking expression returning JSON-serializable
//! data. Scripts that need parameters are built by small functions that
//! inline the values as JSON literals.

/// Load state check used by the navigation wait loop
pub const READY_STATE_SCRIPT: &str = r"
    (() => ({
        readyState: document.readyState,
        bodyExists: document.body !== null,
        resources: performance.getEntriesByType('resource').length
    }))()
";

/// Declared MIME type of the current document (`application/pdf` for the PDF viewer)
pub const CONTENT_TYPE_SCRIPT: &str = r"(() => document.contentType || '')()";

/// Current document title
pub const TITLE_SCRIPT: &str = r"(() => document.title || '')()";

/// Anchors with a non-empty `href`, resolved against `document.baseURI` at
/// query time
pub const LINKS_SCRIPT: &str = r"
    (() => Array.from(document.querySelectorAll('a[href]'))
        .map(a => a.getAttribute('href') || '')
        .filter(Boolean)
        .map(raw => {
            let abs = null;
            try {
                abs = new URL(raw, document.baseURI).href;
            } catch (e) {}
            return { raw, abs };
        }))()
";

/// Attributes carried in a DOM snapshot. Everything else is dropped to keep
/// the payload small.
pub const SNAPSHOT_ATTRIBUTES: &[&str] = &[
    "id",
    "name",
    "class",
    "role",
    "type",
    "placeholder",
    "href",
    "data-testid",
    "data-crawler-ignore",
    "aria-haspopup",
    "aria-expanded",
    "aria-disabled",
    "hidden",
    "disabled",
    "open",
    "style",
];

/// Flat, document-ordered element list. Node `i` is
/// `document.getElementsByTagName('*')[i]`; `parent` points into the same list.
///
/// Visibility follows the usual automation rule: a non-empty bounding box and
/// no `visibility: hidden`. Text is only read for elements that can become an
/// extraction candidate.
pub const SNAPSHOT_SCRIPT: &str = r#"
    (() => {
        const KEEP = ["id", "name", "class", "role", "type", "placeholder", "href",
            "data-testid", "data-crawler-ignore", "aria-haspopup", "aria-expanded",
            "aria-disabled", "hidden", "disabled", "open", "style"];
        const TEXT_TAGS = new Set(["a", "button", "input", "textarea", "summary"]);
        const all = Array.from(document.getElementsByTagName('*'));
        const index = new Map();
        all.forEach((el, i) => index.set(el, i));

        const isVisible = (el) => {
            const rect = el.getBoundingClientRect();
            if (rect.width <= 0 || rect.height <= 0) return false;
            const style = window.getComputedStyle(el);
            return style.visibility !== 'hidden';
        };
        const isEnabled = (el) => {
            if (typeof el.matches === 'function' && el.matches(':disabled')) return false;
            return el.closest('[aria-disabled="true"]') === null;
        };

        const nodes = all.map((el) => {
            const tag = el.tagName.toLowerCase();
            const attrs = {};
            for (const name of KEEP) {
                const value = el.getAttribute(name);
                if (value !== null) attrs[name] = value;
            }
            const parent = el.parentElement ? index.get(el.parentElement) : undefined;
            const wantsText = TEXT_TAGS.has(tag) || el.hasAttribute('role');
            return {
                tag,
                parent: parent === undefined ? null : parent,
                attrs,
                text: wantsText ? (el.textContent || '') : '',
                visible: isVisible(el),
                enabled: isEnabled(el),
            };
        });
        return { nodes };
    })()
"#;

/// Whether any `role="dialog"` container (or open `<dialog>`) is visible
pub const DIALOG_VISIBLE_SCRIPT: &str = r#"
    (() => Array.from(document.querySelectorAll('[role="dialog"], dialog:not([role])'))
        .some(d => {
            const rect = d.getBoundingClientRect();
            return rect.width > 0 && rect.height > 0
                && window.getComputedStyle(d).visibility !== 'hidden';
        }))()
"#;

/// Scroll to the bottom `steps` times with `delay_ms` between steps
#[must_use]
pub fn auto_scroll_script(steps: u32, delay_ms: u64) -> String {
    format!(
        r"
    (async () => {{
        for (let i = 0; i < {steps}; i++) {{
            window.scrollTo(0, document.body ? document.body.scrollHeight : 0);
            await new Promise(r => setTimeout(r, {delay_ms}));
        }}
        return true;
    }})()
"
    )
}

/// Scroll node `index` into view and return its centre in viewport
/// coordinates, or `null` when it has no box
#[must_use]
pub fn node_center_script(index: usize) -> String {
    format!(
        r"
    (() => {{
        const el = document.getElementsByTagName('*')[{index}];
        if (!el) return null;
        el.scrollIntoView({{ block: 'center', inline: 'center' }});
        const rect = el.getBoundingClientRect();
        if (rect.width <= 0 || rect.height <= 0) return null;
        return {{ x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 }};
    }})()
"
    )
}

/// Whether the first element matching `selector` is present and visible
#[must_use]
pub fn selector_visible_script(selector: &str) -> String {
    let literal = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r"
    (() => {{
        let el = null;
        try {{ el = document.querySelector({literal}); }} catch (e) {{ return false; }}
        if (!el) return false;
        const rect = el.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0
            && window.getComputedStyle(el).visibility !== 'hidden';
    }})()
"
    )
}

/// Clear the value of the first element matching `selector`; `false` when absent
#[must_use]
pub fn clear_field_script(selector: &str) -> String {
    let literal = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r"
    (() => {{
        const el = document.querySelector({literal});
        if (!el) return false;
        if ('value' in el) el.value = '';
        return true;
    }})()
"
    )
}
